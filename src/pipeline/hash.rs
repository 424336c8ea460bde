// src/pipeline/hash.rs
// =============================================================================
// Content hash of a downloaded file.
//
// The digest goes into the [hash] placeholder of the filename template, so
// the same image downloaded from two different URLs lands on the same file
// name. This is content addressing for deduplication, not a security
// boundary, which is why MD5's 128 bits are plenty.
// =============================================================================

// Returns the lowercase hex MD5 digest of the bytes
//
// Deterministic: identical bytes always produce the identical 32-character
// string.
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", md5::compute(bytes))
}

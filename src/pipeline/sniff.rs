// src/pipeline/sniff.rs
// =============================================================================
// This module works out what kind of file a downloaded buffer actually is.
//
// Remote URLs lie: a link ending in .png can serve a JPEG, and plenty of
// image URLs have no extension at all. The first bytes of the file do not
// lie, so the extension we save under comes from the magic-number signature
// of the downloaded data, not from the URL.
//
// One ambiguity needs special care: an SVG is also a well-formed XML
// document. When the signature says "XML" we additionally look for an <svg>
// root element and prefer .svg, so vector images are not saved as .xml.
//
// An unrecognized buffer is NOT an error - the caller just saves it with no
// extension.
// =============================================================================

// Returns the extension (with leading dot) for the buffer, or "" if the
// signature is unrecognized
pub fn sniff_extension(bytes: &[u8]) -> String {
    match match_signature(bytes) {
        Some(".xml") if looks_like_svg(bytes) => ".svg".to_string(),
        Some(ext) => ext.to_string(),
        None => String::new(),
    }
}

// The magic-number table
//
// Ordered roughly by how common the formats are in the wild. Every check is
// anchored at the start of the buffer.
fn match_signature(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        return Some(".png");
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some(".jpg");
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return Some(".gif");
    }
    // WebP is a RIFF container: "RIFF" + 4 length bytes + "WEBP"
    if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some(".webp");
    }
    if bytes.starts_with(b"BM") {
        return Some(".bmp");
    }
    if bytes.starts_with(&[0x00, 0x00, 0x01, 0x00]) {
        return Some(".ico");
    }
    // TIFF, little- and big-endian
    if bytes.starts_with(b"II*\x00") || bytes.starts_with(b"MM\x00*") {
        return Some(".tif");
    }
    if looks_like_xml(bytes) {
        return Some(".xml");
    }
    None
}

// XML is text, so its "signature" is the declaration at the top of the
// file, allowing for a UTF-8 BOM and leading whitespace
fn looks_like_xml(bytes: &[u8]) -> bool {
    let rest = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let start = rest
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(rest.len());
    rest[start..].starts_with(b"<?xml")
}

// Structural check for an <svg> root somewhere in the document
//
// "<svg" must be followed by whitespace, '>', or '/' so that an element
// like <svgfoo> does not count.
fn looks_like_svg(bytes: &[u8]) -> bool {
    let text = String::from_utf8_lossy(bytes);
    for (idx, _) in text.match_indices("<svg") {
        match text[idx + 4..].chars().next() {
            None => return true,
            Some(c) if c.is_whitespace() || c == '>' || c == '/' => return true,
            Some(_) => {}
        }
    }
    false
}

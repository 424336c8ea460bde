// src/vault/mod.rs
// =============================================================================
// This module is the seam between the pipeline and the note collection on
// disk.
//
// The pipeline never touches std::fs directly. Everything goes through the
// Vault trait, which exposes exactly the operations the pipeline needs:
// - read_text / write_text: for the note itself
// - exists / create_dir_all / write_binary: for the downloaded assets
//
// All paths are relative to a vault root (the directory the note collection
// lives in). Two implementations exist:
// - FsVault: the real one, backed by the file system (fs.rs)
// - MemVault: an in-memory one for tests, so pipeline tests can assert on
//   every write without touching disk
//
// Rust concepts:
// - Traits: Define shared behavior that multiple types implement
// - Trait objects (&dyn Vault): Let the pipeline accept any implementation
// =============================================================================

mod fs;

pub use fs::FsVault;

use std::io;
use std::path::Path;

// The file-system contract the pipeline is written against
pub trait Vault {
    /// Reads a note as UTF-8 text
    fn read_text(&self, path: &Path) -> io::Result<String>;

    /// Overwrites a note with new text
    fn write_text(&self, path: &Path, text: &str) -> io::Result<()>;

    /// True if a file already exists at this path
    fn exists(&self, path: &Path) -> bool;

    /// Writes a downloaded asset
    fn write_binary(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;

    /// Creates a directory (and its parents) if it is not there yet
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;
}

// -----------------------------------------------------------------------------
// In-memory vault for tests
//
// Lives here rather than in a tests/ directory because unit tests in several
// modules share it. It is compiled only for test builds.
// -----------------------------------------------------------------------------

#[cfg(test)]
pub struct MemVault {
    files: std::sync::Mutex<std::collections::HashMap<std::path::PathBuf, Vec<u8>>>,
    dirs: std::sync::Mutex<std::collections::HashSet<std::path::PathBuf>>,
    fail_binary_writes: bool,
}

#[cfg(test)]
impl MemVault {
    pub fn new() -> Self {
        MemVault {
            files: std::sync::Mutex::new(std::collections::HashMap::new()),
            dirs: std::sync::Mutex::new(std::collections::HashSet::new()),
            fail_binary_writes: false,
        }
    }

    /// A vault whose binary writes always fail, for the save-error path
    pub fn failing_writes() -> Self {
        MemVault {
            fail_binary_writes: true,
            ..MemVault::new()
        }
    }

    pub fn insert_text(&self, path: impl Into<std::path::PathBuf>, text: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(path.into(), text.as_bytes().to_vec());
    }

    pub fn insert_binary(&self, path: impl Into<std::path::PathBuf>, bytes: &[u8]) {
        self.files.lock().unwrap().insert(path.into(), bytes.to_vec());
    }

    pub fn text(&self, path: &Path) -> Option<String> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn binary(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub fn file_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }
}

#[cfg(test)]
impl Vault for MemVault {
    fn read_text(&self, path: &Path) -> io::Result<String> {
        match self.files.lock().unwrap().get(path) {
            Some(bytes) => String::from_utf8(bytes.clone())
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file: {}", path.display()),
            )),
        }
    }

    fn write_text(&self, path: &Path, text: &str) -> io::Result<()> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), text.as_bytes().to_vec());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    fn write_binary(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        if self.fail_binary_writes {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "write refused",
            ));
        }
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.dirs.lock().unwrap().insert(path.to_path_buf());
        Ok(())
    }
}

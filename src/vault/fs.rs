// src/vault/fs.rs
// =============================================================================
// The disk-backed vault implementation.
//
// FsVault resolves every path against the vault root before touching the
// file system, so callers only ever deal in root-relative paths. That keeps
// the pipeline independent of where the collection actually lives.
// =============================================================================

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::Vault;

// A note collection rooted at a directory on disk
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsVault { root: root.into() }
    }

    // Joins a root-relative path onto the vault root
    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl Vault for FsVault {
    fn read_text(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(self.resolve(path))
    }

    fn write_text(&self, path: &Path, text: &str) -> io::Result<()> {
        fs::write(self.resolve(path), text)
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).exists()
    }

    fn write_binary(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        fs::write(self.resolve(path), bytes)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(self.resolve(path))
    }
}

// src/config.rs
// =============================================================================
// This file defines the persistent settings for notedown.
//
// Settings live in a JSON file (notedown.json by default) under the vault
// root. Loading merges the file over the defaults: any key missing from the
// file keeps its default value, so old settings files keep working when new
// keys are added.
//
// Rust concepts:
// - Default trait: Provides the baseline values for every setting
// - serde(default): Fills missing JSON keys from Default during parsing
// - Result<T, E>: For error handling when the file is unreadable or invalid
// =============================================================================

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name we look for under the vault root when --config is not given
pub const DEFAULT_CONFIG_FILE: &str = "notedown.json";

// The full user-editable configuration surface
//
// The JSON keys are camelCase (storeRelativeToDocument, assetsDirectory,
// filenameTemplate, downloadTimeoutMs) while the Rust fields stay snake_case;
// serde's rename_all bridges the two.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Store downloads next to the note (true) or under one
    /// vault-level directory (false)
    pub store_relative_to_document: bool,

    /// Directory the downloaded files are saved into
    pub assets_directory: String,

    /// Naming rule for saved files. Placeholders: [noteName], [name],
    /// [alt], [title], [hash], [ext]. Unknown placeholders stay literal.
    pub filename_template: String,

    /// Download timeout in milliseconds. Reserved: requests currently run
    /// until the server answers or the connection drops.
    pub download_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            store_relative_to_document: true,
            assets_directory: "assets".to_string(),
            filename_template: "[noteName]-[hash][ext]".to_string(),
            download_timeout_ms: 5000,
        }
    }
}

// Loads settings from a JSON file, merging over the defaults
//
// A missing file is not an error: you get the plain defaults, same as a
// fresh install. A file that exists but does not parse IS an error - silently
// ignoring a typo in a settings file is worse than failing loudly.
pub fn load(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file {}", path.display()))?;

    let settings: Settings = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid settings file {}", path.display()))?;

    Ok(settings)
}

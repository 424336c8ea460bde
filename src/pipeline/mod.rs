// src/pipeline/mod.rs
// =============================================================================
// This module contains the batch link-rewrite pipeline.
//
// Submodules:
// - extract: Finds the ![alt](https://...) image tokens and their offsets
// - fetch: Downloads one URL into memory, following redirects on a budget
// - sniff: Works out the real file type from the downloaded bytes
// - hash: Content hash used for stable file naming
// - correlate: Runs every download at once and maps results back to spans
// - rewrite: Splices the outcomes into the new note text and saves files
//
// This file (mod.rs) is the module root - it ties the stages together into
// localize_note(), the one entry point the CLI calls per note.
// =============================================================================

mod correlate;
mod extract;
mod fetch;
mod hash;
mod rewrite;
mod sniff;

// Re-export the public API so callers write pipeline::localize_note()
// without knowing the internal file layout
pub use correlate::{resolve_spans, FetchOutcome};
pub use extract::{extract_image_links, MatchSpan};
pub use fetch::{download_client, fetch_binary, FetchError, DEFAULT_REDIRECT_BUDGET};
pub use hash::content_hash;
pub use rewrite::{assemble, render_template};
pub use sniff::sniff_extension;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use std::path::Path;

use crate::config::Settings;
use crate::vault::Vault;

// The end-of-run summary for one note
//
// Serializable so --json output can print it directly.
#[derive(Debug, Serialize)]
pub struct NoteReport {
    /// The note that was processed (vault-relative path)
    pub note: String,
    /// How many remote images were found
    pub attempted: usize,
    /// How many of them downloaded and classified successfully
    pub resolved: usize,
    /// How many files were newly written to disk
    pub saved: usize,
    /// Whether the note text was rewritten
    pub changed: bool,
}

impl NoteReport {
    /// True when every image that was attempted also resolved
    pub fn is_clean(&self) -> bool {
        self.resolved == self.attempted
    }
}

// Runs the whole pipeline over one note
//
// Stages: read -> extract -> download all at once -> splice -> write back.
// The write-back only happens when the spliced text differs from the
// original, which makes a re-run over an already-localized note (or one
// whose downloads all failed) a no-op.
//
// Per-image failures never surface as errors here - they show up as
// attempted > resolved in the report. An Err from this function means the
// note itself could not be read or written.
pub async fn localize_note(
    vault: &dyn Vault,
    client: &Client,
    settings: &Settings,
    note_path: &Path,
) -> Result<NoteReport> {
    let text = vault
        .read_text(note_path)
        .with_context(|| format!("Failed to read note {}", note_path.display()))?;

    let spans = extract::extract_image_links(&text);

    let mut report = NoteReport {
        note: note_path.display().to_string(),
        attempted: spans.len(),
        resolved: 0,
        saved: 0,
        changed: false,
    };

    // Nothing to download: stop before any network or disk work.
    if spans.is_empty() {
        return Ok(report);
    }

    tracing::info!(
        note = %note_path.display(),
        count = spans.len(),
        "downloading remote images"
    );

    let outcomes = resolve_spans(client, &spans).await;
    report.resolved = outcomes.iter().filter(|o| o.is_success()).count();

    let note_name = note_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let note_dir = note_path.parent().unwrap_or_else(|| Path::new(""));

    let (new_text, saved) = rewrite::assemble(
        &text,
        &spans,
        &outcomes,
        &note_name,
        note_dir,
        settings,
        vault,
    );
    report.saved = saved;

    if new_text != text {
        vault
            .write_text(note_path, &new_text)
            .with_context(|| format!("Failed to write note {}", note_path.display()))?;
        report.changed = true;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::MemVault;
    use wiremock::matchers::{method, path as url_path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n0000";

    #[tokio::test]
    async fn test_note_without_remote_images_is_untouched() {
        let vault = MemVault::new();
        vault.insert_text("note.md", "plain text and a ![local](./assets/x.png)");
        let client = download_client().unwrap();

        let report = localize_note(&vault, &client, &Settings::default(), Path::new("note.md"))
            .await
            .unwrap();

        assert_eq!(report.attempted, 0);
        assert!(!report.changed);
        assert_eq!(
            vault.text(Path::new("note.md")).unwrap(),
            "plain text and a ![local](./assets/x.png)"
        );
        // The note itself is the only file in the vault: no assets appeared.
        assert_eq!(vault.file_count(), 1);
    }

    #[tokio::test]
    async fn test_partial_failure_rewrites_only_the_survivors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/good.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG.to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(url_path("/bad.png"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let vault = MemVault::new();
        vault.insert_text(
            "note.md",
            &format!(
                "![ok]({uri}/good.png)\n![broken]({uri}/bad.png)\n",
                uri = server.uri()
            ),
        );
        let client = download_client().unwrap();

        let report = localize_note(&vault, &client, &Settings::default(), Path::new("note.md"))
            .await
            .unwrap();

        assert_eq!(report.attempted, 2);
        assert_eq!(report.resolved, 1);
        assert_eq!(report.saved, 1);
        assert!(report.changed);

        let text = vault.text(Path::new("note.md")).unwrap();
        let hash = content_hash(PNG);
        assert_eq!(
            text,
            format!(
                "![ok](./assets/note-{hash}.png)\n![broken]({uri}/bad.png)\n",
                uri = server.uri()
            )
        );
    }

    #[tokio::test]
    async fn test_second_run_is_a_no_op() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/pic.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG.to_vec()))
            .mount(&server)
            .await;

        let vault = MemVault::new();
        vault.insert_text("note.md", &format!("![p]({}/pic.png)", server.uri()));
        let client = download_client().unwrap();
        let settings = Settings::default();

        let first = localize_note(&vault, &client, &settings, Path::new("note.md"))
            .await
            .unwrap();
        assert!(first.changed);
        let after_first = vault.text(Path::new("note.md")).unwrap();

        // The rewritten link is local now, so the second run finds nothing.
        let second = localize_note(&vault, &client, &settings, Path::new("note.md"))
            .await
            .unwrap();
        assert_eq!(second.attempted, 0);
        assert!(!second.changed);
        assert_eq!(vault.text(Path::new("note.md")).unwrap(), after_first);
    }

    #[tokio::test]
    async fn test_assets_land_next_to_a_nested_note() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/pic.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG.to_vec()))
            .mount(&server)
            .await;

        let vault = MemVault::new();
        vault.insert_text(
            "journal/2026/trip.md",
            &format!("![p]({}/pic.png)", server.uri()),
        );
        let client = download_client().unwrap();

        let report = localize_note(
            &vault,
            &client,
            &Settings::default(),
            Path::new("journal/2026/trip.md"),
        )
        .await
        .unwrap();

        assert_eq!(report.saved, 1);
        let hash = content_hash(PNG);
        // Saved under the note's own directory...
        assert!(vault.exists(Path::new(&format!(
            "journal/2026/assets/trip-{hash}.png"
        ))));
        // ...while the link stays note-relative.
        assert_eq!(
            vault.text(Path::new("journal/2026/trip.md")).unwrap(),
            format!("![p](./assets/trip-{hash}.png)")
        );
    }

    #[tokio::test]
    async fn test_missing_note_is_an_error() {
        let vault = MemVault::new();
        let client = download_client().unwrap();
        let result =
            localize_note(&vault, &client, &Settings::default(), Path::new("nope.md")).await;
        assert!(result.is_err());
    }
}

// src/pipeline/rewrite.rs
// =============================================================================
// This module builds the new note text out of the old text, the spans, and
// their outcomes.
//
// It is a single cursor walk over the original text: copy the gap before
// each span unchanged, then either splice in a rewritten local link (span
// succeeded) or copy the original token through (span failed). Failures are
// invisible in the result - a reader of the note cannot tell a skipped span
// from one that was never matched.
//
// Saving happens here too, one file at a time during the walk, guarded by
// an existence check so a file downloaded on an earlier run is reused
// instead of overwritten.
// =============================================================================

use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::vault::Vault;

use super::correlate::FetchOutcome;
use super::extract::MatchSpan;

// Instantiates the filename template from the per-span name values
//
// Every [key] found in names is replaced by its value; a bracketed token
// that is not a known key stays in the output verbatim, so a template typo
// is visible in the resulting file name instead of vanishing.
pub fn render_template(template: &str, names: &HashMap<&str, String>) -> String {
    let placeholder = Regex::new(r"\[([^\]]+)\]").expect("placeholder pattern is valid");

    placeholder
        .replace_all(template, |caps: &regex::Captures| match names.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

// Splices the outcomes back into the text and saves the new files
//
// Returns the assembled text and how many files were newly written. The
// caller compares the text against the original to decide whether the note
// needs writing back at all.
//
// spans and outcomes are index-correlated: outcomes[i] belongs to spans[i].
pub fn assemble(
    text: &str,
    spans: &[MatchSpan],
    outcomes: &[FetchOutcome],
    note_name: &str,
    note_dir: &Path,
    settings: &Settings,
    vault: &dyn Vault,
) -> (String, usize) {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    let mut saved = 0usize;

    // Where the files go on disk: next to the note, or in one vault-level
    // directory, per the settings.
    let assets_dir = if settings.store_relative_to_document {
        note_dir.join(&settings.assets_directory)
    } else {
        PathBuf::from(&settings.assets_directory)
    };
    // The directory is created lazily at the first actual save, so a note
    // whose downloads all failed leaves no empty directory behind.
    let mut assets_dir_ready = false;

    for (span, outcome) in spans.iter().zip(outcomes) {
        // The unchanged text between the previous span and this one.
        out.push_str(&text[cursor..span.start]);

        match outcome {
            FetchOutcome::Success { bytes, ext, hash } => {
                let names = name_context(note_name, span, hash, ext);
                let file_name = render_template(&settings.filename_template, &names);
                let save_path = assets_dir.join(&file_name);

                // Save only when the file is not there yet; an existing
                // copy keeps its bytes and we just point the link at it.
                let mut save_failed = false;
                if !vault.exists(&save_path) {
                    let dir_result = if assets_dir_ready {
                        Ok(())
                    } else {
                        vault.create_dir_all(&assets_dir)
                    };
                    match dir_result.and_then(|_| vault.write_binary(&save_path, bytes)) {
                        Ok(()) => {
                            assets_dir_ready = true;
                            saved += 1;
                        }
                        Err(e) => {
                            tracing::warn!(
                                path = %save_path.display(),
                                error = %e,
                                "could not save downloaded file"
                            );
                            save_failed = true;
                        }
                    }
                }

                if save_failed {
                    // A span whose save failed stays exactly as it was;
                    // the walk continues with the remaining spans.
                    out.push_str(&text[span.start..span.end]);
                } else {
                    out.push_str(&local_link_token(span, settings, &file_name));
                }
            }
            FetchOutcome::Failure { .. } => {
                // Already logged when the outcome was built; the original
                // token is copied through untouched.
                out.push_str(&text[span.start..span.end]);
            }
        }

        cursor = span.end;
    }

    // The tail after the last span.
    out.push_str(&text[cursor..]);

    (out, saved)
}

// The values the filename template placeholders draw from
fn name_context(
    note_name: &str,
    span: &MatchSpan,
    hash: &str,
    ext: &str,
) -> HashMap<&'static str, String> {
    HashMap::from([
        ("noteName", note_name.to_string()),
        ("name", span.base_name.clone()),
        ("alt", span.alt.clone()),
        ("title", span.title.clone()),
        ("hash", hash.to_string()),
        ("ext", ext.to_string()),
    ])
}

// Builds the replacement ![alt](path "title") token
//
// The path written into the note always uses the configured directory name
// with forward slashes (Markdown links are not OS paths), gets a ./ prefix
// in relative mode, and has spaces percent-encoded so the link survives
// strict Markdown renderers. The title keeps its text but interior double
// quotes become single quotes so the quoting cannot break.
fn local_link_token(span: &MatchSpan, settings: &Settings, file_name: &str) -> String {
    let joined = if settings.assets_directory.is_empty() {
        file_name.to_string()
    } else {
        format!(
            "{}/{}",
            settings.assets_directory.trim_end_matches('/'),
            file_name
        )
    };

    let mut link = String::new();
    if settings.store_relative_to_document {
        link.push_str("./");
    }
    link.push_str(&joined.replace(' ', "%20"));

    let mut token = format!("![{}]({}", span.alt, link);
    if !span.title.is_empty() {
        token.push_str(" \"");
        token.push_str(&span.title.replace('"', "'"));
        token.push('"');
    }
    token.push(')');
    token
}

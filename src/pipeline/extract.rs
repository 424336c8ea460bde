// src/pipeline/extract.rs
// =============================================================================
// This module finds the remote-image tokens in a note's text.
//
// We are looking for Markdown image syntax with an absolute http/https URL:
//
//   ![alt text](https://example.com/pic.png "optional title")
//
// Unlike a full Markdown parse, we need the exact byte range of every token
// so the assembler can splice replacements back into the original text. A
// single regex pass over the raw text gives us both the ranges and the
// captured fields.
//
// Known limitation: nested or unbalanced brackets inside the alt or title
// text can mis-tokenize. The grammar is deliberately left as-is; widening it
// would change which tokens match in existing notes.
//
// Rust concepts:
// - regex captures: Named pieces of each match plus their byte offsets
// - Iterators: captures_iter walks the matches left to right
// =============================================================================

use regex::Regex;
use std::path::Path;
use url::Url;

// One matched image token, immutable once extracted
//
// start/end are half-open byte offsets into the original text. Matches are
// produced in ascending start order and never overlap.
#[derive(Debug, Clone)]
pub struct MatchSpan {
    /// Where the token starts in the note text
    pub start: usize,
    /// One past where the token ends
    pub end: usize,
    /// The alt text between ![ and ]
    pub alt: String,
    /// The remote URL between ( and the title/closing paren
    pub url: String,
    /// The optional title, without its surrounding quotes
    pub title: String,
    /// The URL path's file name with its extension stripped
    pub base_name: String,
}

// Scans the note text and returns every remote-image token, in order
//
// Zero matches is a perfectly normal outcome - it just means there is
// nothing to download.
pub fn extract_image_links(text: &str) -> Vec<MatchSpan> {
    // ![alt](url "title") with the url restricted to absolute http/https.
    // The title quotes can be single or double and are optional.
    let pattern =
        Regex::new(r#"!\[([^\]]*)\]\(\s*(https?://[^\s)]+)\s*(?:['"])?([^)]*?)(?:['"])?\s*\)"#)
            .expect("image token pattern is valid");

    let mut spans = Vec::new();

    for caps in pattern.captures_iter(text) {
        let whole = caps.get(0).expect("capture group 0 always exists");
        let url = caps
            .get(2)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();

        spans.push(MatchSpan {
            start: whole.start(),
            end: whole.end(),
            alt: caps
                .get(1)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            title: caps
                .get(3)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            base_name: derive_base_name(&url),
            url,
        });
    }

    spans
}

// Derives the [name] template value from the URL's path
//
// "https://example.com/images/photo.png" -> "photo"
//
// A URL whose path has no file name (or that somehow fails to parse even
// though the regex accepted it) just yields an empty name; the template
// falls back to the other placeholders.
fn derive_base_name(url: &str) -> String {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => return String::new(),
    };

    Path::new(parsed.path())
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_image() {
        let text = "Intro ![a cat](https://example.com/cat.png) outro";
        let spans = extract_image_links(text);

        assert_eq!(spans.len(), 1);
        let span = &spans[0];
        assert_eq!(&text[span.start..span.end], "![a cat](https://example.com/cat.png)");
        assert_eq!(span.alt, "a cat");
        assert_eq!(span.url, "https://example.com/cat.png");
        assert_eq!(span.title, "");
        assert_eq!(span.base_name, "cat");
    }

    #[test]
    fn test_extract_image_with_title() {
        let text = r#"![logo](https://example.com/img/logo.svg "The Logo")"#;
        let spans = extract_image_links(text);

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].url, "https://example.com/img/logo.svg");
        assert_eq!(spans[0].title, "The Logo");
        assert_eq!(spans[0].base_name, "logo");
    }

    #[test]
    fn test_extract_multiple_in_document_order() {
        let text = "\
![first](http://a.test/one.png)
some text
![second](https://b.test/two.jpg)";
        let spans = extract_image_links(text);

        assert_eq!(spans.len(), 2);
        assert!(spans[0].start < spans[1].start);
        assert_eq!(spans[0].alt, "first");
        assert_eq!(spans[1].alt, "second");
    }

    #[test]
    fn test_skips_local_images() {
        // Already-localized links are not matched, which is what makes a
        // second run over a rewritten note a no-op.
        let text = "![pic](./assets/pic.png) and ![other](images/other.jpg)";
        assert!(extract_image_links(text).is_empty());
    }

    #[test]
    fn test_skips_plain_links() {
        let text = "[not an image](https://example.com/page)";
        assert!(extract_image_links(text).is_empty());
    }

    #[test]
    fn test_empty_alt_is_allowed() {
        let spans = extract_image_links("![](https://example.com/x.png)");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].alt, "");
    }

    #[test]
    fn test_no_matches_in_plain_text() {
        assert!(extract_image_links("just a paragraph of words").is_empty());
    }

    #[test]
    fn test_base_name_without_extension() {
        let spans = extract_image_links("![x](https://example.com/files/diagram)");
        assert_eq!(spans[0].base_name, "diagram");
    }

    #[test]
    fn test_base_name_for_bare_host() {
        let spans = extract_image_links("![x](https://example.com/)");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].base_name, "");
    }
}

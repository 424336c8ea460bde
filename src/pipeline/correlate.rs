// src/pipeline/correlate.rs
// =============================================================================
// This module turns a list of matched spans into a list of outcomes.
//
// Every span's download is launched at the same time - no concurrency cap,
// no queue. The tricky requirement is correlation: N concurrent downloads
// finishing in arbitrary order, with arbitrary failures, must map back onto
// the N ordered text spans without ever mixing two of them up.
//
// The whole answer is the array index. join_all returns its results in the
// order the futures went in, regardless of the order they finished in, so
// the Nth outcome always belongs to the Nth span. No shared state, no
// locks, no task handles to track.
//
// Rust concepts:
// - futures::future::join_all: Await many futures, keep the input order
// - Enums with data: An outcome is either Success{...} or Failure{...}
// =============================================================================

use futures::future;
use reqwest::Client;

use super::extract::MatchSpan;
use super::{fetch, hash, sniff};

// What happened to one span's download, write-once
//
// Failures carry only a reason string because by the time an outcome
// exists, nothing downstream will retry - the reason is for the log.
#[derive(Debug)]
pub enum FetchOutcome {
    Success {
        /// The downloaded file, still in memory
        bytes: Vec<u8>,
        /// Extension sniffed from the bytes ("" when unrecognized)
        ext: String,
        /// Content hash of the bytes
        hash: String,
    },
    Failure {
        reason: String,
    },
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }
}

// Resolves every span to an outcome, preserving order
//
// The returned Vec has exactly one entry per input span, in input order.
// One download failing never cancels or delays the others: each future
// resolves to its own Result, so join_all acts as a settle-all barrier.
pub async fn resolve_spans(client: &Client, spans: &[MatchSpan]) -> Vec<FetchOutcome> {
    // Stage 1: every download in flight at once.
    let downloads = future::join_all(
        spans
            .iter()
            .map(|span| fetch::fetch_binary(client, &span.url, fetch::DEFAULT_REDIRECT_BUDGET)),
    )
    .await;

    // Stage 2: classify and hash the survivors. Sniffing and hashing are
    // pure functions over bytes we already hold, so this is a plain ordered
    // map over the settled results.
    spans
        .iter()
        .zip(downloads)
        .map(|(span, result)| match result {
            Ok(bytes) => {
                let ext = sniff::sniff_extension(&bytes);
                let hash = hash::content_hash(&bytes);
                FetchOutcome::Success { bytes, ext, hash }
            }
            Err(e) => {
                tracing::warn!(url = %span.url, error = %e, "download failed");
                FetchOutcome::Failure {
                    reason: e.to_string(),
                }
            }
        })
        .collect()
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why not buffer_unordered here?
//    - buffer_unordered yields results as they finish, which throws away
//      the input order - exactly the thing this module must preserve.
//    - join_all keeps order and the batch is one note's worth of images,
//      so an unbounded launch is fine.
//
// 2. Why does Failure not keep the partial bytes?
//    - A failed download has nothing worth saving, and dropping the buffer
//      as early as possible keeps a large batch's memory flat.
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn span_for(url: String) -> MatchSpan {
        MatchSpan {
            start: 0,
            end: 0,
            alt: String::new(),
            title: String::new(),
            base_name: String::new(),
            url,
        }
    }

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n0000";

    #[tokio::test]
    async fn test_outcomes_align_with_spans_under_partial_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok1.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG.to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing.png"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ok2.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG.to_vec()))
            .mount(&server)
            .await;

        let spans = vec![
            span_for(format!("{}/ok1.png", server.uri())),
            span_for(format!("{}/missing.png", server.uri())),
            span_for(format!("{}/ok2.png", server.uri())),
        ];

        let client = fetch::download_client().unwrap();
        let outcomes = resolve_spans(&client, &spans).await;

        // Same length, same order: the middle span failed, its neighbors
        // did not.
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_success());
        assert!(!outcomes[1].is_success());
        assert!(outcomes[2].is_success());

        match &outcomes[1] {
            FetchOutcome::Failure { reason } => {
                assert_eq!(reason, "unexpected status code 404")
            }
            _ => panic!("expected a failure outcome"),
        }
    }

    #[tokio::test]
    async fn test_success_carries_bytes_ext_and_hash() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pic"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG.to_vec()))
            .mount(&server)
            .await;

        let spans = vec![span_for(format!("{}/pic", server.uri()))];
        let client = fetch::download_client().unwrap();
        let outcomes = resolve_spans(&client, &spans).await;

        match &outcomes[0] {
            FetchOutcome::Success { bytes, ext, hash } => {
                assert_eq!(bytes, PNG);
                assert_eq!(ext, ".png");
                assert_eq!(hash, &super::hash::content_hash(PNG));
            }
            _ => panic!("expected a success outcome"),
        }
    }

    #[tokio::test]
    async fn test_empty_span_list_resolves_to_nothing() {
        let client = fetch::download_client().unwrap();
        let outcomes = resolve_spans(&client, &[]).await;
        assert!(outcomes.is_empty());
    }
}

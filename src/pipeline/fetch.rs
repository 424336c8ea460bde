// src/pipeline/fetch.rs
// =============================================================================
// This module downloads one remote image into memory.
//
// Redirect handling is done by hand instead of letting reqwest follow them:
// the budget is part of the contract (a chain longer than the budget is a
// failure, not a silent truncation), and each hop's body must be dropped
// rather than buffered.
//
// Rust concepts:
// - thiserror: Gives every failure mode a typed variant with a display text
// - loop + budget counter: An async-friendly rewrite of bounded recursion
// =============================================================================

use reqwest::{Client, StatusCode};
use thiserror::Error;

/// How many redirect hops a single download may take
pub const DEFAULT_REDIRECT_BUDGET: u32 = 5;

// Everything that can go wrong while downloading
//
// The display strings are what ends up in a span's failure reason, so they
// are written for the diagnostic log.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The redirect chain was longer than the budget allowed
    #[error("redirect limit exceeded")]
    RedirectLimit,

    /// A terminal response that was neither 200 nor a followable redirect
    #[error("unexpected status code {0}")]
    UnexpectedStatus(u16),

    /// DNS, connection, or TLS trouble below the HTTP layer
    #[error("{0}")]
    Network(String),
}

// Builds the HTTP client the whole batch shares
//
// Automatic redirects are off because fetch_binary follows them manually.
// TODO: wire settings.download_timeout_ms into this builder; until then a
// request runs as long as the server keeps the connection open.
pub fn download_client() -> reqwest::Result<Client> {
    Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
}

// Downloads a URL into one contiguous byte buffer
//
// Behavior:
// - 200: the whole body is accumulated and returned
// - 301/302 with a Location header: follow it, spending one unit of budget;
//   the redirect's own body is dropped, never buffered
// - budget spent and another redirect arrives: RedirectLimit
// - any other status (including a redirect without a Location): UnexpectedStatus
// - anything below HTTP (DNS, reset, TLS): Network with the error text
pub async fn fetch_binary(
    client: &Client,
    url: &str,
    redirect_budget: u32,
) -> Result<Vec<u8>, FetchError> {
    let mut current = url.to_string();
    let mut budget = redirect_budget;

    loop {
        let response = client
            .get(&current)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();

        if status == StatusCode::MOVED_PERMANENTLY || status == StatusCode::FOUND {
            let location = response
                .headers()
                .get("location")
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);

            if let Some(location) = location {
                if budget == 0 {
                    return Err(FetchError::RedirectLimit);
                }
                // Dropping `response` here hangs up on the redirect body.
                current = resolve_location(&current, &location);
                budget -= 1;
                continue;
            }
            // A 301/302 without a Location falls through as a plain
            // unexpected status.
        }

        if status != StatusCode::OK {
            return Err(FetchError::UnexpectedStatus(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        return Ok(bytes.to_vec());
    }
}

// Resolves a Location header against the URL that sent it
//
// Servers may answer with a relative Location ("/img/new.png"); joining it
// onto the current URL handles both that and the absolute case.
fn resolve_location(base: &str, location: &str) -> String {
    match url::Url::parse(base).and_then(|base| base.join(location)) {
        Ok(joined) => joined.to_string(),
        Err(_) => location.to_string(),
    }
}

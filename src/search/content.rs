//! README retrieval and normalization for the search index.

use reqwest::Client;
use tracing::debug;

use crate::error::{Error, Result};

/// Upper bound on indexed content, in characters.
pub const MAX_CONTENT_CHARS: usize = 5000;

/// Bytes read from a README body. Covers [`MAX_CONTENT_CHARS`] characters of any width.
pub const MAX_README_BYTES: usize = MAX_CONTENT_CHARS * 4;

/// Fetches the leading part of a README as UTF-8 text. At most
/// [`MAX_README_BYTES`] of the body are read. Transport failures and
/// non-success statuses are errors.
pub async fn fetch_readme(client: &Client, url: &str) -> Result<String> {
    debug!(url = url, "fetching readme");

    let fetch_err = |source| Error::Fetch {
        url: url.to_string(),
        source,
    };

    let mut response = client
        .get(url)
        .send()
        .await
        .and_then(|resp| resp.error_for_status())
        .map_err(fetch_err)?;

    let mut body = Vec::new();
    while body.len() < MAX_README_BYTES {
        match response.chunk().await.map_err(fetch_err)? {
            Some(chunk) => body.extend_from_slice(&chunk),
            None => break,
        }
    }
    body.truncate(MAX_README_BYTES);

    Ok(decode_prefix(&body))
}

/// Decodes a byte prefix, dropping a character cut off at the end.
fn decode_prefix(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(e) if e.error_len().is_none() => {
            String::from_utf8_lossy(&bytes[..e.valid_up_to()]).into_owned()
        }
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Keeps the first [`MAX_CONTENT_CHARS`] characters of the raw content, then
/// drops every `\n` from that slice.
#[must_use]
pub fn index_content(raw: &str) -> String {
    raw.chars()
        .take(MAX_CONTENT_CHARS)
        .filter(|c| *c != '\n')
        .collect()
}

//! Favicon lookup for internet shortcuts.

use std::time::Duration;

use url::Url;

use crate::host::{Host, IconImage};
use crate::icon::decode;

/// Well-known icon paths tried against a site's origin, in order.
pub const DEFAULT_CANDIDATES: [&str; 5] = [
    "favicon.ico",
    "favicon.png",
    "apple-touch-icon.png",
    "favicon-32x32.png",
    "favicon-192x192.png",
];

/// Builds the candidate icon URLs for `target`.
///
/// Only `http` and `https` targets produce candidates; anything else
/// (including unparsable text) yields an empty list.
pub fn candidate_urls(target: &str, names: &[String]) -> Vec<String> {
    let Ok(url) = Url::parse(target.trim()) else {
        return Vec::new();
    };
    if !matches!(url.scheme(), "http" | "https") {
        return Vec::new();
    }
    let origin = url.origin().ascii_serialization();
    names
        .iter()
        .map(|name| format!("{origin}/{}", name.trim_start_matches('/')))
        .collect()
}

/// Tries each candidate URL for `target` and returns the first icon found.
///
/// Each request is bounded by `timeout`. Failures, timeouts, non-success
/// statuses, and empty bodies move on to the next candidate. A body that
/// decodes as an image is normalised to PNG; otherwise it is returned as is
/// with the response's content type (`image/x-icon` when absent).
pub async fn probe<H: Host + ?Sized>(
    host: &H,
    target: &str,
    names: &[String],
    timeout: Duration,
) -> Option<IconImage> {
    for url in candidate_urls(target, names) {
        let response = match tokio::time::timeout(timeout, host.fetch(&url, timeout)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::trace!("favicon fetch failed for {url}: {e}");
                continue;
            }
            Err(_) => {
                tracing::trace!("favicon fetch timed out for {url}");
                continue;
            }
        };
        if !response.is_success() || response.body.is_empty() {
            tracing::trace!("favicon {url} answered {}", response.status);
            continue;
        }
        if let Some(png) = decode::decode_to_png(&response.body) {
            return Some(IconImage::png(png));
        }
        let mime = response
            .content_type
            .unwrap_or_else(|| "image/x-icon".to_string());
        return Some(IconImage::new(response.body, mime));
    }
    None
}

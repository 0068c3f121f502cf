//! Low-level HTTP helpers shared by the source adapters.
//!
//! Maps transport failures and non-success statuses onto the source error
//! taxonomy in exactly one place: 429 becomes `RateLimited` (honouring
//! `Retry-After` when present), any other non-2xx status or network error
//! becomes `Unavailable`.

use strikecast_core::SourceId;

use crate::error::SourceError;

const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Fetch a plain-text resource body.
pub(crate) async fn fetch_text(
    client: &reqwest::Client,
    url: &str,
    source_id: SourceId,
) -> Result<String, SourceError> {
    let response = send(client, url, source_id).await?;
    response
        .text()
        .await
        .map_err(|e| transport_error(source_id, &e))
}

/// Perform a GET and parse the body as JSON.
pub(crate) async fn fetch_json(
    client: &reqwest::Client,
    url: &str,
    source_id: SourceId,
) -> Result<serde_json::Value, SourceError> {
    let response = send(client, url, source_id).await?;
    let body = response
        .text()
        .await
        .map_err(|e| transport_error(source_id, &e))?;
    serde_json::from_str(&body).map_err(|e| SourceError::MalformedPayload {
        source_id,
        reason: format!("response body is not valid JSON: {e}"),
    })
}

async fn send(
    client: &reqwest::Client,
    url: &str,
    source_id: SourceId,
) -> Result<reqwest::Response, SourceError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| transport_error(source_id, &e))?;

    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
        return Err(SourceError::RateLimited {
            source_id,
            retry_after_secs,
        });
    }

    if !status.is_success() {
        return Err(SourceError::Unavailable {
            source_id,
            reason: format!("unexpected HTTP status {} from {url}", status.as_u16()),
        });
    }

    Ok(response)
}

fn transport_error(source_id: SourceId, error: &reqwest::Error) -> SourceError {
    SourceError::Unavailable {
        source_id,
        reason: error.to_string(),
    }
}

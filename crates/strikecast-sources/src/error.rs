use strikecast_core::SourceId;
use thiserror::Error;

/// Failure of a single adapter fetch.
///
/// Every variant is recoverable at the resolver level: the next source in
/// the preference chain is tried. Nothing here escapes a refresh cycle's
/// per-location boundary.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network/transport failure, non-success HTTP status, or per-call timeout.
    #[error("{source_id}: upstream unavailable: {reason}")]
    Unavailable { source_id: SourceId, reason: String },

    /// Transport succeeded but the payload violates the expected shape.
    #[error("{source_id}: malformed payload: {reason}")]
    MalformedPayload { source_id: SourceId, reason: String },

    /// Explicit throttling signal (HTTP 429) from the provider.
    #[error("{source_id}: rate limited (retry after {retry_after_secs}s)")]
    RateLimited {
        source_id: SourceId,
        retry_after_secs: u64,
    },

    /// The adapter has no credentials configured and cannot be used.
    #[error("{source_id}: adapter disabled (no API key configured)")]
    Disabled { source_id: SourceId },
}

impl SourceError {
    #[must_use]
    pub fn source_id(&self) -> SourceId {
        match self {
            SourceError::Unavailable { source_id, .. }
            | SourceError::MalformedPayload { source_id, .. }
            | SourceError::RateLimited { source_id, .. }
            | SourceError::Disabled { source_id } => *source_id,
        }
    }
}

/// Every adapter in a location's fallback chain failed.
#[derive(Debug, Error)]
#[error("no source available for '{location_id}' after {} attempt(s)", failures.len())]
pub struct ResolveError {
    pub location_id: String,
    pub failures: Vec<SourceError>,
}

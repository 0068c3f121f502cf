//! Preference-ordered fallback resolution across source adapters.
//!
//! Each location gets a capability- and region-aware chain: the buoy feed
//! first for surf spots with the marine forecast API as global fallback,
//! the grid-forecast API first for US ski locations with the keyed global
//! provider behind it. Adapters are tried strictly in order and the first
//! valid reading wins; per-source failures are logged and accumulated but
//! never surfaced past a successful resolve.

use std::time::Duration;

use strikecast_core::{AppConfig, Domain, Location, Reading, SourceId};

use crate::error::{ResolveError, SourceError};
use crate::ndbc::NdbcAdapter;
use crate::nws::NwsAdapter;
use crate::openmeteo::OpenMeteoAdapter;
use crate::openweather::OpenWeatherAdapter;

pub struct SourceRegistry {
    ndbc: NdbcAdapter,
    nws: NwsAdapter,
    openmeteo: OpenMeteoAdapter,
    openweather: OpenWeatherAdapter,
}

impl SourceRegistry {
    #[must_use]
    pub fn new(
        ndbc: NdbcAdapter,
        nws: NwsAdapter,
        openmeteo: OpenMeteoAdapter,
        openweather: OpenWeatherAdapter,
    ) -> Self {
        Self {
            ndbc,
            nws,
            openmeteo,
            openweather,
        }
    }

    /// Build the registry from application configuration.
    ///
    /// The shared HTTP client carries the configured `User-Agent` and a
    /// per-request timeout, so any single upstream call that stalls is cut
    /// off and reported as `Unavailable` rather than dragging out the cycle.
    ///
    /// # Errors
    ///
    /// Returns the underlying `reqwest` error if the HTTP client cannot be
    /// constructed (e.g. invalid TLS configuration).
    pub fn from_config(config: &AppConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self::new(
            NdbcAdapter::new(client.clone(), config.ndbc_base_url.clone()),
            NwsAdapter::new(client.clone(), config.nws_base_url.clone()),
            OpenMeteoAdapter::new(client.clone(), config.openmeteo_base_url.clone()),
            OpenWeatherAdapter::new(
                client,
                config.openweather_base_url.clone(),
                config.openweather_api_key.clone(),
            ),
        ))
    }

    /// Preference chain for a location: primary domestic provider first,
    /// global provider second.
    #[must_use]
    pub fn preference_chain(location: &Location) -> Vec<SourceId> {
        match location.domain {
            Domain::Surf => vec![SourceId::Ndbc, SourceId::OpenMeteo],
            Domain::Ski if location.region.starts_with("us-") => {
                vec![SourceId::Nws, SourceId::OpenWeather]
            }
            Domain::Ski => vec![SourceId::OpenWeather],
        }
    }

    /// Resolve a location to a reading via its fallback chain.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] with the accumulated per-source failures
    /// when every adapter in the chain fails.
    pub async fn resolve(&self, location: &Location) -> Result<Reading, ResolveError> {
        let chain = Self::preference_chain(location);
        let mut failures = Vec::new();

        for source_id in chain {
            match self.fetch_from(source_id, location).await {
                Ok(reading) if reading.metrics.is_empty() => {
                    // Adapters should never hand back an empty reading; treat
                    // it as malformed and keep walking the chain.
                    failures.push(SourceError::MalformedPayload {
                        source_id,
                        reason: "reading carries no metrics".to_string(),
                    });
                }
                Ok(reading) => {
                    if !failures.is_empty() {
                        tracing::debug!(
                            location = %location.id,
                            source = %source_id,
                            failed_attempts = failures.len(),
                            "fallback source succeeded after earlier failures"
                        );
                    }
                    return Ok(reading);
                }
                Err(error) => {
                    tracing::debug!(
                        location = %location.id,
                        source = %source_id,
                        error = %error,
                        "source attempt failed; trying next in chain"
                    );
                    failures.push(error);
                }
            }
        }

        Err(ResolveError {
            location_id: location.id.clone(),
            failures,
        })
    }

    async fn fetch_from(
        &self,
        source_id: SourceId,
        location: &Location,
    ) -> Result<Reading, SourceError> {
        match source_id {
            SourceId::Ndbc => self.ndbc.fetch(location).await,
            SourceId::Nws => self.nws.fetch(location).await,
            SourceId::OpenMeteo => self.openmeteo.fetch(location).await,
            SourceId::OpenWeather => self.openweather.fetch(location).await,
        }
    }
}

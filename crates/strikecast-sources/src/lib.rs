//! Upstream source adapters and the fallback resolver.
//!
//! One adapter per provider wire format: the fixed-width buoy feed, the
//! two-step grid-forecast JSON API, the marine forecast JSON API, and the
//! keyed current/forecast JSON API. Each adapter fetches one provider's raw
//! payload and normalizes it into a [`strikecast_core::Reading`] in canonical
//! units. The [`SourceRegistry`] tries adapters in preference order per
//! location and masks individual provider outages.

mod error;
mod fetch;
mod ndbc;
mod nws;
mod openmeteo;
mod openweather;
mod registry;

pub use error::{ResolveError, SourceError};
pub use ndbc::NdbcAdapter;
pub use nws::NwsAdapter;
pub use openmeteo::OpenMeteoAdapter;
pub use openweather::OpenWeatherAdapter;
pub use registry::SourceRegistry;

//! Shared domain types and configuration for the condition engine.

mod app_config;
mod config;
mod locations;
mod readings;
mod strikes;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use locations::{load_locations, Domain, Location, LocationsFile};
pub use readings::{Metric, Reading, ScoredReading, SourceId};
pub use strikes::StrikeEvent;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read locations file {path}: {source}")]
    LocationsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse locations file: {0}")]
    LocationsFileParse(#[from] serde_yaml::Error),

    #[error("invalid locations file: {0}")]
    Validation(String),
}

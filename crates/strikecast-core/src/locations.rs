//! Reference location set loaded from `config/locations.yaml`.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Condition domain a location is scored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Surf,
    Ski,
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Domain::Surf => write!(f, "surf"),
            Domain::Ski => write!(f, "ski"),
        }
    }
}

impl std::str::FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "surf" => Ok(Domain::Surf),
            "ski" => Ok(Domain::Ski),
            other => Err(format!("unknown domain '{other}'; expected surf or ski")),
        }
    }
}

/// Immutable reference entity describing one monitored spot.
///
/// For surf locations the `id` doubles as the upstream buoy station id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub domain: Domain,
    pub region: String,
}

#[derive(Debug, Deserialize)]
pub struct LocationsFile {
    pub locations: Vec<Location>,
}

/// Load and validate the location set from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_locations(path: &Path) -> Result<LocationsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LocationsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let locations_file: LocationsFile =
        serde_yaml::from_str(&content).map_err(ConfigError::LocationsFileParse)?;

    validate_locations(&locations_file)?;

    Ok(locations_file)
}

fn validate_locations(file: &LocationsFile) -> Result<(), ConfigError> {
    if file.locations.is_empty() {
        return Err(ConfigError::Validation(
            "location set must not be empty".to_string(),
        ));
    }

    let mut seen_ids = HashSet::new();

    for location in &file.locations {
        if location.id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "location id must be non-empty".to_string(),
            ));
        }
        if location.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "location '{}' has an empty name",
                location.id
            )));
        }
        if !location.latitude.is_finite() || !(-90.0..=90.0).contains(&location.latitude) {
            return Err(ConfigError::Validation(format!(
                "location '{}' has invalid latitude {}",
                location.id, location.latitude
            )));
        }
        if !location.longitude.is_finite() || !(-180.0..=180.0).contains(&location.longitude) {
            return Err(ConfigError::Validation(format!(
                "location '{}' has invalid longitude {}",
                location.id, location.longitude
            )));
        }

        let lower_id = location.id.to_lowercase();
        if !seen_ids.insert(lower_id) {
            return Err(ConfigError::Validation(format!(
                "duplicate location id: '{}'",
                location.id
            )));
        }
    }

    Ok(())
}

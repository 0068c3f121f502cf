use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if any env var holds an invalid value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files; useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if any env var holds an invalid value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup, with no `set_var`/`remove_var` needed.
///
/// Every variable has a default; validation failures are fatal at startup so a
/// misconfigured process never silently runs a no-op scheduler.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u8 = |var: &str, default: &str| -> Result<u8, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u8>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let bind_addr = parse_addr("STRIKECAST_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("STRIKECAST_LOG_LEVEL", "info");
    let locations_path = PathBuf::from(or_default(
        "STRIKECAST_LOCATIONS_PATH",
        "./config/locations.yaml",
    ));
    let events_path = PathBuf::from(or_default(
        "STRIKECAST_EVENTS_PATH",
        "./data/strike_events.jsonl",
    ));

    let refresh_interval_secs = parse_u64("STRIKECAST_REFRESH_INTERVAL_SECS", "900")?;
    if refresh_interval_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "STRIKECAST_REFRESH_INTERVAL_SECS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    let fetch_timeout_secs = parse_u64("STRIKECAST_FETCH_TIMEOUT_SECS", "10")?;
    let cycle_deadline_secs = parse_u64("STRIKECAST_CYCLE_DEADLINE_SECS", "120")?;
    let max_concurrent_locations = parse_usize("STRIKECAST_MAX_CONCURRENT_LOCATIONS", "4")?;

    let strike_threshold = parse_u8("STRIKECAST_STRIKE_THRESHOLD", "70")?;
    if strike_threshold > 100 {
        return Err(ConfigError::InvalidEnvVar {
            var: "STRIKECAST_STRIKE_THRESHOLD".to_string(),
            reason: format!("{strike_threshold} is out of range; scores run 0-100"),
        });
    }

    let strike_silence_secs = parse_u64("STRIKECAST_STRIKE_SILENCE_SECS", "10800")?;

    let user_agent = or_default(
        "STRIKECAST_USER_AGENT",
        "strikecast/0.1 (condition-engine)",
    );

    let ndbc_base_url = or_default("STRIKECAST_NDBC_BASE_URL", "https://www.ndbc.noaa.gov");
    let nws_base_url = or_default("STRIKECAST_NWS_BASE_URL", "https://api.weather.gov");
    let openmeteo_base_url = or_default(
        "STRIKECAST_OPENMETEO_BASE_URL",
        "https://marine-api.open-meteo.com",
    );
    let openweather_base_url = or_default(
        "STRIKECAST_OPENWEATHER_BASE_URL",
        "https://api.openweathermap.org",
    );
    let openweather_api_key = lookup("OPENWEATHER_API_KEY").ok().filter(|k| !k.is_empty());

    Ok(AppConfig {
        bind_addr,
        log_level,
        locations_path,
        events_path,
        refresh_interval_secs,
        fetch_timeout_secs,
        cycle_deadline_secs,
        max_concurrent_locations,
        strike_threshold,
        strike_silence_secs,
        user_agent,
        ndbc_base_url,
        nws_base_url,
        openmeteo_base_url,
        openweather_base_url,
        openweather_api_key,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn build_app_config_succeeds_with_empty_env() {
        let map: HashMap<&str, &str> = HashMap::new();
        let result = build_app_config(lookup_from_map(&map));
        assert!(result.is_ok(), "expected Ok, got: {result:?}");
        let cfg = result.unwrap();
        assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:3000");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.refresh_interval_secs, 900);
        assert_eq!(cfg.fetch_timeout_secs, 10);
        assert_eq!(cfg.cycle_deadline_secs, 120);
        assert_eq!(cfg.max_concurrent_locations, 4);
        assert_eq!(cfg.strike_threshold, 70);
        assert_eq!(cfg.strike_silence_secs, 10800);
        assert!(cfg.openweather_api_key.is_none());
    }

    #[test]
    fn build_app_config_fails_with_invalid_bind_addr() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("STRIKECAST_BIND_ADDR", "not-a-socket-addr");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "STRIKECAST_BIND_ADDR"),
            "expected InvalidEnvVar(STRIKECAST_BIND_ADDR), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_rejects_zero_refresh_interval() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("STRIKECAST_REFRESH_INTERVAL_SECS", "0");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "STRIKECAST_REFRESH_INTERVAL_SECS"),
            "expected InvalidEnvVar(STRIKECAST_REFRESH_INTERVAL_SECS), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_rejects_threshold_above_100() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("STRIKECAST_STRIKE_THRESHOLD", "150");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "STRIKECAST_STRIKE_THRESHOLD"),
            "expected InvalidEnvVar(STRIKECAST_STRIKE_THRESHOLD), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_rejects_non_numeric_threshold() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("STRIKECAST_STRIKE_THRESHOLD", "high");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "STRIKECAST_STRIKE_THRESHOLD"),
            "expected InvalidEnvVar(STRIKECAST_STRIKE_THRESHOLD), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_overrides_refresh_interval() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("STRIKECAST_REFRESH_INTERVAL_SECS", "60");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.refresh_interval_secs, 60);
    }

    #[test]
    fn build_app_config_reads_openweather_key() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("OPENWEATHER_API_KEY", "abc123");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.openweather_api_key.as_deref(), Some("abc123"));
    }

    #[test]
    fn build_app_config_treats_empty_openweather_key_as_absent() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("OPENWEATHER_API_KEY", "");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert!(cfg.openweather_api_key.is_none());
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let mut map: HashMap<&str, &str> = HashMap::new();
        map.insert("OPENWEATHER_API_KEY", "super-secret");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        let rendered = format!("{cfg:?}");
        assert!(
            !rendered.contains("super-secret"),
            "Debug output leaked the API key: {rendered}"
        );
        assert!(rendered.contains("[redacted]"));
    }
}

use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub locations_path: PathBuf,
    pub events_path: PathBuf,
    pub refresh_interval_secs: u64,
    pub fetch_timeout_secs: u64,
    pub cycle_deadline_secs: u64,
    pub max_concurrent_locations: usize,
    pub strike_threshold: u8,
    pub strike_silence_secs: u64,
    pub user_agent: String,
    pub ndbc_base_url: String,
    pub nws_base_url: String,
    pub openmeteo_base_url: String,
    pub openweather_base_url: String,
    pub openweather_api_key: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("locations_path", &self.locations_path)
            .field("events_path", &self.events_path)
            .field("refresh_interval_secs", &self.refresh_interval_secs)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("cycle_deadline_secs", &self.cycle_deadline_secs)
            .field("max_concurrent_locations", &self.max_concurrent_locations)
            .field("strike_threshold", &self.strike_threshold)
            .field("strike_silence_secs", &self.strike_silence_secs)
            .field("user_agent", &self.user_agent)
            .field("ndbc_base_url", &self.ndbc_base_url)
            .field("nws_base_url", &self.nws_base_url)
            .field("openmeteo_base_url", &self.openmeteo_base_url)
            .field("openweather_base_url", &self.openweather_base_url)
            .field(
                "openweather_api_key",
                &self.openweather_api_key.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

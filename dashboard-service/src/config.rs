use common::tracing::LogFormat;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub log_format: LogFormat,
    pub snapshot_path: PathBuf,
    pub countries_api_url: String,
    pub currency_api_url: String,
    pub geocoding_api_url: String,
    pub weather_api_url: String,
    pub http_timeout_seconds: u64,
    pub http_max_retries: u32,
    pub max_concurrent_deliveries: usize,
    pub database_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            log_format: env::var("LOG_FORMAT")
                .map(|f| LogFormat::parse(&f))
                .unwrap_or(LogFormat::Pretty),
            snapshot_path: env::var("SNAPSHOT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("stored-data/cache.json")),
            countries_api_url: env::var("COUNTRIES_API_URL")
                .unwrap_or_else(|_| "http://129.241.150.113:8080/v3.1".to_string()),
            currency_api_url: env::var("CURRENCY_API_URL")
                .unwrap_or_else(|_| "http://129.241.150.113:9090/currency".to_string()),
            geocoding_api_url: env::var("GEOCODING_API_URL")
                .unwrap_or_else(|_| "https://geocoding-api.open-meteo.com/v1/search".to_string()),
            weather_api_url: env::var("WEATHER_API_URL")
                .unwrap_or_else(|_| "https://api.open-meteo.com/v1/forecast".to_string()),
            http_timeout_seconds: env::var("HTTP_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            http_max_retries: env::var("HTTP_MAX_RETRIES")
                .ok()
                .and_then(|r| r.parse().ok())
                .unwrap_or(2),
            max_concurrent_deliveries: env::var("MAX_CONCURRENT_DELIVERIES")
                .ok()
                .and_then(|m| m.parse().ok())
                .filter(|m| *m > 0)
                .unwrap_or(32),
            database_url: env::var("DATABASE_URL").ok().filter(|u| !u.trim().is_empty()),
        }
    }
}

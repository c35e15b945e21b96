use common::errors::AppError;
use common::http_client::HttpClient;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// Value reported when the forecast has no hourly samples
const MISSING_SAMPLE: f64 = -99.0;

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<GeocodingResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    hourly: HourlyForecast,
}

#[derive(Debug, Deserialize)]
struct HourlyForecast {
    #[serde(default)]
    temperature_2m: Vec<f64>,
    #[serde(default)]
    precipitation: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherReading {
    pub temperature: f64,
    pub precipitation: f64,
}

/// Open-Meteo geocoding + forecast client
pub struct OpenMeteoClient {
    http_client: Arc<HttpClient>,
    geocoding_url: String,
    forecast_url: String,
}

impl OpenMeteoClient {
    pub fn new(http_client: Arc<HttpClient>, geocoding_url: String, forecast_url: String) -> Self {
        Self {
            http_client,
            geocoding_url,
            forecast_url,
        }
    }

    /// Current-hour temperature and precipitation for a place name
    #[instrument(skip(self), fields(place = %place))]
    pub async fn get_weather(&self, place: &str) -> Result<WeatherReading, AppError> {
        if place.trim().is_empty() {
            return Err(AppError::validation("Place name is empty"));
        }

        let geo_url = format!(
            "{}?name={}&count=1",
            self.geocoding_url,
            urlencoding::encode(place.trim())
        );
        let geo: GeocodingResponse = self.http_client.get_json(&geo_url).await?;
        let location = geo
            .results
            .into_iter()
            .next()
            .ok_or_else(|| AppError::http(404, format!("No geocoding results for '{}'", place)))?;

        info!(
            place = %place,
            latitude = location.latitude,
            longitude = location.longitude,
            "Fetching weather from API"
        );

        let url = format!(
            "{}?latitude={}&longitude={}&hourly=temperature_2m&hourly=precipitation",
            self.forecast_url, location.latitude, location.longitude
        );
        let forecast: ForecastResponse = self.http_client.get_json(&url).await?;

        Ok(WeatherReading {
            temperature: forecast
                .hourly
                .temperature_2m
                .first()
                .copied()
                .unwrap_or(MISSING_SAMPLE),
            precipitation: forecast
                .hourly
                .precipitation
                .first()
                .copied()
                .unwrap_or(MISSING_SAMPLE),
        })
    }

    pub fn status_url(&self) -> String {
        format!(
            "{}?latitude=0&longitude=0&hourly=temperature_2m",
            self.forecast_url
        )
    }
}

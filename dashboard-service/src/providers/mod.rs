//! Clients for the external country, currency and weather providers.

pub mod countries;
pub mod currency;
pub mod weather;

use common::http_client::HttpClient;
use std::sync::Arc;

use crate::config::Config;
use countries::CountriesClient;
use currency::CurrencyClient;
use weather::OpenMeteoClient;

pub struct Providers {
    pub countries: CountriesClient,
    pub currency: CurrencyClient,
    pub weather: OpenMeteoClient,
    http_client: Arc<HttpClient>,
}

impl Providers {
    pub fn new(config: &Config, http_client: Arc<HttpClient>) -> Self {
        Self {
            countries: CountriesClient::new(http_client.clone(), config.countries_api_url.clone()),
            currency: CurrencyClient::new(http_client.clone(), config.currency_api_url.clone()),
            weather: OpenMeteoClient::new(
                http_client.clone(),
                config.geocoding_api_url.clone(),
                config.weather_api_url.clone(),
            ),
            http_client,
        }
    }

    /// Health codes for (countries, weather, currency), probed concurrently
    pub async fn probe(&self) -> (u16, u16, u16) {
        let countries = self.countries.status_url();
        let weather = self.weather.status_url();
        let currency = self.currency.status_url();

        tokio::join!(
            self.http_client.probe(&countries),
            self.http_client.probe(&weather),
            self.http_client.probe(&currency),
        )
    }
}

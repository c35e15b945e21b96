use common::errors::AppError;
use common::models::{
    Coordinates, CurrencyRates, DashboardFeatures, DashboardView, LifecycleEvent, timestamp_now,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::providers::Providers;
use crate::providers::countries::CountryDetails;
use crate::providers::weather::WeatherReading;
use crate::store::DashboardStore;

const UNKNOWN_CAPITAL: &str = "Unknown";

/// Builds dashboard views from stored configs and live provider lookups
pub struct DashboardComposer {
    store: Arc<DashboardStore>,
    providers: Arc<Providers>,
}

impl DashboardComposer {
    pub fn new(store: Arc<DashboardStore>, providers: Arc<Providers>) -> Self {
        Self { store, providers }
    }

    /// Upstream failures degrade to placeholder values; only an unknown id fails.
    ///
    /// An INVOKE notification is scheduled once the view is built and is not awaited.
    #[instrument(skip(self))]
    pub async fn compose(&self, id: &str) -> Result<DashboardView, AppError> {
        let config = self.store.get_registration(id).await?;
        let flags = &config.features;

        let lookup_key = if config.country.trim().is_empty() {
            config.iso_code.clone()
        } else {
            config.country.clone()
        };
        let wants_weather = flags.temperature || flags.precipitation;

        let (country, rates, weather) = tokio::join!(
            self.country_details(&lookup_key),
            self.currency_rates(&config.currency),
            async {
                if wants_weather {
                    self.weather(&lookup_key).await
                } else {
                    None
                }
            },
        );

        let target_currencies = (!flags.target_currencies.is_empty()).then(|| {
            flags
                .target_currencies
                .iter()
                .map(|code| {
                    let rate = rates
                        .get(code)
                        .or_else(|| rates.get(&code.to_uppercase()))
                        .copied()
                        .unwrap_or(1.0);
                    (code.clone(), rate)
                })
                .collect::<BTreeMap<_, _>>()
        });
        let weather = weather.unwrap_or(WeatherReading {
            temperature: 0.0,
            precipitation: 0.0,
        });

        let view = DashboardView {
            country: config.country.clone(),
            iso_code: config.iso_code.clone(),
            features: DashboardFeatures {
                temperature: flags.temperature.then_some(weather.temperature),
                precipitation: flags.precipitation.then_some(weather.precipitation),
                capital: flags.capital.then(|| country.capital.clone()),
                coordinates: flags.coordinates.then_some(Coordinates {
                    latitude: country.latitude,
                    longitude: country.longitude,
                }),
                population: flags.population.then_some(country.population),
                area: flags.area.then_some(country.area),
                target_currencies,
            },
            last_retrieval: timestamp_now(),
        };

        self.store
            .notifier()
            .notify_in_background(LifecycleEvent::Invoke, config.iso_code);

        Ok(view)
    }

    async fn country_details(&self, key: &str) -> CountryDetails {
        match self.providers.countries.lookup(key).await {
            Ok(details) => details,
            Err(e) => {
                warn!(key = %key, error = %e, "Country lookup failed, using placeholders");
                CountryDetails {
                    capital: UNKNOWN_CAPITAL.to_string(),
                    ..Default::default()
                }
            }
        }
    }

    async fn currency_rates(&self, base: &str) -> CurrencyRates {
        if base.trim().is_empty() {
            debug!("No base currency configured, skipping rate lookup");
            return CurrencyRates::new();
        }

        self.providers
            .currency
            .rates(base)
            .await
            .unwrap_or_else(|e| {
                warn!(base = %base, error = %e, "Currency lookup failed, using empty rate set");
                CurrencyRates::new()
            })
    }

    async fn weather(&self, place: &str) -> Option<WeatherReading> {
        self.providers
            .weather
            .get_weather(place)
            .await
            .inspect_err(|e| warn!(place = %place, error = %e, "Weather lookup failed"))
            .ok()
    }
}

use common::errors::AppError;
use common::models::{
    DashboardConfig, DashboardConfigUpdate, Features, FeaturesUpdate, LifecycleEvent,
    timestamp_now,
};
use tracing::{info, instrument, warn};

use super::DashboardStore;
use crate::providers::countries::CountryDetails;

/// Country identity fields to overwrite on a stored config
#[derive(Debug, Default, PartialEq)]
struct IdentityPatch {
    country: Option<String>,
    iso_code: Option<String>,
    currency: Option<String>,
}

impl IdentityPatch {
    fn resolved(details: &CountryDetails) -> Self {
        let has_name = !details.name.is_empty();
        Self {
            country: has_name.then(|| details.name.clone()),
            iso_code: has_name.then(|| details.iso_code.to_uppercase()),
            currency: (!details.currency_code.is_empty())
                .then(|| details.currency_code.to_uppercase()),
        }
    }

    fn apply(self, config: &mut DashboardConfig) {
        if let Some(country) = self.country {
            config.country = country;
        }
        if let Some(iso_code) = self.iso_code {
            config.iso_code = iso_code;
        }
        if let Some(currency) = self.currency {
            config.currency = currency;
        }
    }
}

fn apply_features(features: &mut Features, update: FeaturesUpdate) {
    if let Some(temperature) = update.temperature {
        features.temperature = temperature;
    }
    if let Some(precipitation) = update.precipitation {
        features.precipitation = precipitation;
    }
    if let Some(capital) = update.capital {
        features.capital = capital;
    }
    if let Some(coordinates) = update.coordinates {
        features.coordinates = coordinates;
    }
    if let Some(population) = update.population {
        features.population = population;
    }
    if let Some(area) = update.area {
        features.area = area;
    }
    if let Some(target_currencies) = update.target_currencies {
        features.target_currencies = target_currencies;
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

impl DashboardStore {
    /// Registers a new configuration, resolving country, ISO code and currency.
    ///
    /// A non-empty `country` wins over `isoCode` when both are supplied. Lookup
    /// failures keep the supplied values.
    #[instrument(skip(self, draft), fields(country = %draft.country, iso_code = %draft.iso_code))]
    pub async fn create_registration(&self, draft: DashboardConfig) -> DashboardConfig {
        let mut config = draft;
        config.currency = config.currency.trim().to_uppercase();

        let query = non_blank(&config.country)
            .or_else(|| non_blank(&config.iso_code))
            .map(str::to_string);

        if let Some(query) = query {
            match self.providers.countries.lookup(&query).await {
                Ok(details) => IdentityPatch::resolved(&details).apply(&mut config),
                Err(e) => warn!(query = %query, error = %e, "Country lookup failed, keeping supplied values"),
            }
        }

        config.id = self.ids.next();
        config.last_change = timestamp_now();

        {
            let mut cache = self.cache.write().await;
            cache.configs.insert(config.id.clone(), config.clone());
        }
        info!(id = %config.id, country = %config.country, "Registration created");

        self.persist().await;
        self.notifier
            .notify(LifecycleEvent::Register, &config.iso_code)
            .await;

        config
    }

    pub async fn get_registration(&self, id: &str) -> Result<DashboardConfig, AppError> {
        let cache = self.cache.read().await;
        cache
            .configs
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Configuration {} not found", id)))
    }

    pub async fn list_registrations(&self) -> Vec<DashboardConfig> {
        let cache = self.cache.read().await;
        cache.configs.values().cloned().collect()
    }

    /// Applies a partial update. Absent fields are left untouched.
    #[instrument(skip(self, update))]
    pub async fn update_registration(
        &self,
        id: &str,
        update: DashboardConfigUpdate,
    ) -> Result<DashboardConfig, AppError> {
        if !self.cache.read().await.configs.contains_key(id) {
            return Err(AppError::not_found(format!("Configuration {} not found", id)));
        }

        // Lookups run before the write lock is taken
        let mut identity = self.resolve_update(&update).await;
        if let Some(currency) = update.currency.as_deref().and_then(non_blank) {
            identity.currency = Some(currency.to_uppercase());
        }

        let updated = {
            let mut cache = self.cache.write().await;
            let existing = cache
                .configs
                .get_mut(id)
                .ok_or_else(|| AppError::not_found(format!("Configuration {} not found", id)))?;

            identity.apply(existing);
            if let Some(features) = update.features {
                apply_features(&mut existing.features, features);
            }
            existing.last_change = timestamp_now();
            existing.clone()
        };
        info!(id = %id, country = %updated.country, iso_code = %updated.iso_code, "Registration updated");

        self.persist().await;
        self.notifier
            .notify(LifecycleEvent::Change, &updated.iso_code)
            .await;

        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_registration(&self, id: &str) -> Result<DashboardConfig, AppError> {
        let removed = {
            let mut cache = self.cache.write().await;
            cache.configs.remove(id)
        }
        .ok_or_else(|| AppError::not_found(format!("Configuration {} not found", id)))?;
        info!(id = %id, "Registration deleted");

        self.persist().await;
        self.notifier
            .notify(LifecycleEvent::Delete, &removed.iso_code)
            .await;

        Ok(removed)
    }

    /// A present `country` takes priority over `isoCode`; an empty one clears
    /// the field without a lookup.
    async fn resolve_update(&self, update: &DashboardConfigUpdate) -> IdentityPatch {
        if let Some(country) = &update.country {
            let Some(query) = non_blank(country) else {
                return IdentityPatch {
                    country: Some(String::new()),
                    ..Default::default()
                };
            };

            return match self.providers.countries.lookup(query).await {
                Ok(details) => IdentityPatch::resolved(&details),
                Err(e) => {
                    warn!(country = %country, error = %e, "Country lookup failed, storing supplied value");
                    IdentityPatch {
                        country: Some(country.clone()),
                        ..Default::default()
                    }
                }
            };
        }

        if let Some(iso_code) = &update.iso_code
            && let Some(query) = non_blank(iso_code)
        {
            return match self.providers.countries.lookup(query).await {
                Ok(details) => IdentityPatch::resolved(&details),
                Err(e) => {
                    warn!(iso_code = %iso_code, error = %e, "ISO lookup failed, storing supplied value");
                    IdentityPatch {
                        iso_code: Some(iso_code.clone()),
                        ..Default::default()
                    }
                }
            };
        }

        IdentityPatch::default()
    }
}

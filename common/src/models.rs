use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Fixed textual timestamp layout used for `lastChange`, `lastRetrieval` and webhook payloads
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d %H:%M";

/// Current local time in the `YYYYMMDD HH:MM` layout
pub fn timestamp_now() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Treats an explicit JSON `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Feature flags selecting which computed fields appear in a dashboard view
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct Features {
    #[serde(deserialize_with = "null_as_default")]
    pub temperature: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub precipitation: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub capital: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub coordinates: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub population: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub area: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub target_currencies: Vec<String>,
}

/// A registered per-country monitoring configuration
///
/// Also accepted as the (partial) registration body; `id` and `lastChange`
/// are always assigned by the server.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct DashboardConfig {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub country: String,
    #[serde(deserialize_with = "null_as_default")]
    pub iso_code: String,
    #[serde(deserialize_with = "null_as_default")]
    pub currency: String,
    #[serde(deserialize_with = "null_as_default")]
    pub features: Features,
    #[serde(deserialize_with = "null_as_default")]
    pub last_change: String,
}

/// Partial feature update. `None` leaves the stored flag untouched.
#[derive(Debug, Serialize, Deserialize, Clone, Default, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct FeaturesUpdate {
    pub temperature: Option<bool>,
    pub precipitation: Option<bool>,
    pub capital: Option<bool>,
    pub coordinates: Option<bool>,
    pub population: Option<bool>,
    pub area: Option<bool>,
    pub target_currencies: Option<Vec<String>>,
}

/// Partial registration update
///
/// Absent fields are `None`. A present but empty `country` clears the stored
/// country, which is why presence is tracked separately from emptiness.
#[derive(Debug, Serialize, Deserialize, Clone, Default, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct DashboardConfigUpdate {
    pub country: Option<String>,
    pub iso_code: Option<String>,
    pub currency: Option<String>,
    pub features: Option<FeaturesUpdate>,
}

/// Configuration lifecycle events a webhook can subscribe to
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum LifecycleEvent {
    Register,
    Change,
    Delete,
    Invoke,
}

impl LifecycleEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEvent::Register => "REGISTER",
            LifecycleEvent::Change => "CHANGE",
            LifecycleEvent::Delete => "DELETE",
            LifecycleEvent::Invoke => "INVOKE",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "REGISTER" => Ok(LifecycleEvent::Register),
            "CHANGE" => Ok(LifecycleEvent::Change),
            "DELETE" => Ok(LifecycleEvent::Delete),
            "INVOKE" => Ok(LifecycleEvent::Invoke),
            other => Err(format!("unknown event '{}'", other)),
        }
    }
}

/// A subscription to configuration lifecycle events
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, ToSchema)]
#[serde(default)]
pub struct Webhook {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    /// Empty means every country
    #[serde(deserialize_with = "null_as_default")]
    pub country: String,
    #[serde(deserialize_with = "null_as_default")]
    pub event: String,
}

impl Webhook {
    /// Case-insensitive match on event, with an empty country acting as a wildcard
    pub fn matches(&self, event: LifecycleEvent, country: &str) -> bool {
        self.event.eq_ignore_ascii_case(event.as_str())
            && (self.country.trim().is_empty() || self.country.trim().eq_ignore_ascii_case(country))
    }
}

/// Body POSTed to a webhook target
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct WebhookPayload {
    pub id: String,
    pub country: String,
    pub event: String,
    pub time: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default, ToSchema)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Feature values of a dashboard view. Disabled features are omitted entirely.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardFeatures {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precipitation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capital: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub population: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_currencies: Option<BTreeMap<String, f64>>,
}

/// Computed dashboard view for one configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub country: String,
    pub iso_code: String,
    pub features: DashboardFeatures,
    pub last_retrieval: String,
}

/// Liveness summary for `/status`
#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct StatusResponse {
    pub countries_api: u16,
    pub meteo_api: u16,
    pub currency_api: u16,
    pub notification_db: u16,
    pub webhooks: usize,
    pub version: String,
    pub uptime: u64,
}

/// Exchange rates keyed by currency code
pub type CurrencyRates = HashMap<String, f64>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn update_distinguishes_absent_from_empty() {
        let update: DashboardConfigUpdate =
            serde_json::from_value(json!({ "country": "" })).unwrap();
        assert_eq!(update.country.as_deref(), Some(""));
        assert!(update.iso_code.is_none());
        assert!(update.features.is_none());
    }

    #[test]
    fn partial_registration_body_fills_defaults() {
        let config: DashboardConfig = serde_json::from_value(json!({
            "isoCode": "no",
            "features": { "capital": true }
        }))
        .unwrap();
        assert_eq!(config.iso_code, "no");
        assert!(config.features.capital);
        assert!(config.features.target_currencies.is_empty());
        assert!(config.id.is_empty());
    }

    #[test]
    fn webhook_matching_is_case_insensitive() {
        let global = Webhook {
            id: "1".into(),
            url: "http://x".into(),
            country: "".into(),
            event: "delete".into(),
        };
        let norway_only = Webhook {
            country: "no".into(),
            event: "INVOKE".into(),
            ..global.clone()
        };

        assert!(global.matches(LifecycleEvent::Delete, "SE"));
        assert!(!global.matches(LifecycleEvent::Change, "SE"));
        assert!(norway_only.matches(LifecycleEvent::Invoke, "NO"));
        assert!(!norway_only.matches(LifecycleEvent::Invoke, "SE"));
    }

    #[test]
    fn null_fields_decode_as_defaults() {
        let config: DashboardConfig = serde_json::from_value(json!({
            "isoCode": "no",
            "currency": null,
            "features": { "capital": null, "targetCurrencies": null }
        }))
        .unwrap();
        assert_eq!(config.iso_code, "no");
        assert_eq!(config.currency, "");
        assert!(!config.features.capital);
        assert!(config.features.target_currencies.is_empty());

        let no_features: DashboardConfig =
            serde_json::from_value(json!({ "country": "Norway", "features": null })).unwrap();
        assert_eq!(no_features.features, Features::default());

        let webhook: Webhook = serde_json::from_value(json!({
            "url": "http://localhost/hook",
            "country": null,
            "event": "DELETE"
        }))
        .unwrap();
        assert_eq!(webhook.country, "");
    }

    #[test]
    fn padded_webhook_country_still_matches() {
        let restored = Webhook {
            id: "1".into(),
            url: "http://x".into(),
            country: " no ".into(),
            event: "CHANGE".into(),
        };

        assert!(restored.matches(LifecycleEvent::Change, "NO"));
        assert!(!restored.matches(LifecycleEvent::Change, "SE"));
    }

    #[test]
    fn disabled_features_are_omitted() {
        let view = DashboardView {
            country: "Norway".into(),
            iso_code: "NO".into(),
            features: DashboardFeatures {
                capital: Some("Oslo".into()),
                ..Default::default()
            },
            last_retrieval: "20240101 12:00".into(),
        };
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["features"], json!({ "capital": "Oslo" }));
        assert_eq!(value["isoCode"], "NO");
    }

    #[test]
    fn event_parsing_accepts_any_case() {
        assert_eq!("invoke".parse::<LifecycleEvent>(), Ok(LifecycleEvent::Invoke));
        assert_eq!(" Change ".parse::<LifecycleEvent>(), Ok(LifecycleEvent::Change));
        assert!("UPDATE".parse::<LifecycleEvent>().is_err());
    }

    #[test]
    fn timestamp_has_fixed_layout() {
        let ts = timestamp_now();
        assert_eq!(ts.len(), 14);
        assert_eq!(&ts[8..9], " ");
        assert_eq!(&ts[11..12], ":");
    }
}

use common::errors::AppError;
use common::http_client::HttpClient;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Debug, Deserialize)]
struct RestCountry {
    name: CountryName,
    #[serde(default)]
    capital: Vec<String>,
    #[serde(default)]
    cca2: String,
    #[serde(default)]
    currencies: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    latlng: Vec<f64>,
    #[serde(default)]
    population: f64,
    #[serde(default)]
    area: f64,
}

#[derive(Debug, Deserialize)]
struct CountryName {
    common: String,
}

/// Country metadata as consumed by registration and dashboard composition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountryDetails {
    pub name: String,
    pub capital: String,
    pub latitude: f64,
    pub longitude: f64,
    pub iso_code: String,
    pub currency_code: String,
    pub population: u64,
    pub area: f64,
}

impl From<RestCountry> for CountryDetails {
    fn from(country: RestCountry) -> Self {
        let (latitude, longitude) = match country.latlng.as_slice() {
            [lat, lon, ..] => (*lat, *lon),
            _ => (0.0, 0.0),
        };

        Self {
            name: country.name.common,
            capital: country.capital.into_iter().next().unwrap_or_default(),
            latitude,
            longitude,
            iso_code: country.cca2,
            currency_code: country.currencies.into_keys().next().unwrap_or_default(),
            population: country.population.max(0.0) as u64,
            area: country.area,
        }
    }
}

/// Client for a REST-countries style API
pub struct CountriesClient {
    http_client: Arc<HttpClient>,
    base_url: String,
}

impl CountriesClient {
    pub fn new(http_client: Arc<HttpClient>, base_url: String) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Looks a country up by two-letter code or by name
    #[instrument(skip(self), fields(query = %query))]
    pub async fn lookup(&self, query: &str) -> Result<CountryDetails, AppError> {
        if query.trim().is_empty() {
            return Err(AppError::validation("Country query is empty"));
        }

        let url = self.lookup_url(query);
        info!(url = %url, "Fetching country details");

        let results: Vec<RestCountry> = self.http_client.get_json(&url).await?;

        results
            .into_iter()
            .next()
            .map(CountryDetails::from)
            .ok_or_else(|| AppError::http(404, format!("No country matches '{}'", query.trim())))
    }

    pub fn status_url(&self) -> String {
        format!("{}/all", self.base_url)
    }

    fn lookup_url(&self, query: &str) -> String {
        let trimmed = query.trim().to_lowercase();
        let endpoint = if trimmed.chars().count() == 2 {
            "alpha"
        } else {
            "name"
        };
        format!(
            "{}/{}/{}?fullText=true",
            self.base_url,
            endpoint,
            urlencoding::encode(&trimmed)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    fn client(server: &MockServer) -> CountriesClient {
        CountriesClient::new(Arc::new(HttpClient::new(2, 0)), server.uri())
    }

    #[tokio::test]
    async fn two_letter_queries_use_alpha_endpoint() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/alpha/no"))
            .and(query_param("fullText", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "name": { "common": "Norway" },
                "capital": ["Oslo"],
                "cca2": "NO",
                "currencies": { "NOK": { "name": "Norwegian krone", "symbol": "kr" } },
                "latlng": [62.0, 10.0],
                "population": 5379475,
                "area": 323802.0
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let details = client(&server).lookup(" NO ").await.unwrap();

        assert_eq!(
            details,
            CountryDetails {
                name: "Norway".into(),
                capital: "Oslo".into(),
                latitude: 62.0,
                longitude: 10.0,
                iso_code: "NO".into(),
                currency_code: "NOK".into(),
                population: 5_379_475,
                area: 323_802.0,
            }
        );
    }

    #[tokio::test]
    async fn names_use_name_endpoint_and_are_encoded() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/name/united%20kingdom"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "name": { "common": "United Kingdom" },
                "cca2": "GB"
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let details = client(&server).lookup("United Kingdom").await.unwrap();

        assert_eq!(details.iso_code, "GB");
        assert_eq!(details.capital, "");
        assert_eq!(details.currency_code, "");
        assert_eq!((details.latitude, details.longitude), (0.0, 0.0));
    }

    #[tokio::test]
    async fn empty_result_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/name/atlantis"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        assert!(client(&server).lookup("Atlantis").await.is_err());
    }
}

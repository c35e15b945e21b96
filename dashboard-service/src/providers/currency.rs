use common::errors::AppError;
use common::http_client::HttpClient;
use common::models::CurrencyRates;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Debug, Deserialize)]
struct RatesResponse {
    #[serde(default)]
    rates: CurrencyRates,
}

/// Client for the exchange-rate API
pub struct CurrencyClient {
    http_client: Arc<HttpClient>,
    base_url: String,
}

impl CurrencyClient {
    pub fn new(http_client: Arc<HttpClient>, base_url: String) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Conversion rates from `base` to every currency the API knows
    #[instrument(skip(self), fields(base = %base))]
    pub async fn rates(&self, base: &str) -> Result<CurrencyRates, AppError> {
        let base = base.trim().to_uppercase();
        if base.is_empty() {
            return Err(AppError::validation("Base currency is empty"));
        }

        info!(base = %base, "Fetching currency rates");

        let url = format!("{}/{}", self.base_url, urlencoding::encode(&base));
        let response: RatesResponse = self.http_client.get_json(&url).await?;

        Ok(response.rates)
    }

    pub fn status_url(&self) -> String {
        format!("{}/NOK", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    #[tokio::test]
    async fn fetches_rates_for_uppercased_base() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/NOK"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": "success",
                "base_code": "NOK",
                "rates": { "EUR": 0.087, "USD": 0.094 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = CurrencyClient::new(Arc::new(HttpClient::new(2, 0)), server.uri());
        let rates = client.rates("nok").await.unwrap();

        assert_eq!(rates.get("EUR"), Some(&0.087));
        assert_eq!(rates.len(), 2);
    }

    #[tokio::test]
    async fn empty_base_skips_the_request() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = CurrencyClient::new(Arc::new(HttpClient::new(2, 0)), server.uri());
        assert!(client.rates("  ").await.is_err());
    }
}

//! IpInfoGeoLocator - country lookup against an ipinfo-style endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use hookchat_core::gateway::{GatewayError, GeoLocator};

use crate::http::{map_transport_error, read_body};

#[derive(Debug, Deserialize)]
struct GeoResponse {
    country_code: Option<String>,
    country: Option<String>,
}

impl GeoResponse {
    fn code(self) -> Option<String> {
        self.country_code
            .or(self.country)
            .map(|code| code.trim().to_ascii_uppercase())
            .filter(|code| code.len() == 2)
    }
}

#[derive(Clone)]
pub struct IpInfoGeoLocator {
    client: Client,
    url: String,
    token: Option<String>,
    timeout: Duration,
}

impl IpInfoGeoLocator {
    pub fn new(url: impl Into<String>, token: Option<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            token: token.filter(|t| !t.trim().is_empty()),
            timeout,
        }
    }
}

#[async_trait]
impl GeoLocator for IpInfoGeoLocator {
    async fn country_code(&self) -> Result<String, GatewayError> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| GatewayError::MissingConfig("geolocation token".to_string()))?;

        let response = self
            .client
            .get(&self.url)
            .bearer_auth(token)
            .header("accept", "application/json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(map_transport_error)?;

        let body_text = read_body(response).await?;
        let parsed: GeoResponse = serde_json::from_str(&body_text)
            .map_err(|e| GatewayError::Malformed(format!("geolocation reply: {e}")))?;

        parsed
            .code()
            .ok_or_else(|| GatewayError::Malformed("geolocation reply has no country".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_fields() {
        let parsed: GeoResponse = serde_json::from_str(r#"{"ip":"1.2.3.4","country":"be"}"#).unwrap();
        assert_eq!(parsed.code().as_deref(), Some("BE"));

        let parsed: GeoResponse =
            serde_json::from_str(r#"{"country_code":"NL","country":"Netherlands"}"#).unwrap();
        assert_eq!(parsed.code().as_deref(), Some("NL"));

        let parsed: GeoResponse = serde_json::from_str(r#"{"country":"Netherlands"}"#).unwrap();
        assert_eq!(parsed.code(), None);
    }

    #[tokio::test]
    async fn test_missing_token_never_calls_out() {
        let locator = IpInfoGeoLocator::new("http://127.0.0.1:9/json", Some("  ".into()), Duration::from_secs(3));
        assert!(matches!(
            locator.country_code().await,
            Err(GatewayError::MissingConfig(_))
        ));
    }
}

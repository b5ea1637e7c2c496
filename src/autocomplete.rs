use async_trait::async_trait;
use serde::Deserialize;

use crate::error::StoreError;
use crate::types::AddressSuggestion;

/// Shorter inputs are not worth a lookup.
pub const MIN_QUERY_CHARS: usize = 3;

/// Best-effort address lookup for the location field. The app works the
/// same with no provider, so callers treat every error as "no suggestion".
#[async_trait]
pub trait AddressAutocomplete: Send + Sync {
    async fn suggest(&self, text: &str) -> Result<Option<AddressSuggestion>, StoreError>;
}

/// Nominatim-compatible geocoder (`/search?q=...&format=jsonv2`).
pub struct GeocoderAutocomplete {
    client: reqwest::Client,
    base_url: String,
}

impl GeocoderAutocomplete {
    pub fn new(base_url: String) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("business-directory/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, base_url })
    }
}

#[derive(Debug, Deserialize)]
struct Place {
    display_name: String,
    #[serde(default)]
    name: Option<String>,
}

#[async_trait]
impl AddressAutocomplete for GeocoderAutocomplete {
    async fn suggest(&self, text: &str) -> Result<Option<AddressSuggestion>, StoreError> {
        let query = text.trim();
        if query.chars().count() < MIN_QUERY_CHARS {
            return Ok(None);
        }
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", query), ("format", "jsonv2"), ("limit", "1")])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Api {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("geocoder error").to_string(),
            });
        }
        let places: Vec<Place> = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(places.into_iter().next().map(|place| AddressSuggestion {
            formatted_address: place.display_name,
            place_name: place.name.filter(|n| !n.trim().is_empty()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn first_place_becomes_the_suggestion() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "5th ave"))
            .and(query_param("format", "jsonv2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"display_name": "5th Avenue, New York, NY, USA", "name": "5th Avenue"},
                {"display_name": "5th Avenue, Seattle, WA, USA", "name": "5th Avenue"}
            ])))
            .mount(&server)
            .await;

        let geocoder = GeocoderAutocomplete::new(server.uri()).unwrap();
        let suggestion = geocoder.suggest(" 5th ave ").await.unwrap().unwrap();
        assert_eq!(suggestion.formatted_address, "5th Avenue, New York, NY, USA");
        assert_eq!(suggestion.place_name.as_deref(), Some("5th Avenue"));
    }

    #[tokio::test]
    async fn short_input_is_not_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let geocoder = GeocoderAutocomplete::new(server.uri()).unwrap();
        assert_eq!(geocoder.suggest("ab").await.unwrap(), None);
    }

    #[tokio::test]
    async fn service_errors_are_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let geocoder = GeocoderAutocomplete::new(server.uri()).unwrap();
        assert!(matches!(
            geocoder.suggest("Main Street").await,
            Err(StoreError::Api { status: 503, .. })
        ));
    }
}

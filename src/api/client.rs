//! API client for the Rick and Morty REST API.

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::models::{Character, CharacterFilter, CharacterPage};

use super::ApiError;

/// Base URL for the public API
const API_BASE_URL: &str = "https://rickandmortyapi.com/api";

/// HTTP request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// API client for rickandmortyapi.com.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client against the default base URL
    pub fn new() -> Result<Self, ApiError> {
        Self::with_base_url(API_BASE_URL)
    }

    /// Create a new API client against a custom base URL
    /// (config override, test servers).
    pub fn with_base_url(base_url: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch one listing page: `GET /character?page=N`
    pub async fn fetch_page(&self, page: u32) -> Result<CharacterPage, ApiError> {
        let url = format!("{}/character", self.base_url);
        self.get(&url, vec![("page", page.to_string())]).await
    }

    /// Fetch a single character by id: `GET /character/{id}`
    pub async fn fetch_character(&self, id: i64) -> Result<Character, ApiError> {
        let url = format!("{}/character/{}", self.base_url, id);
        self.get(&url, Vec::new()).await
    }

    /// Fetch one page of a server-side filtered listing:
    /// `GET /character?page=N&name=&status=&species=&gender=`.
    /// Only criteria that are set appear in the query string.
    pub async fn filter_characters(
        &self,
        filter: &CharacterFilter,
        page: u32,
    ) -> Result<CharacterPage, ApiError> {
        let url = format!("{}/character", self.base_url);

        let mut params: Vec<(&str, String)> = vec![("page", page.to_string())];
        if let Some(ref name) = filter.name {
            params.push(("name", name.clone()));
        }
        if let Some(ref status) = filter.status {
            params.push(("status", status.clone()));
        }
        if let Some(ref species) = filter.species {
            params.push(("species", species.clone()));
        }
        if let Some(ref gender) = filter.gender {
            params.push(("gender", gender.clone()));
        }

        self.get(&url, params).await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        params: Vec<(&str, String)>,
    ) -> Result<T, ApiError> {
        debug!(url, "GET");

        let response = self.client.get(url).query(&params).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(url, status = %status, "Request failed");
            return Err(ApiError::from_status(status, &body));
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("{} from {}", e, url)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_stripped() {
        let client = ApiClient::with_base_url("http://localhost:8080/api/").unwrap();
        assert_eq!(client.base_url, "http://localhost:8080/api");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_connectivity_error() {
        // Port 9 (discard) is never listening; connect is refused immediately
        let client = ApiClient::with_base_url("http://127.0.0.1:9").unwrap();
        let err = client.fetch_page(1).await.unwrap_err();
        assert!(err.is_connectivity());
    }
}

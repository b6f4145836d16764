use async_trait::async_trait;
use cryptoadvisor_model::OwnerId;
use log::{debug, info, warn};
use reqwest::{Client, RequestBuilder};
use serde::{Serialize, de::DeserializeOwned};

use crate::infra::api_types::{
    BalanceResponse, DepositBody, DepositResponse, routes,
};
use crate::infra::constants::http::REQUEST_TIMEOUT;
use crate::infra::errors::ApiError;
use crate::infra::services::wallet::WalletApi;

/// HTTP client for the advisory backend
#[derive(Clone)]
pub struct ApiClient {
    pub(crate) client: Client,
    base_url: String,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                ApiError::Network(format!("Failed to create HTTP client: {e}"))
            })?;

        info!(
            "[ApiClient] Creating new API client with base URL: {}",
            base_url
        );

        Ok(Self { client, base_url })
    }

    /// Build an absolute URL for an API path
    pub fn build_url(&self, path: impl AsRef<str>) -> String {
        let p = path.as_ref();
        if p.starts_with("http://") || p.starts_with("https://") {
            return p.to_string();
        }
        format!("{}/{}", self.base_url, p.trim_start_matches('/'))
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Execute a request and map the status line onto [`ApiError`]
    async fn execute_request<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("[ApiClient] Request failed before a response: {}", e);
                return Err(e.into());
            }
        };

        let status = response.status();
        debug!(
            "[ApiClient] Response: {} {}",
            status.as_u16(),
            response.url().path()
        );

        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let error_text = response.text().await.unwrap_or_default();
        let err = ApiError::from_status(status.as_u16(), &error_text);
        warn!("[ApiClient] Request failed with status {}: {}", status, err);
        Err(err)
    }

    /// GET request
    pub async fn get<R: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<R, ApiError> {
        let url = self.build_url(path);
        debug!("[ApiClient] GET {}", url);
        let request = self.client.get(&url);
        self.execute_request(request).await
    }

    /// POST request with a JSON body
    pub async fn post<T: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<R, ApiError> {
        let url = self.build_url(path);
        debug!("[ApiClient] POST {}", url);
        let request = self.client.post(&url).json(body);
        self.execute_request(request).await
    }
}

#[async_trait]
impl WalletApi for ApiClient {
    async fn fetch_balance(&self, owner: &OwnerId) -> Result<f64, ApiError> {
        let response: BalanceResponse =
            self.get(&routes::balance(owner)).await?;
        Ok(response.balance)
    }

    async fn deposit(
        &self,
        owner: &OwnerId,
        amount: f64,
    ) -> Result<f64, ApiError> {
        let response: DepositResponse = self
            .post(&routes::deposit(owner), &DepositBody { amount })
            .await?;
        info!(
            "[ApiClient] Deposit of {} for {} accepted, new balance {}",
            amount, owner, response.new_balance
        );
        Ok(response.new_balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_url_joins_without_double_slash() {
        let client = ApiClient::new("http://localhost:8000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(
            client.build_url("/balance/7"),
            "http://localhost:8000/balance/7"
        );
        assert_eq!(
            client.build_url("deposit/7"),
            "http://localhost:8000/deposit/7"
        );
    }

    #[test]
    fn absolute_urls_pass_through() {
        let client = ApiClient::new("http://localhost:8000").unwrap();
        assert_eq!(
            client.build_url("https://example.org/x"),
            "https://example.org/x"
        );
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_network_error() {
        // Port 9 (discard) on loopback is closed in any sane test env
        let client = ApiClient::new("http://127.0.0.1:9").unwrap();
        let owner = OwnerId::new("1").unwrap();
        let err = client.fetch_balance(&owner).await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)), "got {err:?}");
        assert!(err.is_transient());
    }
}

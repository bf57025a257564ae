/// HPA console API client
use anyhow::{Context, Result};
use futures::future::BoxFuture;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::models::*;
use crate::tabs::{SwitchError, ContextSwitcher};

/// Client for the console's cluster endpoints
#[derive(Clone)]
pub struct ConsoleApiClient {
    client: Client,
    base_url: Url,
}

impl ConsoleApiClient {
    /// Create a new API client; `token` is sent as a bearer token when set
    pub fn new(base_url: &str, token: Option<&str>, timeout: Duration) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))
                    .context("Invalid API token format")?,
            );
        }
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: normalize_base_url(base_url)?,
        })
    }

    fn url(&self, endpoint: &str) -> Result<Url, SwitchError> {
        self.base_url
            .join(endpoint)
            .map_err(|e| SwitchError::Command(format!("Invalid endpoint {}: {}", endpoint, e)))
    }

    /// Make a GET request to the API
    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, SwitchError> {
        let url = self.url(endpoint)?;
        debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        Self::handle_response(response).await
    }

    /// Make a POST request to the API
    async fn post<T: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> Result<R, SwitchError> {
        let url = self.url(endpoint)?;
        debug!("POST {}", url);

        let response = self.client.post(url).json(body).send().await?;
        Self::handle_response(response).await
    }

    /// Decode a success body, or turn the error body into `SwitchError::Api`
    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, SwitchError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let error_text = response.text().await.unwrap_or_default();
        Err(api_error(status.as_u16(), &error_text))
    }

    /// List clusters known to the backend
    pub async fn list_clusters(&self) -> Result<Vec<Cluster>, SwitchError> {
        let response: ApiResponse<Vec<Cluster>> = self.get("clusters").await?;
        Ok(response.data.unwrap_or_default())
    }

    /// Point the backend at another cluster context
    pub async fn request_context_switch(&self, context: &str) -> Result<(), SwitchError> {
        let response: SwitchContextResponse = self
            .post("clusters/switch-context", &SwitchContextRequest { context })
            .await?;

        if !response.success {
            return Err(SwitchError::Api {
                status: 200,
                message: response.message,
            });
        }

        debug!("Backend switched context: {}", response.message);
        Ok(())
    }
}

impl ContextSwitcher for ConsoleApiClient {
    fn switch_context<'a>(&'a self, cluster: &'a str) -> BoxFuture<'a, Result<(), SwitchError>> {
        Box::pin(self.request_context_switch(cluster))
    }
}

/// Ensure the base URL ends with a slash so endpoints are joined beneath it
fn normalize_base_url(base_url: &str) -> Result<Url> {
    let mut normalized = base_url.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Url::parse(&normalized).with_context(|| format!("Invalid API base URL: {}", base_url))
}

/// Build an API error from a non-2xx body
fn api_error(status: u16, body: &str) -> SwitchError {
    let message = match serde_json::from_str::<ErrorResponse>(body) {
        Ok(error_response) => error_response.error,
        Err(_) if body.trim().is_empty() => format!("HTTP {}", status),
        Err(_) => body.trim().to_string(),
    };
    SwitchError::Api { status, message }
}

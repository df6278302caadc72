use std::time::Duration;

use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Method, Response,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};

use shared_config::AppConfig;
use shared_models::auth::Session;

use crate::error::ApiError;

/// REST client for the therapist booking backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(config: &AppConfig) -> Self {
        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let client = builder.build().unwrap_or_else(|e| {
            warn!("Failed to build configured HTTP client, using defaults: {}", e);
            Client::new()
        });

        Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }

    fn get_headers(&self, session: Option<&Session>) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(session) = session {
            let value = HeaderValue::from_str(&session.bearer_header())
                .map_err(|e| ApiError::InvalidHeader(e.to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }

    /// Sends a request and returns the response if the status is 2xx.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        session: Option<&Session>,
        body: Option<Value>,
    ) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let headers = self.get_headers(session)?;
        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("API error ({}): {}", status, error_text);
            return Err(ApiError::from_status(status.as_u16(), error_text));
        }

        Ok(response)
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        session: Option<&Session>,
        body: Option<Value>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let response = self.send(method, path, session, body).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

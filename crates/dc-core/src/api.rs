//! Thin HTTP wrapper over the backend REST API
//!
//! Adds the base URL and auth header, maps transport and status failures to
//! [`ApiError`], and unwraps the `{ success, data, error }` envelope most
//! endpoints answer with.

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Longest response body kept in an [`ApiError::Status`]
const MAX_ERROR_BODY: usize = 512;

/// Standard response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Whether the backend handled the request
    #[serde(default = "default_success")]
    pub success: bool,
    /// Payload on success
    pub data: Option<T>,
    /// Human-readable failure reason
    pub error: Option<String>,
}

fn default_success() -> bool {
    true
}

impl<T> ApiEnvelope<T> {
    /// Successful envelope carrying `data`
    #[inline]
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Failed envelope carrying an error message
    #[inline]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Extract the payload, turning envelope failures into errors
    ///
    /// # Errors
    /// - `ApiError::Rejected` if `success` is false
    /// - `ApiError::MissingData` if `data` is absent
    pub fn into_data(self, path: &str) -> ApiResult<T> {
        if !self.success {
            return Err(ApiError::Rejected(
                self.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        self.data.ok_or_else(|| ApiError::MissingData(path.to_string()))
    }
}

/// REST client bound to one API base
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ApiClient {
    /// Build a client from configuration
    ///
    /// # Errors
    /// Returns `ApiError::Config` if the token is not a valid header value or
    /// the underlying client cannot be built.
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.auth_token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ApiError::Config(format!("invalid auth token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `GET` and decode the raw body
    ///
    /// # Errors
    /// Network, status and decode failures.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.send::<(), T>(Method::GET, path, None).await
    }

    /// `POST` a JSON body and decode the raw response
    ///
    /// # Errors
    /// Network, status and decode failures.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::POST, path, Some(body)).await
    }

    /// `PATCH` a JSON body and decode the raw response
    ///
    /// # Errors
    /// Network, status and decode failures.
    pub async fn patch<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::PATCH, path, Some(body)).await
    }

    /// `GET` and unwrap the response envelope
    ///
    /// # Errors
    /// As [`Self::get`], plus envelope rejection or missing data.
    pub async fn get_data<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.get::<ApiEnvelope<T>>(path).await?.into_data(path)
    }

    /// `POST` and unwrap the response envelope
    ///
    /// # Errors
    /// As [`Self::post`], plus envelope rejection or missing data.
    pub async fn post_data<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.post::<B, ApiEnvelope<T>>(path, body)
            .await?
            .into_data(path)
    }

    /// `PATCH` and unwrap the response envelope
    ///
    /// # Errors
    /// As [`Self::patch`], plus envelope rejection or missing data.
    pub async fn patch_data<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.patch::<B, ApiEnvelope<T>>(path, body)
            .await?
            .into_data(path)
    }

    async fn send<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.config.url_for(path);
        tracing::debug!(%method, %url, "api request");

        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let mut text = response.text().await.unwrap_or_default();
            if text.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !text.is_char_boundary(cut) {
                    cut -= 1;
                }
                text.truncate(cut);
            }
            return Err(ApiError::Status {
                status: status.as_u16(),
                path: path.to_string(),
                body: text,
            });
        }

        response.json::<T>().await.map_err(|e| ApiError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }
}

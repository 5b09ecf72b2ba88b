//! reqwest implementation of [`BookingApi`]

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{form_content_path, submit_path, ApiError, BookingApi};
use crate::booking::Booking;
use crate::config::ApiConfig;
use crate::content::FormContent;
use crate::session::SessionKind;
use crate::wizard::Variant;

const USER_AGENT: &str = concat!("festival-booking/", env!("CARGO_PKG_VERSION"));

/// Booking service reached over HTTP
pub struct HttpBookingApi {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    access_token: String,
}

impl HttpBookingApi {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        Self::with_base_url(config.base_url.clone(), config.timeout())
    }

    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = base_url.into();
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::network(base_url.as_str(), e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map the status of a response, reading the error body on failure
    async fn check(path: &str, response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        match response.status().as_u16() {
            200..=299 => Ok(response),
            401 => Err(ApiError::unauthorized(path)),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(ApiError::http(path, status, error_message(&body)))
            }
        }
    }

    async fn decode<T: DeserializeOwned>(path: &str, response: reqwest::Response) -> Result<T, ApiError> {
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::decode(path, e.to_string()))
    }
}

/// Pull the human-readable message out of an error body.
///
/// The service answers with `{"error": ..}` or `{"msg": ..}`; anything else is
/// passed through as text.
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "msg"] {
            if let Some(message) = value.get(key).and_then(|v| v.as_str()) {
                return message.to_string();
            }
        }
    }
    body.trim().to_string()
}

#[async_trait]
impl BookingApi for HttpBookingApi {
    async fn login(&self, kind: SessionKind, password: &str) -> Result<String, ApiError> {
        let path = kind.login_path();
        let response = self
            .client
            .post(self.url(path))
            .json(&LoginRequest { password })
            .send()
            .await
            .map_err(|e| ApiError::network(path, e.to_string()))?;

        let response = Self::check(path, response).await?;
        let login: LoginResponse = Self::decode(path, response).await?;
        Ok(login.access_token)
    }

    async fn fetch_form_content(&self, variant: Variant, token: &str) -> Result<FormContent, ApiError> {
        let path = form_content_path(variant);
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ApiError::network(path, e.to_string()))?;

        let response = Self::check(path, response).await?;
        Self::decode(path, response).await
    }

    async fn submit_booking(&self, variant: Variant, token: &str, booking: &Booking) -> Result<(), ApiError> {
        let path = submit_path(variant);
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(booking)
            .send()
            .await
            .map_err(|e| ApiError::network(path, e.to_string()))?;

        Self::check(path, response).await?;
        Ok(())
    }
}

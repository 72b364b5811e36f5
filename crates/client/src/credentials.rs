//! HTTP client for the remote credential service.
//!
//! The service is an opaque collaborator. All this side needs is a bearer token
//! on login and, on failure, whatever `message` the body carries.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ClientConfig;

const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of a successful `POST /auth/login`.
///
/// Only `token` is relied upon; the rest is informational and re-derived from
/// the token itself.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub roles: Option<serde_json::Value>,
    #[serde(default)]
    pub exp: Option<f64>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("credential service returned {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Rejected { status: u16, message: Option<String> },

    #[error("credential service unreachable: {0}")]
    Network(String),

    #[error("unexpected credential service response: {0}")]
    Decode(String),
}

impl CredentialError {
    /// Best message to show inline in the form.
    pub fn user_message(&self) -> String {
        match self {
            CredentialError::Rejected {
                message: Some(message),
                ..
            } => message.clone(),
            CredentialError::Rejected { status: 401, .. } => "Invalid email or password.".to_string(),
            CredentialError::Network(_) => {
                "Unable to reach the server. Please check your connection and try again.".to_string()
            }
            _ => GENERIC_FAILURE.to_string(),
        }
    }
}

/// Extract a non-blank `message` field from an error body.
pub fn message_from_body(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")?
        .as_str()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone)]
pub struct CredentialClient {
    http: reqwest::Client,
    api_url: String,
}

impl CredentialClient {
    pub fn new(config: &ClientConfig) -> Result<Self, CredentialError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| CredentialError::Network(e.to_string()))?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, CredentialError> {
        let resp = self.post("/auth/login", request).await?;
        resp.json::<LoginResponse>()
            .await
            .map_err(|e| CredentialError::Decode(e.to_string()))
    }

    /// Any 2xx counts as success; the body is ignored.
    pub async fn register(&self, request: &RegisterRequest) -> Result<(), CredentialError> {
        self.post("/user/register", request).await?;
        Ok(())
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, CredentialError> {
        let url = format!("{}{}", self.api_url, path);

        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(url = %url, error = %e, "credential request failed");
                CredentialError::Network(e.to_string())
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::info!(url = %url, status = status.as_u16(), "credential request rejected");
            return Err(CredentialError::Rejected {
                status: status.as_u16(),
                message: message_from_body(&body),
            });
        }

        Ok(resp)
    }
}

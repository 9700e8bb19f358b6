//! Streaming-avatar session tokens
//!
//! Exchanges the server's HeyGen API key for a short-lived token the browser
//! uses to open the avatar stream. The key itself never leaves the server.

use crate::config::AvatarConfig;
use crate::net::{error_body, join_url, transport_error};
use crate::secrets::{CredentialKey, Credentials};
use async_trait::async_trait;
use sdk::errors::{PitchError, Result};
use serde::Deserialize;
use std::sync::Arc;

const PROVIDER: &str = "HeyGen API";

pub const DEFAULT_HEYGEN_URL: &str = "https://api.heygen.com";

#[async_trait]
pub trait AvatarTokenSource: Send + Sync {
    async fn create_token(&self) -> Result<String>;
}

pub struct HeyGenTokens {
    credentials: Arc<Credentials>,
    config: AvatarConfig,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct TokenEnvelope {
    data: TokenData,
}

#[derive(Deserialize)]
struct TokenData {
    token: String,
}

impl HeyGenTokens {
    pub fn new(config: AvatarConfig, credentials: Arc<Credentials>) -> Self {
        Self {
            credentials,
            config,
            client: reqwest::Client::new(),
        }
    }

    fn base_url(&self) -> String {
        self.credentials
            .lookup(CredentialKey::HeygenApiUrl)
            .map(|url| url.unsecure().to_string())
            .unwrap_or_else(|| DEFAULT_HEYGEN_URL.to_string())
    }
}

#[async_trait]
impl AvatarTokenSource for HeyGenTokens {
    async fn create_token(&self) -> Result<String> {
        let api_key = self.credentials.require(CredentialKey::HeygenApiKey)?;
        let url = join_url(&self.base_url(), "v1/streaming.create_token");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", api_key.unsecure())
            .timeout(self.config.timeout())
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = error_body(response).await;
            tracing::warn!("HeyGen token request failed ({}): {}", status, body);
            return Err(PitchError::upstream_status(
                status.as_u16(),
                format!("Failed to get HeyGen token: {}", body),
            ));
        }

        let envelope: TokenEnvelope = response
            .json()
            .await
            .map_err(|e| PitchError::upstream(format!("Unexpected HeyGen token response: {}", e)))?;

        tracing::debug!("Issued streaming avatar token");
        Ok(envelope.data.token)
    }
}

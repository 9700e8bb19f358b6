use super::{ChatModel, CompletionRequest, LLMError, ResponseFormat};
use crate::config::LLMConfig;
use crate::net::join_url;
use crate::secrets::{scrub, CredentialKey, Credentials};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

pub struct OpenAIProvider {
    config: LLMConfig,
    credentials: Arc<Credentials>,
    client: reqwest::Client,
}

impl OpenAIProvider {
    pub fn new(config: LLMConfig, credentials: Arc<Credentials>) -> Self {
        Self {
            config,
            credentials,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ChatModel for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &CompletionRequest) -> super::Result<String> {
        let api_key = self
            .credentials
            .lookup(CredentialKey::OpenAiApiKey)
            .ok_or_else(|| {
                LLMError::MissingCredential(CredentialKey::OpenAiApiKey.primary_var().to_string())
            })?;

        let url = join_url(&self.config.base_url, "chat/completions");

        let api_messages: Vec<serde_json::Value> = request
            .messages
            .iter()
            .map(|msg| {
                json!({
                    "role": msg.role.to_string(),
                    "content": msg.content
                })
            })
            .collect();

        let mut payload = json!({
            "model": self.config.model,
            "messages": api_messages,
            "temperature": request.temperature,
        });
        if request.response_format == ResponseFormat::JsonObject {
            payload["response_format"] = json!({ "type": "json_object" });
        }

        tracing::debug!(
            "OpenAI request: model={}, messages={}, format={:?}",
            self.config.model,
            request.messages.len(),
            request.response_format
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key.unsecure()))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LLMError::Timeout
                } else {
                    LLMError::NetworkError(scrub(&e.to_string()))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = scrub(&response.text().await.unwrap_or_default());
            tracing::warn!("OpenAI returned {}: {}", status, text);

            return Err(match status.as_u16() {
                401 | 403 => LLMError::AuthenticationFailed(text),
                429 => LLMError::RateLimitExceeded,
                500..=599 => LLMError::ProviderUnavailable(text),
                _ => LLMError::InvalidRequest(text),
            });
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        let choice = data
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .ok_or_else(|| LLMError::ParseError("No choices in response".to_string()))?;

        let content = choice
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(str::trim)
            .unwrap_or_default();

        if content.is_empty() {
            return Err(LLMError::ParseError("Empty content".to_string()));
        }

        Ok(content.to_string())
    }
}

use super::ConversationStore;
use crate::net::{error_body, join_url, transport_error};
use crate::secrets::{CredentialKey, Credentials, SecretString};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use sdk::errors::{PitchError, Result};
use sdk::{Conversation, ConversationId, Message, Sender};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

const PROVIDER: &str = "Supabase";
const INVALID_TOKEN: &str = "Invalid or expired authentication token";

/// Supabase adapter: GoTrue for token checks, PostgREST for the
/// `conversations` and `messages` tables.
pub struct SupabaseStore {
    credentials: Arc<Credentials>,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct AuthUser {
    id: String,
}

impl SupabaseStore {
    pub fn new(credentials: Arc<Credentials>) -> Self {
        Self {
            credentials,
            client: reqwest::Client::new(),
        }
    }

    /// Builds a request with the project key and the caller's token
    fn request(&self, method: Method, path: &str, token: &SecretString) -> Result<RequestBuilder> {
        let base = self.credentials.require(CredentialKey::SupabaseUrl)?;
        let anon_key = self.credentials.require(CredentialKey::SupabaseAnonKey)?;

        Ok(self
            .client
            .request(method, join_url(base.unsecure(), path))
            .header("apikey", anon_key.unsecure())
            .header("Authorization", format!("Bearer {}", token.unsecure())))
    }

    async fn send(&self, operation: &str, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = error_body(response).await;
        tracing::warn!("Supabase {} failed ({}): {}", operation, status, body);

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(PitchError::Auth(INVALID_TOKEN.to_string()));
        }
        Err(PitchError::Store(format!(
            "{} failed ({}): {}",
            operation,
            status.as_u16(),
            body
        )))
    }

    async fn decode<T: serde::de::DeserializeOwned>(operation: &str, response: Response) -> Result<T> {
        response
            .json()
            .await
            .map_err(|e| PitchError::Store(format!("{} returned malformed rows: {}", operation, e)))
    }
}

#[async_trait]
impl ConversationStore for SupabaseStore {
    async fn authenticate(&self, token: &SecretString) -> Result<String> {
        let request = self.request(Method::GET, "auth/v1/user", token)?;
        let response = self.send("authenticate", request).await?;
        let user: AuthUser = response
            .json()
            .await
            .map_err(|_| PitchError::Auth(INVALID_TOKEN.to_string()))?;

        if user.id.is_empty() {
            return Err(PitchError::Auth(INVALID_TOKEN.to_string()));
        }
        Ok(user.id)
    }

    async fn create_conversation(
        &self,
        token: &SecretString,
        user_id: &str,
        judge_id: &str,
    ) -> Result<Conversation> {
        let request = self
            .request(Method::POST, "rest/v1/conversations", token)?
            .header("Prefer", "return=representation")
            .json(&json!({ "user_id": user_id, "judge_id": judge_id }));

        let response = self.send("create conversation", request).await?;
        let rows: Vec<Conversation> = Self::decode("create conversation", response).await?;

        let conversation = rows.into_iter().next().ok_or_else(|| {
            PitchError::Store("create conversation returned no rows".to_string())
        })?;
        tracing::info!("Created conversation {}", conversation.id);
        Ok(conversation)
    }

    async fn get_conversation(
        &self,
        token: &SecretString,
        id: &ConversationId,
    ) -> Result<Option<Conversation>> {
        let request = self
            .request(Method::GET, "rest/v1/conversations", token)?
            .query(&[("id", format!("eq.{}", id)), ("select", "*".to_string())]);

        let response = self.send("get conversation", request).await?;
        let rows: Vec<Conversation> = Self::decode("get conversation", response).await?;
        Ok(rows.into_iter().next())
    }

    async fn append_message(
        &self,
        token: &SecretString,
        id: &ConversationId,
        sender: Sender,
        content: &str,
    ) -> Result<()> {
        let request = self
            .request(Method::POST, "rest/v1/messages", token)?
            .header("Prefer", "return=minimal")
            .json(&json!({
                "conversation_id": id,
                "sender": sender.as_str(),
                "content": content,
            }));

        self.send("append message", request).await?;
        Ok(())
    }

    async fn list_messages(
        &self,
        token: &SecretString,
        id: &ConversationId,
    ) -> Result<Vec<Message>> {
        let request = self
            .request(Method::GET, "rest/v1/messages", token)?
            .query(&[
                ("conversation_id", format!("eq.{}", id)),
                ("select", "*".to_string()),
                ("order", "created_at.asc,id.asc".to_string()),
            ]);

        let response = self.send("list messages", request).await?;
        Self::decode("list messages", response).await
    }

    async fn delete_messages(&self, token: &SecretString, id: &ConversationId) -> Result<()> {
        let request = self
            .request(Method::DELETE, "rest/v1/messages", token)?
            .query(&[("conversation_id", format!("eq.{}", id))]);

        self.send("delete messages", request).await?;
        tracing::info!("Deleted messages of conversation {}", id);
        Ok(())
    }
}

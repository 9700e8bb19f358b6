//! Conversation Store Adapter
//!
//! Every call carries the caller's bearer token; ownership checks are left to
//! the remote store's row-level security.

use crate::secrets::SecretString;
use async_trait::async_trait;
use sdk::errors::Result;
use sdk::{Conversation, ConversationId, Message, Sender};

pub mod supabase;

pub use supabase::SupabaseStore;

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Resolve the user id behind `token`; `Auth` error when rejected
    async fn authenticate(&self, token: &SecretString) -> Result<String>;

    /// Insert a conversation row owned by `user_id`, recording the persona
    async fn create_conversation(
        &self,
        token: &SecretString,
        user_id: &str,
        judge_id: &str,
    ) -> Result<Conversation>;

    /// Conversation metadata, `None` when absent or not visible to the token
    async fn get_conversation(
        &self,
        token: &SecretString,
        id: &ConversationId,
    ) -> Result<Option<Conversation>>;

    /// Append one message; the store assigns the timestamp
    async fn append_message(
        &self,
        token: &SecretString,
        id: &ConversationId,
        sender: Sender,
        content: &str,
    ) -> Result<()>;

    /// Messages ordered by creation time, oldest first. Empty is not an error.
    async fn list_messages(&self, token: &SecretString, id: &ConversationId)
        -> Result<Vec<Message>>;

    /// Delete every message of the conversation; the conversation row stays
    async fn delete_messages(&self, token: &SecretString, id: &ConversationId) -> Result<()>;
}

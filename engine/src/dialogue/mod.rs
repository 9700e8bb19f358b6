//! Dialogue Orchestrator
//!
//! Drives a pitch conversation: creates it with the persona's system prompt,
//! then for every user utterance persists the turn, asks the model for the
//! judge's reply, persists that too and finally tries to voice it.
//!
//! # Conversation lifecycle
//!
//! ```text
//! Created (system prompt only) --reply--> Active --reply--> Active
//!                                           |
//!                                          end
//!                                           v
//!                                 Ended (messages deleted)
//! ```

mod locks;

pub use locks::{ConversationGuard, ConversationLocks};

use crate::llm::{ChatModel, CompletionRequest, Message as ChatMessage};
use crate::persona::{build_system_prompt, PersonaCatalog};
use crate::secrets::SecretString;
use crate::speech::SpeechService;
use crate::store::ConversationStore;
use sdk::errors::{PitchError, Result};
use sdk::{Conversation, ConversationId, Message, Persona, Sender};
use std::sync::Arc;

/// Where a conversation stands, derived from its stored history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    /// Only the persona prompt has been written
    Created,
    /// At least one user turn exists
    Active,
    /// Messages were deleted; the conversation cannot be resumed
    Ended,
}

impl ConversationState {
    pub fn from_history(history: &[Message]) -> Self {
        if history.is_empty() {
            ConversationState::Ended
        } else if history.iter().all(|m| m.sender == Sender::System) {
            ConversationState::Created
        } else {
            ConversationState::Active
        }
    }
}

/// A freshly created conversation and its judge
#[derive(Debug, Clone)]
pub struct StartedConversation {
    pub conversation: Conversation,
    pub persona: Persona,
}

/// The judge's answer to one utterance
#[derive(Debug, Clone)]
pub struct Reply {
    pub text: String,
    /// Absent when synthesis failed
    pub audio: Option<Vec<u8>>,
    pub judge_id: Option<String>,
}

pub struct DialogueOrchestrator {
    catalog: Arc<PersonaCatalog>,
    store: Arc<dyn ConversationStore>,
    model: Arc<dyn ChatModel>,
    speech: Arc<dyn SpeechService>,
    locks: ConversationLocks,
    temperature: f32,
}

impl DialogueOrchestrator {
    pub fn new(
        catalog: Arc<PersonaCatalog>,
        store: Arc<dyn ConversationStore>,
        model: Arc<dyn ChatModel>,
        speech: Arc<dyn SpeechService>,
        temperature: f32,
    ) -> Self {
        Self {
            catalog,
            store,
            model,
            speech,
            locks: ConversationLocks::new(),
            temperature,
        }
    }

    /// Create a conversation with `judge_id` and store its persona prompt.
    ///
    /// The judge is validated before anything is written, so an unknown id
    /// never leaves a conversation behind.
    pub async fn start(&self, token: &SecretString, judge_id: &str) -> Result<StartedConversation> {
        let persona = self
            .catalog
            .get(judge_id)
            .map_err(|_| {
                PitchError::Validation(format!(
                    "Invalid judge '{}'. Choose one of: {}",
                    judge_id,
                    self.catalog.ids().join(", ")
                ))
            })?
            .clone();

        let user_id = self.store.authenticate(token).await?;
        let conversation = self
            .store
            .create_conversation(token, &user_id, &persona.id)
            .await?;

        let _guard = self.locks.acquire(&conversation.id).await;
        self.store
            .append_message(
                token,
                &conversation.id,
                Sender::System,
                &build_system_prompt(&persona),
            )
            .await?;

        tracing::info!(
            "Started conversation {} with judge {}",
            conversation.id,
            persona.id
        );
        Ok(StartedConversation {
            conversation,
            persona,
        })
    }

    /// Persist `utterance`, generate the judge's reply, persist it, then try
    /// to voice it. Synthesis failures only drop the audio.
    pub async fn generate_reply(
        &self,
        token: &SecretString,
        id: &ConversationId,
        utterance: &str,
    ) -> Result<Reply> {
        let mut reply = self.respond(token, id, utterance).await?;

        match self
            .speech
            .synthesize(&reply.text, reply.judge_id.as_deref())
            .await
        {
            Ok(audio) => reply.audio = Some(audio),
            Err(e) => {
                tracing::warn!("Speech synthesis failed for {}: {}", id, e);
            }
        }

        Ok(reply)
    }

    /// Text-only turn: persist `utterance`, ask the model, persist the reply
    pub async fn respond(
        &self,
        token: &SecretString,
        id: &ConversationId,
        utterance: &str,
    ) -> Result<Reply> {
        let utterance = utterance.trim();
        if utterance.is_empty() {
            return Err(PitchError::Validation("Message must not be empty".to_string()));
        }

        self.store.authenticate(token).await?;
        let _guard = self.locks.acquire(id).await;

        let history = self.store.list_messages(token, id).await?;
        if ConversationState::from_history(&history) == ConversationState::Ended {
            return Err(PitchError::NotFound(
                "Conversation not found or empty".to_string(),
            ));
        }

        let judge_id = self.resolve_judge(token, id, &history).await;

        self.store
            .append_message(token, id, Sender::User, utterance)
            .await?;

        let mut messages: Vec<ChatMessage> = history.iter().map(ChatMessage::from).collect();
        messages.push(ChatMessage::user(utterance));

        let text = self
            .model
            .complete(&CompletionRequest::text(messages, self.temperature))
            .await?;

        self.store
            .append_message(token, id, Sender::Assistant, &text)
            .await?;

        tracing::debug!(
            "Conversation {}: {} turns stored",
            id,
            history.len() + 2
        );

        Ok(Reply {
            text,
            audio: None,
            judge_id,
        })
    }

    /// Delete the conversation's messages; the conversation row stays.
    /// Ending an already ended conversation succeeds again.
    pub async fn end(&self, token: &SecretString, id: &ConversationId) -> Result<()> {
        self.store.authenticate(token).await?;
        let _guard = self.locks.acquire(id).await;

        // The store silently ignores deletes on rows the token cannot see
        if self.store.get_conversation(token, id).await?.is_none() {
            return Err(PitchError::NotFound("Conversation not found".to_string()));
        }
        self.store.delete_messages(token, id).await?;
        tracing::info!("Ended conversation {}", id);
        Ok(())
    }

    /// Current lifecycle state of a conversation
    pub async fn state(&self, token: &SecretString, id: &ConversationId) -> Result<ConversationState> {
        let history = self.store.list_messages(token, id).await?;
        Ok(ConversationState::from_history(&history))
    }

    /// Judge of a conversation: the stored column, or for older rows the
    /// persona named in the stored system prompt.
    async fn resolve_judge(
        &self,
        token: &SecretString,
        id: &ConversationId,
        history: &[Message],
    ) -> Option<String> {
        match self.store.get_conversation(token, id).await {
            Ok(Some(Conversation {
                judge_id: Some(judge_id),
                ..
            })) => return Some(judge_id),
            Ok(_) => {}
            Err(e) => tracing::warn!("Could not load conversation {}: {}", id, e),
        }

        let prompt = history.iter().find(|m| m.sender == Sender::System)?;
        let persona = self.catalog.identify_from_prompt(&prompt.content);
        if persona.is_none() {
            tracing::warn!("No judge recognized for conversation {}", id);
        }
        persona.map(|p| p.id.clone())
    }
}

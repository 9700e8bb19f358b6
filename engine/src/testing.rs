//! In-memory doubles for the provider seams
//!
//! Available to this crate's tests and, through the `test-util` feature, to
//! downstream crates.

use crate::avatar::AvatarTokenSource;
use crate::llm::{self, ChatModel, CompletionRequest, LLMError};
use crate::secrets::SecretString;
use crate::speech::{AudioClip, SpeechService};
use crate::store::ConversationStore;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use sdk::errors::{PitchError, Result};
use sdk::{Conversation, ConversationId, Message, Sender};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct StoreState {
    sessions: HashMap<String, String>,
    conversations: Vec<Conversation>,
    messages: Vec<Message>,
    ticks: i64,
}

impl StoreState {
    /// Deterministic store clock, one millisecond per write
    fn now(&mut self) -> DateTime<Utc> {
        self.ticks += 1;
        let epoch = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_default();
        epoch + Duration::milliseconds(self.ticks)
    }

    fn user_for(&self, token: &SecretString) -> Result<String> {
        self.sessions
            .get(token.unsecure())
            .cloned()
            .ok_or_else(|| PitchError::Auth("Invalid or expired authentication token".to_string()))
    }

    fn owns(&self, user_id: &str, id: &ConversationId) -> bool {
        self.conversations
            .iter()
            .any(|c| &c.id == id && c.user_id == user_id)
    }

    fn insert_conversation(&mut self, user_id: &str, judge_id: Option<&str>) -> Conversation {
        let conversation = Conversation {
            id: ConversationId::new(format!("conv-{}", self.conversations.len() + 1)),
            user_id: user_id.to_string(),
            judge_id: judge_id.map(str::to_string),
            created_at: self.now(),
        };
        self.conversations.push(conversation.clone());
        conversation
    }

    fn insert_message(&mut self, id: &ConversationId, sender: Sender, content: &str) {
        let created_at = self.now();
        self.messages.push(Message {
            conversation_id: id.clone(),
            sender,
            content: content.to_string(),
            created_at,
        });
    }
}

/// Conversation store kept in memory, emulating row-level security: a
/// conversation owned by another user is invisible to reads and rejects
/// writes.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `token` as a session of `user_id`
    pub fn with_session(self, token: &str, user_id: &str) -> Self {
        self.add_session(token, user_id);
        self
    }

    pub fn add_session(&self, token: &str, user_id: &str) {
        lock(&self.state)
            .sessions
            .insert(token.to_string(), user_id.to_string());
    }

    pub fn conversation_count(&self) -> usize {
        lock(&self.state).conversations.len()
    }

    pub fn conversation(&self, id: &ConversationId) -> Option<Conversation> {
        lock(&self.state)
            .conversations
            .iter()
            .find(|c| &c.id == id)
            .cloned()
    }

    /// Stored messages of `id` in insertion order, bypassing ownership
    pub fn messages_for(&self, id: &ConversationId) -> Vec<Message> {
        lock(&self.state)
            .messages
            .iter()
            .filter(|m| &m.conversation_id == id)
            .cloned()
            .collect()
    }

    /// Insert a conversation with the given history
    pub fn seed_conversation(
        &self,
        user_id: &str,
        judge_id: Option<&str>,
        history: &[(Sender, &str)],
    ) -> ConversationId {
        let mut state = lock(&self.state);
        let conversation = state.insert_conversation(user_id, judge_id);
        for (sender, content) in history {
            state.insert_message(&conversation.id, *sender, content);
        }
        conversation.id
    }

    /// A conversation written before the judge column existed
    pub fn insert_legacy_conversation(&self, user_id: &str, system_prompt: &str) -> ConversationId {
        self.seed_conversation(user_id, None, &[(Sender::System, system_prompt)])
    }
}

#[async_trait]
impl ConversationStore for InMemoryStore {
    async fn authenticate(&self, token: &SecretString) -> Result<String> {
        lock(&self.state).user_for(token)
    }

    async fn create_conversation(
        &self,
        token: &SecretString,
        user_id: &str,
        judge_id: &str,
    ) -> Result<Conversation> {
        let mut state = lock(&self.state);
        if state.user_for(token)? != user_id {
            return Err(PitchError::Auth(
                "new row violates row-level security policy".to_string(),
            ));
        }
        Ok(state.insert_conversation(user_id, Some(judge_id)))
    }

    async fn get_conversation(
        &self,
        token: &SecretString,
        id: &ConversationId,
    ) -> Result<Option<Conversation>> {
        let state = lock(&self.state);
        let user_id = state.user_for(token)?;
        Ok(state
            .conversations
            .iter()
            .find(|c| &c.id == id && c.user_id == user_id)
            .cloned())
    }

    async fn append_message(
        &self,
        token: &SecretString,
        id: &ConversationId,
        sender: Sender,
        content: &str,
    ) -> Result<()> {
        let mut state = lock(&self.state);
        let user_id = state.user_for(token)?;
        if !state.owns(&user_id, id) {
            return Err(PitchError::Auth(
                "new row violates row-level security policy".to_string(),
            ));
        }
        state.insert_message(id, sender, content);
        Ok(())
    }

    async fn list_messages(
        &self,
        token: &SecretString,
        id: &ConversationId,
    ) -> Result<Vec<Message>> {
        let state = lock(&self.state);
        let user_id = state.user_for(token)?;
        if !state.owns(&user_id, id) {
            return Ok(Vec::new());
        }
        let mut messages: Vec<Message> = state
            .messages
            .iter()
            .filter(|m| &m.conversation_id == id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    async fn delete_messages(&self, token: &SecretString, id: &ConversationId) -> Result<()> {
        let mut state = lock(&self.state);
        let user_id = state.user_for(token)?;
        if state.owns(&user_id, id) {
            state.messages.retain(|m| &m.conversation_id != id);
        }
        Ok(())
    }
}

/// Chat model replaying queued replies, then a default reply
pub struct ScriptedModel {
    default_reply: String,
    queue: Mutex<VecDeque<llm::Result<String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedModel {
    pub fn new(default_reply: impl Into<String>) -> Self {
        Self {
            default_reply: default_reply.into(),
            queue: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        lock(&self.queue).push_back(Ok(reply.into()));
    }

    pub fn push_error(&self, error: LLMError) {
        lock(&self.queue).push_back(Err(error));
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        lock(&self.requests).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> llm::Result<String> {
        lock(&self.requests).push(request.clone());
        lock(&self.queue)
            .pop_front()
            .unwrap_or_else(|| Ok(self.default_reply.clone()))
    }
}

/// Audio returned by [`FakeSpeech::synthesize`]
pub const FAKE_AUDIO: &[u8] = b"ID3fake-mp3";

/// Speech double recording synthesis calls
#[derive(Default)]
pub struct FakeSpeech {
    fail_synthesis: bool,
    transcript: String,
    transcription_error: Option<(u16, String)>,
    synthesis_calls: Mutex<Vec<(String, Option<String>)>>,
    transcriptions: Mutex<Vec<AudioClip>>,
}

impl FakeSpeech {
    pub fn new() -> Self {
        Self {
            transcript: "We are building a marketplace for used lab equipment.".to_string(),
            ..Self::default()
        }
    }

    pub fn failing_synthesis(mut self) -> Self {
        self.fail_synthesis = true;
        self
    }

    pub fn with_transcript(mut self, transcript: impl Into<String>) -> Self {
        self.transcript = transcript.into();
        self
    }

    /// Transcription fails with the given upstream status and body
    pub fn failing_transcription(mut self, status: u16, body: impl Into<String>) -> Self {
        self.transcription_error = Some((status, body.into()));
        self
    }

    pub fn synthesis_calls(&self) -> Vec<(String, Option<String>)> {
        lock(&self.synthesis_calls).clone()
    }

    pub fn transcriptions(&self) -> Vec<AudioClip> {
        lock(&self.transcriptions).clone()
    }
}

#[async_trait]
impl SpeechService for FakeSpeech {
    async fn synthesize(&self, text: &str, persona_id: Option<&str>) -> Result<Vec<u8>> {
        lock(&self.synthesis_calls).push((text.to_string(), persona_id.map(str::to_string)));
        if self.fail_synthesis {
            return Err(PitchError::UpstreamTimeout(
                "ElevenLabs request timed out".to_string(),
            ));
        }
        Ok(FAKE_AUDIO.to_vec())
    }

    async fn transcribe(&self, clip: AudioClip) -> Result<String> {
        lock(&self.transcriptions).push(clip);
        if let Some((status, body)) = &self.transcription_error {
            return Err(PitchError::Transcription {
                status: *status,
                body: body.clone(),
            });
        }
        Ok(self.transcript.clone())
    }
}

/// Avatar token double
pub struct FakeAvatar {
    token: Option<String>,
}

impl FakeAvatar {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// Every request fails as if the provider were unreachable
    pub fn unreachable() -> Self {
        Self { token: None }
    }
}

#[async_trait]
impl AvatarTokenSource for FakeAvatar {
    async fn create_token(&self) -> Result<String> {
        self.token.clone().ok_or_else(|| {
            PitchError::UpstreamUnavailable("Failed to connect to HeyGen API".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_persisted_message_is_listed_last() {
        let store = InMemoryStore::new().with_session("t", "u");
        let token = SecretString::new("t");
        let conversation = store.create_conversation(&token, "u", "elon").await.unwrap();

        store
            .append_message(&token, &conversation.id, Sender::System, "prompt")
            .await
            .unwrap();
        store
            .append_message(&token, &conversation.id, Sender::User, "latest")
            .await
            .unwrap();

        let messages = store.list_messages(&token, &conversation.id).await.unwrap();
        assert_eq!(messages.last().unwrap().content, "latest");
        assert!(messages[0].created_at < messages[1].created_at);
    }

    #[tokio::test]
    async fn test_row_level_security() {
        let store = InMemoryStore::new()
            .with_session("owner", "u1")
            .with_session("other", "u2");
        let id = store.seed_conversation("u1", Some("zuck"), &[(Sender::System, "p")]);
        let other = SecretString::new("other");

        assert!(store.list_messages(&other, &id).await.unwrap().is_empty());
        assert!(store.get_conversation(&other, &id).await.unwrap().is_none());
        assert!(store
            .append_message(&other, &id, Sender::User, "x")
            .await
            .is_err());
        assert!(store
            .authenticate(&SecretString::new("nobody"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_scripted_model_queue() {
        let model = ScriptedModel::new("default");
        model.push_reply("first");
        let request = CompletionRequest::text(vec![llm::Message::user("hi")], 0.8);

        assert_eq!(model.complete(&request).await.unwrap(), "first");
        assert_eq!(model.complete(&request).await.unwrap(), "default");
        assert_eq!(model.call_count(), 2);
    }
}

//! LLM Provider Abstraction Layer
//!
//! A single chat-completion seam used by the dialogue orchestrator, the
//! performance reviewer and the judge profile generator. Requests carry the
//! full ordered history; no streaming, no function calling.

use async_trait::async_trait;
use sdk::errors::PitchError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod openai;

pub use openai::OpenAIProvider;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("{0} not configured in environment variables")]
    MissingCredential(String),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl From<LLMError> for PitchError {
    fn from(error: LLMError) -> Self {
        match error {
            LLMError::MissingCredential(var) => {
                PitchError::Config(format!("{} not configured in environment variables", var))
            }
            LLMError::Timeout => PitchError::UpstreamTimeout("LLM request timed out".to_string()),
            LLMError::NetworkError(msg) => {
                PitchError::UpstreamUnavailable(format!("Failed to connect to LLM: {}", msg))
            }
            other => PitchError::upstream(format!("LLM request failed: {}", other)),
        }
    }
}

/// Message in a conversation history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Role of the message sender (user, assistant, system)
    pub role: MessageRole,

    /// Content of the message
    pub content: String,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

impl From<&sdk::Message> for Message {
    fn from(stored: &sdk::Message) -> Self {
        let role = match stored.sender {
            sdk::Sender::System => MessageRole::System,
            sdk::Sender::User => MessageRole::User,
            sdk::Sender::Assistant => MessageRole::Assistant,
        };
        Self {
            role,
            content: stored.content.clone(),
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::System => write!(f, "system"),
        }
    }
}

/// Output constraint requested from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Text,
    /// Provider-side JSON mode; the reply is a single JSON object
    JsonObject,
}

/// One chat-completion call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub response_format: ResponseFormat,
}

impl CompletionRequest {
    pub fn text(messages: Vec<Message>, temperature: f32) -> Self {
        Self {
            messages,
            temperature,
            response_format: ResponseFormat::Text,
        }
    }

    pub fn json(messages: Vec<Message>, temperature: f32) -> Self {
        Self {
            messages,
            temperature,
            response_format: ResponseFormat::JsonObject,
        }
    }
}

/// Chat model trait that all providers must implement
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Returns the name of the provider (e.g., "openai")
    fn name(&self) -> &str;

    /// Run one completion and return the reply text, trimmed
    ///
    /// # Returns
    /// * `Ok(String)` - The assistant's reply
    /// * `Err(LLMError)` - If the request fails or the reply is empty
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Parse structured model output into `T`.
///
/// Handles multiple LLM output formats:
/// 1. Raw JSON
/// 2. Fenced JSON (with or without trailing text): ` ```json\n{...}\n``` `
/// 3. A JSON object embedded in prose
///
/// Returns `None` when none of them deserializes into `T`.
pub fn parse_structured<T: DeserializeOwned>(content: &str) -> Option<T> {
    let trimmed = content.trim();

    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    if let Some(inner) = extract_fenced_json(trimmed) {
        if let Ok(value) = serde_json::from_str(inner.trim()) {
            return Some(value);
        }
    }

    if let Some(pos) = trimmed.find('{') {
        if let Some(json_str) = extract_balanced_json(&trimmed[pos..]) {
            if let Ok(value) = serde_json::from_str(json_str) {
                return Some(value);
            }
        }
    }

    None
}

/// Extract the body of the first markdown code fence in the text.
///
/// Works even when there is trailing prose after the closing ```.
/// Returns `None` if no fenced block is found.
fn extract_fenced_json(content: &str) -> Option<&str> {
    let fence_start = content.find("```")?;
    let after_opening = &content[fence_start + 3..];

    // Skip the language tag line (e.g. "json\n")
    let body_start_rel = after_opening.find('\n')? + 1;
    let body_start = fence_start + 3 + body_start_rel;

    let closing = content[body_start..].find("```")?;
    let body_end = body_start + closing;

    if body_start >= body_end {
        return None;
    }

    Some(&content[body_start..body_end])
}

/// Extract a balanced JSON object starting at position 0 of `s`.
///
/// Counts `{` / `}` depth, respecting string literals, to find the
/// matching close brace.
fn extract_balanced_json(s: &str) -> Option<&str> {
    if !s.starts_with('{') {
        return None;
    }
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

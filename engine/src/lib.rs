//! Pitchd Engine Library
//!
//! Provider clients, the conversation store adapter and the pitch-session
//! logic (persona catalog, dialogue orchestration, performance review).
//! It is used by the HTTP surface and by integration tests.

/// Configuration management module
pub mod config;

/// Credential resolution and secret scrubbing
pub mod secrets;

/// Telemetry and Observability
pub mod telemetry;

/// LLM provider abstraction layer
pub mod llm;

/// Speech synthesis and recognition
pub mod speech;

/// Remote conversation store adapter
pub mod store;

/// Static judge persona catalog
pub mod persona;

/// Conversation turn-taking with a judge
pub mod dialogue;

/// Post-session performance review
pub mod reviewer;

/// LLM-generated profiles for custom judges
pub mod profile;

/// Streaming-avatar session tokens
pub mod avatar;

/// Process-wide service wiring
pub mod services;

mod net;

/// In-memory doubles for tests
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use services::Services;

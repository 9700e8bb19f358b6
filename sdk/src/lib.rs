//! Pitchd SDK
//!
//! Shared data model and error taxonomy used by the engine and the HTTP
//! surface. This crate performs no I/O.

/// Error types and handling
pub mod errors;

/// Personas, conversations, messages and review output
pub mod types;

// Re-export commonly used types
pub use errors::{PitchError, PitchErrorExt, Result};
pub use types::{
    Conversation, ConversationId, InvestmentMemo, InvestmentStyle, JudgeProfile, Message,
    MicroExpression, PerformanceAnalysis, Persona, PresentationMetrics, ScoringWeights, Sender,
};

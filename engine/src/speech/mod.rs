//! Speech Adapter
//!
//! Text to audio and audio to text, one external call each. The adapter keeps
//! no state besides its HTTP client.

use async_trait::async_trait;
use base64::Engine as _;
use sdk::errors::Result;

pub mod elevenlabs;

pub use elevenlabs::ElevenLabsSpeech;

/// Voice used for any persona without an entry in [`VOICES`]
pub const DEFAULT_VOICE: &str = "21m00Tcm4TlvDq8ikWAM";

/// Static persona id to voice id table
pub const VOICES: [(&str, &str); 3] = [
    ("altman", DEFAULT_VOICE),
    ("elon", "pNInz6obpgDQGcFmaJgB"),
    ("zuck", "ErXwobaYiN019PkySvjV"),
];

/// Resolve the voice for a persona; unknown or absent ids get the default voice
pub fn voice_for(persona_id: Option<&str>) -> &'static str {
    persona_id
        .and_then(|id| {
            VOICES
                .iter()
                .find(|(persona, _)| *persona == id)
                .map(|(_, voice)| *voice)
        })
        .unwrap_or(DEFAULT_VOICE)
}

/// Standard base64 for audio embedded in JSON responses
pub fn encode_base64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// An uploaded audio clip
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime_type: String,
}

impl AudioClip {
    pub fn new(
        bytes: Vec<u8>,
        file_name: Option<String>,
        mime_type: Option<String>,
    ) -> Self {
        Self {
            bytes,
            file_name: file_name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "audio.webm".to_string()),
            mime_type: mime_type
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "audio/webm".to_string()),
        }
    }
}

#[async_trait]
pub trait SpeechService: Send + Sync {
    /// Render `text` in the persona's voice; returns the whole encoded clip
    async fn synthesize(&self, text: &str, persona_id: Option<&str>) -> Result<Vec<u8>>;

    /// Recognize the speech in `clip`
    async fn transcribe(&self, clip: AudioClip) -> Result<String>;
}

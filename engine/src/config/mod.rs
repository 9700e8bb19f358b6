//! Configuration management
//!
//! This module handles loading and validation of the server configuration.
//! Configuration is stored in TOML format at ~/.pitchd/config.toml; every
//! section and field has a default, so a missing file is not an error.
//!
//! # Configuration Sections
//!
//! - **server**: Bind address, log level, CORS origins, upload limit
//! - **llm**: Chat-completions endpoint, model and sampling temperatures
//! - **speech**: Text-to-speech / speech-to-text endpoint, models and timeout
//! - **avatar**: Streaming-avatar token request timeout
//!
//! Credentials are never read from this file. They come from the environment
//! through [`crate::secrets::Credentials`].
//!
//! # Examples
//!
//! ```no_run
//! use pitch_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_default()?;
//! println!("Binding to {}", config.server.bind);
//! println!("Model: {}", config.llm.model);
//! # Ok(())
//! # }
//! ```

use sdk::errors::PitchError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// LLM provider configuration
    #[serde(default)]
    pub llm: LLMConfig,

    /// Speech provider configuration
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Avatar provider configuration
    #[serde(default)]
    pub avatar: AvatarConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Allowed CORS origins; `*` allows any origin
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Largest accepted request body, in bytes (audio uploads)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_openai_model")]
    pub model: String,

    /// Sampling temperature for judge replies
    #[serde(default = "default_reply_temperature")]
    pub reply_temperature: f32,

    /// Sampling temperature for the memo and rubric calls
    #[serde(default = "default_analysis_temperature")]
    pub analysis_temperature: f32,

    /// Sampling temperature for custom judge profiles
    #[serde(default = "default_profile_temperature")]
    pub profile_temperature: f32,
    // Note: API key comes from OPENAI_API_KEY, not from config
}

/// Speech provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Base URL of the ElevenLabs API
    #[serde(default = "default_speech_base_url")]
    pub base_url: String,

    /// Text-to-speech model
    #[serde(default = "default_tts_model")]
    pub tts_model: String,

    /// Text-to-speech output encoding
    #[serde(default = "default_output_format")]
    pub output_format: String,

    /// Speech-to-text model
    #[serde(default = "default_stt_model")]
    pub stt_model: String,

    /// Request timeout in seconds, applied to both directions
    #[serde(default = "default_speech_timeout")]
    pub timeout_secs: u64,
}

/// Avatar provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarConfig {
    /// Token request timeout in seconds
    #[serde(default = "default_avatar_timeout")]
    pub timeout_secs: u64,
    // Note: base URL and API key come from HEYGEN_API_URL / HEYGEN_API_KEY
}

impl SpeechConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AvatarConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// Default value functions
fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_max_upload_bytes() -> usize {
    25 * 1024 * 1024
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_reply_temperature() -> f32 {
    0.8
}

fn default_analysis_temperature() -> f32 {
    0.7
}

fn default_profile_temperature() -> f32 {
    0.8
}

fn default_speech_base_url() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_tts_model() -> String {
    "eleven_turbo_v2_5".to_string()
}

fn default_output_format() -> String {
    "mp3_22050_32".to_string()
}

fn default_stt_model() -> String {
    "scribe_v1".to_string()
}

fn default_speech_timeout() -> u64 {
    60
}

fn default_avatar_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            log_level: default_log_level(),
            cors_origins: default_cors_origins(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            model: default_openai_model(),
            reply_temperature: default_reply_temperature(),
            analysis_temperature: default_analysis_temperature(),
            profile_temperature: default_profile_temperature(),
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            base_url: default_speech_base_url(),
            tts_model: default_tts_model(),
            output_format: default_output_format(),
            stt_model: default_stt_model(),
            timeout_secs: default_speech_timeout(),
        }
    }
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_avatar_timeout(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.pitchd/config.toml)
    ///
    /// Falls back to built-in defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed or
    /// validated.
    pub fn load_or_default() -> Result<Self, PitchError> {
        match Self::default_config_path() {
            Ok(path) if path.exists() => Self::load_from_path(&path),
            _ => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Load configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_from_path(path: &Path) -> Result<Self, PitchError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| PitchError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self, PitchError> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| PitchError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path (~/.pitchd/config.toml)
    pub fn default_config_path() -> Result<PathBuf, PitchError> {
        let home = dirs::home_dir()
            .ok_or_else(|| PitchError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".pitchd").join("config.toml"))
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The log level is unknown
    /// - The bind address is not a socket address
    /// - A temperature is outside 0.0-2.0
    /// - A timeout or the upload limit is zero
    pub fn validate(&self) -> Result<(), PitchError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.server.log_level.as_str()) {
            return Err(PitchError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.server.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if self.server.bind.parse::<std::net::SocketAddr>().is_err() {
            return Err(PitchError::Config(format!(
                "Invalid bind address '{}'",
                self.server.bind
            )));
        }

        if self.server.max_upload_bytes == 0 {
            return Err(PitchError::Config(
                "max_upload_bytes must be greater than zero".to_string(),
            ));
        }

        let temperatures = [
            ("reply_temperature", self.llm.reply_temperature),
            ("analysis_temperature", self.llm.analysis_temperature),
            ("profile_temperature", self.llm.profile_temperature),
        ];
        for (name, value) in temperatures {
            if !(0.0..=2.0).contains(&value) {
                return Err(PitchError::Config(format!(
                    "{} must be between 0.0 and 2.0",
                    name
                )));
            }
        }

        if self.speech.timeout_secs == 0 || self.avatar.timeout_secs == 0 {
            return Err(PitchError::Config(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

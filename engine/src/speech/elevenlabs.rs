use super::{voice_for, AudioClip, SpeechService};
use crate::config::SpeechConfig;
use crate::net::{error_body, join_url, transport_error};
use crate::secrets::{CredentialKey, Credentials};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::multipart;
use sdk::errors::{PitchError, Result};
use serde_json::json;
use std::sync::Arc;

const PROVIDER: &str = "ElevenLabs";

/// ElevenLabs text-to-speech and speech-to-text client.
pub struct ElevenLabsSpeech {
    config: SpeechConfig,
    credentials: Arc<Credentials>,
    client: reqwest::Client,
}

impl ElevenLabsSpeech {
    pub fn new(config: SpeechConfig, credentials: Arc<Credentials>) -> Self {
        Self {
            config,
            credentials,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SpeechService for ElevenLabsSpeech {
    async fn synthesize(&self, text: &str, persona_id: Option<&str>) -> Result<Vec<u8>> {
        let api_key = self.credentials.require(CredentialKey::ElevenLabsApiKey)?;
        let voice = voice_for(persona_id);
        let url = join_url(
            &self.config.base_url,
            &format!("v1/text-to-speech/{}", voice),
        );

        let payload = json!({
            "text": text,
            "model_id": self.config.tts_model,
            "voice_settings": {
                "stability": 0.5,
                "similarity_boost": 0.75,
                "style": 0.0,
                "use_speaker_boost": true
            }
        });

        tracing::debug!("Synthesizing {} chars with voice {}", text.len(), voice);

        let response = self
            .client
            .post(&url)
            .query(&[
                ("optimize_streaming_latency", "0"),
                ("output_format", self.config.output_format.as_str()),
            ])
            .header("xi-api-key", api_key.unsecure())
            .header("Accept", "audio/mpeg")
            .json(&payload)
            .timeout(self.config.timeout())
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            tracing::warn!("Text-to-speech failed ({}): {}", status, body);
            return Err(PitchError::upstream_status(
                status.as_u16(),
                format!("Text-to-speech failed: {}", body),
            ));
        }

        let mut audio = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| transport_error(PROVIDER, e))?;
            audio.extend_from_slice(&chunk);
        }

        tracing::debug!("Synthesized {} bytes of audio", audio.len());
        Ok(audio)
    }

    async fn transcribe(&self, clip: AudioClip) -> Result<String> {
        let api_key = self.credentials.require(CredentialKey::ElevenLabsApiKey)?;
        let url = join_url(&self.config.base_url, "v1/speech-to-text");

        let size = clip.bytes.len();
        let audio_part = multipart::Part::bytes(clip.bytes)
            .file_name(clip.file_name)
            .mime_str(&clip.mime_type)
            .map_err(|e| PitchError::Validation(format!("Invalid audio content type: {}", e)))?;

        let form = multipart::Form::new()
            .part("audio", audio_part)
            .text("model_id", self.config.stt_model.clone());

        tracing::debug!("Transcribing {} bytes of {}", size, clip.mime_type);

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", api_key.unsecure())
            .multipart(form)
            .timeout(self.config.timeout())
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            tracing::warn!("Transcription failed ({}): {}", status, body);
            return Err(PitchError::Transcription {
                status: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PitchError::upstream(format!("Failed to parse transcription: {}", e)))?;

        Ok(json["text"].as_str().unwrap_or_default().trim().to_string())
    }
}

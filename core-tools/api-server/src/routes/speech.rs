use crate::auth::BearerToken;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use pitch_engine::speech::AudioClip;
use sdk::{ConversationId, PitchError};
use serde::{Deserialize, Serialize};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stt", post(stt_handler))
        .route("/audio-with-judge", post(audio_with_judge_handler))
        .route("/tts", post(tts_handler))
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub transcript: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioWithJudgeResponse {
    pub transcript: String,
    pub judge_reply: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TtsRequest {
    pub text: String,
    #[serde(default)]
    pub judge: Option<String>,
}

/// Parts of an audio upload form
#[derive(Debug, Default)]
struct AudioUpload {
    clip: Option<AudioClip>,
    conversation_id: Option<ConversationId>,
}

async fn read_upload(multipart: Result<Multipart, MultipartRejection>) -> ApiResult<AudioUpload> {
    let mut multipart = multipart?;
    let mut upload = AudioUpload::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("audio") => {
                let file_name = field.file_name().map(str::to_string);
                let mime_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                upload.clip = Some(AudioClip::new(bytes.to_vec(), file_name, mime_type));
            }
            Some("conversation_id") | Some("conversationId") => {
                let value = field.text().await?;
                let value = value.trim();
                if !value.is_empty() {
                    upload.conversation_id = Some(ConversationId::new(value));
                }
            }
            other => {
                tracing::debug!("Ignoring upload field {:?}", other);
            }
        }
    }

    Ok(upload)
}

fn require_audio(upload: &mut AudioUpload) -> ApiResult<AudioClip> {
    let clip = upload
        .clip
        .take()
        .ok_or_else(|| PitchError::Validation("No audio file provided".to_string()))?;
    if clip.bytes.is_empty() {
        return Err(ApiError(PitchError::Validation(
            "Audio file is empty".to_string(),
        )));
    }
    Ok(clip)
}

async fn stt_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<TranscriptResponse>> {
    let mut upload = read_upload(multipart).await?;
    let clip = require_audio(&mut upload)?;

    let transcript = state.services.speech.transcribe(clip).await?;
    Ok(Json(TranscriptResponse { transcript }))
}

/// Transcribe, then let the judge answer when a conversation and a token are
/// supplied. Judge failures leave `judgeReply` null.
async fn audio_with_judge_handler(
    State(state): State<AppState>,
    token: Option<BearerToken>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<AudioWithJudgeResponse>> {
    let mut upload = read_upload(multipart).await?;
    let clip = require_audio(&mut upload)?;

    let transcript = state.services.speech.transcribe(clip).await?;

    let judge_reply = match (upload.conversation_id, token) {
        (Some(id), Some(token)) if !transcript.trim().is_empty() => {
            match state
                .services
                .dialogue
                .respond(token.secret(), &id, &transcript)
                .await
            {
                Ok(reply) => Some(reply.text),
                Err(e) => {
                    tracing::warn!("Judge reply failed for {}: {}", id, e);
                    None
                }
            }
        }
        _ => None,
    };

    Ok(Json(AudioWithJudgeResponse {
        transcript,
        judge_reply,
    }))
}

async fn tts_handler(
    State(state): State<AppState>,
    payload: Result<Json<TtsRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = payload?;
    if request.text.trim().is_empty() {
        return Err(ApiError(PitchError::Validation(
            "Text must not be empty".to_string(),
        )));
    }

    let audio = state
        .services
        .speech
        .synthesize(&request.text, request.judge.as_deref())
        .await?;

    Ok(([(CONTENT_TYPE, "audio/mpeg")], audio).into_response())
}

use crate::auth::BearerToken;
use crate::error::ApiResult;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use pitch_engine::persona::scoring_weights;
use pitch_engine::profile::ProfileRequest;
use pitch_engine::speech::encode_base64;
use sdk::{ConversationId, InvestmentMemo, JudgeProfile, Persona, PresentationMetrics, ScoringWeights};
use serde::{Deserialize, Serialize};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/select", post(select_handler))
        .route("/generate", post(generate_handler))
        .route("/end", post(end_handler))
        .route("/get_score", post(score_handler))
        .route("/get_judges", get(list_handler))
        .route("/generate-personality", post(personality_handler))
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub judge: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectResponse {
    pub conversation_id: ConversationId,
    pub judge: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(alias = "conversation_id")]
    pub conversation_id: ConversationId,
    #[serde(alias = "new_message")]
    pub new_message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub judge_reply: String,
    pub audio_base64: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRequest {
    #[serde(alias = "conversation_id")]
    pub conversation_id: ConversationId,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub memo: InvestmentMemo,
    pub metrics: PresentationMetrics,
}

/// Catalog entry with the judge's derived weights
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeSummary {
    #[serde(flatten)]
    pub persona: Persona,
    pub scoring_weights: ScoringWeights,
}

#[derive(Debug, Serialize)]
pub struct JudgesResponse {
    pub judges: Vec<JudgeSummary>,
}

async fn select_handler(
    State(state): State<AppState>,
    token: BearerToken,
    payload: Result<Json<SelectRequest>, JsonRejection>,
) -> ApiResult<Json<SelectResponse>> {
    let Json(request) = payload?;
    let started = state
        .services
        .dialogue
        .start(token.secret(), request.judge.trim())
        .await?;

    Ok(Json(SelectResponse {
        conversation_id: started.conversation.id,
        judge: started.persona.id,
    }))
}

async fn generate_handler(
    State(state): State<AppState>,
    token: BearerToken,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> ApiResult<Json<GenerateResponse>> {
    let Json(request) = payload?;
    let reply = state
        .services
        .dialogue
        .generate_reply(token.secret(), &request.conversation_id, &request.new_message)
        .await?;

    Ok(Json(GenerateResponse {
        judge_reply: reply.text,
        audio_base64: reply.audio.as_deref().map(encode_base64),
    }))
}

async fn end_handler(
    State(state): State<AppState>,
    token: BearerToken,
    payload: Result<Json<ConversationRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(request) = payload?;
    state
        .services
        .dialogue
        .end(token.secret(), &request.conversation_id)
        .await?;

    Ok(Json(MessageResponse {
        message: "Conversation ended".to_string(),
    }))
}

async fn score_handler(
    State(state): State<AppState>,
    token: BearerToken,
    payload: Result<Json<ConversationRequest>, JsonRejection>,
) -> ApiResult<Json<ScoreResponse>> {
    let Json(request) = payload?;
    let analysis = state
        .services
        .reviewer
        .analyze(token.secret(), &request.conversation_id)
        .await?;

    Ok(Json(ScoreResponse {
        memo: analysis.investment_memo,
        metrics: analysis.presentation_metrics,
    }))
}

async fn list_handler(State(state): State<AppState>) -> Json<JudgesResponse> {
    let judges = state
        .services
        .catalog
        .all()
        .iter()
        .map(|persona| JudgeSummary {
            scoring_weights: scoring_weights(persona.investment_style),
            persona: persona.clone(),
        })
        .collect();

    Json(JudgesResponse { judges })
}

async fn personality_handler(
    State(state): State<AppState>,
    payload: Result<Json<ProfileRequest>, JsonRejection>,
) -> ApiResult<Json<JudgeProfile>> {
    let Json(request) = payload?;
    let profile = state.services.profiles.generate(&request).await?;
    Ok(Json(profile))
}

use super::judges::ConversationRequest;
use crate::auth::BearerToken;
use crate::error::ApiResult;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use sdk::PerformanceAnalysis;

pub fn routes() -> Router<AppState> {
    Router::new().route("/analyze", post(analyze_handler))
}

/// Investment memo plus presentation rubric for a finished pitch
async fn analyze_handler(
    State(state): State<AppState>,
    token: BearerToken,
    payload: Result<Json<ConversationRequest>, JsonRejection>,
) -> ApiResult<Json<PerformanceAnalysis>> {
    let Json(request) = payload?;
    tracing::info!("Performance analysis requested for {}", request.conversation_id);

    let analysis = state
        .services
        .reviewer
        .analyze(token.secret(), &request.conversation_id)
        .await?;

    tracing::info!(
        "Analysis complete for {}: overall {}",
        request.conversation_id,
        analysis.overall_score
    );
    Ok(Json(analysis))
}

use crate::error::ApiResult;
use crate::state::AppState;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;

pub fn routes() -> Router<AppState> {
    Router::new().route("/token", post(token_handler))
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

async fn token_handler(State(state): State<AppState>) -> ApiResult<Json<TokenResponse>> {
    let token = state.services.avatar.create_token().await?;
    Ok(Json(TokenResponse { token }))
}

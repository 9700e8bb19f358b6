//! Route table
//!
//! - `GET  /`                            welcome message
//! - `GET  /status`                      server status
//! - `POST /judges/select`               start a conversation with a judge
//! - `POST /judges/generate`             judge reply (+ audio)
//! - `POST /judges/end`                  end a conversation
//! - `POST /judges/get_score`            memo and rubric
//! - `GET  /judges/get_judges`           judge catalog
//! - `POST /judges/generate-personality` custom judge profile
//! - `POST /performance/analyze`         full performance review
//! - `POST /elevenlabs/stt`              transcription
//! - `POST /elevenlabs/audio-with-judge` transcription + judge reply
//! - `POST /elevenlabs/tts`              synthesis
//! - `POST /heygen/token`                streaming-avatar token

use crate::state::AppState;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

pub mod avatar;
pub mod judges;
pub mod performance;
pub mod speech;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root_handler))
        .route("/status", get(status_handler))
        .nest("/judges", judges::routes())
        .nest("/performance", performance::routes())
        .nest("/elevenlabs", speech::routes())
        .nest("/heygen", avatar::routes())
}

async fn root_handler() -> Json<Value> {
    Json(json!({ "message": "Welcome to the Judge API" }))
}

/// Server status API endpoint
async fn status_handler() -> Json<Value> {
    Json(json!({
        "status": "running",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

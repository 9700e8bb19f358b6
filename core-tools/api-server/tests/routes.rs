//! End-to-end tests of the HTTP surface against in-memory providers

use api_server::{app, AppState};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use pitch_engine::avatar::AvatarTokenSource;
use pitch_engine::config::{Config, LLMConfig, ServerConfig};
use pitch_engine::llm::ChatModel;
use pitch_engine::persona::PersonaCatalog;
use pitch_engine::speech::{encode_base64, SpeechService};
use pitch_engine::store::ConversationStore;
use pitch_engine::testing::{FakeAvatar, FakeSpeech, InMemoryStore, ScriptedModel, FAKE_AUDIO};
use pitch_engine::Services;
use sdk::{ConversationId, Sender};
use serde_json::{json, Value};
use std::io::Write;
use std::sync::Arc;
use tower::ServiceExt;

const TOKEN: &str = "session-token";
const USER: &str = "user-1";
const JUDGE_REPLY: &str = "What is your customer acquisition cost?";
const BOUNDARY: &str = "pitchd-test-boundary";

struct Harness {
    store: Arc<InMemoryStore>,
    model: Arc<ScriptedModel>,
    speech: Arc<FakeSpeech>,
    app: Router,
}

impl Harness {
    fn new() -> Self {
        Self::with(FakeSpeech::new(), FakeAvatar::new("heygen-session-token"))
    }

    fn with(speech: FakeSpeech, avatar: FakeAvatar) -> Self {
        let store = Arc::new(InMemoryStore::new().with_session(TOKEN, USER));
        let model = Arc::new(ScriptedModel::new(JUDGE_REPLY));
        let speech = Arc::new(speech);

        let services = Services::assemble(
            &LLMConfig::default(),
            Arc::new(PersonaCatalog::builtin()),
            Arc::clone(&store) as Arc<dyn ConversationStore>,
            Arc::clone(&model) as Arc<dyn ChatModel>,
            Arc::clone(&speech) as Arc<dyn SpeechService>,
            Arc::new(avatar) as Arc<dyn AvatarTokenSource>,
        );
        let app = app(AppState::new(services), &ServerConfig::default());

        Self {
            store,
            model,
            speech,
            app,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    async fn post_json(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();
        let (status, bytes) = self.send(request).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let (status, bytes) = self.send(request).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn post_upload(
        &self,
        uri: &str,
        token: Option<&str>,
        audio: Option<&[u8]>,
        conversation_id: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut body: Vec<u8> = Vec::new();
        if let Some(audio) = audio {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"audio\"; filename=\"pitch.webm\"\r\nContent-Type: audio/webm\r\n\r\n",
                    BOUNDARY
                )
                .as_bytes(),
            );
            body.extend_from_slice(audio);
            body.extend_from_slice(b"\r\n");
        }
        if let Some(id) = conversation_id {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"conversation_id\"\r\n\r\n{}\r\n",
                    BOUNDARY, id
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        let mut builder = Request::builder().method("POST").uri(uri).header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let (status, bytes) = self.send(builder.body(Body::from(body)).unwrap()).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn start(&self, judge: &str) -> ConversationId {
        let (status, body) = self
            .post_json("/judges/select", Some(TOKEN), json!({ "judge": judge }))
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        ConversationId::new(body["conversationId"].as_str().unwrap())
    }
}

#[tokio::test]
async fn test_root_and_status() {
    let harness = Harness::new();

    let (status, body) = harness.get_json("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Welcome to the Judge API");

    let (status, body) = harness.get_json("/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_select_starts_conversation_with_persona_prompt() {
    let harness = Harness::new();

    let (status, body) = harness
        .post_json("/judges/select", Some(TOKEN), json!({ "judge": "elon" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["judge"], "elon");

    let id = ConversationId::new(body["conversationId"].as_str().unwrap());
    let conversation = harness.store.conversation(&id).unwrap();
    assert_eq!(conversation.user_id, USER);
    assert_eq!(conversation.judge_id.as_deref(), Some("elon"));

    let messages = harness.store.messages_for(&id);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].sender, Sender::System);
}

#[tokio::test]
async fn test_select_unknown_judge_writes_nothing() {
    let harness = Harness::new();

    let (status, body) = harness
        .post_json("/judges/select", Some(TOKEN), json!({ "judge": "gandalf" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("Invalid judge 'gandalf'"));
    assert_eq!(harness.store.conversation_count(), 0);
}

#[tokio::test]
async fn test_missing_and_malformed_bearer() {
    let harness = Harness::new();

    let (status, body) = harness
        .post_json("/judges/select", None, json!({ "judge": "elon" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Missing authorization header");

    let request = Request::builder()
        .method("POST")
        .uri("/judges/select")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, "Token abc")
        .body(Body::from(json!({ "judge": "elon" }).to_string()))
        .unwrap();
    let (status, _) = harness.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = harness
        .post_json("/judges/select", Some("expired"), json!({ "judge": "elon" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(harness.store.conversation_count(), 0);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let harness = Harness::new();

    let request = Request::builder()
        .method("POST")
        .uri("/judges/generate")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
        .body(Body::from("{\"conversationId\":"))
        .unwrap();
    let (status, bytes) = harness.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_generate_appends_turn_and_returns_audio() {
    let harness = Harness::new();
    let id = harness.start("altman").await;

    let (status, body) = harness
        .post_json(
            "/judges/generate",
            Some(TOKEN),
            json!({ "conversationId": id, "newMessage": "We sell lab equipment." }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["judgeReply"], JUDGE_REPLY);
    assert_eq!(body["audioBase64"], encode_base64(FAKE_AUDIO));

    let messages = harness.store.messages_for(&id);
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].sender, Sender::User);
    assert_eq!(messages[1].content, "We sell lab equipment.");
    assert_eq!(messages[2].sender, Sender::Assistant);
    assert_eq!(messages[2].content, JUDGE_REPLY);

    let calls = harness.speech.synthesis_calls();
    assert_eq!(calls, vec![(JUDGE_REPLY.to_string(), Some("altman".to_string()))]);
}

#[tokio::test]
async fn test_generate_accepts_snake_case_fields() {
    let harness = Harness::new();
    let id = harness.start("zuck").await;

    let (status, body) = harness
        .post_json(
            "/judges/generate",
            Some(TOKEN),
            json!({ "conversation_id": id, "new_message": "Hello" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(harness.store.messages_for(&id).len(), 3);
}

#[tokio::test]
async fn test_generate_survives_synthesis_failure() {
    let harness = Harness::with(
        FakeSpeech::new().failing_synthesis(),
        FakeAvatar::new("unused"),
    );
    let id = harness.start("elon").await;

    let (status, body) = harness
        .post_json(
            "/judges/generate",
            Some(TOKEN),
            json!({ "conversationId": id, "newMessage": "Mars logistics." }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["judgeReply"], JUDGE_REPLY);
    assert!(body["audioBase64"].is_null());
    assert_eq!(harness.store.messages_for(&id).len(), 3);
}

#[tokio::test]
async fn test_end_clears_messages_and_blocks_further_turns() {
    let harness = Harness::new();
    let id = harness.start("elon").await;

    let (status, body) = harness
        .post_json("/judges/end", Some(TOKEN), json!({ "conversationId": id }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Conversation ended");
    assert!(harness.store.messages_for(&id).is_empty());
    assert!(harness.store.conversation(&id).is_some());

    let (status, body) = harness
        .post_json(
            "/judges/generate",
            Some(TOKEN),
            json!({ "conversationId": id, "newMessage": "Still there?" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Conversation not found or empty");
    assert_eq!(harness.model.call_count(), 0);
}

#[tokio::test]
async fn test_end_of_foreign_or_missing_conversation_is_not_found() {
    let harness = Harness::new();
    let id = harness.start("elon").await;
    harness.store.add_session("rival-token", "user-2");

    let (status, body) = harness
        .post_json("/judges/end", Some("rival-token"), json!({ "conversationId": id }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Conversation not found");
    assert_eq!(harness.store.messages_for(&id).len(), 1);

    let (status, _) = harness
        .post_json(
            "/judges/end",
            Some(TOKEN),
            json!({ "conversationId": "does-not-exist" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The owner can end it, twice
    for _ in 0..2 {
        let (status, _) = harness
            .post_json("/judges/end", Some(TOKEN), json!({ "conversationId": id }))
            .await;
        assert_eq!(status, StatusCode::OK);
    }
    assert!(harness.store.messages_for(&id).is_empty());
}

#[tokio::test]
async fn test_analyze_without_history_is_not_found() {
    let harness = Harness::new();
    let id = harness.store.seed_conversation(USER, Some("elon"), &[]);

    let (status, body) = harness
        .post_json("/performance/analyze", Some(TOKEN), json!({ "conversationId": id }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["detail"],
        "No conversation history found. Please complete a pitch session first."
    );
    assert_eq!(harness.model.call_count(), 0);
}

#[tokio::test]
async fn test_analyze_clamps_rubric() {
    let harness = Harness::new();
    let id = harness.store.seed_conversation(
        USER,
        Some("altman"),
        &[
            (Sender::System, "You are Sam Altman"),
            (Sender::User, "We automate clinical trial matching."),
            (Sender::Assistant, "How big is the market?"),
        ],
    );
    harness.model.push_reply("not a memo");
    harness.model.push_reply(
        json!({
            "clarity": 8.5,
            "confidence": 12,
            "engagement": 6,
            "structure": -1,
            "delivery": 7.5,
            "overall": 7.8
        })
        .to_string(),
    );

    let (status, body) = harness
        .post_json("/performance/analyze", Some(TOKEN), json!({ "conversationId": id }))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let metrics = &body["presentationMetrics"];
    assert_eq!(metrics["clarity"], 8.5);
    assert_eq!(metrics["confidence"], 10.0);
    assert_eq!(metrics["structure"], 0.0);
    assert_eq!(body["overallScore"], 7.8);
    assert!(body["investmentMemo"]["recommendation"]
        .as_str()
        .unwrap()
        .starts_with("HOLD"));
    assert_eq!(harness.model.call_count(), 2);
}

#[tokio::test]
async fn test_score_falls_back_on_malformed_rubric() {
    let harness = Harness::new();
    let id = harness.store.seed_conversation(
        USER,
        Some("zuck"),
        &[
            (Sender::User, "We build social fitness apps."),
            (Sender::Assistant, "What is retention at day 30?"),
        ],
    );
    harness.model.push_reply("no memo today");
    harness.model.push_reply("{\"clarity\": \"great\"");

    let (status, body) = harness
        .post_json("/judges/get_score", Some(TOKEN), json!({ "conversationId": id }))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["metrics"]["overall"], 7.0);
    assert_eq!(body["metrics"]["clarity"], 7.0);
    assert!(body["memo"].is_object());
}

#[tokio::test]
async fn test_get_judges_lists_catalog_with_weights() {
    let harness = Harness::new();

    let (status, body) = harness.get_json("/judges/get_judges").await;
    assert_eq!(status, StatusCode::OK);

    let judges = body["judges"].as_array().unwrap();
    assert_eq!(judges.len(), PersonaCatalog::builtin().all().len());
    for judge in judges {
        assert!(judge["id"].is_string());
        assert!(judge["name"].is_string());
        let weights = judge["scoringWeights"].as_object().unwrap();
        let total: f64 = weights.values().map(|v| v.as_f64().unwrap()).sum();
        assert!((total - 1.0).abs() < 1e-9, "weights sum to {}", total);
    }
    assert!(judges.iter().any(|j| j["id"] == "altman"));
}

#[tokio::test]
async fn test_generate_personality_validates_and_falls_back() {
    let harness = Harness::new();

    let (status, body) = harness
        .post_json(
            "/judges/generate-personality",
            None,
            json!({ "name": "Ada", "specialties": [] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["detail"],
        "Name, specialties, and investment style are required"
    );
    assert_eq!(harness.model.call_count(), 0);

    harness.model.push_reply("I cannot produce JSON");
    let (status, body) = harness
        .post_json(
            "/judges/generate-personality",
            None,
            json!({
                "name": "Ada",
                "specialties": ["fintech"],
                "investmentStyle": "analytical"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(body["personality"].as_str().unwrap().contains("Ada"));
    assert!(body["scoringCriteria"].is_object());
}

#[tokio::test]
async fn test_stt_transcribes_upload() {
    let harness = Harness::with(
        FakeSpeech::new().with_transcript("Our burn rate is low."),
        FakeAvatar::new("unused"),
    );

    let (status, body) = harness
        .post_upload("/elevenlabs/stt", None, Some(b"webm-bytes"), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["transcript"], "Our burn rate is low.");

    let clips = harness.speech.transcriptions();
    assert_eq!(clips.len(), 1);
    assert_eq!(clips[0].bytes, b"webm-bytes".to_vec());
    assert_eq!(clips[0].file_name, "pitch.webm");
    assert_eq!(clips[0].mime_type, "audio/webm");
}

#[tokio::test]
async fn test_stt_rejects_missing_or_empty_audio() {
    let harness = Harness::new();

    let (status, body) = harness.post_upload("/elevenlabs/stt", None, None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "No audio file provided");

    let (status, body) = harness
        .post_upload("/elevenlabs/stt", None, Some(b""), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Audio file is empty");
    assert!(harness.speech.transcriptions().is_empty());
}

#[tokio::test]
async fn test_stt_forwards_provider_status() {
    let harness = Harness::with(
        FakeSpeech::new().failing_transcription(422, "unsupported format"),
        FakeAvatar::new("unused"),
    );

    let (status, body) = harness
        .post_upload("/elevenlabs/stt", None, Some(b"bytes"), None)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"], "Transcription failed (422): unsupported format");
}

#[tokio::test]
async fn test_audio_with_judge_replies_in_conversation() {
    let harness = Harness::with(
        FakeSpeech::new().with_transcript("We have ten paying customers."),
        FakeAvatar::new("unused"),
    );
    let id = harness.start("elon").await;

    let (status, body) = harness
        .post_upload(
            "/elevenlabs/audio-with-judge",
            Some(TOKEN),
            Some(b"bytes"),
            Some(id.as_str()),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["transcript"], "We have ten paying customers.");
    assert_eq!(body["judgeReply"], JUDGE_REPLY);

    let messages = harness.store.messages_for(&id);
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].content, "We have ten paying customers.");
}

#[tokio::test]
async fn test_audio_with_judge_swallows_judge_failure() {
    let harness = Harness::new();

    let (status, body) = harness
        .post_upload(
            "/elevenlabs/audio-with-judge",
            Some(TOKEN),
            Some(b"bytes"),
            Some("conv-404"),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(body["transcript"].is_string());
    assert!(body["judgeReply"].is_null());

    // Without a token no judge call is attempted
    let (status, body) = harness
        .post_upload("/elevenlabs/audio-with-judge", None, Some(b"bytes"), Some("conv-1"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["judgeReply"].is_null());
    assert_eq!(harness.model.call_count(), 0);
}

#[tokio::test]
async fn test_tts_returns_mpeg() {
    let harness = Harness::new();

    let request = Request::builder()
        .method("POST")
        .uri("/elevenlabs/tts")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "text": "Pass.", "judge": "zuck" }).to_string()))
        .unwrap();
    let response = harness.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(bytes.as_ref(), FAKE_AUDIO);

    let (status, _) = harness
        .post_json("/elevenlabs/tts", None, json!({ "text": "   " }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_heygen_token() {
    let harness = Harness::new();
    let (status, body) = harness.post_json("/heygen/token", None, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token"], "heygen-session-token");

    let harness = Harness::with(FakeSpeech::new(), FakeAvatar::unreachable());
    let (status, body) = harness.post_json("/heygen/token", None, json!({})).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["detail"], "Failed to connect to HeyGen API");
}

#[tokio::test]
async fn test_router_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[server]\nbind = \"0.0.0.0:9000\"\ncors_origins = [\"http://localhost:3000\"]\nmax_upload_bytes = 1024"
    )
    .unwrap();

    let config = Config::load_from_path(file.path()).unwrap();
    assert_eq!(config.server.bind, "0.0.0.0:9000");

    let store = Arc::new(InMemoryStore::new());
    let services = Services::assemble(
        &config.llm,
        Arc::new(PersonaCatalog::builtin()),
        store as Arc<dyn ConversationStore>,
        Arc::new(ScriptedModel::new("ok")) as Arc<dyn ChatModel>,
        Arc::new(FakeSpeech::new()) as Arc<dyn SpeechService>,
        Arc::new(FakeAvatar::new("t")) as Arc<dyn AvatarTokenSource>,
    );
    let router = app(AppState::new(services), &config.server);

    // Bodies above the configured limit are refused before reaching a handler
    let oversized = vec![b'a'; 4096];
    let request = Request::builder()
        .method("POST")
        .uri("/elevenlabs/tts")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "text": String::from_utf8(oversized).unwrap() }).to_string(),
        ))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

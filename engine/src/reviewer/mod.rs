//! Performance Reviewer
//!
//! Replays a finished pitch into two independent JSON-mode model calls: an
//! investment memo and a numeric presentation rubric. Output that cannot be
//! parsed is replaced by fixed fallbacks; nothing is persisted.

use crate::llm::{parse_structured, ChatModel, CompletionRequest, Message as ChatMessage};
use crate::secrets::SecretString;
use crate::store::ConversationStore;
use sdk::errors::{PitchError, Result};
use sdk::{ConversationId, InvestmentMemo, Message, PerformanceAnalysis, PresentationMetrics, Sender};
use std::sync::Arc;

const MEMO_SYSTEM_PROMPT: &str =
    "You are a venture capital analyst. Respond only with valid JSON, no markdown.";
const METRICS_SYSTEM_PROMPT: &str =
    "You are a pitch coach. Respond only with valid JSON, no markdown.";

pub struct PerformanceReviewer {
    store: Arc<dyn ConversationStore>,
    model: Arc<dyn ChatModel>,
    temperature: f32,
}

impl PerformanceReviewer {
    pub fn new(store: Arc<dyn ConversationStore>, model: Arc<dyn ChatModel>, temperature: f32) -> Self {
        Self {
            store,
            model,
            temperature,
        }
    }

    /// Review the conversation behind `id`.
    ///
    /// # Errors
    ///
    /// - `Auth` when the store rejects the token
    /// - `NotFound` when there is no history, or only the persona prompt
    /// - Upstream errors from either model call
    pub async fn analyze(&self, token: &SecretString, id: &ConversationId) -> Result<PerformanceAnalysis> {
        self.store.authenticate(token).await?;

        let history = self.store.list_messages(token, id).await?;
        if history.is_empty() {
            return Err(PitchError::NotFound(
                "No conversation history found. Please complete a pitch session first."
                    .to_string(),
            ));
        }

        let transcript = render_transcript(&history);
        if transcript.trim().is_empty() {
            return Err(PitchError::NotFound(
                "No valid conversation content found".to_string(),
            ));
        }
        tracing::info!("Analyzing conversation {} ({} messages)", id, history.len());

        let memo_text = self
            .model
            .complete(&CompletionRequest::json(
                vec![
                    ChatMessage::system(MEMO_SYSTEM_PROMPT),
                    ChatMessage::user(memo_prompt(&transcript)),
                ],
                self.temperature,
            ))
            .await?;

        let metrics_text = self
            .model
            .complete(&CompletionRequest::json(
                vec![
                    ChatMessage::system(METRICS_SYSTEM_PROMPT),
                    ChatMessage::user(metrics_prompt(&transcript)),
                ],
                self.temperature,
            ))
            .await?;

        let investment_memo = parse_structured::<InvestmentMemo>(&memo_text).unwrap_or_else(|| {
            tracing::warn!("Unparseable investment memo for {}, using fallback", id);
            InvestmentMemo::fallback()
        });

        let presentation_metrics = parse_structured::<PresentationMetrics>(&metrics_text)
            .and_then(|m| m.clamped())
            .unwrap_or_else(|| {
                tracing::warn!("Unparseable presentation metrics for {}, using fallback", id);
                PresentationMetrics::fallback()
            });

        Ok(PerformanceAnalysis {
            overall_score: presentation_metrics.overall,
            investment_memo,
            presentation_metrics,
        })
    }
}

/// Render stored messages as a dialogue, skipping the persona prompt
pub fn render_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .filter(|m| m.sender != Sender::System)
        .map(|m| {
            let role = if m.sender == Sender::User {
                "Entrepreneur"
            } else {
                "Judge"
            };
            format!("{}: {}", role, m.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn memo_prompt(transcript: &str) -> String {
    format!(
        r#"
You are an experienced venture capital analyst who has just witnessed a Shark Tank pitch session.
Below is the complete conversation between the entrepreneur and the judges:

{transcript}

Based on this conversation, create a comprehensive investment memo. Analyze the pitch quality, business viability, market opportunity, team competence, and financial projections discussed.

Provide your response in this exact JSON format:
{{
  "recommendation": "A clear BUY/HOLD/PASS recommendation with 1-2 sentence justification",
  "summary": "2-3 sentence executive summary of the business and pitch performance",
  "valueProposition": "What unique value does this business offer? What problem does it solve?",
  "market": "Market size, target audience, growth potential, and competitive landscape discussed",
  "product": "Product/service description, unique features, technology, and differentiation",
  "metrics": "Key business metrics mentioned (revenue, growth rate, customers, retention, etc.) formatted with bullet points using • symbol",
  "risks": "Major risks and challenges identified, formatted with bullet points using • symbol",
  "team": "Team background, expertise, and capability assessment based on the conversation",
  "deal": "Investment ask, valuation, equity offer, and use of funds if mentioned",
  "scenarioAnalysis": "Revenue projections or growth scenarios discussed, formatted as Conservative/Base/Optimistic cases",
  "conclusion": "Final assessment of investment worthiness and key takeaways"
}}

Be specific and reference actual details from the conversation. If information wasn't provided, note that in your analysis.
Return ONLY valid JSON, no markdown formatting.
"#
    )
}

pub fn metrics_prompt(transcript: &str) -> String {
    format!(
        r#"
You are a professional pitch coach and communication expert. Analyze the following pitch conversation:

{transcript}

Evaluate the ENTREPRENEUR'S performance (not the judges) on these dimensions:

1. **Clarity** (0-10): How clearly did they communicate their idea? Were explanations easy to understand?
2. **Confidence** (0-10): How confident and assertive were they? Did they handle questions well?
3. **Engagement** (0-10): How engaging and compelling was their delivery? Did they capture attention?
4. **Structure** (0-10): How well-organized was their pitch? Did they cover all key points logically?
5. **Delivery** (0-10): Quality of communication - pace, enthusiasm, professionalism, handling objections
6. **Overall** (0-10): Overall pitch performance considering all factors

Provide your response in this exact JSON format:
{{
  "clarity": 8.5,
  "confidence": 7.8,
  "engagement": 9.2,
  "structure": 8.0,
  "delivery": 8.7,
  "overall": 8.4
}}

Use decimals (0.0 to 10.0) for precise scoring. Be objective and fair in your assessment.
Return ONLY valid JSON, no markdown formatting.
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LLMError, ResponseFormat};
    use crate::testing::{InMemoryStore, ScriptedModel};

    const TOKEN: &str = "token-founder";

    const MEMO: &str = r#"{
        "recommendation": "BUY - strong traction",
        "summary": "A marketplace for used lab equipment.",
        "valueProposition": "Cheaper equipment for small labs",
        "market": "Academic and biotech labs",
        "product": "Listings with inspection reports",
        "metrics": "• $40k MRR",
        "risks": "• Liability for faulty equipment",
        "team": "Two former lab managers",
        "deal": "$500k for 10%",
        "scenarioAnalysis": "Conservative/Base/Optimistic",
        "conclusion": "Worth a follow-up"
    }"#;

    fn setup(model: ScriptedModel) -> (Arc<InMemoryStore>, Arc<ScriptedModel>, PerformanceReviewer) {
        let store = Arc::new(InMemoryStore::new().with_session(TOKEN, "user-1"));
        let model = Arc::new(model);
        let reviewer = PerformanceReviewer::new(
            Arc::clone(&store) as Arc<dyn ConversationStore>,
            Arc::clone(&model) as Arc<dyn ChatModel>,
            0.7,
        );
        (store, model, reviewer)
    }

    fn message(sender: Sender, content: &str) -> Message {
        Message {
            conversation_id: ConversationId::new("c1"),
            sender,
            content: content.to_string(),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_render_transcript() {
        let transcript = render_transcript(&[
            message(Sender::System, "You are Sam Altman,"),
            message(Sender::User, "We sell shovels."),
            message(Sender::Assistant, "To whom?"),
        ]);
        assert_eq!(transcript, "Entrepreneur: We sell shovels.\n\nJudge: To whom?");
    }

    #[test]
    fn test_prompts_embed_transcript() {
        assert!(memo_prompt("Entrepreneur: hi").contains("Entrepreneur: hi"));
        assert!(memo_prompt("x").contains("\"scenarioAnalysis\""));
        assert!(metrics_prompt("Judge: why").contains("Judge: why"));
    }

    #[tokio::test]
    async fn test_analyze_parses_both_outputs() {
        let (store, model, reviewer) = setup(ScriptedModel::new("{}"));
        let id = store.seed_conversation(
            "user-1",
            Some("altman"),
            &[(Sender::System, "You are Sam Altman,"), (Sender::User, "Pitch"), (Sender::Assistant, "Numbers?")],
        );
        model.push_reply(MEMO);
        model.push_reply(
            r#"{"clarity":8.5,"confidence":7.0,"engagement":9.0,"structure":6.5,"delivery":8.0,"overall":12.0}"#,
        );

        let analysis = reviewer
            .analyze(&SecretString::new(TOKEN), &id)
            .await
            .unwrap();

        assert_eq!(analysis.investment_memo.deal, "$500k for 10%");
        assert_eq!(analysis.presentation_metrics.clarity, 8.5);
        // out-of-range scores are clamped
        assert_eq!(analysis.presentation_metrics.overall, 10.0);
        assert_eq!(analysis.overall_score, 10.0);

        let requests = model.requests();
        assert_eq!(requests.len(), 2);
        for request in &requests {
            assert_eq!(request.response_format, ResponseFormat::JsonObject);
            assert_eq!(request.temperature, 0.7);
            assert!(request.messages[1].content.contains("Entrepreneur: Pitch"));
            assert!(!request.messages[1].content.contains("You are Sam Altman,"));
        }
    }

    #[tokio::test]
    async fn test_malformed_output_falls_back() {
        let (store, model, reviewer) = setup(ScriptedModel::new("{}"));
        let id = store.seed_conversation(
            "user-1",
            Some("elon"),
            &[(Sender::System, "prompt"), (Sender::User, "Pitch")],
        );
        model.push_reply("I think they did great!");
        model.push_reply(r#"{"clarity": "high"}"#);

        let analysis = reviewer
            .analyze(&SecretString::new(TOKEN), &id)
            .await
            .unwrap();

        assert_eq!(analysis.investment_memo, InvestmentMemo::fallback());
        assert_eq!(analysis.presentation_metrics, PresentationMetrics::fallback());
        assert_eq!(analysis.overall_score, 7.0);
    }

    #[tokio::test]
    async fn test_system_only_history_makes_no_model_calls() {
        let (store, model, reviewer) = setup(ScriptedModel::new("{}"));
        let id = store.seed_conversation("user-1", Some("zuck"), &[(Sender::System, "prompt")]);

        let err = reviewer
            .analyze(&SecretString::new(TOKEN), &id)
            .await
            .unwrap_err();

        assert!(matches!(err, PitchError::NotFound(ref m) if m.contains("No valid conversation")));
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_history_not_found() {
        let (_store, model, reviewer) = setup(ScriptedModel::new("{}"));
        let err = reviewer
            .analyze(&SecretString::new(TOKEN), &ConversationId::new("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, PitchError::NotFound(ref m) if m.contains("No conversation history")));
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_model_error_is_fatal() {
        let (store, model, reviewer) = setup(ScriptedModel::new("{}"));
        let id = store.seed_conversation(
            "user-1",
            None,
            &[(Sender::System, "prompt"), (Sender::User, "Pitch")],
        );
        model.push_error(LLMError::AuthenticationFailed("bad key".to_string()));

        let err = reviewer
            .analyze(&SecretString::new(TOKEN), &id)
            .await
            .unwrap_err();
        assert!(matches!(err, PitchError::Upstream { .. }));
    }
}

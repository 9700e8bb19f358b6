//! Judge profile generator
//!
//! Turns a short description of a user-defined judge into a full profile:
//! personality, traits, catchphrases, scoring weights and avatar micro
//! expressions.

use crate::llm::{parse_structured, ChatModel, CompletionRequest, Message as ChatMessage};
use crate::persona::scoring_weights;
use sdk::errors::{PitchError, Result};
use sdk::{InvestmentStyle, JudgeProfile, MicroExpression};
use serde::Deserialize;
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "You are an expert at creating realistic Shark Tank judge personalities. Generate detailed, authentic profiles that would fit perfectly in the Shark Tank environment.";

/// Allowed deviation of the weight total from 1.0 before rescaling
const WEIGHT_TOLERANCE: f64 = 0.01;

/// Description of a custom judge
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default, alias = "investment_style")]
    pub investment_style: String,
    #[serde(default)]
    pub causes: Vec<String>,
}

impl ProfileRequest {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty()
            || self.specialties.iter().all(|s| s.trim().is_empty())
            || self.investment_style.trim().is_empty()
        {
            return Err(PitchError::Validation(
                "Name, specialties, and investment style are required".to_string(),
            ));
        }
        Ok(())
    }
}

pub struct ProfileGenerator {
    model: Arc<dyn ChatModel>,
    temperature: f32,
}

impl ProfileGenerator {
    pub fn new(model: Arc<dyn ChatModel>, temperature: f32) -> Self {
        Self { model, temperature }
    }

    /// Generate a profile for `request`.
    ///
    /// Model errors are returned; unparseable output falls back to a profile
    /// derived from the request itself.
    pub async fn generate(&self, request: &ProfileRequest) -> Result<JudgeProfile> {
        request.validate()?;

        let content = self
            .model
            .complete(&CompletionRequest::json(
                vec![
                    ChatMessage::system(SYSTEM_PROMPT),
                    ChatMessage::user(profile_prompt(request)),
                ],
                self.temperature,
            ))
            .await?;

        let profile = match parse_structured::<JudgeProfile>(&content) {
            Some(mut profile) => {
                let total = profile.scoring_criteria.total();
                if (total - 1.0).abs() > WEIGHT_TOLERANCE {
                    tracing::debug!("Rescaling scoring weights that sum to {}", total);
                    profile.scoring_criteria = profile
                        .scoring_criteria
                        .normalized()
                        .unwrap_or_else(|| style_weights(request));
                }
                profile
            }
            None => {
                tracing::warn!("Unparseable judge profile for '{}', using fallback", request.name);
                fallback_profile(request)
            }
        };

        Ok(profile)
    }
}

fn style_weights(request: &ProfileRequest) -> sdk::ScoringWeights {
    let style = request
        .investment_style
        .parse::<InvestmentStyle>()
        .unwrap_or(InvestmentStyle::Balanced);
    scoring_weights(style)
}

/// Profile built from the request alone
pub fn fallback_profile(request: &ProfileRequest) -> JudgeProfile {
    let specialties = request.specialties.join(", ");
    JudgeProfile {
        personality: format!(
            "{} is a {} investor focused on {}. Direct and demanding, they expect founders to know their numbers.",
            request.name.trim(),
            request.investment_style.trim(),
            specialties
        ),
        personality_traits: vec![
            "Direct".to_string(),
            "Analytical".to_string(),
            "Demanding".to_string(),
            "Curious".to_string(),
        ],
        catchphrases: vec![
            "What are your numbers?".to_string(),
            "Why should I believe you can pull this off?".to_string(),
            "Convince me.".to_string(),
        ],
        scoring_criteria: style_weights(request),
        micro_expressions: vec![
            MicroExpression {
                id: "raised_eyebrow".to_string(),
                name: "Raised Eyebrow".to_string(),
                trigger: "unclear_numbers".to_string(),
                duration: 1500,
                intensity: 0.6,
            },
            MicroExpression {
                id: "nod".to_string(),
                name: "Approving Nod".to_string(),
                trigger: "strong_answer".to_string(),
                duration: 1000,
                intensity: 0.5,
            },
            MicroExpression {
                id: "lean_in".to_string(),
                name: "Lean In".to_string(),
                trigger: "traction_mentioned".to_string(),
                duration: 2000,
                intensity: 0.7,
            },
            MicroExpression {
                id: "frown".to_string(),
                name: "Skeptical Frown".to_string(),
                trigger: "high_valuation".to_string(),
                duration: 1800,
                intensity: 0.8,
            },
        ],
    }
}

fn profile_prompt(request: &ProfileRequest) -> String {
    let causes = if request.causes.is_empty() {
        "Not specified".to_string()
    } else {
        request.causes.join(", ")
    };

    format!(
        r#"Create a detailed Shark Tank judge personality for "{name}" based on the following information:

Name: {name}
Specialties: {specialties}
Investment Style: {style}
Causes: {causes}

Please generate a comprehensive judge profile that includes:

1. A detailed personality description (2-3 sentences)
2. 4-6 personality traits
3. 3-4 catchphrases they might use
4. Scoring criteria weights (innovation, marketPotential, team, financials, presentation) that total to 1.0
5. 4-5 micro expressions with triggers, durations, and intensities

Format the response as JSON with the following structure:
{{
  "personality": "detailed personality description",
  "personalityTraits": ["trait1", "trait2", "trait3", "trait4", "trait5", "trait6"],
  "catchphrases": ["catchphrase1", "catchphrase2", "catchphrase3", "catchphrase4"],
  "scoringCriteria": {{
    "innovation": 0.0,
    "marketPotential": 0.0,
    "team": 0.0,
    "financials": 0.0,
    "presentation": 0.0
  }},
  "microExpressions": [
    {{
      "id": "expression1",
      "name": "Expression Name",
      "trigger": "trigger_condition",
      "duration": 2000,
      "intensity": 0.8
    }}
  ]
}}

Make the personality authentic to a real Shark Tank judge - they should be direct, insightful, and have strong opinions about business. The scoring criteria should reflect their investment style and specialties."#,
        name = request.name.trim(),
        specialties = request.specialties.join(", "),
        style = request.investment_style.trim(),
        causes = causes,
    )
}

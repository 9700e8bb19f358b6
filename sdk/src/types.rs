//! Shared data model
//!
//! Personas, conversations, messages and the structured review output. All
//! JSON shapes here are the wire shapes used by the HTTP surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a judge weighs a pitch
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum InvestmentStyle {
    Conservative,
    RiskTaker,
    Analytical,
    Emotional,
    Balanced,
}

impl InvestmentStyle {
    pub const ALL: [InvestmentStyle; 5] = [
        InvestmentStyle::Conservative,
        InvestmentStyle::RiskTaker,
        InvestmentStyle::Analytical,
        InvestmentStyle::Emotional,
        InvestmentStyle::Balanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvestmentStyle::Conservative => "conservative",
            InvestmentStyle::RiskTaker => "risk-taker",
            InvestmentStyle::Analytical => "analytical",
            InvestmentStyle::Emotional => "emotional",
            InvestmentStyle::Balanced => "balanced",
        }
    }
}

impl fmt::Display for InvestmentStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvestmentStyle {
    type Err = String;

    /// Accepts `risk-taker`, `risk_taker`, `Risk Taker` and friends
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect();

        match normalized.as_str() {
            "conservative" => Ok(InvestmentStyle::Conservative),
            "risktaker" => Ok(InvestmentStyle::RiskTaker),
            "analytical" => Ok(InvestmentStyle::Analytical),
            "emotional" => Ok(InvestmentStyle::Emotional),
            "balanced" => Ok(InvestmentStyle::Balanced),
            _ => Err(format!("Unknown investment style: {}", s)),
        }
    }
}

/// Five-dimension scoring weights
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoringWeights {
    pub innovation: f64,
    pub market_potential: f64,
    pub team: f64,
    pub financials: f64,
    pub presentation: f64,
}

impl ScoringWeights {
    pub fn total(&self) -> f64 {
        self.innovation + self.market_potential + self.team + self.financials + self.presentation
    }

    /// Rescale so the weights sum to 1.0. Returns `None` when the total is
    /// not a positive finite number.
    pub fn normalized(&self) -> Option<Self> {
        let total = self.total();
        if !total.is_finite() || total <= 0.0 {
            return None;
        }
        Some(Self {
            innovation: self.innovation / total,
            market_potential: self.market_potential / total,
            team: self.team / total,
            financials: self.financials / total,
            presentation: self.presentation / total,
        })
    }
}

/// A judge persona
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    pub id: String,
    pub name: String,
    pub specialties: Vec<String>,
    pub investment_style: InvestmentStyle,
    pub causes: Vec<String>,
    pub personality_traits: Vec<String>,
    pub catchphrases: Vec<String>,
}

/// Identifier assigned by the remote store
///
/// Deserializes from a string (uuid column) or an integer (identity column).
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ConversationId(pub String);

impl<'de> Deserialize<'de> for ConversationId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self(s),
            Raw::Number(n) => Self(n.to_string()),
        })
    }
}

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Conversation metadata row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conversation {
    pub id: ConversationId,
    pub user_id: String,
    /// Rows written before the persona column existed carry no judge id
    #[serde(default)]
    pub judge_id: Option<String>,
    #[serde(deserialize_with = "store_timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Accepts RFC 3339 timestamps and offset-less ones (`timestamp` columns),
/// the latter read as UTC
fn store_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}

/// Who wrote a message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    System,
    User,
    // Older rows from the web client
    #[serde(alias = "agent")]
    Assistant,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::System => "system",
            Sender::User => "user",
            Sender::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored message row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub conversation_id: ConversationId,
    pub sender: Sender,
    pub content: String,
    #[serde(deserialize_with = "store_timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Qualitative investment memo
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentMemo {
    pub recommendation: String,
    pub summary: String,
    pub value_proposition: String,
    pub market: String,
    pub product: String,
    pub metrics: String,
    pub risks: String,
    pub team: String,
    pub deal: String,
    pub scenario_analysis: String,
    pub conclusion: String,
}

impl InvestmentMemo {
    /// Returned when the model's memo cannot be parsed
    pub fn fallback() -> Self {
        Self {
            recommendation: "HOLD - Additional information needed for full assessment".to_string(),
            summary: "Unable to generate detailed analysis from conversation.".to_string(),
            value_proposition: "Not available from conversation".to_string(),
            market: "Not discussed in detail".to_string(),
            product: "Product details not fully articulated".to_string(),
            metrics: "• No specific metrics mentioned".to_string(),
            risks: "• Unable to assess from limited information".to_string(),
            team: "Team background not discussed".to_string(),
            deal: "Investment terms not specified".to_string(),
            scenario_analysis: "No financial projections provided".to_string(),
            conclusion: "Additional information needed for comprehensive evaluation".to_string(),
        }
    }
}

/// Numeric presentation rubric, every field on a 0-10 scale
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PresentationMetrics {
    pub clarity: f64,
    pub confidence: f64,
    pub engagement: f64,
    pub structure: f64,
    pub delivery: f64,
    pub overall: f64,
}

impl PresentationMetrics {
    pub const MIN_SCORE: f64 = 0.0;
    pub const MAX_SCORE: f64 = 10.0;

    /// Returned when the model's rubric cannot be parsed
    pub fn fallback() -> Self {
        Self {
            clarity: 7.0,
            confidence: 7.0,
            engagement: 7.0,
            structure: 7.0,
            delivery: 7.0,
            overall: 7.0,
        }
    }

    /// `None` if any score is NaN or infinite; otherwise every score is
    /// clamped into the 0-10 range.
    pub fn clamped(&self) -> Option<Self> {
        let scores = [
            self.clarity,
            self.confidence,
            self.engagement,
            self.structure,
            self.delivery,
            self.overall,
        ];
        if scores.iter().any(|s| !s.is_finite()) {
            return None;
        }
        let clamp = |v: f64| v.clamp(Self::MIN_SCORE, Self::MAX_SCORE);
        Some(Self {
            clarity: clamp(self.clarity),
            confidence: clamp(self.confidence),
            engagement: clamp(self.engagement),
            structure: clamp(self.structure),
            delivery: clamp(self.delivery),
            overall: clamp(self.overall),
        })
    }
}

/// Full output of a performance review
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceAnalysis {
    pub investment_memo: InvestmentMemo,
    pub presentation_metrics: PresentationMetrics,
    pub overall_score: f64,
}

/// Facial cue an avatar can play
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MicroExpression {
    pub id: String,
    pub name: String,
    pub trigger: String,
    /// Milliseconds
    pub duration: u32,
    pub intensity: f64,
}

/// LLM-generated profile for a user-defined judge
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JudgeProfile {
    pub personality: String,
    #[serde(default)]
    pub personality_traits: Vec<String>,
    #[serde(default)]
    pub catchphrases: Vec<String>,
    pub scoring_criteria: ScoringWeights,
    #[serde(default)]
    pub micro_expressions: Vec<MicroExpression>,
}

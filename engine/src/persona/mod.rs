//! Persona Catalog
//!
//! The fixed set of investor judges, their system prompts and the per-style
//! scoring weights. Read-only after construction.

use sdk::errors::{PitchError, Result};
use sdk::{InvestmentStyle, Persona, ScoringWeights};

/// Static judge catalog
#[derive(Debug, Clone)]
pub struct PersonaCatalog {
    personas: Vec<Persona>,
}

impl Default for PersonaCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PersonaCatalog {
    /// The built-in judges: `altman`, `elon`, `zuck`
    pub fn builtin() -> Self {
        Self::new(builtin_personas())
    }

    pub fn new(personas: Vec<Persona>) -> Self {
        Self { personas }
    }

    /// Look up a persona by id
    ///
    /// # Errors
    ///
    /// `NotFound` when the id is not in the catalog.
    pub fn get(&self, id: &str) -> Result<&Persona> {
        self.personas
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| PitchError::NotFound(format!("Judge '{}' not found", id)))
    }

    pub fn all(&self) -> &[Persona] {
        &self.personas
    }

    pub fn ids(&self) -> Vec<&str> {
        self.personas.iter().map(|p| p.id.as_str()).collect()
    }

    /// Recover the persona of a conversation stored without a judge id by
    /// matching its system prompt against each persona's name.
    pub fn identify_from_prompt(&self, prompt: &str) -> Option<&Persona> {
        self.personas
            .iter()
            .find(|p| prompt.starts_with(&format!("You are {},", p.name)))
            .or_else(|| self.personas.iter().find(|p| prompt.contains(&p.name)))
    }
}

/// Render the instruction block stored as the first message of a conversation.
///
/// Deterministic; embeds every persona field verbatim.
pub fn build_system_prompt(persona: &Persona) -> String {
    let mut prompt = format!(
        "You are {}, an investor judging a live startup pitch.\n\n",
        persona.name
    );

    prompt.push_str(&format!(
        "Your specialties: {}.\n",
        persona.specialties.join(", ")
    ));
    prompt.push_str(&format!(
        "Your investment style: {}.\n",
        persona.investment_style
    ));
    if !persona.causes.is_empty() {
        prompt.push_str(&format!(
            "Causes you care about: {}.\n",
            persona.causes.join(", ")
        ));
    }

    prompt.push_str("\nPersonality traits:\n");
    for trait_name in &persona.personality_traits {
        prompt.push_str(&format!("- {}\n", trait_name));
    }

    prompt.push_str("\nPhrases you are known for:\n");
    for phrase in &persona.catchphrases {
        prompt.push_str(&format!("- \"{}\"\n", phrase));
    }

    prompt.push_str(
        "\nStay in character for the whole session. Keep each reply short and spoken-style, \
         ask one pointed question at a time, and challenge weak assumptions about the market, \
         the team and the numbers. Never mention that you are an AI.",
    );

    prompt
}

/// Fixed weights for each investment style; every row sums to 1.0
pub fn scoring_weights(style: InvestmentStyle) -> ScoringWeights {
    let (innovation, market_potential, team, financials, presentation) = match style {
        InvestmentStyle::Conservative => (0.10, 0.20, 0.10, 0.50, 0.10),
        InvestmentStyle::RiskTaker => (0.35, 0.25, 0.15, 0.15, 0.10),
        InvestmentStyle::Analytical => (0.20, 0.25, 0.15, 0.30, 0.10),
        InvestmentStyle::Emotional => (0.15, 0.20, 0.30, 0.10, 0.25),
        InvestmentStyle::Balanced => (0.20, 0.20, 0.20, 0.20, 0.20),
    };
    ScoringWeights {
        innovation,
        market_potential,
        team,
        financials,
        presentation,
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn builtin_personas() -> Vec<Persona> {
    vec![
        Persona {
            id: "altman".to_string(),
            name: "Sam Altman".to_string(),
            specialties: strings(&["Artificial Intelligence", "Developer Platforms", "Startup Scaling"]),
            investment_style: InvestmentStyle::Analytical,
            causes: strings(&["AI safety", "Abundant energy", "Universal basic income"]),
            personality_traits: strings(&[
                "Calm and measured",
                "Thinks in decades",
                "Obsessed with growth rate",
                "Asks why now",
            ]),
            catchphrases: strings(&[
                "What does this look like if it works wildly well?",
                "How fast is it growing week over week?",
                "Why is now the right time for this?",
            ]),
        },
        Persona {
            id: "elon".to_string(),
            name: "Elon Musk".to_string(),
            specialties: strings(&["Hardware", "Energy", "Space", "Manufacturing"]),
            investment_style: InvestmentStyle::RiskTaker,
            causes: strings(&["Sustainable energy", "Making life multiplanetary"]),
            personality_traits: strings(&[
                "Reasons from first principles",
                "Blunt",
                "Impatient with incrementalism",
                "Cares about physics more than slides",
            ]),
            catchphrases: strings(&[
                "What are the physics of this?",
                "That timeline is way too slow.",
                "The best part is no part.",
            ]),
        },
        Persona {
            id: "zuck".to_string(),
            name: "Mark Zuckerberg".to_string(),
            specialties: strings(&["Social Networks", "Consumer Products", "Virtual Reality"]),
            investment_style: InvestmentStyle::Conservative,
            causes: strings(&["Connecting people", "Open science", "Education"]),
            personality_traits: strings(&[
                "Data driven",
                "Focused on engagement metrics",
                "Competitive",
                "Plays the long game",
            ]),
            catchphrases: strings(&[
                "How many daily actives do you have?",
                "What does retention look like after 30 days?",
                "Move fast, but show me the numbers.",
            ]),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_builtin_ids() {
        let catalog = PersonaCatalog::builtin();
        assert_eq!(catalog.ids(), vec!["altman", "elon", "zuck"]);
        assert_eq!(catalog.get("elon").unwrap().name, "Elon Musk");
    }

    #[test]
    fn test_unknown_persona() {
        let catalog = PersonaCatalog::builtin();
        let err = catalog.get("cuban").unwrap_err();
        assert!(matches!(err, PitchError::NotFound(_)));
    }

    #[test]
    fn test_system_prompt_embeds_every_field() {
        let catalog = PersonaCatalog::builtin();
        for persona in catalog.all() {
            let prompt = build_system_prompt(persona);
            assert!(prompt.starts_with(&format!("You are {},", persona.name)));
            assert!(prompt.contains(persona.investment_style.as_str()));
            for item in persona
                .specialties
                .iter()
                .chain(&persona.causes)
                .chain(&persona.personality_traits)
                .chain(&persona.catchphrases)
            {
                assert!(prompt.contains(item.as_str()), "{} missing {}", persona.id, item);
            }
        }
    }

    #[test]
    fn test_system_prompt_is_deterministic() {
        let catalog = PersonaCatalog::builtin();
        let persona = catalog.get("zuck").unwrap();
        assert_eq!(build_system_prompt(persona), build_system_prompt(persona));
    }

    #[test]
    fn test_identify_from_prompt() {
        let catalog = PersonaCatalog::builtin();
        for persona in catalog.all() {
            let prompt = build_system_prompt(persona);
            assert_eq!(catalog.identify_from_prompt(&prompt).unwrap().id, persona.id);
        }
        assert!(catalog.identify_from_prompt("You are a helpful assistant").is_none());
    }

    #[test]
    fn test_balanced_weights() {
        let weights = scoring_weights(InvestmentStyle::Balanced);
        assert_eq!(weights.team, 0.2);
        assert_eq!(weights.financials, 0.2);
    }

    fn any_style() -> impl Strategy<Value = InvestmentStyle> {
        prop::sample::select(InvestmentStyle::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_weights_sum_to_one(style in any_style()) {
            let weights = scoring_weights(style);
            prop_assert!((weights.total() - 1.0).abs() < 1e-9);
        }

        #[test]
        fn prop_weights_are_fractions(style in any_style()) {
            let w = scoring_weights(style);
            for value in [w.innovation, w.market_potential, w.team, w.financials, w.presentation] {
                prop_assert!((0.0..=1.0).contains(&value));
            }
        }

        #[test]
        fn prop_unknown_ids_are_rejected(id in "[a-z]{1,12}") {
            let catalog = PersonaCatalog::builtin();
            prop_assume!(!["altman", "elon", "zuck"].contains(&id.as_str()));
            prop_assert!(catalog.get(&id).is_err());
        }
    }
}

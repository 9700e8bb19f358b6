//! Process-wide service wiring
//!
//! Provider clients are built once from configuration and shared by every
//! request through [`Services`].

use crate::avatar::{AvatarTokenSource, HeyGenTokens};
use crate::config::{Config, LLMConfig};
use crate::dialogue::DialogueOrchestrator;
use crate::llm::{ChatModel, OpenAIProvider};
use crate::persona::PersonaCatalog;
use crate::profile::ProfileGenerator;
use crate::reviewer::PerformanceReviewer;
use crate::secrets::Credentials;
use crate::speech::{ElevenLabsSpeech, SpeechService};
use crate::store::{ConversationStore, SupabaseStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct Services {
    pub catalog: Arc<PersonaCatalog>,
    pub store: Arc<dyn ConversationStore>,
    pub speech: Arc<dyn SpeechService>,
    pub avatar: Arc<dyn AvatarTokenSource>,
    pub dialogue: Arc<DialogueOrchestrator>,
    pub reviewer: Arc<PerformanceReviewer>,
    pub profiles: Arc<ProfileGenerator>,
}

impl Services {
    /// Wire the real providers. Nothing is contacted and no credential is
    /// read until a request needs it.
    pub fn from_config(config: &Config, credentials: Arc<Credentials>) -> Self {
        let store: Arc<dyn ConversationStore> =
            Arc::new(SupabaseStore::new(Arc::clone(&credentials)));
        let model: Arc<dyn ChatModel> = Arc::new(OpenAIProvider::new(
            config.llm.clone(),
            Arc::clone(&credentials),
        ));
        let speech: Arc<dyn SpeechService> = Arc::new(ElevenLabsSpeech::new(
            config.speech.clone(),
            Arc::clone(&credentials),
        ));
        let avatar: Arc<dyn AvatarTokenSource> =
            Arc::new(HeyGenTokens::new(config.avatar.clone(), credentials));

        tracing::info!(
            "Services ready: llm={} ({})",
            model.name(),
            config.llm.model
        );

        Self::assemble(
            &config.llm,
            Arc::new(PersonaCatalog::builtin()),
            store,
            model,
            speech,
            avatar,
        )
    }

    /// Wire the components around the given providers
    pub fn assemble(
        llm: &LLMConfig,
        catalog: Arc<PersonaCatalog>,
        store: Arc<dyn ConversationStore>,
        model: Arc<dyn ChatModel>,
        speech: Arc<dyn SpeechService>,
        avatar: Arc<dyn AvatarTokenSource>,
    ) -> Self {
        let dialogue = DialogueOrchestrator::new(
            Arc::clone(&catalog),
            Arc::clone(&store),
            Arc::clone(&model),
            Arc::clone(&speech),
            llm.reply_temperature,
        );
        let reviewer =
            PerformanceReviewer::new(Arc::clone(&store), Arc::clone(&model), llm.analysis_temperature);
        let profiles = ProfileGenerator::new(model, llm.profile_temperature);

        Self {
            catalog,
            store,
            speech,
            avatar,
            dialogue: Arc::new(dialogue),
            reviewer: Arc::new(reviewer),
            profiles: Arc::new(profiles),
        }
    }
}

pub mod api;
pub mod config;
pub mod error;
pub mod job;
pub mod llm;
pub mod mindmap;
pub mod orchestrator;
pub mod persist;
pub mod scraper;
pub mod store;
pub mod summarizer;

use std::sync::Arc;
use config::Config;
use error::Result;
use llm::OpenRouterProvider;
use orchestrator::{JobOrchestrator, OrchestratorSettings};
use store::JobStore;
use summarizer::ConceptVocabulary;

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub orchestrator: JobOrchestrator,
}

impl AppState {
    /// Wires the HTTP fetcher and the OpenRouter provider into a fresh orchestrator.
    pub fn from_config(config: Config) -> Result<Self> {
        let fetcher = crate::scraper::HttpFetcher::new(config.fetch_timeout)?;
        let ai = OpenRouterProvider::new(config.openrouter_api_key.clone(), config.llm.clone());
        let orchestrator = JobOrchestrator::new(
            JobStore::new(),
            Arc::new(fetcher),
            Arc::new(ai),
            OrchestratorSettings {
                output_dir: config.output_dir.clone(),
                default_summary_length: config.default_summary_length,
                vocabulary: ConceptVocabulary::default(),
            },
        );
        Ok(Self {
            config: Arc::new(config),
            orchestrator,
        })
    }
}

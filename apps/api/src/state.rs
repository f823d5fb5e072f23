use std::sync::Arc;

use crate::config::Config;
use crate::corpus::retrieval::Retriever;
use crate::corpus::CorpusSnapshot;
use crate::llm_client::TextGenerator;
use crate::normalizer::ResponseNormalizer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Generation service. Default: `LlmClient`.
    pub generator: Arc<dyn TextGenerator>,
    /// Pluggable retriever. Default: `KeywordRetriever`.
    pub retriever: Arc<dyn Retriever>,
    /// Reference corpus, loaded once at startup and never mutated.
    pub corpus: Arc<CorpusSnapshot>,
    pub normalizer: ResponseNormalizer,
}

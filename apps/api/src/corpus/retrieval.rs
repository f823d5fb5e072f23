//! Retrieval: pluggable, trait-based lookup of reference passages for a project description.
//!
//! Default: `KeywordRetriever` (pure-Rust, deterministic, no network).
//! An embedding-backed retriever slots in behind the same trait.
//!
//! `AppState` holds an `Arc<dyn Retriever>`, chosen at startup.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::Serialize;

use crate::corpus::{tokenize, CorpusSnapshot};
use crate::errors::AppError;

/// A passage selected for the prompt, with the score that ranked it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedChunk {
    pub source: String,
    pub ordinal: usize,
    pub text: String,
    pub score: f32,
}

#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(
        &self,
        corpus: &CorpusSnapshot,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedChunk>, AppError>;
}

/// Term-overlap retriever.
///
/// score = |query terms ∩ chunk terms| / |query terms|
///
/// Zero-score chunks are never returned. Equal scores keep corpus order.
pub struct KeywordRetriever;

#[async_trait]
impl Retriever for KeywordRetriever {
    async fn retrieve(
        &self,
        corpus: &CorpusSnapshot,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedChunk>, AppError> {
        Ok(rank_by_overlap(corpus, query, k))
    }
}

fn rank_by_overlap(corpus: &CorpusSnapshot, query: &str, k: usize) -> Vec<RetrievedChunk> {
    let query_terms: HashSet<String> = tokenize(query).collect();
    if query_terms.is_empty() || k == 0 {
        return Vec::new();
    }

    let mut scored: Vec<RetrievedChunk> = corpus
        .chunks()
        .iter()
        .filter_map(|chunk| {
            let shared = query_terms
                .iter()
                .filter(|t| chunk.terms.contains(t.as_str()))
                .count();
            (shared > 0).then(|| RetrievedChunk {
                source: chunk.source.clone(),
                ordinal: chunk.ordinal,
                text: chunk.text.clone(),
                score: shared as f32 / query_terms.len() as f32,
            })
        })
        .collect();

    // Stable sort: ties stay in corpus order.
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(k);
    scored
}

//! Formulation: orchestrates one project formulation.
//!
//! Flow: retrieve reference passages → build prompt → generate →
//!       normalize → return record.
//!
//! Normalization never fails on malformed output; only the strict no-payload
//! policy turns a prose answer into an error.

use serde::Serialize;
use tracing::{info, warn};

use crate::corpus::retrieval::{RetrievedChunk, Retriever};
use crate::corpus::{CorpusSnapshot, FormatTemplate};
use crate::errors::AppError;
use crate::formulation::prompts::{
    FORMULATION_PROMPT_TEMPLATE, FORMULATION_SYSTEM, NO_CONTEXT_PLACEHOLDER,
    NO_FORMATS_PLACEHOLDER,
};
use crate::llm_client::prompts::{GROUNDING_INSTRUCTION, JSON_ONLY_SYSTEM};
use crate::llm_client::TextGenerator;
use crate::normalizer::{NormalizeError, NormalizedRecord, ResponseNormalizer};

/// Everything one formulation call needs, borrowed from `AppState`.
pub struct Formulator<'a> {
    pub corpus: &'a CorpusSnapshot,
    pub retriever: &'a dyn Retriever,
    pub generator: &'a dyn TextGenerator,
    pub normalizer: &'a ResponseNormalizer,
    pub retrieval_k: usize,
}

/// Result of a formulation: the record plus the passages that grounded it.
#[derive(Debug, Clone, Serialize)]
pub struct Formulation {
    pub record: NormalizedRecord,
    pub context: Vec<RetrievedChunk>,
}

impl Formulation {
    /// Distinct source documents of the retrieved context, in rank order.
    pub fn sources(&self) -> Vec<&str> {
        let mut sources: Vec<&str> = Vec::new();
        for chunk in &self.context {
            if !sources.contains(&chunk.source.as_str()) {
                sources.push(&chunk.source);
            }
        }
        sources
    }
}

impl Formulator<'_> {
    pub async fn formulate(&self, description: &str) -> Result<Formulation, AppError> {
        let context = self
            .retriever
            .retrieve(self.corpus, description, self.retrieval_k)
            .await?;
        info!("Retrieved {} reference passages", context.len());

        let prompt = build_prompt(description, self.corpus.formats(), &context);

        let raw = self
            .generator
            .generate(&prompt, FORMULATION_SYSTEM)
            .await
            .map_err(|e| AppError::Llm(format!("Formulation LLM call failed: {e}")))?;

        let record = self.normalizer.normalize(&raw).map_err(|e| match e {
            NormalizeError::NoStructuredPayload => {
                AppError::Llm(format!("Model answered without a JSON object: {e}"))
            }
        })?;

        if record.is_empty_extraction() {
            warn!(
                "Formulation produced an empty record (origin {:?}); the archive will be blank",
                record.origin()
            );
        } else {
            info!(
                "Formulation normalized (origin {:?}): {} value-chain rows, {} sector-concept rows",
                record.origin(),
                record.value_chain().len(),
                record.sector_concept().len()
            );
        }

        Ok(Formulation { record, context })
    }
}

/// Fills the formulation template.
pub fn build_prompt(
    description: &str,
    formats: &[FormatTemplate],
    context: &[RetrievedChunk],
) -> String {
    let formats_block = if formats.is_empty() {
        NO_FORMATS_PLACEHOLDER.to_string()
    } else {
        formats
            .iter()
            .map(|f| format!("{}:\n{}", f.label, f.csv))
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    let context_block = if context.is_empty() {
        NO_CONTEXT_PLACEHOLDER.to_string()
    } else {
        context
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    // Description last: it is user input and must not be re-scanned for placeholders.
    FORMULATION_PROMPT_TEMPLATE
        .replace("{json_only}", JSON_ONLY_SYSTEM)
        .replace("{grounding_instruction}", GROUNDING_INSTRUCTION)
        .replace("{formats}", &formats_block)
        .replace("{context}", &context_block)
        .replace("{description}", description.trim())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::corpus::chunking::ChunkingConfig;
    use crate::corpus::retrieval::KeywordRetriever;
    use crate::corpus::Document;
    use crate::llm_client::LlmError;
    use crate::normalizer::{FallbackReason, NoPayloadPolicy, RecordOrigin};

    /// Returns a fixed answer and remembers the last prompt.
    struct CannedGenerator {
        answer: Result<String, ()>,
        last_prompt: Mutex<Option<String>>,
    }

    impl CannedGenerator {
        fn answering(answer: &str) -> Self {
            Self {
                answer: Ok(answer.to_string()),
                last_prompt: Mutex::new(None),
            }
        }

        fn failing() -> Self {
            Self {
                answer: Err(()),
                last_prompt: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, prompt: &str, _system: &str) -> Result<String, LlmError> {
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            self.answer.clone().map_err(|_| LlmError::EmptyContent)
        }
    }

    fn corpus() -> CorpusSnapshot {
        CorpusSnapshot::from_documents(
            vec![
                Document::new("acueducto.txt", "Acueducto veredal con planta de tratamiento"),
                Document::new("vias.txt", "Mejoramiento de vías terciarias"),
            ],
            vec![FormatTemplate {
                label: "FORMATO CADENA".to_string(),
                csv: "objetivo,producto".to_string(),
            }],
            ChunkingConfig::default(),
        )
    }

    async fn run(
        generator: &CannedGenerator,
        policy: NoPayloadPolicy,
        description: &str,
    ) -> Result<Formulation, AppError> {
        let corpus = corpus();
        let normalizer = ResponseNormalizer::new(policy);
        Formulator {
            corpus: &corpus,
            retriever: &KeywordRetriever,
            generator,
            normalizer: &normalizer,
            retrieval_k: 12,
        }
        .formulate(description)
        .await
    }

    #[tokio::test]
    async fn test_formulate_normalizes_model_answer() {
        let generator = CannedGenerator::answering(
            "Claro, aquí está:\n{'documento_tecnico': 'Documento', 'cadena_valor': [{'objetivo': 'Agua'},]}",
        );
        let formulation = run(&generator, NoPayloadPolicy::Fallback, "acueducto veredal")
            .await
            .unwrap();

        assert_eq!(formulation.record.origin(), RecordOrigin::Structured);
        assert_eq!(formulation.record.narrative(), "Documento");
        assert_eq!(formulation.record.value_chain().len(), 1);
        assert_eq!(formulation.sources(), vec!["acueducto.txt"]);
    }

    #[tokio::test]
    async fn test_prompt_carries_formats_context_and_description() {
        let generator = CannedGenerator::answering("{}");
        run(&generator, NoPayloadPolicy::Fallback, "acueducto veredal")
            .await
            .unwrap();

        let prompt = generator.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("FORMATO CADENA:\nobjetivo,producto"));
        assert!(prompt.contains("Acueducto veredal con planta de tratamiento"));
        assert!(!prompt.contains("vías terciarias"));
        assert!(prompt.ends_with("DESCRIPCIÓN DEL PROYECTO:\nacueducto veredal\n"));
    }

    #[tokio::test]
    async fn test_prose_answer_falls_back_under_default_policy() {
        let generator = CannedGenerator::answering("No tengo suficiente información.");
        let formulation = run(&generator, NoPayloadPolicy::Fallback, "algo")
            .await
            .unwrap();
        assert_eq!(
            formulation.record.origin(),
            RecordOrigin::Fallback(FallbackReason::NoStructuredPayload)
        );
        assert_eq!(formulation.record.narrative(), "No tengo suficiente información.");
    }

    #[tokio::test]
    async fn test_prose_answer_is_an_error_under_strict_policy() {
        let generator = CannedGenerator::answering("No tengo suficiente información.");
        let err = run(&generator, NoPayloadPolicy::Strict, "algo")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
    }

    #[tokio::test]
    async fn test_generator_failure_is_llm_error() {
        let generator = CannedGenerator::failing();
        let err = run(&generator, NoPayloadPolicy::Fallback, "algo")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
    }

    #[test]
    fn test_build_prompt_uses_placeholders_when_empty() {
        let prompt = build_prompt("proyecto", &[], &[]);
        assert!(prompt.contains(NO_FORMATS_PLACEHOLDER));
        assert!(prompt.contains(NO_CONTEXT_PLACEHOLDER));
        assert!(prompt.contains("\"cadena_valor\": [{}]"));
        assert!(!prompt.contains("{json_only}"));
    }

    #[test]
    fn test_build_prompt_does_not_expand_placeholders_in_description() {
        let prompt = build_prompt("usar {context} literal", &[], &[]);
        assert!(prompt.contains("usar {context} literal"));
    }
}

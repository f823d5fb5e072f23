// Project formulation: retrieval, prompt assembly, generation, normalization.
// All LLM calls go through llm_client; no direct API calls here.

pub mod formulator;
pub mod handlers;
pub mod prompts;

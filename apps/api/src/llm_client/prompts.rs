// Shared prompt fragments. Each service that needs LLM calls defines its own
// prompts.rs alongside it; this file holds the cross-cutting pieces.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction that keeps the model inside the reference material.
pub const GROUNDING_INSTRUCTION: &str = "\
    Base every figure, indicator and product on the reference documents provided. \
    Do NOT invent programs, indicators or budget lines that the references do not support.";

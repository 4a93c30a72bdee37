// Shared prompt fragments. Task-specific templates live in evaluation/prompts.rs.

/// System prompt that asks for a bare JSON object. The sanitizer still copes
/// when the model ignores it and wraps the object in fences or prose.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

// Cross-cutting prompt fragments shared by every LLM call.
// Task-specific templates live next to the code that uses them.

/// Correction appended when the model's previous answer failed validation.
/// Replace `{problem}` before sending.
pub const JSON_ONLY_CORRECTION: &str = "\
Your previous answer could not be used: {problem}.
Respond again with ONLY the JSON object described above. \
Include every field. Do NOT use markdown code fences. \
Do NOT include any text before or after the JSON object.";

/// Appends the JSON-only correction to the given prompt.
pub fn with_json_correction(prompt: &str, problem: &str) -> String {
    format!(
        "{prompt}\n\n{}",
        JSON_ONLY_CORRECTION.replace("{problem}", problem)
    )
}

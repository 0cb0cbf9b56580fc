// src/llm/prompt.rs

/// System instructions: the field schema, per-field extraction rules and
/// worked examples.
pub const SYSTEM_PROMPT: &str = include_str!("extraction_prompt.txt");

/// User message carrying one document's filtered text.
pub fn user_message(filtered_text: &str) -> String {
    format!("{}, please wait for ", filtered_text)
}

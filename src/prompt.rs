//! # Prompt assembly
//!
//! Builds the single prompt string handed to the [`Generator`](crate::api::Generator).
//! Pure string construction: no I/O, same input, same output.
//!
//! Without context:
//!
//! ```text
//! Question: {question}
//!
//! Answer:
//! ```
//!
//! With context (passages joined by a blank line, in rank order):
//!
//! ```text
//! Based on the following context, answer the question.
//!
//! Context:
//! {passage 1}
//!
//! {passage 2}
//!
//! Question: {question}
//!
//! Answer:
//! ```

/// Separator placed between retrieved passages.
pub const PASSAGE_SEPARATOR: &str = "\n\n";

/// Build the generation prompt for `question`, grounded on `passages` when there are any.
///
/// # Examples
/// ```rust
/// use ollama_cli_agent::prompt::assemble_prompt;
///
/// assert_eq!(assemble_prompt("Why?", &[]), "Question: Why?\n\nAnswer:");
///
/// let prompt = assemble_prompt("Why?", &["Because.".to_string()]);
/// assert!(prompt.starts_with("Based on the following context"));
/// assert!(prompt.contains("Context:\nBecause.\n\nQuestion: Why?"));
/// ```
pub fn assemble_prompt(question: &str, passages: &[String]) -> String {
    if passages.is_empty() {
        return format!("Question: {question}\n\nAnswer:");
    }

    let context = passages.join(PASSAGE_SEPARATOR);
    format!(
        "Based on the following context, answer the question.\n\nContext:\n{context}\n\nQuestion: {question}\n\nAnswer:"
    )
}

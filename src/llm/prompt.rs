//! Prompt builder for the three correction-engine calls.
//!
//! Every prompt is a `(system_msg, user_msg)` pair for an OpenAI-compatible
//! chat endpoint.  Each user message asks for a bare JSON object so the
//! reply can be parsed by [`crate::llm::response`].

use crate::llm::types::Candidate;

// ---------------------------------------------------------------------------
// System instructions
// ---------------------------------------------------------------------------

const SYSTEM_SPELLING: &str = "\
You are an English spelling checker for vocabulary lists.
Identify and fix spelling mistakes in single English words.
Reply with a JSON object only.";

const SYSTEM_TEACHER: &str = "\
You are an English teaching expert who picks the most useful words for
learners to study. Reply with a JSON object only.";

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

const CORRECTION_TEMPLATE: &str = r#"Check whether the English word below is misspelled. If it is, give the correct spelling.

Word: {word}
Meaning: {meaning}

Return a JSON object with these fields:
- corrected: the corrected word (the original word if it is already correct)
- confidence: one of "high", "medium", "low"
- reason: a short explanation of the fix, or why the word is already correct

Examples:
{"corrected": "example", "confidence": "high", "reason": "already spelled correctly"}
{"corrected": "receive", "confidence": "high", "reason": "swapped i and e"}

Return only the JSON."#;

const CANDIDATES_TEMPLATE: &str = r#"The English word "{word}" (meaning: {meaning}) is not recognized by the dictionary.
Propose 3 to 5 candidate words. A candidate may be:
1. the root or base form of the word
2. the word with a prefix or suffix removed
3. a common word with a close meaning
4. the likely correct spelling, if the word is misspelled

Requirements:
- every candidate must be a real, common English word
- prefer more basic, more frequent vocabulary
- stay relevant to the original meaning

Return a JSON object with:
- candidates: a list of objects with "word" and "reason" fields

Example:
{
  "candidates": [
    {"word": "system", "reason": "root of supersystem"},
    {"word": "finance", "reason": "root of finanzially"}
  ]
}

Return only the JSON."#;

const SELECTION_TEMPLATE: &str = r#"Original word: {word}
Meaning: {meaning}

All of the following candidates are valid English words:
{candidates}

Pick the single most representative word, the one most worth learning. Criteria:
1. higher usage frequency
2. more basic, more central vocabulary
3. a root that covers more derived words
4. closest to the original meaning

Return a JSON object:
{
  "selected": "the chosen word",
  "reason": "why it was chosen",
  "confidence": "high/medium/low"
}

Return only the JSON."#;

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

/// Builds the chat messages for correction, candidate generation and
/// selection.
///
/// ```rust
/// use wordbook_verify::llm::PromptBuilder;
///
/// let (system, user) = PromptBuilder::new().correction("recieve", "to get");
/// assert!(system.contains("spelling"));
/// assert!(user.contains("recieve"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Prompt for a single direct correction.
    pub fn correction(&self, word: &str, meaning: &str) -> (String, String) {
        let user = fill(CORRECTION_TEMPLATE, word, meaning);
        (SYSTEM_SPELLING.to_string(), user)
    }

    /// Prompt for 3–5 alternative candidates.
    pub fn candidates(&self, word: &str, meaning: &str) -> (String, String) {
        let user = fill(CANDIDATES_TEMPLATE, word, meaning);
        (SYSTEM_SPELLING.to_string(), user)
    }

    /// Prompt for ranking several verified candidates.
    pub fn selection(&self, word: &str, meaning: &str, candidates: &[Candidate]) -> (String, String) {
        let listing = candidates
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let reason = if c.rationale.is_empty() {
                    "no note"
                } else {
                    c.rationale.as_str()
                };
                format!("{}. {} - {}", i + 1, c.word, reason)
            })
            .collect::<Vec<_>>()
            .join("\n");

        let user = fill(SELECTION_TEMPLATE, word, meaning).replace("{candidates}", &listing);
        (SYSTEM_TEACHER.to_string(), user)
    }
}

fn fill(template: &str, word: &str, meaning: &str) -> String {
    let meaning = if meaning.trim().is_empty() {
        "unknown"
    } else {
        meaning.trim()
    };
    template.replace("{word}", word).replace("{meaning}", meaning)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correction_prompt_embeds_word_and_meaning() {
        let (system, user) = PromptBuilder::new().correction("recieve", "to get");

        assert!(system.contains("JSON"));
        assert!(user.contains("Word: recieve"));
        assert!(user.contains("Meaning: to get"));
        assert!(user.contains("\"corrected\""));
        assert!(!user.contains("{word}"));
    }

    #[test]
    fn blank_meaning_is_marked_unknown() {
        let (_, user) = PromptBuilder::new().correction("xqplm", "  ");
        assert!(user.contains("Meaning: unknown"));
    }

    #[test]
    fn candidates_prompt_asks_for_list() {
        let (_, user) = PromptBuilder::new().candidates("xqplm", "a model");

        assert!(user.contains("\"xqplm\""));
        assert!(user.contains("(meaning: a model)"));
        assert!(user.contains("3 to 5"));
        assert!(user.contains("\"candidates\""));
    }

    #[test]
    fn selection_prompt_numbers_candidates() {
        let candidates = vec![
            Candidate::new("example", "closest meaning"),
            Candidate::new("template", ""),
        ];
        let (system, user) = PromptBuilder::new().selection("xqplm", "a model", &candidates);

        assert!(system.contains("teaching"));
        assert!(user.contains("1. example - closest meaning"));
        assert!(user.contains("2. template - no note"));
        assert!(!user.contains("{candidates}"));
    }
}

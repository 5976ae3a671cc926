//! Parsing of the JSON objects the correction prompts ask for.
//!
//! Models often wrap the object in a Markdown code fence, so every parser
//! first runs [`extract_json_block`].  Missing fields are reported as
//! [`LlmError::Shape`]; callers decide the fallback.

use serde::Deserialize;

use crate::llm::client::LlmError;
use crate::llm::types::{Candidate, Confidence};

// ---------------------------------------------------------------------------
// Reply shapes
// ---------------------------------------------------------------------------

/// `{"corrected", "confidence", "reason"}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CorrectionReply {
    pub corrected: String,
    #[serde(default)]
    pub confidence: Option<String>,
    #[serde(default)]
    pub reason: String,
}

/// `{"candidates": [{"word", "reason"}]}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CandidatesReply {
    pub candidates: Vec<CandidateReply>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CandidateReply {
    pub word: String,
    #[serde(default)]
    pub reason: String,
}

/// `{"selected", "reason", "confidence"}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SelectionReply {
    pub selected: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub confidence: Option<String>,
}

// ---------------------------------------------------------------------------
// Fence handling
// ---------------------------------------------------------------------------

/// Return the body of the first ```` ```json ```` (or bare ```` ``` ````)
/// fence, or the whole trimmed reply when there is none.
pub fn extract_json_block(content: &str) -> &str {
    let content = content.trim();

    let after_fence = if let Some((_, rest)) = content.split_once("```json") {
        Some(rest)
    } else {
        content.split_once("```").map(|(_, rest)| rest)
    };

    match after_fence {
        Some(rest) => rest.split("```").next().unwrap_or(rest).trim(),
        None => content,
    }
}

/// Whether the (possibly fenced) reply is a JSON document at all.
pub fn is_json_reply(content: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(extract_json_block(content)).is_ok()
}

fn parse_object<T: for<'de> Deserialize<'de>>(content: &str) -> Result<T, LlmError> {
    let body = extract_json_block(content);
    serde_json::from_str(body).map_err(|e| LlmError::Shape(e.to_string()))
}

// ---------------------------------------------------------------------------
// Parsers
// ---------------------------------------------------------------------------

pub fn parse_correction(content: &str) -> Result<CorrectionReply, LlmError> {
    let reply: CorrectionReply = parse_object(content)?;
    if reply.corrected.trim().is_empty() {
        return Err(LlmError::Shape("empty \"corrected\" field".into()));
    }
    Ok(CorrectionReply {
        corrected: reply.corrected.trim().to_string(),
        ..reply
    })
}

/// Candidates with blank words are dropped.
pub fn parse_candidates(content: &str) -> Result<Vec<Candidate>, LlmError> {
    let reply: CandidatesReply = parse_object(content)?;
    Ok(reply
        .candidates
        .into_iter()
        .filter(|c| !c.word.trim().is_empty())
        .map(|c| Candidate::new(c.word.trim(), c.reason))
        .collect())
}

pub fn parse_selection(content: &str) -> Result<SelectionReply, LlmError> {
    let reply: SelectionReply = parse_object(content)?;
    if reply.selected.trim().is_empty() {
        return Err(LlmError::Shape("empty \"selected\" field".into()));
    }
    Ok(SelectionReply {
        selected: reply.selected.trim().to_string(),
        ..reply
    })
}

/// Best-effort guess from free text: the first whitespace-delimited token
/// with non-alphabetic characters stripped from both ends.
pub fn first_token_guess(content: &str) -> Option<String> {
    let token = content
        .split_whitespace()
        .next()?
        .trim_matches(|c: char| !c.is_alphabetic());
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Confidence of a reply field, `medium` when the model left it out.
pub fn reply_confidence(label: Option<&str>) -> Confidence {
    label.map(Confidence::from_label).unwrap_or(Confidence::Medium)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

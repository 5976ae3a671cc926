//! Correction artifacts produced by the engine and consumed by the pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Confidence
// ---------------------------------------------------------------------------

/// Qualitative trust level the engine reports for its own output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
    /// No usable answer was produced.
    None,
}

impl Confidence {
    /// Parse the label an LLM put in its reply.  Anything unrecognised is
    /// treated as `Low`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "high" => Confidence::High,
            "medium" => Confidence::Medium,
            "low" => Confidence::Low,
            "none" => Confidence::None,
            _ => Confidence::Low,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
            Confidence::None => "none",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// CorrectionAttempt
// ---------------------------------------------------------------------------

/// Round-1 proposal for one unrecognized word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionAttempt {
    pub original: String,
    pub corrected: String,
    pub confidence: Confidence,
    pub rationale: String,
    /// Set only after the oracle re-checked `corrected`.
    pub verified: bool,
    /// The engine call produced no usable answer.
    #[serde(default)]
    pub failed: bool,
    pub source_line: Option<usize>,
}

impl CorrectionAttempt {
    /// An unverified proposal from the engine.
    pub fn proposal(
        original: &str,
        corrected: impl Into<String>,
        confidence: Confidence,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            original: original.to_string(),
            corrected: corrected.into(),
            confidence,
            rationale: rationale.into(),
            verified: false,
            failed: false,
            source_line: None,
        }
    }

    /// An attempt whose engine call produced nothing usable.
    pub fn failed(original: &str, rationale: impl Into<String>) -> Self {
        Self {
            original: original.to_string(),
            corrected: original.to_string(),
            confidence: Confidence::None,
            rationale: rationale.into(),
            verified: false,
            failed: true,
            source_line: None,
        }
    }

    /// `false` when the engine call itself failed.  The reported
    /// confidence plays no part.
    pub fn is_proposal(&self) -> bool {
        !self.failed
    }

    /// Whether the proposal changes the word at all (exact comparison, so a
    /// case-only fix counts as a change).
    pub fn changes_word(&self) -> bool {
        self.corrected != self.original
    }
}

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// One round-2 alternative for a word whose direct correction failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub word: String,
    pub rationale: String,
    pub verified: bool,
}

impl Candidate {
    pub fn new(word: impl Into<String>, rationale: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            rationale: rationale.into(),
            verified: false,
        }
    }
}

// ---------------------------------------------------------------------------
// SelectionResult
// ---------------------------------------------------------------------------

/// Terminal artifact of round 2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionResult {
    pub original: String,
    pub selected: String,
    pub rationale: String,
    pub confidence: Confidence,
    /// Every candidate generated for the word, verified or not.
    pub candidates: Vec<Candidate>,
    pub source_line: Option<usize>,
}

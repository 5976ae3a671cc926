//! Per-word correction state machine.
//!
//! ```text
//! Pending ──propose──▶ Round1Proposed ──verified──▶ Round1Verified
//!                                     ──failed────▶ Round1Failed
//! Round1Failed ──candidates──▶ CandidatesGenerated ──batch──▶ CandidatesVerified
//!              ──none───────▶ Unresolved
//! CandidatesVerified ──≥1 verified──▶ Selected
//!                    ──0 verified───▶ Unresolved
//! ```

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WordState {
    Pending,
    Round1Proposed,
    Round1Verified,
    /// Proposal not verified, or the proposal call itself failed.
    Round1Failed,
    CandidatesGenerated,
    CandidatesVerified,
    Selected,
    Unresolved,
}

impl WordState {
    /// `Round1Verified`, `Selected` and `Unresolved` end a word's run.
    ///
    /// ```
    /// use wordbook_verify::pipeline::WordState;
    ///
    /// assert!(WordState::Selected.is_terminal());
    /// assert!(!WordState::Round1Failed.is_terminal());
    /// ```
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WordState::Round1Verified | WordState::Selected | WordState::Unresolved
        )
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(&self, next: WordState) -> bool {
        use WordState::*;
        matches!(
            (self, next),
            (Pending, Round1Proposed)
                | (Round1Proposed, Round1Verified)
                | (Round1Proposed, Round1Failed)
                | (Round1Failed, CandidatesGenerated)
                | (Round1Failed, Unresolved)
                | (CandidatesGenerated, CandidatesVerified)
                | (CandidatesVerified, Selected)
                | (CandidatesVerified, Unresolved)
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            WordState::Pending => "pending",
            WordState::Round1Proposed => "round 1 proposed",
            WordState::Round1Verified => "corrected (round 1)",
            WordState::Round1Failed => "round 1 failed",
            WordState::CandidatesGenerated => "candidates generated",
            WordState::CandidatesVerified => "candidates verified",
            WordState::Selected => "corrected (round 2)",
            WordState::Unresolved => "unresolved",
        }
    }
}

impl Default for WordState {
    fn default() -> Self {
        WordState::Pending
    }
}

/// Current state of one unrecognized word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordProgress {
    pub word: String,
    pub state: WordState,
}

impl WordProgress {
    pub fn new(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            state: WordState::Pending,
        }
    }

    /// Move to `next`.  Illegal transitions are a pipeline bug.
    pub fn advance(&mut self, next: WordState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal transition for {:?}: {:?} -> {:?}",
            self.word,
            self.state,
            next
        );
        log::debug!("{}: {} -> {}", self.word, self.state.label(), next.label());
        self.state = next;
    }
}

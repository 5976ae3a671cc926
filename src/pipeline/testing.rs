//! Scripted oracle, engine and clock for pipeline tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::llm::{
    Candidate, Confidence, CorrectionAttempt, CorrectionEngine, LlmError, SelectionResult,
};
use crate::oracle::{OracleError, Partition, RecognitionOracle};

use super::throttle::Clock;

// ---------------------------------------------------------------------------
// ManualClock
// ---------------------------------------------------------------------------

/// Records requested pauses instead of sleeping.
#[derive(Default)]
pub struct ManualClock {
    pauses: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn pauses(&self) -> usize {
        self.pauses.lock().unwrap().len()
    }

    pub fn elapsed(&self) -> Duration {
        self.pauses.lock().unwrap().iter().sum()
    }
}

#[async_trait]
impl Clock for ManualClock {
    async fn sleep(&self, duration: Duration) {
        self.pauses.lock().unwrap().push(duration);
    }
}

// ---------------------------------------------------------------------------
// ScriptedOracle
// ---------------------------------------------------------------------------

/// Recognizes a fixed vocabulary case-insensitively.  Calls numbered at or
/// past `fail_from` return a network error.  A lowercasing oracle reports
/// every word in lowercase.
pub struct ScriptedOracle {
    known: HashSet<String>,
    fail_from: Option<usize>,
    lowercase: bool,
    batches: Mutex<Vec<Vec<String>>>,
}

impl ScriptedOracle {
    pub fn knowing(words: &[&str]) -> Self {
        Self {
            known: words.iter().map(|w| w.to_lowercase()).collect(),
            fail_from: None,
            lowercase: false,
            batches: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_from(mut self, call: usize) -> Self {
        self.fail_from = Some(call);
        self
    }

    pub fn lowercasing(mut self) -> Self {
        self.lowercase = true;
        self
    }

    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecognitionOracle for ScriptedOracle {
    async fn verify(&self, words: &[String]) -> Result<Partition, OracleError> {
        let call = {
            let mut batches = self.batches.lock().unwrap();
            batches.push(words.to_vec());
            batches.len() - 1
        };
        if self.fail_from.is_some_and(|n| call >= n) {
            return Err(OracleError::Request("connection refused".into()));
        }

        let (recognized, unrecognized) = words
            .iter()
            .map(|w| if self.lowercase { w.to_lowercase() } else { w.clone() })
            .partition(|w| self.known.contains(&w.to_lowercase()));
        Ok(Partition {
            recognized,
            unrecognized,
        })
    }
}

// ---------------------------------------------------------------------------
// ScriptedEngine
// ---------------------------------------------------------------------------

/// Answers from per-word scripts and logs every call as `"<op>:<word>"`.
/// Unscripted proposals fail, unscripted candidate lists are empty and
/// unscripted selections return an error.
pub struct ScriptedEngine {
    enabled: bool,
    proposals: HashMap<String, String>,
    candidates: HashMap<String, Vec<String>>,
    selections: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self {
            enabled: true,
            proposals: HashMap::new(),
            candidates: HashMap::new(),
            selections: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new()
        }
    }

    pub fn propose(mut self, word: &str, corrected: &str) -> Self {
        self.proposals.insert(word.into(), corrected.into());
        self
    }

    pub fn candidates(mut self, word: &str, words: &[&str]) -> Self {
        self.candidates
            .insert(word.into(), words.iter().map(|w| w.to_string()).collect());
        self
    }

    pub fn select(mut self, word: &str, selected: &str) -> Self {
        self.selections.insert(word.into(), selected.into());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, op: &str) -> usize {
        let prefix = format!("{op}:");
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(&prefix))
            .count()
    }

    fn record(&self, op: &str, word: &str) {
        self.calls.lock().unwrap().push(format!("{op}:{word}"));
    }
}

#[async_trait]
impl CorrectionEngine for ScriptedEngine {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn propose_correction(&self, word: &str, _meaning: &str) -> CorrectionAttempt {
        self.record("propose", word);
        match self.proposals.get(word) {
            Some(corrected) => {
                CorrectionAttempt::proposal(word, corrected.as_str(), Confidence::High, "scripted")
            }
            None => CorrectionAttempt::failed(word, "no script"),
        }
    }

    async fn generate_candidates(&self, word: &str, _meaning: &str) -> Vec<Candidate> {
        self.record("candidates", word);
        self.candidates
            .get(word)
            .map(|words| words.iter().map(|w| Candidate::new(w.as_str(), "scripted")).collect())
            .unwrap_or_default()
    }

    async fn select_best(
        &self,
        original: &str,
        _meaning: &str,
        verified: &[Candidate],
    ) -> Result<SelectionResult, LlmError> {
        self.record("select", original);
        let selected = self
            .selections
            .get(original)
            .ok_or(LlmError::EmptyResponse)?;
        Ok(SelectionResult {
            original: original.to_string(),
            selected: selected.clone(),
            rationale: "scripted".into(),
            confidence: Confidence::Medium,
            candidates: verified.to_vec(),
            source_line: None,
        })
    }
}

//! `CorrectionPipeline` — partition, two correction rounds, apply.
//!
//! # Flow
//!
//! ```text
//! read word list ──▶ oracle partition
//!   └─ unrecognized (deduplicated, resolved against the entry index)
//!        │
//!        ├─ round 1: propose_correction per word        [paced]
//!        │           one batch verify of every proposal
//!        │             ├─ verified → Round1Verified
//!        │             └─ else     → Round1Failed
//!        │
//!        ├─ round 2: generate_candidates per failed word [paced]
//!        │           one combined verify of every candidate
//!        │           per word: 0 verified → Unresolved
//!        │                     1 verified → Selected (no engine call)
//!        │                     n verified → select_best [paced]
//!        │
//!        └─ spawn_blocking(FileMutator::apply)  unless dry run
//! ```
//!
//! Only oracle-verified words ever reach the mutator.  Failures after the
//! initial partition degrade into report diagnostics; `run` errors only when
//! it cannot even read and partition the word list.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::config::AppConfig;
use crate::llm::{
    Candidate, Confidence, CorrectionAttempt, CorrectionEngine, LlmEngine, SelectionResult,
};
use crate::oracle::{HttpOracle, OracleError, Partition, RecognitionOracle, VerificationBatcher};
use crate::wordlist::{read_word_list, EntryError, EntryIndex, FileMutator, Replacement, WordEntry};

use super::report::{AppliedCorrection, PipelineResult, Round};
use super::state::{WordProgress, WordState};
use super::throttle::{Pacer, Throttle};

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    WordList(#[from] EntryError),

    #[error("initial verification failed: {0}")]
    Oracle(#[from] OracleError),
}

// ---------------------------------------------------------------------------
// CorrectionPipeline
// ---------------------------------------------------------------------------

pub struct CorrectionPipeline {
    oracle: Arc<dyn RecognitionOracle>,
    batcher: VerificationBatcher,
    engine: Arc<dyn CorrectionEngine>,
    throttle: Throttle,
    mutator: FileMutator,
    apply: bool,
}

impl CorrectionPipeline {
    pub fn new(
        oracle: Arc<dyn RecognitionOracle>,
        engine: Arc<dyn CorrectionEngine>,
        throttle: Throttle,
    ) -> Self {
        Self {
            batcher: VerificationBatcher::new(oracle.clone()),
            oracle,
            engine,
            throttle,
            mutator: FileMutator::new(),
            apply: true,
        }
    }

    /// Production wiring: HTTP oracle, chat-completion engine, real clock.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Arc::new(HttpOracle::from_config(&config.oracle)),
            Arc::new(LlmEngine::from_config(&config.llm)),
            Throttle::from_millis(config.pipeline.call_delay_ms),
        )
        .with_apply(config.pipeline.apply_corrections)
    }

    /// `false` runs both rounds but leaves the word list untouched.
    pub fn with_apply(mut self, apply: bool) -> Self {
        self.apply = apply;
        self
    }

    /// Partition only, no correction.
    pub async fn check(&self, word_file: &Path) -> Result<Partition, PipelineError> {
        let words = read_word_list(word_file)?;
        if words.is_empty() {
            return Ok(Partition::default());
        }
        Ok(self.oracle.verify(&words).await?)
    }

    pub async fn run(
        &self,
        word_file: &Path,
        entries: &EntryIndex,
    ) -> Result<PipelineResult, PipelineError> {
        let words = read_word_list(word_file)?;
        let mut result = PipelineResult::default();
        if words.is_empty() {
            log::info!("{} holds no words", word_file.display());
            return Ok(result);
        }

        let partition = self.oracle.verify(&words).await?;
        result.total_count = partition.total();
        result.recognized_count = partition.recognized.len();
        result.unrecognized_count = partition.unrecognized.len();
        result.recognized_words = partition.recognized.clone();

        let mut listed: HashMap<String, &str> = HashMap::new();
        for w in &words {
            listed.entry(w.to_lowercase()).or_insert(w.as_str());
        }
        let mut seen = HashSet::new();
        result.unrecognized = partition
            .unrecognized
            .iter()
            .filter(|w| seen.insert(w.to_lowercase()))
            .map(|w| document_entry(entries, &listed, w))
            .collect();

        log::info!(
            "{} of {} words recognized ({:.1}%)",
            result.recognized_count,
            result.total_count,
            partition.recognition_rate()
        );

        if result.unrecognized.is_empty() {
            return Ok(result);
        }
        if !self.engine.is_enabled() {
            log::warn!("LLM is not configured; skipping correction");
            result.llm_skipped = true;
            return Ok(result);
        }

        let mut progress: Vec<WordProgress> = result
            .unrecognized
            .iter()
            .map(|e| WordProgress::new(e.word.as_str()))
            .collect();

        result.corrections = self
            .round_one(&result.unrecognized, &mut progress, &mut result.diagnostics)
            .await;

        let failed: Vec<usize> = progress
            .iter()
            .enumerate()
            .filter(|(_, p)| p.state == WordState::Round1Failed)
            .map(|(i, _)| i)
            .collect();
        if !failed.is_empty() {
            result.selections = self
                .round_two(
                    &result.unrecognized,
                    &failed,
                    &mut progress,
                    &mut result.diagnostics,
                )
                .await;
        }
        result.outcomes = progress;
        result.applied = plan_corrections(&result.corrections, &result.selections);

        self.apply_corrections(word_file, &mut result).await;
        Ok(result)
    }

    // -----------------------------------------------------------------------
    // Round 1
    // -----------------------------------------------------------------------

    async fn round_one(
        &self,
        entries: &[WordEntry],
        progress: &mut [WordProgress],
        diagnostics: &mut Vec<String>,
    ) -> Vec<CorrectionAttempt> {
        log::info!("round 1: proposing corrections for {} words", entries.len());
        let mut pacer = self.throttle.pacer();
        let mut attempts = Vec::with_capacity(entries.len());

        for (entry, p) in entries.iter().zip(progress.iter_mut()) {
            pacer.ready().await;
            let mut attempt = self
                .engine
                .propose_correction(&entry.word, &entry.meaning)
                .await;
            attempt.source_line = entry.source_line;
            log::info!(
                "{} -> {} ({})",
                attempt.original,
                attempt.corrected,
                attempt.confidence
            );
            p.advance(WordState::Round1Proposed);
            attempts.push(attempt);
        }

        let proposals = unique_words(
            attempts
                .iter()
                .filter(|a| a.is_proposal())
                .map(|a| a.corrected.as_str()),
        );
        let verified = self.verify_all(&proposals, "round 1", diagnostics).await;

        for (attempt, p) in attempts.iter_mut().zip(progress.iter_mut()) {
            attempt.verified =
                attempt.is_proposal() && verified.contains(&attempt.corrected.to_lowercase());
            p.advance(if attempt.verified {
                WordState::Round1Verified
            } else {
                WordState::Round1Failed
            });
        }
        log::info!(
            "round 1: {} of {} proposals verified",
            attempts.iter().filter(|a| a.verified).count(),
            attempts.len()
        );
        attempts
    }

    // -----------------------------------------------------------------------
    // Round 2
    // -----------------------------------------------------------------------

    async fn round_two(
        &self,
        entries: &[WordEntry],
        failed: &[usize],
        progress: &mut [WordProgress],
        diagnostics: &mut Vec<String>,
    ) -> Vec<SelectionResult> {
        log::info!("round 2: generating candidates for {} words", failed.len());
        let mut pacer = self.throttle.pacer();
        let mut pending: Vec<(usize, Vec<Candidate>)> = Vec::new();

        for &i in failed {
            let entry = &entries[i];
            pacer.ready().await;
            let candidates = self
                .engine
                .generate_candidates(&entry.word, &entry.meaning)
                .await;
            if candidates.is_empty() {
                log::info!("{}: no candidates", entry.word);
                progress[i].advance(WordState::Unresolved);
                continue;
            }
            progress[i].advance(WordState::CandidatesGenerated);
            pending.push((i, candidates));
        }
        if pending.is_empty() {
            return Vec::new();
        }

        let all = unique_words(
            pending
                .iter()
                .flat_map(|(_, cs)| cs.iter().map(|c| c.word.as_str())),
        );
        let verified = self.verify_all(&all, "round 2", diagnostics).await;

        let mut selections = Vec::new();
        for (i, mut candidates) in pending {
            for c in &mut candidates {
                c.verified = verified.contains(&c.word.to_lowercase());
            }
            progress[i].advance(WordState::CandidatesVerified);

            match self
                .select(&entries[i], candidates, &mut pacer, diagnostics)
                .await
            {
                Some(selection) => {
                    log::info!(
                        "{} -> {} ({})",
                        selection.original,
                        selection.selected,
                        selection.confidence
                    );
                    progress[i].advance(WordState::Selected);
                    selections.push(selection);
                }
                None => {
                    log::info!("{}: no verified candidate", entries[i].word);
                    progress[i].advance(WordState::Unresolved);
                }
            }
        }
        selections
    }

    /// Zero verified candidates yield nothing, one is taken as is, several
    /// go to the engine.  Whatever comes back must be one of the verified
    /// candidates, otherwise the first verified one stands in.
    async fn select(
        &self,
        entry: &WordEntry,
        candidates: Vec<Candidate>,
        pacer: &mut Pacer<'_>,
        diagnostics: &mut Vec<String>,
    ) -> Option<SelectionResult> {
        let verified: Vec<Candidate> = candidates.iter().filter(|c| c.verified).cloned().collect();
        let first = verified.first()?;

        let (selected, rationale, confidence) = if verified.len() == 1 {
            (
                first.word.clone(),
                "only verified candidate".to_string(),
                Confidence::High,
            )
        } else {
            pacer.ready().await;
            match self
                .engine
                .select_best(&entry.word, &entry.meaning, &verified)
                .await
            {
                Ok(choice) => match verified
                    .iter()
                    .find(|c| c.word.to_lowercase() == choice.selected.to_lowercase())
                {
                    Some(c) => (c.word.clone(), choice.rationale, choice.confidence),
                    None => {
                        diagnostics.push(format!(
                            "{}: selection {:?} is not a verified candidate; using {}",
                            entry.word, choice.selected, first.word
                        ));
                        (
                            first.word.clone(),
                            "first verified candidate".to_string(),
                            Confidence::Low,
                        )
                    }
                },
                Err(e) => {
                    log::warn!("selection for {} failed: {e}", entry.word);
                    diagnostics.push(format!("{}: selection failed: {e}", entry.word));
                    (
                        first.word.clone(),
                        "first verified candidate".to_string(),
                        Confidence::Low,
                    )
                }
            }
        };

        Some(SelectionResult {
            original: entry.word.clone(),
            selected,
            rationale,
            confidence,
            candidates,
            source_line: entry.source_line,
        })
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Lowercased set of the words the oracle recognized.
    async fn verify_all(
        &self,
        words: &[String],
        round: &str,
        diagnostics: &mut Vec<String>,
    ) -> HashSet<String> {
        let (membership, error) = self.batcher.verify_batch_reporting(words).await;
        if let Some(e) = error {
            diagnostics.push(format!("{round} verification failed: {e}"));
        }
        verified_set(&membership)
    }

    async fn apply_corrections(&self, word_file: &Path, result: &mut PipelineResult) {
        if result.applied.is_empty() {
            return;
        }
        if !self.apply {
            log::info!(
                "dry run: {} correction(s) not written",
                result.applied.len()
            );
            return;
        }

        let replacements: Vec<Replacement> = result
            .applied
            .iter()
            .map(|a| Replacement::new(a.original.as_str(), a.corrected.as_str()))
            .collect();
        let mutator = self.mutator;
        let path = word_file.to_path_buf();
        let outcome =
            tokio::task::spawn_blocking(move || mutator.apply(&path, &replacements)).await;

        match outcome {
            Ok(Ok(summary)) => {
                for (applied, lines) in result.applied.iter_mut().zip(summary.hits) {
                    if lines.is_empty() {
                        log::warn!("{}: no line of the word list matched", applied.original);
                        result.diagnostics.push(format!(
                            "{} -> {}: no line of {} matched, nothing replaced",
                            applied.original,
                            applied.corrected,
                            word_file.display()
                        ));
                    }
                    applied.lines = lines;
                }
                result.corrections_applied = !summary.replaced_lines.is_empty();
                result.replaced_lines = summary.replaced_lines;
                result.backup = Some(summary.backup);
            }
            Ok(Err(e)) => {
                log::error!("applying corrections failed: {e}");
                result.diagnostics.push(format!("apply failed: {e}"));
            }
            Err(e) => {
                log::error!("apply task panicked: {e}");
                result.diagnostics.push(format!("apply failed: {e}"));
            }
        }
    }
}

/// The entry for an oracle-reported word, spelled as the document spells it:
/// the parser's spelling when it has an entry, else the word list's own line.
fn document_entry(entries: &EntryIndex, listed: &HashMap<String, &str>, word: &str) -> WordEntry {
    if entries.get(word).is_some() {
        return entries.resolve(word);
    }
    let spelling = listed.get(&word.to_lowercase()).copied().unwrap_or(word);
    WordEntry::bare(spelling)
}

/// At most one correction per original word; round 1 wins over round 2.
fn plan_corrections(
    attempts: &[CorrectionAttempt],
    selections: &[SelectionResult],
) -> Vec<AppliedCorrection> {
    let mut covered = HashSet::new();
    let mut planned = Vec::new();

    for a in attempts.iter().filter(|a| a.verified && a.changes_word()) {
        if covered.insert(a.original.to_lowercase()) {
            planned.push(AppliedCorrection {
                original: a.original.clone(),
                corrected: a.corrected.clone(),
                round: Round::First,
                confidence: a.confidence,
                lines: Vec::new(),
            });
        }
    }
    for s in selections.iter().filter(|s| s.selected != s.original) {
        if covered.insert(s.original.to_lowercase()) {
            planned.push(AppliedCorrection {
                original: s.original.clone(),
                corrected: s.selected.clone(),
                round: Round::Second,
                confidence: s.confidence,
                lines: Vec::new(),
            });
        }
    }
    planned
}

fn unique_words<'a>(words: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    words
        .filter(|w| !w.trim().is_empty())
        .filter(|w| seen.insert(w.to_lowercase()))
        .map(str::to_string)
        .collect()
}

fn verified_set(membership: &HashMap<String, bool>) -> HashSet<String> {
    membership
        .iter()
        .filter(|(_, ok)| **ok)
        .map(|(w, _)| w.to_lowercase())
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

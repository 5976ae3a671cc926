//! `PipelineResult` — everything one run observed, plus its text and JSON
//! renderings.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::llm::{Confidence, CorrectionAttempt, SelectionResult};
use crate::wordlist::WordEntry;

use super::state::{WordProgress, WordState};

/// Which round produced an applied correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Round {
    First,
    Second,
}

impl Round {
    pub fn label(&self) -> &'static str {
        match self {
            Round::First => "round 1",
            Round::Second => "round 2",
        }
    }
}

/// A verified correction chosen for the word list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedCorrection {
    pub original: String,
    pub corrected: String,
    pub round: Round,
    pub confidence: Confidence,
    /// 1-based lines rewritten for this correction.
    pub lines: Vec<usize>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineResult {
    pub total_count: usize,
    pub recognized_count: usize,
    pub unrecognized_count: usize,
    pub recognized_words: Vec<String>,
    pub unrecognized: Vec<WordEntry>,
    /// The engine was disabled, so no correction was attempted.
    pub llm_skipped: bool,
    pub corrections: Vec<CorrectionAttempt>,
    pub selections: Vec<SelectionResult>,
    pub outcomes: Vec<WordProgress>,
    pub applied: Vec<AppliedCorrection>,
    /// `true` only when at least one line of the word list was replaced.
    pub corrections_applied: bool,
    /// 1-based lines of the word list that were replaced.
    pub replaced_lines: Vec<usize>,
    pub backup: Option<PathBuf>,
    pub diagnostics: Vec<String>,
}

impl PipelineResult {
    pub fn recognition_rate(&self) -> f64 {
        if self.total_count == 0 {
            0.0
        } else {
            self.recognized_count as f64 / self.total_count as f64 * 100.0
        }
    }

    /// Words that ended with no verified correction.
    pub fn unresolved(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.state == WordState::Unresolved)
            .map(|o| o.word.as_str())
            .collect()
    }

    pub fn round_one_verified(&self) -> usize {
        self.corrections.iter().filter(|c| c.verified).count()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Word verification report");
        let _ = writeln!(out, "========================");
        let _ = writeln!(out, "total:        {}", self.total_count);
        let _ = writeln!(
            out,
            "recognized:   {} ({:.1}%)",
            self.recognized_count,
            self.recognition_rate()
        );
        let _ = writeln!(out, "unrecognized: {}", self.unrecognized_count);

        if !self.unrecognized.is_empty() {
            let _ = writeln!(out, "\nUnrecognized words");
            for entry in &self.unrecognized {
                match entry.source_line {
                    Some(line) => {
                        let _ = writeln!(out, "  {} (line {line})", entry.word);
                    }
                    None => {
                        let _ = writeln!(out, "  {}", entry.word);
                    }
                }
            }
        }

        if self.llm_skipped {
            let _ = writeln!(out, "\nCorrection skipped: LLM is not configured.");
        }

        if !self.corrections.is_empty() {
            let _ = writeln!(
                out,
                "\nRound 1: {} proposal(s), {} verified",
                self.corrections.len(),
                self.round_one_verified()
            );
            for c in &self.corrections {
                let mark = if c.verified { "ok" } else { "--" };
                let _ = writeln!(
                    out,
                    "  [{mark}] {} -> {} ({}) {}",
                    c.original, c.corrected, c.confidence, c.rationale
                );
            }
        }

        if !self.selections.is_empty() {
            let _ = writeln!(out, "\nRound 2: {} selection(s)", self.selections.len());
            for s in &self.selections {
                let _ = writeln!(
                    out,
                    "  {} -> {} ({}) {}",
                    s.original, s.selected, s.confidence, s.rationale
                );
                for c in &s.candidates {
                    let mark = if c.verified { "ok" } else { "--" };
                    let _ = writeln!(out, "      [{mark}] {}", c.word);
                }
            }
        }

        let unresolved = self.unresolved();
        if !unresolved.is_empty() {
            let _ = writeln!(out, "\nUnresolved: {}", unresolved.join(", "));
        }

        if !self.applied.is_empty() {
            let status = if self.corrections_applied {
                "applied"
            } else {
                "not applied"
            };
            let _ = writeln!(out, "\nCorrections ({status})");
            for a in &self.applied {
                let lines = if a.lines.is_empty() {
                    "-".to_string()
                } else {
                    a.lines
                        .iter()
                        .map(|l| l.to_string())
                        .collect::<Vec<_>>()
                        .join(",")
                };
                let _ = writeln!(
                    out,
                    "  {} -> {} [{}] lines {lines}",
                    a.original,
                    a.corrected,
                    a.round.label()
                );
            }
        }
        if let Some(backup) = &self.backup {
            let _ = writeln!(out, "backup: {}", backup.display());
        }

        if !self.diagnostics.is_empty() {
            let _ = writeln!(out, "\nDiagnostics");
            for d in &self.diagnostics {
                let _ = writeln!(out, "  {d}");
            }
        }
        out
    }

    /// Write the report: JSON for a `.json` path, text otherwise.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let body = if is_json {
            self.to_json()?
        } else {
            self.render_text()
        };
        std::fs::write(path, body)?;
        log::info!("report written to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Candidate;
    use tempfile::tempdir;

    fn sample() -> PipelineResult {
        let mut outcome = WordProgress::new("xqplm");
        outcome.state = WordState::Unresolved;
        PipelineResult {
            total_count: 4,
            recognized_count: 3,
            unrecognized_count: 1,
            recognized_words: vec!["apple".into(), "banana".into(), "cherry".into()],
            unrecognized: vec![WordEntry::bare("xqplm")],
            corrections: vec![CorrectionAttempt::failed("xqplm", "timeout")],
            selections: vec![SelectionResult {
                original: "zzz".into(),
                selected: "buzz".into(),
                rationale: "closest".into(),
                confidence: Confidence::Medium,
                candidates: vec![Candidate::new("buzz", "")],
                source_line: None,
            }],
            outcomes: vec![outcome],
            diagnostics: vec!["round 2 verification failed".into()],
            ..Default::default()
        }
    }

    #[test]
    fn rate_is_a_percentage() {
        assert_eq!(sample().recognition_rate(), 75.0);
        assert_eq!(PipelineResult::default().recognition_rate(), 0.0);
    }

    #[test]
    fn text_lists_every_section() {
        let text = sample().render_text();
        assert!(text.contains("recognized:   3 (75.0%)"));
        assert!(text.contains("Round 1: 1 proposal(s), 0 verified"));
        assert!(text.contains("zzz -> buzz (medium)"));
        assert!(text.contains("Unresolved: xqplm"));
        assert!(text.contains("round 2 verification failed"));
    }

    #[test]
    fn save_picks_format_from_extension() {
        let dir = tempdir().expect("temp dir");
        let result = sample();

        let json_path = dir.path().join("report.json");
        result.save(&json_path).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(value["unrecognized_count"], 1);
        assert_eq!(value["outcomes"][0]["state"], "Unresolved");

        let text_path = dir.path().join("report.txt");
        result.save(&text_path).unwrap();
        assert!(std::fs::read_to_string(&text_path)
            .unwrap()
            .starts_with("Word verification report"));
    }
}

//! Two-round correction pipeline.
//!
//! ```text
//! word list ──▶ RecognitionOracle ──▶ unrecognized entries
//!                                          │
//!     round 1: CorrectionEngine::propose_correction ─▶ VerificationBatcher
//!     round 2: generate_candidates ─▶ VerificationBatcher ─▶ select_best
//!                                          │
//!                       verified corrections ─▶ FileMutator ─▶ PipelineResult
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use wordbook_verify::config::AppConfig;
//! use wordbook_verify::pipeline::CorrectionPipeline;
//! use wordbook_verify::wordlist::EntryIndex;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let mut config = AppConfig::load()?;
//!     config.apply_env_overrides();
//!
//!     let pipeline = CorrectionPipeline::from_config(&config);
//!     let result = pipeline
//!         .run(Path::new("words.txt"), &EntryIndex::default())
//!         .await?;
//!     print!("{}", result.render_text());
//!     Ok(())
//! }
//! ```

pub mod report;
pub mod runner;
pub mod state;
pub mod throttle;

#[cfg(test)]
pub(crate) mod testing;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use report::{AppliedCorrection, PipelineResult, Round};
pub use runner::{CorrectionPipeline, PipelineError};
pub use state::{WordProgress, WordState};
pub use throttle::{Clock, Pacer, Throttle, TokioClock};

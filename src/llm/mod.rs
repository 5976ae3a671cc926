//! Language-model correction module.
//!
//! This module provides:
//! * [`CorrectionEngine`] — async trait with the three correction operations.
//! * [`LlmEngine`] — chat-model implementation with fail-soft fallbacks.
//! * [`ChatClient`] / [`ChatCompletion`] — OpenAI-compatible transport.
//! * [`PromptBuilder`] — correction / candidate / selection prompts.
//! * [`response`] — fenced-JSON extraction and reply parsing.
//! * [`LlmError`] — error variants for LLM operations.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use wordbook_verify::config::AppConfig;
//! use wordbook_verify::llm::{CorrectionEngine, LlmEngine};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut config = AppConfig::default();
//!     config.apply_env_overrides();
//!
//!     let engine = LlmEngine::from_config(&config.llm);
//!     let attempt = engine.propose_correction("recieve", "to get").await;
//!     println!("{} -> {} ({})", attempt.original, attempt.corrected, attempt.confidence);
//! }
//! ```

pub mod client;
pub mod engine;
pub mod prompt;
pub mod response;
pub mod types;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use client::{ChatClient, ChatCompletion, LlmError};
pub use engine::{CorrectionEngine, LlmEngine};
pub use prompt::PromptBuilder;
pub use types::{Candidate, Confidence, CorrectionAttempt, SelectionResult};

//! Vocabulary-list verification and two-round LLM spelling correction.
//!
//! * [`oracle`] — recognition oracle client and verification batcher.
//! * [`llm`] — correction engine over an OpenAI-compatible chat API.
//! * [`pipeline`] — the correction rounds, pacing and the run report.
//! * [`wordlist`] — parser entries, word-list reading and guarded rewrites.
//! * [`config`] — TOML settings and platform paths.

pub mod config;
pub mod llm;
pub mod oracle;
pub mod pipeline;
pub mod wordlist;

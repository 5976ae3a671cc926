//! Configuration module.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for the oracle, the
//! LLM and the pipeline, `AppPaths` for the platform config directory, and
//! TOML persistence via `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::{backup_path, next_backup_path, AppPaths};
pub use settings::{
    AppConfig, LlmConfig, OracleConfig, PipelineConfig, ENV_LLM_API_KEY, ENV_LLM_BASE_URL,
    ENV_LLM_MODEL, ENV_ORACLE_URL,
};

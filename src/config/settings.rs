//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and handed to each
//! component once at startup.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

/// Environment variable that supplies the LLM API key.
pub const ENV_LLM_API_KEY: &str = "WORDBOOK_LLM_API_KEY";
/// Environment variable that overrides [`LlmConfig::base_url`].
pub const ENV_LLM_BASE_URL: &str = "WORDBOOK_LLM_BASE_URL";
/// Environment variable that overrides [`LlmConfig::model`].
pub const ENV_LLM_MODEL: &str = "WORDBOOK_LLM_MODEL";
/// Environment variable that overrides [`OracleConfig::endpoint`].
pub const ENV_ORACLE_URL: &str = "WORDBOOK_ORACLE_URL";

// ---------------------------------------------------------------------------
// OracleConfig
// ---------------------------------------------------------------------------

/// Settings for the word-recognition oracle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Upload endpoint that accepts the multipart word list.
    pub endpoint: String,
    /// `Origin` header sent with every upload.
    pub origin: String,
    /// `Referer` header sent with every upload.
    pub referer: String,
    /// User agent for the oracle HTTP client.
    pub user_agent: String,
    /// Maximum seconds to wait for one verification call.
    pub timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://bbdc.cn/lexis/book/file/submit".into(),
            origin: "https://bbdc.cn".into(),
            referer: "https://bbdc.cn/lexis_book_index".into(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".into(),
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// LlmConfig
// ---------------------------------------------------------------------------

/// Settings for the correction language model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Whether LLM correction is active at all.
    pub enabled: bool,
    /// Base URL of the OpenAI-compatible API; `/v1/chat/completions` is
    /// appended.
    pub base_url: String,
    /// API key.  Correction is skipped entirely when this is missing.
    pub api_key: Option<String>,
    /// Model identifier sent to the API.
    pub model: String,
    /// Sampling temperature (0.0 – 1.0).
    pub temperature: f32,
    /// `max_tokens` for correction and selection replies.
    pub max_tokens: u32,
    /// `max_tokens` for candidate generation, which lists several words.
    pub candidate_max_tokens: u32,
    /// Maximum seconds to wait for an LLM response before timing out.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.siliconflow.cn".into(),
            api_key: None,
            model: "Qwen/Qwen2.5-7B-Instruct".into(),
            temperature: 0.3,
            max_tokens: 200,
            candidate_max_tokens: 400,
            timeout_secs: 30,
        }
    }
}

impl LlmConfig {
    /// `true` when correction is enabled and a non-empty key is configured.
    pub fn is_usable(&self) -> bool {
        self.enabled && self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// PipelineConfig
// ---------------------------------------------------------------------------

/// Settings for the correction pipeline itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Pause inserted between consecutive LLM calls of one sweep.
    pub call_delay_ms: u64,
    /// Write verified corrections back to the word-list file.
    pub apply_corrections: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            call_delay_ms: 500,
            apply_corrections: true,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use wordbook_verify::config::AppConfig;
///
/// // Load (returns Default when file is missing), then layer env overrides.
/// let mut config = AppConfig::load().unwrap();
/// config.apply_env_overrides();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Recognition oracle settings.
    pub oracle: OracleConfig,
    /// Correction engine settings.
    pub llm: LlmConfig,
    /// Pipeline pacing and mutation settings.
    pub pipeline: PipelineConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Layer credentials and endpoints from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Layer overrides from an arbitrary lookup.  Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(ENV_LLM_API_KEY) {
            self.llm.api_key = Some(key);
        }
        if let Some(url) = get(ENV_LLM_BASE_URL) {
            self.llm.base_url = url;
        }
        if let Some(model) = get(ENV_LLM_MODEL) {
            self.llm.model = model;
        }
        if let Some(url) = get(ENV_ORACLE_URL) {
            self.oracle.endpoint = url;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

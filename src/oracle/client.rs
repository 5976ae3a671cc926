//! `RecognitionOracle` trait and the HTTP implementation `HttpOracle`.
//!
//! The oracle accepts a newline-delimited word list as a multipart file
//! upload and answers with comma-separated `knowList` / `unknowList`
//! strings inside a `data_body` object.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;
use thiserror::Error;

use crate::config::OracleConfig;

// ---------------------------------------------------------------------------
// OracleError
// ---------------------------------------------------------------------------

/// Errors from one verification call.  Any of them means the whole batch is
/// unverified.
#[derive(Debug, Clone, Error)]
pub enum OracleError {
    /// Nothing to verify.
    #[error("word list is empty")]
    EmptyInput,

    /// HTTP transport or connection error.
    #[error("oracle request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("oracle request timed out")]
    Timeout,

    /// Non-success status code.
    #[error("oracle returned HTTP {0}")]
    Status(u16),

    /// Body was not the expected JSON document.
    #[error("failed to parse oracle response: {0}")]
    Parse(String),

    /// JSON parsed but carried no `data_body`.
    #[error("oracle response has no data_body")]
    MissingBody,
}

impl From<reqwest::Error> for OracleError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            OracleError::Timeout
        } else {
            OracleError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Partition
// ---------------------------------------------------------------------------

/// Recognized / unrecognized split reported by one oracle call, in the
/// oracle's own order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    pub recognized: Vec<String>,
    pub unrecognized: Vec<String>,
}

impl Partition {
    pub fn total(&self) -> usize {
        self.recognized.len() + self.unrecognized.len()
    }

    /// Lowercased recognized set for case-insensitive membership tests.
    pub fn recognized_set(&self) -> HashSet<String> {
        self.recognized.iter().map(|w| w.to_lowercase()).collect()
    }

    pub fn is_recognized(&self, word: &str) -> bool {
        let word = word.to_lowercase();
        self.recognized.iter().any(|w| w.to_lowercase() == word)
    }

    /// Share of recognized words, in percent.
    pub fn recognition_rate(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.recognized.len() as f64 / self.total() as f64 * 100.0
        }
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    data_body: Option<DataBody>,
}

#[derive(Debug, Deserialize)]
struct DataBody {
    #[serde(rename = "knowList", default)]
    know_list: String,
    #[serde(rename = "unknowList", default)]
    unknow_list: String,
}

/// Split a comma-separated list, trimming entries and dropping empty ones.
pub fn split_word_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse the oracle's JSON body into a [`Partition`].
pub fn parse_submit_response(body: &str) -> Result<Partition, OracleError> {
    let response: SubmitResponse =
        serde_json::from_str(body).map_err(|e| OracleError::Parse(e.to_string()))?;
    let data = response.data_body.ok_or(OracleError::MissingBody)?;

    Ok(Partition {
        recognized: split_word_list(&data.know_list),
        unrecognized: split_word_list(&data.unknow_list),
    })
}

/// One word per line, the payload the oracle expects.
pub fn serialize_word_list(words: &[String]) -> String {
    words.join("\n")
}

// ---------------------------------------------------------------------------
// RecognitionOracle trait
// ---------------------------------------------------------------------------

/// Classifies a word list into recognized and unrecognized words.
///
/// Stateless per call.  Implementors must be `Send + Sync` so they can be
/// held behind an `Arc<dyn RecognitionOracle>`.
#[async_trait]
pub trait RecognitionOracle: Send + Sync {
    async fn verify(&self, words: &[String]) -> Result<Partition, OracleError>;
}

// ---------------------------------------------------------------------------
// HttpOracle
// ---------------------------------------------------------------------------

/// Uploads the word list to the configured endpoint.
pub struct HttpOracle {
    client: reqwest::Client,
    config: OracleConfig,
}

impl HttpOracle {
    const UPLOAD_NAME: &'static str = "words.txt";

    /// Build an oracle client from config.  A default client is used if the
    /// builder fails.
    pub fn from_config(config: &OracleConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }
}

#[async_trait]
impl RecognitionOracle for HttpOracle {
    async fn verify(&self, words: &[String]) -> Result<Partition, OracleError> {
        if words.is_empty() {
            return Err(OracleError::EmptyInput);
        }

        log::debug!("oracle: submitting {} words to {}", words.len(), self.config.endpoint);

        let payload = serialize_word_list(words).into_bytes();
        let part = multipart::Part::bytes(payload)
            .file_name(Self::UPLOAD_NAME)
            .mime_str("text/plain")?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Accept", "application/json, text/javascript, */*; q=0.01")
            .header("Origin", &self.config.origin)
            .header("Referer", &self.config.referer)
            .header("X-Requested-With", "XMLHttpRequest")
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OracleError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        let partition = parse_submit_response(&body)?;

        log::info!(
            "oracle: recognized {}/{} ({:.1}%)",
            partition.recognized.len(),
            partition.total(),
            partition.recognition_rate()
        );
        Ok(partition)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

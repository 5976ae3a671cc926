//! `ChatClient` — thin wrapper around an OpenAI-compatible
//! `/v1/chat/completions` endpoint, and the `LlmError` taxonomy shared by the
//! whole LLM layer.
//!
//! All connection details come from [`LlmConfig`]; nothing is hardcoded.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::LlmConfig;

// ---------------------------------------------------------------------------
// LlmError
// ---------------------------------------------------------------------------

/// Errors that can occur while talking to the correction model.
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    /// No API key is configured; the correction phase is unavailable.
    #[error("LLM correction is disabled (no API key configured)")]
    Disabled,

    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("LLM request timed out")]
    Timeout,

    /// The endpoint answered with a non-success status code.
    #[error("LLM endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The HTTP body could not be parsed as a chat-completion JSON document.
    #[error("failed to parse LLM response: {0}")]
    Parse(String),

    /// The reply was valid text but not the JSON object the prompt asked for.
    #[error("LLM reply has unexpected shape: {0}")]
    Shape(String),

    /// The LLM returned a response with no usable text content.
    #[error("LLM returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// ChatCompletion trait
// ---------------------------------------------------------------------------

/// One round-trip to a chat model: system + user message in, reply text out.
///
/// Object-safe and `Send + Sync` so engines can hold it behind an `Arc`.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, system: &str, user: &str, max_tokens: u32)
        -> Result<String, LlmError>;
}

// ---------------------------------------------------------------------------
// ChatClient
// ---------------------------------------------------------------------------

/// Calls an OpenAI-compatible `/v1/chat/completions` endpoint.
pub struct ChatClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl ChatClient {
    /// Build a client from config.
    ///
    /// The HTTP client carries the per-request timeout from
    /// `config.timeout_secs`.  A default client is used if the builder fails.
    pub fn from_config(config: &LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    /// Full URL of the chat-completions endpoint.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_usable()
    }

    fn request_body(&self, system: &str, user: &str, max_tokens: u32) -> serde_json::Value {
        serde_json::json!({
            "model":       self.config.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user",   "content": user   }
            ],
            "stream":      false,
            "temperature": self.config.temperature,
            "max_tokens":  max_tokens
        })
    }
}

#[async_trait]
impl ChatCompletion for ChatClient {
    /// Send one chat request and return the first choice's content.
    ///
    /// The `Authorization: Bearer …` header is attached only when a
    /// non-empty key is configured; without one the call is refused with
    /// [`LlmError::Disabled`].
    async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let key = self.config.api_key.as_deref().unwrap_or("").trim();
        if !self.config.enabled || key.is_empty() {
            return Err(LlmError::Disabled);
        }

        let body = self.request_body(system, user, max_tokens);
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        extract_content(&json)
    }
}

/// Pull `choices[0].message.content` out of a chat-completion document.
pub fn extract_content(json: &serde_json::Value) -> Result<String, LlmError> {
    let content = json["choices"][0]["message"]["content"]
        .as_str()
        .ok_or(LlmError::EmptyResponse)?
        .trim()
        .to_string();

    if content.is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(content)
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config(api_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            base_url: "http://localhost:11434/".into(),
            api_key: api_key.map(|s| s.to_string()),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let client = ChatClient::from_config(&make_config(None));
        assert_eq!(
            client.endpoint(),
            "http://localhost:11434/v1/chat/completions"
        );
    }

    #[test]
    fn request_body_carries_model_and_messages() {
        let client = ChatClient::from_config(&make_config(Some("sk-test")));
        let body = client.request_body("sys", "usr", 123);

        assert_eq!(body["model"], "Qwen/Qwen2.5-7B-Instruct");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "sys");
        assert_eq!(body["messages"][1]["content"], "usr");
        assert_eq!(body["max_tokens"], 123);
        assert_eq!(body["stream"], false);
    }

    #[tokio::test]
    async fn missing_key_is_refused_without_network() {
        let client = ChatClient::from_config(&make_config(Some("")));
        assert!(!client.is_configured());
        let err = client.complete("s", "u", 10).await.unwrap_err();
        assert!(matches!(err, LlmError::Disabled));
    }

    #[test]
    fn extract_content_trims_reply() {
        let json = serde_json::json!({
            "choices": [{ "message": { "content": "  {\"corrected\":\"x\"}\n" } }]
        });
        assert_eq!(extract_content(&json).unwrap(), "{\"corrected\":\"x\"}");
    }

    #[test]
    fn extract_content_rejects_missing_or_blank() {
        let missing = serde_json::json!({ "choices": [] });
        assert!(matches!(
            extract_content(&missing),
            Err(LlmError::EmptyResponse)
        ));

        let blank = serde_json::json!({ "choices": [{ "message": { "content": "   " } }] });
        assert!(matches!(extract_content(&blank), Err(LlmError::EmptyResponse)));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("验证失败原因", 2), "验证…");
    }

    #[test]
    fn client_is_object_safe() {
        let client: Box<dyn ChatCompletion> =
            Box::new(ChatClient::from_config(&make_config(None)));
        drop(client);
    }
}

//! `CorrectionEngine` trait and the chat-model implementation `LlmEngine`.
//!
//! The engine never surfaces transport or shape errors from
//! [`propose_correction`](CorrectionEngine::propose_correction) or
//! [`generate_candidates`](CorrectionEngine::generate_candidates): both
//! degrade to a fallback value, the same way the pipeline must keep going
//! when the upstream model is unreachable.  Only
//! [`select_best`](CorrectionEngine::select_best) reports failure, because
//! the pipeline owns the first-verified fallback for selection.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::LlmConfig;
use crate::llm::client::{ChatClient, ChatCompletion, LlmError};
use crate::llm::prompt::PromptBuilder;
use crate::llm::response::{
    first_token_guess, is_json_reply, parse_candidates, parse_correction, parse_selection,
    reply_confidence,
};
use crate::llm::types::{Candidate, Confidence, CorrectionAttempt, SelectionResult};

// ---------------------------------------------------------------------------
// CorrectionEngine trait
// ---------------------------------------------------------------------------

/// The three language-model operations the correction pipeline relies on.
///
/// Implementors must be `Send + Sync` so they can be held behind an
/// `Arc<dyn CorrectionEngine>`.
#[async_trait]
pub trait CorrectionEngine: Send + Sync {
    /// `false` when no credential is configured; the pipeline then skips
    /// the whole correction phase.
    fn is_enabled(&self) -> bool;

    /// Propose one replacement spelling.  Always returns an unverified
    /// attempt; `confidence == None` means the call produced nothing.
    async fn propose_correction(&self, word: &str, meaning: &str) -> CorrectionAttempt;

    /// Propose 3–5 alternative words.  Empty on any failure.
    async fn generate_candidates(&self, word: &str, meaning: &str) -> Vec<Candidate>;

    /// Rank two or more verified candidates and name the best one.
    async fn select_best(
        &self,
        original: &str,
        meaning: &str,
        verified: &[Candidate],
    ) -> Result<SelectionResult, LlmError>;
}

// ---------------------------------------------------------------------------
// LlmEngine
// ---------------------------------------------------------------------------

/// [`CorrectionEngine`] backed by any [`ChatCompletion`] transport.
pub struct LlmEngine {
    chat: Arc<dyn ChatCompletion>,
    prompts: PromptBuilder,
    enabled: bool,
    max_tokens: u32,
    candidate_max_tokens: u32,
}

impl LlmEngine {
    /// Build an engine talking to the endpoint described by `config`.
    pub fn from_config(config: &LlmConfig) -> Self {
        Self::with_transport(Arc::new(ChatClient::from_config(config)), config)
    }

    /// Build an engine over an explicit transport.
    pub fn with_transport(chat: Arc<dyn ChatCompletion>, config: &LlmConfig) -> Self {
        Self {
            chat,
            prompts: PromptBuilder::new(),
            enabled: config.is_usable(),
            max_tokens: config.max_tokens,
            candidate_max_tokens: config.candidate_max_tokens,
        }
    }
}

#[async_trait]
impl CorrectionEngine for LlmEngine {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn propose_correction(&self, word: &str, meaning: &str) -> CorrectionAttempt {
        if !self.enabled {
            return CorrectionAttempt::failed(word, LlmError::Disabled.to_string());
        }

        let (system, user) = self.prompts.correction(word, meaning);
        let content = match self.chat.complete(&system, &user, self.max_tokens).await {
            Ok(content) => content,
            Err(e) => {
                log::warn!("correction call for {word:?} failed: {e}");
                return CorrectionAttempt::failed(word, e.to_string());
            }
        };

        match parse_correction(&content) {
            Ok(reply) => CorrectionAttempt::proposal(
                word,
                reply.corrected,
                reply_confidence(reply.confidence.as_deref()),
                reply.reason,
            ),
            Err(e) if is_json_reply(&content) => {
                log::debug!("correction reply for {word:?} has no usable field ({e})");
                CorrectionAttempt::failed(word, format!("reply without a correction: {e}"))
            }
            Err(e) => match first_token_guess(&content) {
                Some(guess) => {
                    log::debug!("correction reply for {word:?} off-format ({e}); guessing {guess:?}");
                    CorrectionAttempt::proposal(
                        word,
                        guess,
                        Confidence::Low,
                        "word extracted from an unstructured reply",
                    )
                }
                None => CorrectionAttempt::failed(word, format!("unparseable reply: {e}")),
            },
        }
    }

    async fn generate_candidates(&self, word: &str, meaning: &str) -> Vec<Candidate> {
        if !self.enabled {
            return Vec::new();
        }

        let (system, user) = self.prompts.candidates(word, meaning);
        let result = match self
            .chat
            .complete(&system, &user, self.candidate_max_tokens)
            .await
        {
            Ok(content) => parse_candidates(&content),
            Err(e) => Err(e),
        };

        result.unwrap_or_else(|e| {
            log::warn!("candidate generation for {word:?} failed: {e}");
            Vec::new()
        })
    }

    async fn select_best(
        &self,
        original: &str,
        meaning: &str,
        verified: &[Candidate],
    ) -> Result<SelectionResult, LlmError> {
        if !self.enabled {
            return Err(LlmError::Disabled);
        }

        let (system, user) = self.prompts.selection(original, meaning, verified);
        let content = self.chat.complete(&system, &user, self.max_tokens).await?;
        let reply = parse_selection(&content)?;

        Ok(SelectionResult {
            original: original.to_string(),
            selected: reply.selected,
            rationale: reply.reason,
            confidence: reply_confidence(reply.confidence.as_deref()),
            candidates: verified.to_vec(),
            source_line: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Replays canned replies in order and records every user prompt.
    struct ScriptedChat {
        replies: Mutex<Vec<Result<String, LlmError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedChat {
        fn new(replies: Vec<Result<&str, LlmError>>) -> Arc<Self> {
            let mut replies: Vec<Result<String, LlmError>> = replies
                .into_iter()
                .map(|r| r.map(|s| s.to_string()))
                .collect();
            replies.reverse();
            Arc::new(Self {
                replies: Mutex::new(replies),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ChatCompletion for ScriptedChat {
        async fn complete(
            &self,
            _system: &str,
            user: &str,
            _max_tokens: u32,
        ) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(user.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(LlmError::EmptyResponse))
        }
    }

    fn enabled_config() -> LlmConfig {
        LlmConfig {
            api_key: Some("sk-test".into()),
            ..LlmConfig::default()
        }
    }

    fn engine(chat: Arc<ScriptedChat>) -> LlmEngine {
        LlmEngine::with_transport(chat, &enabled_config())
    }

    #[tokio::test]
    async fn structured_correction_is_used() {
        let chat = ScriptedChat::new(vec![Ok(
            r#"{"corrected": "receive", "confidence": "high", "reason": "i before e"}"#,
        )]);
        let attempt = engine(chat.clone()).propose_correction("recieve", "to get").await;

        assert_eq!(attempt.corrected, "receive");
        assert_eq!(attempt.confidence, Confidence::High);
        assert_eq!(attempt.rationale, "i before e");
        assert!(!attempt.verified);
        assert!(chat.prompts.lock().unwrap()[0].contains("recieve"));
    }

    #[tokio::test]
    async fn prose_reply_falls_back_to_first_token() {
        let chat = ScriptedChat::new(vec![Ok("Receive, with e before i.")]);
        let attempt = engine(chat).propose_correction("recieve", "").await;

        assert_eq!(attempt.corrected, "Receive");
        assert_eq!(attempt.confidence, Confidence::Low);
    }

    #[tokio::test]
    async fn transport_failure_echoes_original() {
        let chat = ScriptedChat::new(vec![Err(LlmError::Timeout)]);
        let attempt = engine(chat).propose_correction("recieve", "").await;

        assert_eq!(attempt.corrected, "recieve");
        assert_eq!(attempt.confidence, Confidence::None);
        assert!(attempt.rationale.contains("timed out"));
    }

    #[tokio::test]
    async fn json_without_corrected_field_echoes_original() {
        let chat = ScriptedChat::new(vec![Ok(r#"```json
{"word": "receive"}
```"#)]);
        let attempt = engine(chat).propose_correction("recieve", "").await;

        assert_eq!(attempt.corrected, "recieve");
        assert!(!attempt.is_proposal());
    }

    #[tokio::test]
    async fn none_confidence_reply_is_verified_like_any_other() {
        let chat = ScriptedChat::new(vec![Ok(
            r#"{"corrected": "receive", "confidence": "none", "reason": "unsure"}"#,
        )]);
        let attempt = engine(chat).propose_correction("recieve", "").await;

        assert_eq!(attempt.corrected, "receive");
        assert_eq!(attempt.confidence, Confidence::None);
        assert!(attempt.is_proposal());
    }

    #[tokio::test]
    async fn reply_without_letters_echoes_original() {
        let chat = ScriptedChat::new(vec![Ok("42 !!")]);
        let attempt = engine(chat).propose_correction("xqplm", "").await;

        assert_eq!(attempt.corrected, "xqplm");
        assert_eq!(attempt.confidence, Confidence::None);
        assert!(!attempt.is_proposal());
    }

    #[tokio::test]
    async fn candidates_parse_or_come_back_empty() {
        let chat = ScriptedChat::new(vec![
            Ok(r#"{"candidates": [{"word": "example", "reason": "r"}, {"word": "sample", "reason": "r"}]}"#),
            Ok("I cannot help with that."),
            Err(LlmError::Status { status: 500, body: "oops".into() }),
        ]);
        let engine = engine(chat.clone());

        assert_eq!(engine.generate_candidates("xqplm", "").await.len(), 2);
        assert!(engine.generate_candidates("xqplm", "").await.is_empty());
        assert!(engine.generate_candidates("xqplm", "").await.is_empty());
        assert_eq!(chat.calls(), 3);
    }

    #[tokio::test]
    async fn selection_reports_engine_failure() {
        let verified = vec![Candidate::new("example", ""), Candidate::new("template", "")];

        let chat = ScriptedChat::new(vec![
            Ok(r#"{"selected": "example", "reason": "common", "confidence": "high"}"#),
            Ok("no json here"),
        ]);
        let engine = engine(chat);

        let chosen = engine.select_best("xqplm", "", &verified).await.unwrap();
        assert_eq!(chosen.selected, "example");
        assert_eq!(chosen.confidence, Confidence::High);
        assert_eq!(chosen.candidates.len(), 2);

        let err = engine.select_best("xqplm", "", &verified).await.unwrap_err();
        assert!(matches!(err, LlmError::Shape(_)));
    }

    #[tokio::test]
    async fn disabled_engine_never_calls_transport() {
        let chat = ScriptedChat::new(vec![]);
        let engine = LlmEngine::with_transport(chat.clone(), &LlmConfig::default());

        assert!(!engine.is_enabled());
        let attempt = engine.propose_correction("recieve", "").await;
        assert_eq!(attempt.confidence, Confidence::None);
        assert!(engine.generate_candidates("recieve", "").await.is_empty());
        assert!(matches!(
            engine.select_best("recieve", "", &[]).await,
            Err(LlmError::Disabled)
        ));
        assert_eq!(chat.calls(), 0);
    }

    #[test]
    fn engine_is_object_safe() {
        let engine: Box<dyn CorrectionEngine> =
            Box::new(LlmEngine::from_config(&LlmConfig::default()));
        drop(engine);
    }
}

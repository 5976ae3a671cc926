//! `VerificationBatcher` — one oracle call per batch, fail-closed.

use std::collections::HashMap;
use std::sync::Arc;

use crate::oracle::client::{OracleError, RecognitionOracle};

/// Re-checks a set of proposed words with a single oracle call.
///
/// Membership is case-insensitive and recomputed on every call; nothing is
/// cached between batches.
#[derive(Clone)]
pub struct VerificationBatcher {
    oracle: Arc<dyn RecognitionOracle>,
}

impl VerificationBatcher {
    pub fn new(oracle: Arc<dyn RecognitionOracle>) -> Self {
        Self { oracle }
    }

    /// Membership map keyed by the original-case input word.  Every word
    /// maps to `false` when the oracle call fails.
    pub async fn verify_batch(&self, words: &[String]) -> HashMap<String, bool> {
        self.verify_batch_reporting(words).await.0
    }

    /// Like [`verify_batch`](Self::verify_batch), also handing back the
    /// oracle failure so callers can record it.
    pub async fn verify_batch_reporting(
        &self,
        words: &[String],
    ) -> (HashMap<String, bool>, Option<OracleError>) {
        if words.is_empty() {
            return (HashMap::new(), None);
        }

        match self.oracle.verify(words).await {
            Ok(partition) => {
                let recognized = partition.recognized_set();
                let membership = words
                    .iter()
                    .map(|w| (w.clone(), recognized.contains(&w.to_lowercase())))
                    .collect();
                (membership, None)
            }
            Err(e) => {
                log::warn!("verification of {} words failed, treating all as unverified: {e}", words.len());
                let membership = words.iter().map(|w| (w.clone(), false)).collect();
                (membership, Some(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::client::Partition;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Recognizes a fixed vocabulary (case-insensitively, echoing the
    /// oracle's own capitalisation) and records each submitted batch.
    struct FixedOracle {
        known: Vec<&'static str>,
        batches: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl RecognitionOracle for FixedOracle {
        async fn verify(&self, words: &[String]) -> Result<Partition, OracleError> {
            self.batches.lock().unwrap().push(words.to_vec());
            let mut partition = Partition::default();
            for w in words {
                match self.known.iter().find(|k| k.eq_ignore_ascii_case(w)) {
                    Some(k) => partition.recognized.push(k.to_string()),
                    None => partition.unrecognized.push(w.clone()),
                }
            }
            Ok(partition)
        }
    }

    struct DownOracle;

    #[async_trait]
    impl RecognitionOracle for DownOracle {
        async fn verify(&self, _words: &[String]) -> Result<Partition, OracleError> {
            Err(OracleError::Timeout)
        }
    }

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn one_call_case_insensitive_keyed_by_input() {
        let oracle = Arc::new(FixedOracle {
            known: vec!["example", "TEMPLATE"],
            batches: Mutex::new(Vec::new()),
        });
        let batcher = VerificationBatcher::new(oracle.clone());

        let map = batcher
            .verify_batch(&words(&["Example", "sample", "template"]))
            .await;

        assert_eq!(map.get("Example"), Some(&true));
        assert_eq!(map.get("sample"), Some(&false));
        assert_eq!(map.get("template"), Some(&true));
        assert_eq!(oracle.batches.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn single_word_agrees_with_oracle() {
        let oracle = Arc::new(FixedOracle {
            known: vec!["receive"],
            batches: Mutex::new(Vec::new()),
        });
        let batcher = VerificationBatcher::new(oracle.clone());

        for w in ["receive", "recieve"] {
            let map = batcher.verify_batch(&words(&[w])).await;
            let partition = oracle.verify(&words(&[w])).await.unwrap();
            assert_eq!(map[w], partition.is_recognized(w));
        }
    }

    #[tokio::test]
    async fn oracle_failure_is_fail_closed() {
        let batcher = VerificationBatcher::new(Arc::new(DownOracle));
        let (map, err) = batcher
            .verify_batch_reporting(&words(&["receive", "example"]))
            .await;

        assert!(map.values().all(|v| !v));
        assert_eq!(map.len(), 2);
        assert!(matches!(err, Some(OracleError::Timeout)));
    }

    #[tokio::test]
    async fn empty_batch_skips_oracle() {
        let oracle = Arc::new(FixedOracle {
            known: vec![],
            batches: Mutex::new(Vec::new()),
        });
        let batcher = VerificationBatcher::new(oracle.clone());

        assert!(batcher.verify_batch(&[]).await.is_empty());
        assert!(oracle.batches.lock().unwrap().is_empty());
    }
}

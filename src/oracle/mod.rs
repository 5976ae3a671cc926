//! Word-recognition oracle.
//!
//! * [`RecognitionOracle`] — async trait: word list in, [`Partition`] out.
//! * [`HttpOracle`] — multipart upload to the configured endpoint.
//! * [`VerificationBatcher`] — one call per batch, case-insensitive,
//!   fail-closed membership map.

pub mod batcher;
pub mod client;

pub use batcher::VerificationBatcher;
pub use client::{HttpOracle, OracleError, Partition, RecognitionOracle};

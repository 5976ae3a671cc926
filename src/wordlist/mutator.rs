//! `FileMutator` — rewrites the word-list file with verified corrections.
//!
//! Order of operations:
//!
//! ```text
//! read bytes ──▶ write <path>.backup (byte-identical, never overwritten;
//!                later runs use <path>.backup.1, .2, ...)
//!            ──▶ replace every line whose trimmed text == original
//!            ──▶ temp file in the same dir ──persist──▶ <path>
//! ```
//!
//! Matching is exact on the trimmed line, so a word that appears inside a
//! longer line is never touched, while every standalone occurrence is.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::config::next_backup_path;

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("failed to read word list {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("word list {0} is not valid UTF-8")]
    Encoding(PathBuf),

    #[error("failed to write backup {path}: {source}")]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write word list {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One replacement handed to the mutator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Replacement {
    pub original: String,
    pub corrected: String,
}

impl Replacement {
    pub fn new(original: impl Into<String>, corrected: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            corrected: corrected.into(),
        }
    }
}

/// What one successful [`FileMutator::apply`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplySummary {
    pub backup: PathBuf,
    /// 1-based line numbers that were rewritten.
    pub replaced_lines: Vec<usize>,
    /// Lines rewritten by each correction, in input order.  An empty entry
    /// means the correction matched no line.
    pub hits: Vec<Vec<usize>>,
}

/// Output of [`replace_lines`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub content: String,
    pub replaced_lines: Vec<usize>,
    pub hits: Vec<Vec<usize>>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FileMutator;

impl FileMutator {
    pub fn new() -> Self {
        Self
    }

    pub fn apply(
        &self,
        path: &Path,
        corrections: &[Replacement],
    ) -> Result<ApplySummary, ApplyError> {
        let bytes = std::fs::read(path).map_err(|source| ApplyError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let backup = next_backup_path(path);
        write_new(&backup, &bytes).map_err(|source| ApplyError::Backup {
            path: backup.clone(),
            source,
        })?;
        log::info!("backup written to {}", backup.display());

        let content =
            String::from_utf8(bytes).map_err(|_| ApplyError::Encoding(path.to_path_buf()))?;
        let rewrite = replace_lines(&content, corrections);

        write_atomically(path, &rewrite.content).map_err(|source| ApplyError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        log::info!(
            "replaced {} line(s) in {}",
            rewrite.replaced_lines.len(),
            path.display()
        );
        Ok(ApplySummary {
            backup,
            replaced_lines: rewrite.replaced_lines,
            hits: rewrite.hits,
        })
    }
}

/// Replace each line whose trimmed text equals a correction's original.
/// A trailing `\r` survives the replacement.
pub fn replace_lines(content: &str, corrections: &[Replacement]) -> Rewrite {
    let mut replaced_lines = Vec::new();
    let mut hits = vec![Vec::new(); corrections.len()];

    let lines: Vec<String> = content
        .split('\n')
        .enumerate()
        .map(|(i, line)| {
            let key = line.trim();
            match corrections.iter().position(|c| c.original == key) {
                Some(k) if !key.is_empty() => {
                    let c = &corrections[k];
                    log::debug!("line {}: {} -> {}", i + 1, c.original, c.corrected);
                    replaced_lines.push(i + 1);
                    hits[k].push(i + 1);
                    if line.ends_with('\r') {
                        format!("{}\r", c.corrected)
                    } else {
                        c.corrected.clone()
                    }
                }
                _ => line.to_string(),
            }
        })
        .collect();

    Rewrite {
        content: lines.join("\n"),
        replaced_lines,
        hits,
    }
}

fn write_new(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn write_atomically(path: &Path, content: &str) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

//! `WordEntry` and the case-insensitive index built from the document
//! parser's output.
//!
//! The parser itself lives outside this crate.  It hands over a JSON array
//! of `{"word", "meaning", "line"}` objects; the word list file it wrote
//! alongside is read with [`read_word_list`].

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EntryError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse word entries: {0}")]
    Json(#[from] serde_json::Error),
}

/// One extracted vocabulary item.  Identity is the word, compared
/// case-insensitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordEntry {
    pub word: String,
    #[serde(default)]
    pub meaning: String,
    #[serde(default, rename = "line")]
    pub source_line: Option<usize>,
}

impl WordEntry {
    /// Entry for a word the parser knows nothing about.
    pub fn bare(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            meaning: String::new(),
            source_line: None,
        }
    }
}

/// Lookup of parser entries by lowercased word.  The first entry wins when
/// the document repeats a word.
#[derive(Debug, Clone, Default)]
pub struct EntryIndex {
    entries: HashMap<String, WordEntry>,
}

impl EntryIndex {
    pub fn new(entries: impl IntoIterator<Item = WordEntry>) -> Self {
        let mut map = HashMap::new();
        for entry in entries {
            map.entry(entry.word.to_lowercase()).or_insert(entry);
        }
        Self { entries: map }
    }

    /// Parse the JSON array produced by the document parser.
    pub fn from_json(json: &str) -> Result<Self, EntryError> {
        let entries: Vec<WordEntry> = serde_json::from_str(json)?;
        Ok(Self::new(entries))
    }

    pub fn load(path: &Path) -> Result<Self, EntryError> {
        let json = std::fs::read_to_string(path).map_err(|source| EntryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn get(&self, word: &str) -> Option<&WordEntry> {
        self.entries.get(&word.to_lowercase())
    }

    /// The parser's entry for `word`, spelled as the document spells it.
    /// Unknown words get an empty meaning and keep the given spelling.
    pub fn resolve(&self, word: &str) -> WordEntry {
        match self.get(word) {
            Some(entry) => entry.clone(),
            None => WordEntry::bare(word),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read a word-list file: one word per line, blank lines skipped.
pub fn read_word_list(path: &Path) -> Result<Vec<String>, EntryError> {
    let content = std::fs::read_to_string(path).map_err(|source| EntryError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

//! Persisted word list: parser entries in, guarded rewrites out.
//!
//! * [`EntryIndex`] / [`WordEntry`] — meanings and source lines from the
//!   external document parser.
//! * [`read_word_list`] — one word per line.
//! * [`FileMutator`] — backup-first, literal-line replacement.

pub mod entry;
pub mod mutator;

pub use entry::{read_word_list, EntryError, EntryIndex, WordEntry};
pub use mutator::{ApplyError, ApplySummary, FileMutator, Replacement, Rewrite};

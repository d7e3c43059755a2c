//! Word deduplication against a dictionary, the job `StSet` was written for.
//!
//! Text is lowercased in place, split on every byte that is not an ASCII
//! letter, and each distinct word is checked against a NUL-separated word list.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::set::StSet;

pub const DEFAULT_DICTIONARY_CAPACITY: usize = 400_000;
pub const MIN_TEXT_CAPACITY: usize = 10_000;

#[derive(Debug, Error)]
pub enum WordsError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write output: {0}")]
    Write(#[source] std::io::Error),
}

pub fn read_file(path: &Path) -> Result<Vec<u8>, WordsError> {
    std::fs::read(path).map_err(|source| WordsError::Read {
        path: path.to_owned(),
        source,
    })
}

pub fn lowercase(buf: &mut [u8]) {
    buf.make_ascii_lowercase();
}

/// Maximal runs of ASCII letters.
pub fn words(buf: &[u8]) -> impl Iterator<Item = &[u8]> {
    buf.split(|b| !b.is_ascii_alphabetic())
        .filter(|word| !word.is_empty())
}

/// Entries of a NUL-separated word list.
pub fn dictionary_entries(buf: &[u8]) -> impl Iterator<Item = &[u8]> {
    buf.split(|&b| b == 0).filter(|entry| !entry.is_empty())
}

/// Capacity hint for the set of distinct words in `text_len` bytes of text.
pub fn text_capacity_hint(text_len: usize) -> usize {
    (text_len / 8).max(MIN_TEXT_CAPACITY)
}

pub struct Dictionary<'k> {
    set: StSet<'k>,
}

impl<'k> Dictionary<'k> {
    /// Loads a duplicate-free NUL-separated word list without dedup checks.
    pub fn from_nul_separated(buf: &'k [u8], capacity_hint: usize) -> Self {
        let mut set = StSet::new(capacity_hint);
        let mut loaded = 0usize;
        for entry in dictionary_entries(buf) {
            set.insert_unchecked(entry);
            loaded += 1;
        }
        log::debug!("dictionary: {} words, capacity {}", loaded, set.capacity());
        Self { set }
    }

    pub fn contains(&self, word: &[u8]) -> bool {
        self.set.exists(word)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WordCounts {
    pub total: u64,
    pub unique: u64,
    pub unknown: u64,
}

/// Counts words in already-lowercased `text`, calling `on_unknown` for the first
/// occurrence of every word missing from `dictionary`, in text order.
pub fn report<'k>(
    text: &'k [u8],
    dictionary: &Dictionary<'_>,
    mut on_unknown: impl FnMut(&'k [u8]),
) -> WordCounts {
    let mut seen = StSet::new(text_capacity_hint(text.len()));
    let mut counts = WordCounts::default();
    for word in words(text) {
        counts.total += 1;
        if !seen.try_insert(word) {
            continue;
        }
        counts.unique += 1;
        if !dictionary.contains(word) {
            counts.unknown += 1;
            on_unknown(word);
        }
    }
    log::debug!("text set ended at capacity {}", seen.capacity());
    counts
}

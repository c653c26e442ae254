//! Vocabulary construction with histogram pruning.
//!
//! A corpus is scanned into token frequencies, the most frequent
//! `prune_threshold` tokens are kept, and every other token maps to the
//! reserved unknown symbol.
//!
//! # Id Layout
//!
//! ```text
//! 0:      UNK (reserved, never pruned)
//! 1..=K:  kept tokens in strictly decreasing frequency order,
//!         ties broken by first occurrence in the corpus
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RnnedError, RnnedResult};

/// The reserved unknown-token symbol.
pub const UNK_TOKEN: &str = "UNK";
/// The id the unknown symbol maps to.
pub const UNK_ID: u32 = 0;

/// Bidirectional mapping between tokens and dense vocabulary ids.
///
/// Id 0 is always [`UNK_TOKEN`]; the forward and reverse maps are exact
/// inverses of each other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vocabulary {
    token_to_id: HashMap<String, u32>,
    id_to_token: Vec<String>,
}

impl Vocabulary {
    /// Build a vocabulary from tokens already ranked by descending frequency.
    /// UNK is prepended at id 0.
    fn from_ranked(ranked: impl IntoIterator<Item = String>) -> Self {
        let mut id_to_token = vec![UNK_TOKEN.to_string()];
        id_to_token.extend(ranked);

        let token_to_id = id_to_token
            .iter()
            .enumerate()
            .map(|(id, token)| (token.clone(), id as u32))
            .collect();

        Self {
            token_to_id,
            id_to_token,
        }
    }

    /// Map a token to its id, falling back to [`UNK_ID`] for OOV tokens.
    pub fn id(&self, token: &str) -> u32 {
        self.token_to_id.get(token).copied().unwrap_or(UNK_ID)
    }

    /// Map an id back to its token.
    pub fn token(&self, id: u32) -> Option<&str> {
        self.id_to_token.get(id as usize).map(String::as_str)
    }

    /// Whether a token is in the pruned vocabulary (UNK itself counts).
    pub fn contains(&self, token: &str) -> bool {
        self.token_to_id.contains_key(token)
    }

    /// Total number of entries, including UNK.
    pub fn len(&self) -> usize {
        self.id_to_token.len()
    }

    /// True only for a vocabulary with zero entries, which `from_ranked`
    /// never produces (UNK is always prepended).
    pub fn is_empty(&self) -> bool {
        self.id_to_token.is_empty()
    }

    /// True if pruning left nothing but the reserved UNK entry.
    pub fn has_only_unk(&self) -> bool {
        self.id_to_token.len() <= 1
    }

    /// Tokens in id order, starting with UNK at id 0.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.id_to_token.iter().map(String::as_str)
    }

    /// Map every whitespace token of a phrase to its id.
    pub fn map_tokens<'a, I>(&self, tokens: I) -> Vec<u32>
    where
        I: IntoIterator<Item = &'a str>,
    {
        tokens.into_iter().map(|t| self.id(t)).collect()
    }
}

/// Accumulates token frequencies while preserving first-seen order, which is
/// the deterministic tie-break for equal counts.
#[derive(Debug, Default)]
struct TokenCounter {
    counts: HashMap<String, u64>,
    first_seen: Vec<String>,
}

impl TokenCounter {
    fn observe_line(&mut self, line: &str) {
        for token in line.split_whitespace() {
            match self.counts.get_mut(token) {
                Some(count) => *count += 1,
                None => {
                    self.counts.insert(token.to_string(), 1);
                    self.first_seen.push(token.to_string());
                }
            }
        }
    }

    fn finish(self, prune_threshold: usize) -> RnnedResult<(f64, Vocabulary)> {
        let total: u64 = self.counts.values().sum();
        if total == 0 {
            return Err(RnnedError::data("corpus contains no tokens"));
        }

        let counts = self.counts;
        let mut ranked: Vec<(String, u64)> = self
            .first_seen
            .into_iter()
            .map(|token| {
                let count = counts[&token];
                (token, count)
            })
            .collect();
        // Stable sort over the first-seen collection keeps ties deterministic.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(prune_threshold);

        let kept: u64 = ranked.iter().map(|(_, count)| count).sum();
        let coverage = kept as f64 / total as f64;

        let vocabulary = Vocabulary::from_ranked(ranked.into_iter().map(|(token, _)| token));
        Ok((coverage, vocabulary))
    }
}

/// Builds frequency-pruned vocabularies from token corpora.
#[derive(Debug, Clone, Copy)]
pub struct VocabularyBuilder {
    prune_threshold: usize,
}

impl VocabularyBuilder {
    /// Create a builder keeping at most `prune_threshold` non-UNK entries.
    pub fn new(prune_threshold: usize) -> Self {
        Self { prune_threshold }
    }

    /// Build a vocabulary from an in-memory line sequence.
    ///
    /// Returns the coverage ratio of the pruned vocabulary (kept token
    /// occurrences / total token occurrences) alongside the vocabulary.
    pub fn build<I, S>(&self, lines: I) -> RnnedResult<(f64, Vocabulary)>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut counter = TokenCounter::default();
        for line in lines {
            counter.observe_line(line.as_ref());
        }
        counter.finish(self.prune_threshold)
    }

    /// Build a vocabulary by streaming a UTF-8 corpus file, one sentence per
    /// line, whitespace-delimited tokens.
    pub fn build_from_path(&self, path: &Path) -> RnnedResult<(f64, Vocabulary)> {
        let file = File::open(path).map_err(|e| {
            RnnedError::data(format!("failed to open corpus {}: {}", path.display(), e))
        })?;

        let mut counter = TokenCounter::default();
        for line in BufReader::new(file).lines() {
            counter.observe_line(&line?);
        }
        counter.finish(self.prune_threshold)
    }
}

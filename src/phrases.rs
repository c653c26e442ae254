//! Phrase-pair extraction from a phrase table.
//!
//! Each usable phrase-table line becomes one immutable training example:
//! the source-phrase embedding sequence, the target-phrase embedding
//! sequence, and the target-phrase id sequence. Lines where every source
//! token or every target token is out of vocabulary carry no signal and are
//! dropped; malformed lines are skipped with a warning.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};

use crate::embeddings::EmbeddingMatrix;
use crate::error::{RnnedError, RnnedResult};
use crate::vocab::{Vocabulary, UNK_ID};

/// Field delimiter of Moses-style phrase tables.
pub const PHRASE_DELIMITER: &str = "|||";

/// One training example extracted from a phrase-table line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhrasePair {
    /// One embedding vector per source-phrase token
    pub source_vectors: Vec<Vec<f32>>,
    /// One embedding vector per target-phrase token
    pub target_vectors: Vec<Vec<f32>>,
    /// Target vocabulary ids, same length as `target_vectors`
    pub target_ids: Vec<u32>,
}

enum LineOutcome {
    Pair(Box<PhrasePair>),
    AllOov,
    Malformed(&'static str),
}

/// Extracts training examples from a phrase table.
pub struct PhrasePairExtractor<'a> {
    source_vocab: &'a Vocabulary,
    target_vocab: &'a Vocabulary,
    source_embeddings: &'a EmbeddingMatrix,
    target_embeddings: &'a EmbeddingMatrix,
}

impl<'a> PhrasePairExtractor<'a> {
    /// Create an extractor over both vocabularies and their aligned matrices.
    pub fn new(
        source_vocab: &'a Vocabulary,
        target_vocab: &'a Vocabulary,
        source_embeddings: &'a EmbeddingMatrix,
        target_embeddings: &'a EmbeddingMatrix,
    ) -> Self {
        Self {
            source_vocab,
            target_vocab,
            source_embeddings,
            target_embeddings,
        }
    }

    /// Extract phrase pairs from a gzip-compressed phrase table on disk.
    pub fn extract_from_path(&self, path: &Path) -> RnnedResult<Vec<PhrasePair>> {
        let file = File::open(path).map_err(|e| {
            RnnedError::data(format!(
                "failed to open phrase table {}: {}",
                path.display(),
                e
            ))
        })?;
        self.extract(BufReader::new(GzDecoder::new(file)))
    }

    /// Extract phrase pairs from an uncompressed line reader.
    pub fn extract<R: BufRead>(&self, reader: R) -> RnnedResult<Vec<PhrasePair>> {
        let mut pairs = Vec::new();
        let mut dropped_oov = 0usize;

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            match self.parse_line(&line) {
                LineOutcome::Pair(pair) => pairs.push(*pair),
                // Expected domain behavior, not an error.
                LineOutcome::AllOov => dropped_oov += 1,
                LineOutcome::Malformed(reason) => {
                    tracing::warn!(line = idx + 1, reason, "skipping malformed phrase-table line");
                }
            }
        }

        tracing::info!(
            kept = pairs.len(),
            dropped_oov,
            "extracted phrase pairs from phrase table"
        );
        Ok(pairs)
    }

    fn parse_line(&self, line: &str) -> LineOutcome {
        let mut fields = line.split(PHRASE_DELIMITER);
        // Additional |||-delimited fields (scores, alignments) are ignored.
        let (Some(source_text), Some(target_text)) = (fields.next(), fields.next()) else {
            return LineOutcome::Malformed("missing ||| delimiter");
        };

        let source_ids = self.source_vocab.map_tokens(source_text.split_whitespace());
        let target_ids = self.target_vocab.map_tokens(target_text.split_whitespace());
        if source_ids.is_empty() || target_ids.is_empty() {
            return LineOutcome::Malformed("empty phrase segment");
        }

        // Explicit all-UNK check rather than an id sum.
        if source_ids.iter().all(|&id| id == UNK_ID)
            || target_ids.iter().all(|&id| id == UNK_ID)
        {
            return LineOutcome::AllOov;
        }

        let source_vectors = gather_rows(self.source_embeddings, &source_ids);
        let target_vectors = gather_rows(self.target_embeddings, &target_ids);

        LineOutcome::Pair(Box::new(PhrasePair {
            source_vectors,
            target_vectors,
            target_ids,
        }))
    }
}

/// Collect the embedding rows for a sequence of vocabulary ids.
fn gather_rows(matrix: &EmbeddingMatrix, ids: &[u32]) -> Vec<Vec<f32>> {
    ids.iter().map(|&id| matrix.row(id as usize).to_vec()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::EmbeddingAligner;
    use crate::vocab::VocabularyBuilder;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    struct Fixture {
        source_vocab: Vocabulary,
        target_vocab: Vocabulary,
        source_embeddings: EmbeddingMatrix,
        target_embeddings: EmbeddingMatrix,
    }

    /// Source vocab {UNK, x:1, y:2}; target vocab {UNK, z:1, w:2}.
    /// No external vectors, so every row is the all-ones fallback.
    fn fixture() -> Fixture {
        let (_, source_vocab) = VocabularyBuilder::new(10).build(["x x y"]).unwrap();
        let (_, target_vocab) = VocabularyBuilder::new(10).build(["z z w"]).unwrap();
        let empty = format!("0 {}\n", 2).into_bytes();
        let aligner = EmbeddingAligner::new(2);
        let (_, source_embeddings) = aligner
            .align(Cursor::new(empty.clone()), &source_vocab)
            .unwrap();
        let (_, target_embeddings) = aligner.align(Cursor::new(empty), &target_vocab).unwrap();
        Fixture {
            source_vocab,
            target_vocab,
            source_embeddings,
            target_embeddings,
        }
    }

    fn extract(fx: &Fixture, table: &str) -> Vec<PhrasePair> {
        PhrasePairExtractor::new(
            &fx.source_vocab,
            &fx.target_vocab,
            &fx.source_embeddings,
            &fx.target_embeddings,
        )
        .extract(Cursor::new(table.as_bytes().to_vec()))
        .unwrap()
    }

    #[test]
    fn test_valid_line_is_extracted() {
        let fx = fixture();
        let pairs = extract(&fx, "x y ||| z w\n");
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].target_ids, vec![1, 2]);
        assert_eq!(pairs[0].source_vectors.len(), 2);
        assert_eq!(pairs[0].target_vectors.len(), 2);
        assert_eq!(pairs[0].source_vectors[0], vec![1.0, 1.0]);
    }

    #[test]
    fn test_all_oov_source_is_dropped() {
        let fx = fixture();
        // "p q" are unknown on the source side: ids [0, 0].
        let pairs = extract(&fx, "p q ||| z\n");
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_all_oov_both_sides_is_dropped() {
        let fx = fixture();
        let pairs = extract(&fx, "p q ||| r\n");
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_partial_oov_is_kept() {
        let fx = fixture();
        let pairs = extract(&fx, "x unknowntoken ||| z\n");
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].target_ids, vec![1]);
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let fx = fixture();
        let pairs = extract(&fx, "x ||| z ||| 0.2 0.4 ||| 0-0\n");
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].target_ids, vec![1]);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let fx = fixture();
        let table = "no delimiter here\nx ||| z\n ||| z\n";
        let pairs = extract(&fx, table);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].target_ids, vec![1]);
    }

    #[test]
    fn test_extract_from_gzip_path() {
        let fx = fixture();
        let mut file = NamedTempFile::new().unwrap();
        let mut encoder = GzEncoder::new(file.as_file_mut(), Compression::default());
        encoder.write_all(b"x y ||| z w\np q ||| z\n").unwrap();
        encoder.finish().unwrap();
        file.flush().unwrap();

        let extractor = PhrasePairExtractor::new(
            &fx.source_vocab,
            &fx.target_vocab,
            &fx.source_embeddings,
            &fx.target_embeddings,
        );
        let pairs = extractor.extract_from_path(file.path()).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].target_ids, vec![1, 2]);
    }
}

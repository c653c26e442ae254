//! Word embedding alignment.
//!
//! Loads an externally trained embedding table (word2vec binary format) and
//! produces a dense matrix whose row `i` holds the vector for vocabulary id
//! `i`. Vocabulary tokens absent from the table get an all-ones fallback row.
//!
//! # File Format
//!
//! ```text
//! <vocabSize> <dim>\n
//! <token>' '<dim little-endian f32 values>\n     (vocabSize times)
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RnnedError, RnnedResult};
use crate::vocab::Vocabulary;

/// Dense embedding matrix stored as a flat row-major buffer with explicit
/// shape, so serialization never recurses through nested structures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingMatrix {
    rows: usize,
    dim: usize,
    data: Vec<f32>,
}

impl EmbeddingMatrix {
    fn new(rows: usize, dim: usize, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), rows * dim);
        Self { rows, dim, data }
    }

    /// Number of rows (equals the vocabulary size).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Embedding dimensionality.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// The vector for vocabulary id `row`.
    ///
    /// # Panics
    ///
    /// Panics if `row >= self.rows()`. Ids produced by the matching
    /// vocabulary are always in range.
    pub fn row(&self, row: usize) -> &[f32] {
        &self.data[row * self.dim..(row + 1) * self.dim]
    }
}

/// Aligns an external embedding table to a vocabulary's index space.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddingAligner {
    expected_dim: usize,
}

impl EmbeddingAligner {
    /// Create an aligner expecting vectors of `expected_dim` dimensions.
    pub fn new(expected_dim: usize) -> Self {
        Self { expected_dim }
    }

    /// Align embeddings from a word2vec binary file on disk.
    ///
    /// Returns the number of vocabulary types missing from the table (the
    /// explicit UNK entry is excluded from the tally) and the aligned matrix.
    pub fn align_from_path(
        &self,
        path: &Path,
        vocab: &Vocabulary,
    ) -> RnnedResult<(i64, EmbeddingMatrix)> {
        let file = File::open(path).map_err(|e| {
            RnnedError::data(format!(
                "failed to open embedding file {}: {}",
                path.display(),
                e
            ))
        })?;
        self.align(BufReader::new(file), vocab)
    }

    /// Align embeddings from any reader over the word2vec binary format.
    pub fn align<R: BufRead>(
        &self,
        reader: R,
        vocab: &Vocabulary,
    ) -> RnnedResult<(i64, EmbeddingMatrix)> {
        let table = self.parse_table(reader)?;

        let fallback = vec![1.0f32; self.expected_dim];
        let mut data = Vec::with_capacity(vocab.len() * self.expected_dim);
        // Start at -1: the explicit UNK entry is guaranteed to miss and must
        // not inflate the metric.
        let mut unk_count: i64 = -1;

        for token in vocab.tokens() {
            match table.get(token) {
                Some(vector) => data.extend_from_slice(vector),
                None => {
                    unk_count += 1;
                    data.extend_from_slice(&fallback);
                }
            }
        }

        let matrix = EmbeddingMatrix::new(vocab.len(), self.expected_dim, data);
        Ok((unk_count, matrix))
    }

    /// Parse the table into a token -> vector map, validating the declared
    /// dimension against the expected one before reading any vectors.
    fn parse_table<R: BufRead>(&self, mut reader: R) -> RnnedResult<HashMap<String, Vec<f32>>> {
        let mut header = String::new();
        reader.read_line(&mut header)?;
        let mut fields = header.split_whitespace();
        let vector_count: usize = fields
            .next()
            .and_then(|f| f.parse().ok())
            .ok_or_else(|| RnnedError::data("embedding header missing vector count"))?;
        let dim: usize = fields
            .next()
            .and_then(|f| f.parse().ok())
            .ok_or_else(|| RnnedError::data("embedding header missing vector dimension"))?;

        if dim != self.expected_dim {
            return Err(RnnedError::config(format!(
                "embedding dimension mismatch: file declares {}, expected {}",
                dim, self.expected_dim
            )));
        }

        let mut table = HashMap::with_capacity(vector_count);
        let mut vector_buf = vec![0u8; dim * std::mem::size_of::<f32>()];

        for _ in 0..vector_count {
            let mut token_bytes = Vec::new();
            reader.read_until(b' ', &mut token_bytes)?;
            if token_bytes.last() == Some(&b' ') {
                token_bytes.pop();
            }
            let token = String::from_utf8(token_bytes)
                .map_err(|_| RnnedError::data("embedding token is not valid UTF-8"))?;

            reader.read_exact(&mut vector_buf)?;
            let vector: Vec<f32> = vector_buf
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect();

            let mut newline = [0u8; 1];
            reader.read_exact(&mut newline)?;

            table.insert(token, vector);
        }

        Ok(table)
    }
}

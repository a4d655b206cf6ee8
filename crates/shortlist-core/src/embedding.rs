//! Similarity oracle trait, embedding-backed oracle, and vector utilities.
//!
//! The scorer never talks to a model directly. It asks a [`SimilarityOracle`]
//! for cosine similarities; [`EmbeddingOracle`] answers by embedding both sides
//! with an [`Embedder`] and comparing the vectors.
//!
//! Concrete embedders (fastembed, tract, OpenAI, Ollama) live in the
//! `shortlist` app crate.

use std::cell::RefCell;
use std::collections::HashMap;

use anyhow::{bail, Result};

/// Trait for embedding backends.
///
/// Implementations are created once per request by the entry point and
/// handed to an [`EmbeddingOracle`]; there is no process-global model.
pub trait Embedder: Send + Sync {
    /// Returns the model identifier (e.g. `"all-minilm-l6-v2"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality (e.g. `384`).
    fn dims(&self) -> usize;
    /// Embed a batch of texts, returning one vector per input in order.
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn model_name(&self) -> &str {
        (**self).model_name()
    }
    fn dims(&self) -> usize {
        (**self).dims()
    }
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        (**self).embed(texts)
    }
}

/// Answers cosine-similarity questions about pairs of strings.
///
/// Every method is fallible; callers treat an error as fatal for the request.
pub trait SimilarityOracle {
    /// Similarity of `a` and `b`, in `[-1.0, 1.0]`.
    fn compare(&self, a: &str, b: &str) -> Result<f32>;

    /// Similarity of `query` against each of `texts`, in input order.
    fn compare_batch(&self, query: &str, texts: &[&str]) -> Result<Vec<f32>>;
}

/// [`SimilarityOracle`] backed by an [`Embedder`].
///
/// Vectors for identical strings are memoized for the lifetime of the oracle,
/// so one request never embeds the same category description twice. The
/// cosine itself is computed on every call.
pub struct EmbeddingOracle<E> {
    embedder: E,
    memo: RefCell<HashMap<String, Vec<f32>>>,
}

impl<E: Embedder> EmbeddingOracle<E> {
    pub fn new(embedder: E) -> Self {
        Self {
            embedder,
            memo: RefCell::new(HashMap::new()),
        }
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    /// Number of distinct strings embedded so far.
    pub fn memoized(&self) -> usize {
        self.memo.borrow().len()
    }

    /// Embed whichever of `texts` are not memoized yet, in one batch.
    fn ensure_embedded(&self, texts: &[&str]) -> Result<()> {
        let mut missing: Vec<String> = Vec::new();
        {
            let memo = self.memo.borrow();
            for text in texts {
                if !memo.contains_key(*text) && !missing.iter().any(|m| m == text) {
                    missing.push(text.to_string());
                }
            }
        }
        if missing.is_empty() {
            return Ok(());
        }

        let vectors = self.embedder.embed(&missing)?;
        if vectors.len() != missing.len() {
            bail!(
                "embedder '{}' returned {} vectors for {} texts",
                self.embedder.model_name(),
                vectors.len(),
                missing.len()
            );
        }

        let mut memo = self.memo.borrow_mut();
        for (text, vector) in missing.into_iter().zip(vectors) {
            memo.insert(text, vector);
        }
        Ok(())
    }

    fn similarity(&self, a: &str, b: &str) -> Result<f32> {
        let memo = self.memo.borrow();
        match (memo.get(a), memo.get(b)) {
            (Some(va), Some(vb)) => Ok(cosine_similarity(va, vb)),
            _ => bail!("embedding missing after batch encode"),
        }
    }
}

impl<E: Embedder> SimilarityOracle for EmbeddingOracle<E> {
    fn compare(&self, a: &str, b: &str) -> Result<f32> {
        self.ensure_embedded(&[a, b])?;
        self.similarity(a, b)
    }

    fn compare_batch(&self, query: &str, texts: &[&str]) -> Result<Vec<f32>> {
        let mut all = Vec::with_capacity(texts.len() + 1);
        all.push(query);
        all.extend_from_slice(texts);
        self.ensure_embedded(&all)?;
        texts.iter().map(|t| self.similarity(query, t)).collect()
    }
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`:
/// - `1.0` = identical direction
/// - `0.0` = orthogonal (unrelated)
/// - `-1.0` = opposite direction
///
/// Returns `0.0` for empty vectors or vectors of different lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

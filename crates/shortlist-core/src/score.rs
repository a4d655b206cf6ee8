//! Relevance scoring on top of a [`SimilarityOracle`].
//!
//! Two kinds of score feed selection:
//!
//! - **Task relevance**: similarity of each passage to the task, computed once
//!   per request in a single batch and cached on the passage.
//! - **Category affinity**: similarity of one passage to one category
//!   description, asked of the oracle on every comparison.
//!
//! Oracle failures propagate; there is no degraded fallback.

use anyhow::{bail, Context, Result};

use crate::embedding::SimilarityOracle;
use crate::models::Passage;

/// Scores passages with an injected oracle.
pub struct RelevanceScorer<'o> {
    oracle: &'o dyn SimilarityOracle,
}

impl<'o> RelevanceScorer<'o> {
    pub fn new(oracle: &'o dyn SimilarityOracle) -> Self {
        Self { oracle }
    }

    /// Fill `task_relevance` on every passage with one batch oracle call.
    ///
    /// Values are the raw cosine similarities, not clamped further.
    pub fn score_task_relevance(&self, passages: &mut [Passage], task: &str) -> Result<()> {
        if task.trim().is_empty() {
            bail!("cannot score task relevance without a task");
        }
        if passages.is_empty() {
            return Ok(());
        }

        let texts: Vec<&str> = passages.iter().map(|p| p.text.as_str()).collect();
        let scores = self
            .oracle
            .compare_batch(task, &texts)
            .context("task relevance scoring failed")?;
        if scores.len() != passages.len() {
            bail!(
                "similarity oracle returned {} scores for {} passages",
                scores.len(),
                passages.len()
            );
        }

        for (passage, score) in passages.iter_mut().zip(scores) {
            passage.task_relevance = Some(f64::from(score));
        }
        Ok(())
    }

    /// Similarity of one passage text to one category description.
    pub fn score_category_affinity(
        &self,
        passage_text: &str,
        category_description: &str,
    ) -> Result<f64> {
        let score = self
            .oracle
            .compare(passage_text, category_description)
            .context("category affinity scoring failed")?;
        Ok(f64::from(score))
    }
}

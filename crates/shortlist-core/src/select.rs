//! Per-category passage selection.
//!
//! For each category, in taxonomy order:
//!
//! 1. Every passage whose text is not yet used gets
//!    `combined = 0.6 × task_relevance + 0.4 × category_affinity`.
//! 2. The request's [`BiasPolicy`] multiplies `combined` by a source-name factor.
//! 3. The highest `combined` wins; ties go to the passage stored first.
//! 4. The winner's exact text joins the used set and the winner is appended
//!    with the next `importance_rank`.
//!
//! A category with no unused passage contributes nothing, so a selection can
//! be shorter than its taxonomy. An empty pool yields an empty selection.

use std::collections::HashSet;

use anyhow::{bail, Result};

use crate::bias::BiasPolicy;
use crate::models::{Passage, SelectedPassage, Selection, Taxonomy};
use crate::score::RelevanceScorer;

/// Weight of task relevance in the combined score.
pub const TASK_WEIGHT: f64 = 0.6;
/// Weight of category affinity in the combined score.
pub const CATEGORY_WEIGHT: f64 = 0.4;

/// Picks one non-duplicate passage per category.
pub struct CategorySelector<'s, 'o> {
    scorer: &'s RelevanceScorer<'o>,
}

impl<'s, 'o> CategorySelector<'s, 'o> {
    pub fn new(scorer: &'s RelevanceScorer<'o>) -> Self {
        Self { scorer }
    }

    /// Select passages for `taxonomy`.
    ///
    /// Every passage must already carry a task relevance score; the bias
    /// policy is derived from `request_id` and `task`.
    pub fn select<'a>(
        &self,
        passages: &'a [Passage],
        task: &str,
        taxonomy: &'a Taxonomy,
        request_id: &str,
    ) -> Result<Selection<'a>> {
        if task.trim().is_empty() {
            bail!("cannot select passages without a task");
        }
        if let Some(p) = passages.iter().find(|p| p.task_relevance.is_none()) {
            bail!(
                "passage {} p.{} has no task relevance score",
                p.source_id,
                p.position
            );
        }

        let bias = BiasPolicy::for_request(request_id, task);
        let mut used: HashSet<&'a str> = HashSet::new();
        let mut selection = Selection::default();

        for category in &taxonomy.categories {
            let mut best: Option<&'a Passage> = None;
            let mut best_score = f64::NEG_INFINITY;

            for passage in passages {
                if used.contains(passage.text.as_str()) {
                    continue;
                }
                let affinity = self
                    .scorer
                    .score_category_affinity(&passage.text, &category.description)?;
                let combined = combine(passage.task_relevance.unwrap_or_default(), affinity);
                let combined = bias.apply(&passage.source_id, combined);

                if combined > best_score {
                    best = Some(passage);
                    best_score = combined;
                }
            }

            if let Some(passage) = best {
                used.insert(passage.text.as_str());
                selection.entries.push(SelectedPassage {
                    passage,
                    category_key: category.key.as_str(),
                    importance_rank: selection.entries.len() as u32 + 1,
                    score: best_score,
                });
            }
        }

        Ok(selection)
    }
}

/// Weighted blend of task relevance and category affinity.
pub fn combine(task_relevance: f64, category_affinity: f64) -> f64 {
    TASK_WEIGHT * task_relevance + CATEGORY_WEIGHT * category_affinity
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::SimilarityOracle;
    use crate::models::Passage;
    use std::cell::Cell;

    /// Affinity = 1.0 when the passage mentions the description's first word.
    struct FirstWordOracle {
        calls: Cell<usize>,
    }

    impl FirstWordOracle {
        fn new() -> Self {
            Self {
                calls: Cell::new(0),
            }
        }
    }

    impl SimilarityOracle for FirstWordOracle {
        fn compare(&self, a: &str, b: &str) -> Result<f32> {
            self.calls.set(self.calls.get() + 1);
            let first = b.split_whitespace().next().unwrap_or_default();
            Ok(if a.contains(first) { 1.0 } else { 0.0 })
        }
        fn compare_batch(&self, _query: &str, texts: &[&str]) -> Result<Vec<f32>> {
            Ok(vec![0.0; texts.len()])
        }
    }

    fn scored(source: &str, position: u32, text: &str, relevance: f64) -> Passage {
        let mut p = Passage::new(source, position, text);
        p.task_relevance = Some(relevance);
        p
    }

    #[test]
    fn combine_uses_fixed_weights() {
        assert!((combine(1.0, 0.0) - 0.6).abs() < 1e-12);
        assert!((combine(0.0, 1.0) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn one_passage_per_category_in_taxonomy_order() {
        let passages = vec![
            scored("a.pdf", 1, "coastal beaches", 0.1),
            scored("a.pdf", 2, "city guide", 0.1),
        ];
        let taxonomy = Taxonomy::from_pairs("t", &[("cities", "city"), ("coast", "coastal")]);
        let oracle = FirstWordOracle::new();
        let scorer = RelevanceScorer::new(&oracle);
        let selection = CategorySelector::new(&scorer)
            .select(&passages, "task", &taxonomy, "")
            .unwrap();

        let picked: Vec<(&str, u32, u32)> = selection
            .iter()
            .map(|e| (e.category_key, e.passage.position, e.importance_rank))
            .collect();
        assert_eq!(picked, vec![("cities", 2, 1), ("coast", 1, 2)]);
    }

    #[test]
    fn used_text_is_skipped_even_from_another_source() {
        let passages = vec![
            scored("a.pdf", 1, "same words here", 0.9),
            scored("b.pdf", 4, "same words here", 0.9),
            scored("c.pdf", 1, "different", 0.1),
        ];
        let taxonomy = Taxonomy::from_pairs("t", &[("x", "x"), ("y", "y")]);
        let oracle = FirstWordOracle::new();
        let scorer = RelevanceScorer::new(&oracle);
        let selection = CategorySelector::new(&scorer)
            .select(&passages, "task", &taxonomy, "")
            .unwrap();

        assert_eq!(selection.len(), 2);
        assert_eq!(selection.entries[0].passage.source_id, "a.pdf");
        assert_eq!(selection.entries[1].passage.source_id, "c.pdf");
    }

    #[test]
    fn ties_go_to_first_stored_passage() {
        let passages = vec![
            scored("a.pdf", 1, "alpha", 0.5),
            scored("b.pdf", 1, "beta", 0.5),
        ];
        let taxonomy = Taxonomy::from_pairs("t", &[("only", "nothing")]);
        let oracle = FirstWordOracle::new();
        let scorer = RelevanceScorer::new(&oracle);
        let selection = CategorySelector::new(&scorer)
            .select(&passages, "task", &taxonomy, "")
            .unwrap();
        assert_eq!(selection.entries[0].passage.text, "alpha");
    }

    #[test]
    fn starved_categories_are_omitted() {
        let passages = vec![scored("a.pdf", 1, "lonely passage", 0.3)];
        let taxonomy = Taxonomy::from_pairs("t", &[("a", "a"), ("b", "b"), ("c", "c")]);
        let oracle = FirstWordOracle::new();
        let scorer = RelevanceScorer::new(&oracle);
        let selection = CategorySelector::new(&scorer)
            .select(&passages, "task", &taxonomy, "")
            .unwrap();
        assert_eq!(selection.len(), 1);
        assert_eq!(selection.entries[0].category_key, "a");
        // Only the first category had a candidate to compare.
        assert_eq!(oracle.calls.get(), 1);
    }

    #[test]
    fn empty_pool_yields_empty_selection() {
        let taxonomy = Taxonomy::from_pairs("t", &[("a", "a")]);
        let oracle = FirstWordOracle::new();
        let scorer = RelevanceScorer::new(&oracle);
        let selection = CategorySelector::new(&scorer)
            .select(&[], "task", &taxonomy, "")
            .unwrap();
        assert!(selection.is_empty());
    }

    #[test]
    fn negative_scores_still_select() {
        let passages = vec![scored("a.pdf", 1, "unrelated", -0.8)];
        let taxonomy = Taxonomy::from_pairs("t", &[("a", "nothing")]);
        let oracle = FirstWordOracle::new();
        let scorer = RelevanceScorer::new(&oracle);
        let selection = CategorySelector::new(&scorer)
            .select(&passages, "task", &taxonomy, "")
            .unwrap();
        assert_eq!(selection.len(), 1);
        assert!(selection.entries[0].score < 0.0);
    }

    #[test]
    fn unscored_passages_are_rejected() {
        let passages = vec![Passage::new("a.pdf", 3, "never scored")];
        let taxonomy = Taxonomy::from_pairs("t", &[("a", "a")]);
        let oracle = FirstWordOracle::new();
        let scorer = RelevanceScorer::new(&oracle);
        let err = CategorySelector::new(&scorer)
            .select(&passages, "task", &taxonomy, "")
            .unwrap_err();
        assert!(err.to_string().contains("a.pdf p.3"));
    }

    #[test]
    fn dinner_bias_prefers_dinner_ideas_source() {
        let passages = vec![
            scored("Lunch Recipes.pdf", 1, "lentil salad bowl", 0.5),
            scored("Dinner Ideas.pdf", 1, "lentil stew pot", 0.5),
        ];
        let taxonomy = Taxonomy::from_pairs("t", &[("mains", "lentil dishes")]);
        let oracle = FirstWordOracle::new();
        let scorer = RelevanceScorer::new(&oracle);
        let selection = CategorySelector::new(&scorer)
            .select(&passages, "Prepare a dinner menu", &taxonomy, "")
            .unwrap();

        let entry = &selection.entries[0];
        assert_eq!(entry.passage.source_id, "Dinner Ideas.pdf");
        // base = 0.6 * 0.5 + 0.4 * 1.0 = 0.7
        assert!((entry.score - 0.7 * 1.15).abs() < 1e-9);
    }
}

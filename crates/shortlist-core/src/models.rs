//! Core data models shared by the resolver, scorer, and selector.
//!
//! Passages are produced once per request by an extractor and discarded when
//! the request completes. Taxonomies and [`RequestContext`] are read-only for
//! the lifetime of a request.

use serde::Serialize;

/// A contiguous unit of extracted document text.
///
/// `text` is whitespace-normalized: no line breaks, no runs of blanks.
/// `task_relevance` is filled exactly once by
/// [`RelevanceScorer::score_task_relevance`](crate::score::RelevanceScorer::score_task_relevance).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Passage {
    /// Identifier of the originating document (its file name).
    pub source_id: String,
    /// 1-based page or slide number within the source.
    pub position: u32,
    pub text: String,
    pub task_relevance: Option<f64>,
}

impl Passage {
    /// Build an unscored passage, collapsing all whitespace in `text`.
    pub fn new(source_id: impl Into<String>, position: u32, text: &str) -> Self {
        Self {
            source_id: source_id.into(),
            position,
            text: normalize_whitespace(text),
            task_relevance: None,
        }
    }
}

/// Collapse line breaks and whitespace runs into single spaces.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One named category of a [`Taxonomy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    /// Unique within its taxonomy.
    pub key: String,
    /// Natural-language profile used for scoring, never displayed.
    pub description: String,
}

/// An ordered set of categories. Category order is output rank order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Taxonomy {
    pub name: String,
    pub categories: Vec<Category>,
}

impl Taxonomy {
    /// Build a taxonomy from `(key, description)` pairs, keeping their order.
    pub fn from_pairs(name: &str, pairs: &[(&str, &str)]) -> Self {
        Self {
            name: name.to_string(),
            categories: pairs
                .iter()
                .map(|(key, description)| Category {
                    key: key.to_string(),
                    description: description.to_string(),
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Returns the first key that appears more than once, if any.
    pub fn duplicate_key(&self) -> Option<&str> {
        self.categories.iter().enumerate().find_map(|(i, c)| {
            self.categories[..i]
                .iter()
                .any(|earlier| earlier.key == c.key)
                .then_some(c.key.as_str())
        })
    }
}

/// Who is asking and what they need done.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub persona: String,
    /// Must be non-empty before scoring.
    pub task: String,
    /// Empty when the request carries no identifier.
    pub request_id: String,
}

/// A passage chosen for one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedPassage<'a> {
    pub passage: &'a Passage,
    pub category_key: &'a str,
    /// 1-based position in the [`Selection`].
    pub importance_rank: u32,
    /// Combined score after bias adjustment.
    pub score: f64,
}

/// Ordered, deduplicated passages, at most one per category.
///
/// Borrows passages from the store; no passage text is copied.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Selection<'a> {
    pub entries: Vec<SelectedPassage<'a>>,
}

impl<'a> Selection<'a> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SelectedPassage<'a>> {
        self.entries.iter()
    }
}

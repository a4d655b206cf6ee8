//! In-memory passage store for a single request.
//!
//! Extractors feed raw `(position, text)` fragments per document; the store
//! turns them into [`Passage`]s in arrival order. Order matters: the selector
//! breaks score ties in favour of the passage stored first.

use crate::models::Passage;

/// A fragment emitted by an extractor before it becomes a [`Passage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPassage {
    pub position: u32,
    pub text: String,
}

/// Holds every passage extracted for one request.
#[derive(Debug, Clone, Default)]
pub struct PassageStore {
    passages: Vec<Passage>,
}

impl PassageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append all fragments of one source document.
    ///
    /// Fragments whose normalized text is empty are dropped. Returns the
    /// number of passages added.
    pub fn add_document(
        &mut self,
        source_id: &str,
        fragments: impl IntoIterator<Item = RawPassage>,
    ) -> usize {
        let before = self.passages.len();
        for fragment in fragments {
            let passage = Passage::new(source_id, fragment.position, &fragment.text);
            if !passage.text.is_empty() {
                self.passages.push(passage);
            }
        }
        self.passages.len() - before
    }

    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    /// Mutable access for the scorer to cache task relevance.
    pub fn passages_mut(&mut self) -> &mut [Passage] {
        &mut self.passages
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }
}

//! # Shortlist Core
//!
//! Category-aware ranking and selection: resolve which taxonomy applies to a
//! request, score passages against the task and each category, apply domain
//! bias, and pick one non-duplicate passage per category.
//!
//! This crate is synchronous and performs no I/O. Similarity and label
//! generation are reached through the [`embedding::SimilarityOracle`] and
//! [`label::Summarizer`] traits, which the calling application implements and
//! injects.
//!
//! ```text
//! PassageStore ─▶ TaxonomyResolver ─▶ RelevanceScorer ─▶ CategorySelector ─▶ Selection
//! ```

pub mod bias;
pub mod embedding;
pub mod label;
pub mod models;
pub mod score;
pub mod select;
pub mod store;
pub mod taxonomy;

//! # Shortlist
//!
//! Category-aware passage ranking for document collections.
//!
//! Given a request (persona, job to be done, list of documents), Shortlist
//! extracts passages from the documents, picks a category taxonomy for the
//! request, and selects the single best non-duplicate passage for each
//! category. Each pick gets a short generated title.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌──────────────────────┐   ┌───────────┐
//! │ Request JSON │──▶│  Extract    │──▶│   shortlist-core     │──▶│ Assemble  │
//! │ + PDFs/DOCX  │   │ PDF/OOXML   │   │ resolve·score·select │   │ + labels  │
//! └──────────────┘   └─────────────┘   └──────────┬───────────┘   └─────┬─────┘
//!                                                 │                     │
//!                                        ┌────────┴────────┐     ┌──────┴──────┐
//!                                        │   Embeddings    │     │ Output JSON │
//!                                        │ local/OpenAI/   │     └─────────────┘
//!                                        │ Ollama          │
//!                                        └─────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`request`] | Request document parsing |
//! | [`extract`] | Passage extraction from PDF, DOCX, PPTX |
//! | [`embedding`] | Embedding backends for the similarity oracle |
//! | [`labels`] | Title generation backends |
//! | [`assemble`] | Result document assembly and output |
//! | [`progress`] | Progress reporting on stderr |
//! | [`run`] | Request pipeline orchestration |

pub mod assemble;
pub mod config;
pub mod embedding;
pub mod extract;
pub mod labels;
pub mod progress;
pub mod request;
pub mod run;

//! Result Assembler: turns a [`Selection`] into the output document.
//!
//! One `extracted_sections` record and one `subsection_analysis` record per
//! selected passage, both in rank order. Labels come from a
//! [`Summarizer`]; a failed label degrades to the passage's first sentence.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use shortlist_core::label::{label_passage, Label, Summarizer};
use shortlist_core::models::Selection;

use crate::request::RequestDocument;

#[derive(Debug, Clone, Serialize)]
pub struct ResultDocument {
    pub metadata: Metadata,
    pub extracted_sections: Vec<ExtractedSection>,
    pub subsection_analysis: Vec<SubsectionAnalysis>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    pub input_documents: Vec<String>,
    pub persona: String,
    pub job_to_be_done: String,
    pub processing_timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractedSection {
    pub document: String,
    pub section_title: String,
    pub importance_rank: u32,
    pub page_number: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubsectionAnalysis {
    pub document: String,
    pub refined_text: String,
    pub page_number: u32,
}

/// Local time, ISO-8601 with microseconds and no offset.
pub fn processing_timestamp() -> String {
    chrono::Local::now()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

pub fn assemble(
    request: &RequestDocument,
    selection: &Selection<'_>,
    summarizer: &dyn Summarizer,
    max_chars: usize,
    processing_timestamp: String,
) -> ResultDocument {
    let mut extracted_sections = Vec::with_capacity(selection.len());
    let mut subsection_analysis = Vec::with_capacity(selection.len());

    for entry in selection.iter() {
        let passage = entry.passage;
        let label = label_passage(summarizer, &passage.text, max_chars);
        if let Label::Fallback { reason, .. } = &label {
            if !reason.is_failure() {
                tracing::debug!(rank = entry.importance_rank, "using fallback label");
            } else {
                tracing::warn!(
                    rank = entry.importance_rank,
                    document = %passage.source_id,
                    %reason,
                    "label generation failed, using first sentence"
                );
            }
        }

        extracted_sections.push(ExtractedSection {
            document: passage.source_id.clone(),
            section_title: label.into_string(),
            importance_rank: entry.importance_rank,
            page_number: passage.position,
        });
        subsection_analysis.push(SubsectionAnalysis {
            document: passage.source_id.clone(),
            refined_text: passage.text.clone(),
            page_number: passage.position,
        });
    }

    ResultDocument {
        metadata: Metadata {
            input_documents: request.filenames(),
            persona: request.persona.role.clone(),
            job_to_be_done: request.job_to_be_done.task.clone(),
            processing_timestamp,
        },
        extracted_sections,
        subsection_analysis,
    }
}

/// Serialize as pretty JSON and write to `path`.
pub fn write_result(path: &Path, result: &ResultDocument) -> Result<()> {
    let json = serde_json::to_string_pretty(result).context("Failed to serialize result")?;
    std::fs::write(path, json + "\n")
        .with_context(|| format!("Failed to write result: {}", path.display()))
}

//! Request document parsing.
//!
//! The request names the documents to read, the persona, the job to be done,
//! and an optional challenge id. Any missing or malformed field is fatal and
//! reported before extraction or scoring starts.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

use shortlist_core::models::RequestContext;

#[derive(Debug, Clone, Deserialize)]
pub struct RequestDocument {
    pub documents: Vec<DocumentRef>,
    pub persona: Persona,
    pub job_to_be_done: JobToBeDone,
    #[serde(default)]
    pub challenge_info: Option<ChallengeInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentRef {
    pub filename: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Persona {
    pub role: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobToBeDone {
    pub task: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChallengeInfo {
    #[serde(default)]
    pub challenge_id: Option<String>,
    /// Free-form label for the collection, used in logs only.
    #[serde(default)]
    pub test_case_name: Option<String>,
}

impl RequestDocument {
    /// Challenge id, or the empty string when absent.
    pub fn request_id(&self) -> &str {
        self.challenge_info
            .as_ref()
            .and_then(|c| c.challenge_id.as_deref())
            .unwrap_or("")
    }

    pub fn test_case_name(&self) -> Option<&str> {
        self.challenge_info
            .as_ref()
            .and_then(|c| c.test_case_name.as_deref())
    }

    pub fn context(&self) -> RequestContext {
        RequestContext {
            persona: self.persona.role.clone(),
            task: self.job_to_be_done.task.clone(),
            request_id: self.request_id().to_string(),
        }
    }

    pub fn filenames(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.filename.clone()).collect()
    }
}

/// Parse a request document from JSON text.
pub fn parse_request(json: &str) -> Result<RequestDocument> {
    let request: RequestDocument =
        serde_json::from_str(json).context("Malformed request document")?;

    if request.job_to_be_done.task.trim().is_empty() {
        bail!("job_to_be_done.task must not be empty");
    }
    if let Some(doc) = request.documents.iter().find(|d| d.filename.trim().is_empty()) {
        bail!("documents: empty filename (title: {:?})", doc.title);
    }

    Ok(request)
}

pub fn load_request(path: &Path) -> Result<RequestDocument> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read request document: {}", path.display()))?;
    parse_request(&content).with_context(|| format!("Invalid request: {}", path.display()))
}

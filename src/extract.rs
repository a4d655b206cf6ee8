//! Passage extraction from source documents (PDF, DOCX, PPTX).
//!
//! Each format is turned into positioned pages, each page is split on blank
//! lines into paragraphs, and paragraphs are whitespace-normalized. Paragraphs
//! at or below the minimum length never become passages.
//!
//! | Format | Position |
//! |--------|----------|
//! | PDF    | 1-based page number |
//! | PPTX   | 1-based slide number |
//! | DOCX   | always 1 (no page model) |
//!
//! Errors never panic; the caller logs them and skips the document.

use std::io::Read;
use std::path::{Path, PathBuf};

use shortlist_core::models::normalize_whitespace;
use shortlist_core::store::RawPassage;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_PPTX: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("unsupported document type: {0}")]
    UnsupportedContentType(String),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("OOXML extraction failed: {0}")]
    Ooxml(String),
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Guess the content type from the file extension.
pub fn content_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some(MIME_PDF),
        "docx" => Some(MIME_DOCX),
        "pptx" => Some(MIME_PPTX),
        _ => None,
    }
}

/// Read and extract one document from disk.
pub fn extract_file(path: &Path, min_chars: usize) -> Result<Vec<RawPassage>, ExtractError> {
    let content_type = content_type_for(path).ok_or_else(|| {
        ExtractError::UnsupportedContentType(path.display().to_string())
    })?;
    let bytes = std::fs::read(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    extract_passages(&bytes, content_type, min_chars)
}

/// Extract passages from in-memory document bytes.
pub fn extract_passages(
    bytes: &[u8],
    content_type: &str,
    min_chars: usize,
) -> Result<Vec<RawPassage>, ExtractError> {
    let pages = match content_type {
        MIME_PDF => extract_pdf_pages(bytes)?,
        MIME_DOCX => vec![extract_docx(bytes)?],
        MIME_PPTX => extract_pptx_slides(bytes)?,
        _ => {
            return Err(ExtractError::UnsupportedContentType(
                content_type.to_string(),
            ))
        }
    };

    Ok(pages
        .iter()
        .enumerate()
        .flat_map(|(i, page)| split_paragraphs(i as u32 + 1, page, min_chars))
        .collect())
}

/// Split one page on blank lines, keeping paragraphs longer than `min_chars`.
///
/// Length is measured on the trimmed paragraph as extracted, before internal
/// whitespace is collapsed.
pub fn split_paragraphs(position: u32, page_text: &str, min_chars: usize) -> Vec<RawPassage> {
    page_text
        .trim()
        .split("\n\n")
        .filter(|para| para.trim().chars().count() > min_chars)
        .map(|para| RawPassage {
            position,
            text: normalize_whitespace(para),
        })
        .collect()
}

fn extract_pdf_pages(bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
    pdf_extract::extract_text_from_mem_by_pages(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

fn read_zip_entry_bounded(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
    name: &str,
    max_bytes: u64,
) -> Result<Vec<u8>, ExtractError> {
    let entry = archive
        .by_name(name)
        .map_err(|e| ExtractError::Ooxml(format!("{}: {}", name, e)))?;
    let mut out = Vec::new();
    entry
        .take(max_bytes)
        .read_to_end(&mut out)
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    if out.len() as u64 >= max_bytes {
        return Err(ExtractError::Ooxml(format!(
            "ZIP entry {} exceeds size limit ({} bytes)",
            name, max_bytes
        )));
    }
    Ok(out)
}

/// Whole document as one page; each `w:p` paragraph separated by a blank line.
fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    let xml = read_zip_entry_bounded(&mut archive, "word/document.xml", MAX_XML_ENTRY_BYTES)?;
    Ok(paragraph_texts(&xml)?.join("\n\n"))
}

/// One page per slide, ordered by slide number; paragraphs within a slide
/// stay together.
fn extract_pptx_slides(bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    let mut slide_names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("ppt/slides/slide") && n.ends_with(".xml"))
        .map(|s| s.to_string())
        .collect();
    slide_names.sort_by_key(|name| {
        name.trim_start_matches("ppt/slides/slide")
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });

    let mut slides = Vec::with_capacity(slide_names.len());
    for name in slide_names {
        let xml = read_zip_entry_bounded(&mut archive, &name, MAX_XML_ENTRY_BYTES)?;
        slides.push(paragraph_texts(&xml)?.join("\n"));
    }
    Ok(slides)
}

/// Collect the text runs (`*:t`) of each paragraph (`*:p`) in document order.
/// Works for both WordprocessingML and DrawingML.
fn paragraph_texts(xml: &[u8]) -> Result<Vec<String>, ExtractError> {
    use quick_xml::events::Event;

    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"t" => in_text = true,
                b"p" => current.clear(),
                _ => {}
            },
            Ok(Event::Text(te)) if in_text => {
                current.push_str(te.unescape().unwrap_or_default().as_ref());
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    let text = current.trim();
                    if !text.is_empty() {
                        paragraphs.push(text.to_string());
                    }
                    current.clear();
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(paragraphs)
}

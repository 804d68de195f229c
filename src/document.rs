use std::path::Path;

use log::info;
use serde::Serialize;
use thiserror::Error;

use crate::extract::{ExtractError, PageExtractor};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("unsupported document format '{0}'")]
    UnsupportedFormat(String),
    #[error("document is corrupt: {0}")]
    CorruptDocument(String),
    #[error("page extraction failed: {0}")]
    Extraction(#[source] ExtractError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Whole byte content is one page of text.
    Flat,
    /// Pages come from the page-extraction collaborator.
    Paginated,
}

impl DocumentFormat {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "txt" => Some(Self::Flat),
            "pdf" => Some(Self::Paginated),
            _ => None,
        }
    }
}

/// One ingested document: a title and at least one page of text.
///
/// Immutable once created; loading a new document replaces the old one in
/// full.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    title: String,
    pages: Vec<String>,
}

impl Document {
    fn new(title: String, pages: Vec<String>) -> Self {
        Self { title, pages }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Text of the given 1-based page number.
    pub fn page(&self, number: usize) -> Option<&str> {
        number
            .checked_sub(1)
            .and_then(|index| self.pages.get(index))
            .map(String::as_str)
    }
}

pub struct DocumentIngestor {
    extractor: Box<dyn PageExtractor>,
}

impl DocumentIngestor {
    pub fn new(extractor: Box<dyn PageExtractor>) -> Self {
        Self { extractor }
    }

    /// Produces a [`Document`] from raw bytes and the filename they came
    /// with. Fails without side effects; the caller installs the result.
    pub fn ingest(&self, bytes: &[u8], filename: &str) -> Result<Document, IngestError> {
        let path = Path::new(filename);
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned());
        let format = extension
            .as_deref()
            .and_then(DocumentFormat::from_extension)
            .ok_or_else(|| {
                IngestError::UnsupportedFormat(extension.unwrap_or_else(|| filename.to_string()))
            })?;

        let title = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| filename.to_string());

        let pages = match format {
            DocumentFormat::Flat => {
                vec![String::from_utf8_lossy(bytes).trim().to_string()]
            }
            DocumentFormat::Paginated => self.extract_pages(bytes)?,
        };

        info!("ingested '{title}' with {} page(s)", pages.len());
        Ok(Document::new(title, pages))
    }

    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, IngestError> {
        let extracted = self.extractor.open(bytes).map_err(map_extract_error)?;
        let count = extracted.page_count();
        if count == 0 {
            return Err(IngestError::CorruptDocument(
                "document reports no pages".to_string(),
            ));
        }

        let mut pages = Vec::with_capacity(count);
        for number in 1..=count {
            let fragments = extracted.fragments(number).map_err(map_extract_error)?;
            pages.push(fragments.join(" "));
        }
        Ok(pages)
    }
}

fn map_extract_error(err: ExtractError) -> IngestError {
    match err {
        ExtractError::Malformed(message) => IngestError::CorruptDocument(message),
        other => IngestError::Extraction(other),
    }
}

use std::{
    fs,
    path::PathBuf,
    process::Command,
    sync::atomic::{AtomicU64, Ordering},
};

use log::{error, info};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("importer rejected the document: {0}")]
    Malformed(String),
    #[error("importer failed: {0}")]
    Importer(String),
    #[error("page {0} out of range")]
    PageOutOfRange(usize),
}

/// Opens raw document bytes for text extraction.
pub trait PageExtractor: Send + Sync {
    fn open(&self, bytes: &[u8]) -> Result<Box<dyn ExtractedPages>, ExtractError>;
}

/// Extraction result for one document: page count and per-page fragments.
///
/// Pages are addressed 1-based; fragments keep the order the importer
/// produced them in.
pub trait ExtractedPages {
    fn page_count(&self) -> usize;
    fn fragments(&self, page: usize) -> Result<Vec<String>, ExtractError>;
}

static SCRATCH_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Runs an external importer command against a scratch copy of the document
/// and parses its JSON answer:
///
/// ```json
/// {"ok": true, "pages": [["fragment", ...], ...]}
/// {"ok": false, "code": "...", "message": "..."}
/// ```
pub struct ImporterCommandExtractor {
    env_key: &'static str,
    default_command: &'static str,
}

#[derive(Debug, Deserialize)]
struct ImporterPayload {
    ok: bool,
    #[serde(default)]
    pages: Vec<Vec<String>>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

struct ImportedDocument {
    pages: Vec<Vec<String>>,
}

impl ImporterCommandExtractor {
    pub fn pdf() -> Self {
        Self {
            env_key: "READER_PDF_COMMAND",
            default_command: "python scripts/py/pdf_extract.py",
        }
    }

    fn build_command(&self) -> Result<Command, ExtractError> {
        let raw = std::env::var(self.env_key).unwrap_or_else(|_| self.default_command.to_string());
        let parts: Vec<String> = shlex::Shlex::new(&raw).collect();
        let mut parts = parts.into_iter();
        let program = parts
            .next()
            .ok_or_else(|| ExtractError::Importer(format!("{} is empty", self.env_key)))?;
        let mut command = Command::new(program);
        for part in parts {
            command.arg(part);
        }
        Ok(command)
    }

    fn scratch_path() -> PathBuf {
        let serial = SCRATCH_COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!(
            "reader-import-{}-{serial}.doc",
            std::process::id()
        ))
    }
}

impl PageExtractor for ImporterCommandExtractor {
    fn open(&self, bytes: &[u8]) -> Result<Box<dyn ExtractedPages>, ExtractError> {
        let scratch = Self::scratch_path();
        fs::write(&scratch, bytes).map_err(|err| {
            ExtractError::Importer(format!(
                "unable to write scratch file {}: {err}",
                scratch.display()
            ))
        })?;

        let mut command = self.build_command()?;
        let output = command.arg(&scratch).output();
        let _ = fs::remove_file(&scratch);
        let output = output.map_err(|err| ExtractError::Importer(err.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!("importer exited with {}: {stderr}", output.status);
            return Err(ExtractError::Malformed(stderr));
        }

        let payload: ImporterPayload = serde_json::from_slice(&output.stdout)
            .map_err(|err| ExtractError::Importer(format!("unexpected importer output: {err}")))?;

        if !payload.ok {
            let message = payload
                .message
                .or(payload.code)
                .unwrap_or_else(|| "importer reported failure".to_string());
            return Err(ExtractError::Malformed(message));
        }

        info!("importer extracted {} page(s)", payload.pages.len());
        Ok(Box::new(ImportedDocument {
            pages: payload.pages,
        }))
    }
}

impl ExtractedPages for ImportedDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn fragments(&self, page: usize) -> Result<Vec<String>, ExtractError> {
        page.checked_sub(1)
            .and_then(|index| self.pages.get(index))
            .cloned()
            .ok_or(ExtractError::PageOutOfRange(page))
    }
}

//! Command layer: one thin function per user-facing operation, mapping
//! session results to [`CommandError`] responses with stable codes.

use std::fmt;

use serde::Serialize;

use crate::document::IngestError;
use crate::playback::PlaybackError;
use crate::session::SessionError;
use crate::store::StoreError;
use crate::voices::VoiceError;

pub mod document;
pub mod playback;
pub mod voices;

pub const ERROR_UNSUPPORTED_FORMAT: &str = "UNSUPPORTED_FORMAT";
pub const ERROR_CORRUPT_DOCUMENT: &str = "CORRUPT_DOCUMENT";
pub const ERROR_NO_DOCUMENT: &str = "NO_DOCUMENT";
pub const ERROR_EMPTY_TEXT: &str = "EMPTY_TEXT";
pub const ERROR_NO_VOICES: &str = "NO_VOICES";
pub const ERROR_DOCUMENT_NOT_READY: &str = "DOCUMENT_NOT_READY";
pub const ERROR_ENGINE_FAILED: &str = "ENGINE_FAILED";
pub const ERROR_IO: &str = "IO_ERROR";

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct CommandError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl CommandError {
    pub fn new(code: &str, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details,
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(details) = &self.details {
            write!(f, " ({details})")?;
        }
        Ok(())
    }
}

impl From<SessionError> for CommandError {
    fn from(value: SessionError) -> Self {
        match value {
            SessionError::Ingest(IngestError::UnsupportedFormat(ext)) => CommandError::new(
                ERROR_UNSUPPORTED_FORMAT,
                format!("'{ext}' is not a supported format, choose a .txt or .pdf file"),
                None,
            ),
            SessionError::Ingest(IngestError::CorruptDocument(message)) => CommandError::new(
                ERROR_CORRUPT_DOCUMENT,
                "the document could not be read",
                Some(message),
            ),
            SessionError::Ingest(IngestError::Extraction(err)) => {
                CommandError::new(ERROR_IO, "page extraction failed", Some(err.to_string()))
            }
            SessionError::Store(StoreError::NoDocumentLoaded) => {
                CommandError::new(ERROR_NO_DOCUMENT, "no document loaded yet", None)
            }
            SessionError::Playback(PlaybackError::EmptyText) => {
                CommandError::new(ERROR_EMPTY_TEXT, "no readable text on this page", None)
            }
            SessionError::Playback(PlaybackError::Engine(err)) => CommandError::new(
                ERROR_ENGINE_FAILED,
                "speech engine failed",
                Some(err.to_string()),
            ),
            SessionError::Voice(VoiceError::NoVoicesAvailable) => CommandError::new(
                ERROR_NO_VOICES,
                "no synthesis voices are available yet",
                None,
            ),
            SessionError::DocumentNotReady => CommandError::new(
                ERROR_DOCUMENT_NOT_READY,
                "a document is still loading, try again shortly",
                None,
            ),
        }
    }
}

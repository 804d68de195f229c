use std::{fs, path::Path};

use log::info;
use serde::Serialize;

use crate::segment;
use crate::session::ReaderSession;

use super::{CommandError, ERROR_IO};

#[derive(Debug, Serialize)]
pub struct OpenResponse {
    pub title: String,
    pub pages: usize,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PageView {
    pub moved: bool,
    pub page: usize,
    pub pages: usize,
}

/// Reads the file and loads it into the session. The filename is the
/// declared format; the session decides whether it is supported.
pub fn open_document(session: &ReaderSession, path: &Path) -> Result<OpenResponse, CommandError> {
    let bytes = fs::read(path).map_err(|err| {
        CommandError::new(
            ERROR_IO,
            format!("failed to read {}", path.display()),
            Some(err.to_string()),
        )
    })?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            CommandError::new(ERROR_IO, format!("{} is not a file", path.display()), None)
        })?;

    info!("opening {} ({} bytes)", path.display(), bytes.len());
    let summary = session.load(&bytes, &filename)?;
    Ok(OpenResponse {
        title: summary.title,
        pages: summary.pages,
    })
}

pub fn next_page(session: &ReaderSession) -> Result<PageView, CommandError> {
    let moved = session.next()?;
    Ok(page_view(session, moved))
}

pub fn prev_page(session: &ReaderSession) -> Result<PageView, CommandError> {
    let moved = session.prev()?;
    Ok(page_view(session, moved))
}

/// Current page text formatted for display: paragraph blocks separated by
/// blank lines. Playback does not go through this path.
pub fn page_text(session: &ReaderSession) -> Result<String, CommandError> {
    let text = session.current_text()?;
    Ok(segment::paragraphs(&text).join("\n\n"))
}

fn page_view(session: &ReaderSession, moved: bool) -> PageView {
    let (page, pages) = session.position().unwrap_or((0, 0));
    PageView { moved, page, pages }
}

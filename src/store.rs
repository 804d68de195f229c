use log::info;
use thiserror::Error;

use crate::document::Document;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("no document loaded")]
    NoDocumentLoaded,
}

/// The loaded document plus the current page pointer. The pointer is
/// 1-based and stays within `[1, page_count]` while a document is present.
pub struct PageStore {
    document: Option<Document>,
    current_page: usize,
}

impl PageStore {
    pub fn new() -> Self {
        Self {
            document: None,
            current_page: 1,
        }
    }

    /// Installs a new document and resets the pointer to page 1. The old
    /// document is discarded in full.
    pub fn load(&mut self, document: Document) {
        info!(
            "loaded '{}' ({} pages)",
            document.title(),
            document.page_count()
        );
        self.current_page = 1;
        self.document = Some(document);
    }

    /// Text of the current page.
    pub fn current_text(&self) -> Result<&str, StoreError> {
        let document = self.document.as_ref().ok_or(StoreError::NoDocumentLoaded)?;
        Ok(document.page(self.current_page).unwrap_or(""))
    }

    /// Advances one page. Returns `false` (without moving) at the last page.
    pub fn next(&mut self) -> Result<bool, StoreError> {
        let document = self.document.as_ref().ok_or(StoreError::NoDocumentLoaded)?;
        if self.current_page < document.page_count() {
            self.current_page += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Goes back one page. Returns `false` (without moving) at page 1.
    pub fn prev(&mut self) -> Result<bool, StoreError> {
        self.document.as_ref().ok_or(StoreError::NoDocumentLoaded)?;
        if self.current_page > 1 {
            self.current_page -= 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// `(current page, page count)` for the page indicator, when a document
    /// is loaded.
    pub fn position(&self) -> Option<(usize, usize)> {
        self.document
            .as_ref()
            .map(|document| (self.current_page, document.page_count()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentIngestor;
    use crate::extract::{ExtractError, ExtractedPages, PageExtractor};

    struct PagesExtractor(Vec<Vec<String>>);
    struct Pages(Vec<Vec<String>>);

    impl PageExtractor for PagesExtractor {
        fn open(&self, _bytes: &[u8]) -> Result<Box<dyn ExtractedPages>, ExtractError> {
            Ok(Box::new(Pages(self.0.clone())))
        }
    }

    impl ExtractedPages for Pages {
        fn page_count(&self) -> usize {
            self.0.len()
        }

        fn fragments(&self, page: usize) -> Result<Vec<String>, ExtractError> {
            self.0
                .get(page - 1)
                .cloned()
                .ok_or(ExtractError::PageOutOfRange(page))
        }
    }

    fn document(pages: &[&str]) -> Document {
        let extractor = PagesExtractor(
            pages
                .iter()
                .map(|text| vec![text.to_string()])
                .collect(),
        );
        DocumentIngestor::new(Box::new(extractor))
            .ingest(b"%PDF-", "sample.pdf")
            .unwrap()
    }

    #[test]
    fn fails_before_any_load() {
        let mut store = PageStore::new();
        assert_eq!(store.current_text(), Err(StoreError::NoDocumentLoaded));
        assert_eq!(store.next(), Err(StoreError::NoDocumentLoaded));
        assert_eq!(store.prev(), Err(StoreError::NoDocumentLoaded));
        assert_eq!(store.position(), None);
    }

    #[test]
    fn walking_forward_visits_every_page() {
        let pages = ["one", "two", "three", "four"];
        let mut store = PageStore::new();
        store.load(document(&pages));
        for (index, expected) in pages.iter().enumerate() {
            assert_eq!(store.current_text().unwrap(), *expected);
            if index + 1 < pages.len() {
                assert!(store.next().unwrap());
            }
        }
    }

    #[test]
    fn navigation_stops_at_bounds() {
        let mut store = PageStore::new();
        store.load(document(&["a", "b"]));
        assert!(!store.prev().unwrap());
        assert_eq!(store.position(), Some((1, 2)));
        assert!(store.next().unwrap());
        assert!(!store.next().unwrap());
        assert_eq!(store.position(), Some((2, 2)));
        assert_eq!(store.current_text().unwrap(), "b");
    }

    #[test]
    fn reload_resets_pointer() {
        let mut store = PageStore::new();
        store.load(document(&["a", "b", "c"]));
        store.next().unwrap();
        store.next().unwrap();
        store.load(document(&["x", "y"]));
        assert_eq!(store.position(), Some((1, 2)));
        assert_eq!(store.current_text().unwrap(), "x");
    }
}

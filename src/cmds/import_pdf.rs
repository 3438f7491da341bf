use std::path::{Path, PathBuf};

use log::{debug, info};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to open PDF {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },
    #[error("failed to extract text from page {page}: {source}")]
    Page {
        page: u32,
        #[source]
        source: lopdf::Error,
    },
}

/// A document whose pages can be read as plain text, in order.
pub trait TextDocument {
    fn page_count(&self) -> usize;
    fn page_text(&self, index: usize) -> Result<String, ExtractError>;
}

pub struct PdfDocument {
    inner: lopdf::Document,
    pages: Vec<u32>,
}

impl PdfDocument {
    pub fn open(path: &Path) -> Result<Self, ExtractError> {
        let inner = lopdf::Document::load(path).map_err(|source| ExtractError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        // get_pages is keyed by page number, so this is document order.
        let pages = inner.get_pages().into_keys().collect();
        Ok(Self { inner, pages })
    }
}

impl TextDocument for PdfDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> Result<String, ExtractError> {
        let page = self.pages[index];
        let mut text = self
            .inner
            .extract_text(&[page])
            .map_err(|source| ExtractError::Page { page, source })?;
        // lopdf closes every text object with a newline; the last one only
        // terminates the page.
        if text.ends_with('\n') {
            text.pop();
        }
        Ok(text)
    }
}

/// Joins the text of every page with no separator.
pub fn concat_pages(document: &dyn TextDocument) -> Result<String, ExtractError> {
    let mut text = String::new();
    for index in 0..document.page_count() {
        let page = document.page_text(index)?;
        debug!("Page {} yielded {} characters", index + 1, page.chars().count());
        text.push_str(&page);
    }
    Ok(text)
}

pub fn extract_text(path: &Path) -> Result<String, ExtractError> {
    let document = PdfDocument::open(path)?;
    info!(
        "Extracting text from {} ({} pages)",
        path.display(),
        document.page_count()
    );
    concat_pages(&document)
}

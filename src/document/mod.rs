// PDF loading
// Turns an uploaded PDF byte stream into ordered page text, parsed in memory

#[cfg(test)]
pub(crate) mod test_pdf;

use fancy_regex::Regex;
use lopdf::Document as PdfDocument;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, info, warn};

static TRAILING_SPACE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+(?=\n)").expect("valid regex"));

static EXCESS_NEWLINES_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("Unreadable document '{source_name}': {reason}")]
    UnreadableDocument { source_name: String, reason: String },
}

impl LoaderError {
    fn unreadable(source_name: &str, reason: impl Into<String>) -> Self {
        Self::UnreadableDocument {
            source_name: source_name.to_string(),
            reason: reason.into(),
        }
    }
}

/// A single page of extracted text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number within the document
    pub number: u32,
    pub text: String,
}

impl Page {
    #[inline]
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }

    #[inline]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// An uploaded document, alive only until it has been chunked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub source: String,
    pub pages: Vec<Page>,
}

impl Document {
    #[inline]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Parse a PDF from memory and extract the text of every page in order.
///
/// Pages whose text cannot be extracted come back as empty strings. The load
/// fails when the bytes are not a PDF, when the document has no pages, or when
/// not a single page carries any text.
#[inline]
pub fn load_pdf(bytes: &[u8], source: &str) -> Result<Document, LoaderError> {
    debug!("Loading PDF '{}' ({} bytes)", source, bytes.len());

    let pdf = PdfDocument::load_mem(bytes)
        .map_err(|err| LoaderError::unreadable(source, format!("not a valid PDF: {err}")))?;

    let page_numbers: Vec<u32> = pdf.get_pages().keys().copied().collect();
    if page_numbers.is_empty() {
        return Err(LoaderError::unreadable(source, "document has no pages"));
    }

    let pages: Vec<Page> = page_numbers
        .into_iter()
        .map(|number| {
            let text = match pdf.extract_text(&[number]) {
                Ok(raw) => normalize_page_text(&raw),
                Err(err) => {
                    warn!("No text extracted from page {} of '{}': {}", number, source, err);
                    String::new()
                }
            };
            Page::new(number, text)
        })
        .collect();

    if pages.iter().all(Page::is_blank) {
        return Err(LoaderError::unreadable(
            source,
            format!("none of the {} pages contain extractable text", pages.len()),
        ));
    }

    info!(
        "Loaded '{}': {} pages, {} blank",
        source,
        pages.len(),
        pages.iter().filter(|page| page.is_blank()).count()
    );

    Ok(Document {
        source: source.to_string(),
        pages,
    })
}

/// Read a PDF from disk and load it. The source name is the file name.
#[inline]
pub fn load_pdf_file(path: &Path) -> Result<Document, LoaderError> {
    let source = source_name(path);
    let bytes = read_pdf_bytes(path, &source)?;
    load_pdf(&bytes, &source)
}

/// Name an upload after its file name, falling back to the full path
#[inline]
pub fn source_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}

#[inline]
pub fn read_pdf_bytes(path: &Path, source: &str) -> Result<Vec<u8>, LoaderError> {
    std::fs::read(path)
        .map_err(|err| LoaderError::unreadable(source, format!("could not read file: {err}")))
}

/// Clean up extractor output: unify line endings, drop trailing spaces and
/// collapse runs of blank lines into a single paragraph break.
#[inline]
pub fn normalize_page_text(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");
    let stripped = TRAILING_SPACE_REGEX.replace_all(&unified, "");
    let collapsed = EXCESS_NEWLINES_REGEX.replace_all(&stripped, "\n\n");
    collapsed.trim().to_string()
}

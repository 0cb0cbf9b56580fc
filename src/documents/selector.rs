// src/documents/selector.rs
use std::fs;
use std::path::{Path, PathBuf};

use lopdf::Document;

use crate::documents::filter::{filter_document, FilteredDocument};

/// Source of per-page text for a PDF file.
pub trait PageSource {
    /// Text of each page in page order. Unreadable files and pages
    /// contribute nothing; this never fails.
    fn page_texts(&self, path: &Path) -> Vec<String>;
}

/// Extracts page text with `lopdf`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfPageSource;

impl PageSource for LopdfPageSource {
    fn page_texts(&self, path: &Path) -> Vec<String> {
        let doc = match Document::load(path) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!("Could not open PDF {}: {}", path.display(), e);
                return Vec::new();
            }
        };

        let mut pages = Vec::new();
        for page_number in doc.get_pages().keys() {
            match doc.extract_text(&[*page_number]) {
                Ok(text) if !text.is_empty() => pages.push(text),
                Ok(_) => {
                    tracing::debug!("Page {} of {} has no text", page_number, path.display());
                }
                Err(e) => {
                    tracing::warn!(
                        "Could not extract text from page {} of {}: {}",
                        page_number,
                        path.display(),
                        e
                    );
                }
            }
        }
        pages
    }
}

/// Lists the `.pdf` files directly inside `dir`, sorted by file name.
///
/// A missing or unreadable directory yields an empty list.
pub fn list_pdf_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Cannot read input directory {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map_or(false, |name| name.ends_with(".pdf"))
        })
        .collect();

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    files
}

pub fn count_pdf_files(dir: &Path) -> usize {
    list_pdf_files(dir).len()
}

/// Turns a directory of term sheets into filtered texts ready for extraction.
pub struct DocumentSelector<P: PageSource> {
    page_source: P,
}

impl DocumentSelector<LopdfPageSource> {
    pub fn new() -> Self {
        Self::with_page_source(LopdfPageSource)
    }
}

impl<P: PageSource> DocumentSelector<P> {
    pub fn with_page_source(page_source: P) -> Self {
        Self { page_source }
    }

    /// One [`FilteredDocument`] per PDF with at least one qualifying
    /// paragraph, in file name order.
    pub fn process_directory(&self, dir: &Path) -> Vec<FilteredDocument> {
        let files = list_pdf_files(dir);
        tracing::info!("Found {} PDF files in {}", files.len(), dir.display());

        let mut documents = Vec::with_capacity(files.len());
        for path in files {
            let file_name = match path.file_name().and_then(|name| name.to_str()) {
                Some(name) => name.to_string(),
                None => continue,
            };

            let pages = self.page_source.page_texts(&path);
            match filter_document(&file_name, &pages) {
                Some(doc) => documents.push(doc),
                None => tracing::debug!("Dropping {}: no qualifying paragraphs", file_name),
            }
        }

        documents
    }
}

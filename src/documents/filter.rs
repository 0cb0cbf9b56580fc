// src/documents/filter.rs

use once_cell::sync::Lazy;
use regex::Regex;

// --- Qualification Rules ---
// Matched as plain substrings, so "Final" also hits "Finally" and "FinalReport".
pub const KEYWORDS: &[&str] = &[
    "ISIN",
    "Issuer",
    "Currency",
    "Underlying",
    "Strike",
    "Launch Date",
    "Final Valuation",
    "Maturity",
    "Cap",
    "Barrier",
    "Final Redemption",
    "Initial",
    "Final",
];

static DIGIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d").expect("Failed to compile DIGIT_RE"));

// --- Data Structures ---
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredDocument {
    pub file_name: String, // e.g., "XS2021832634.pdf"
    pub text: String,      // "Filename: <name>\n" followed by the kept paragraphs
}

/// True when a paragraph is likely to carry term sheet data: it has a digit
/// or contains one of the [`KEYWORDS`].
pub fn qualifies(paragraph: &str) -> bool {
    DIGIT_RE.is_match(paragraph) || KEYWORDS.iter().any(|keyword| paragraph.contains(keyword))
}

/// Keeps the qualifying paragraphs of every page, in order.
///
/// Paragraphs are the `\n`-separated segments of a page's text. Each kept
/// paragraph is followed by a single space. Returns `None` when nothing in
/// the document qualified.
pub fn filter_document<S: AsRef<str>>(file_name: &str, pages: &[S]) -> Option<FilteredDocument> {
    let mut text = format!("Filename: {}\n", file_name);
    let mut kept = 0usize;

    for page in pages {
        for paragraph in page.as_ref().split('\n') {
            if qualifies(paragraph) {
                text.push_str(paragraph);
                text.push(' ');
                kept += 1;
            }
        }
    }

    tracing::debug!("{}: kept {} paragraphs across {} pages", file_name, kept, pages.len());

    if kept == 0 {
        return None;
    }

    Some(FilteredDocument {
        file_name: file_name.to_string(),
        text,
    })
}

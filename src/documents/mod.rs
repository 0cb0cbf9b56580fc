// src/documents/mod.rs
pub mod filter;
pub mod selector;

// Re-export key selection types for convenience
pub use filter::FilteredDocument;
pub use selector::{count_pdf_files, DocumentSelector};

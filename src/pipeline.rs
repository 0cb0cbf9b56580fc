// src/pipeline.rs
use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt};

use crate::documents::selector::PageSource;
use crate::documents::{count_pdf_files, DocumentSelector, FilteredDocument};
use crate::llm::{CompletionService, ExtractionResult};
use crate::storage::{OutputTable, StorageManager};
use crate::utils::AppError;

/// How a batch is run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Completion requests in flight at once (at least 1).
    pub concurrency: usize,
    /// Abort the batch on the first failed document instead of skipping it.
    pub fail_fast: bool,
    /// Append a timestamp to the output file name.
    pub timestamped: bool,
    /// Save filtered texts and raw responses under `debug/`.
    pub debug: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            fail_fast: false,
            timestamped: false,
            debug: false,
        }
    }
}

/// Sends every document to the completion service and returns one result
/// per document, in the order of `documents`.
///
/// Up to `options.concurrency` requests run at once; results are still
/// yielded in input order. A failed document becomes
/// [`ExtractionResult::Failed`] unless `fail_fast` is set.
pub async fn extract_all<S>(
    service: &S,
    documents: &[FilteredDocument],
    total_pdf_count: usize,
    options: &BatchOptions,
    storage: &StorageManager,
) -> Result<Vec<ExtractionResult>, AppError>
where
    S: CompletionService + ?Sized,
{
    let mut responses = stream::iter(documents.iter().map(|doc| async move {
        let response = service.complete(&doc.text).await;
        (doc, response)
    }))
    .buffered(options.concurrency.max(1));

    let mut results = Vec::with_capacity(documents.len());
    let mut count = 0usize;

    while let Some((doc, response)) = responses.next().await {
        count += 1;

        if options.debug {
            save_debug(storage, doc, response.as_ref().ok().and_then(|r| r.as_deref()));
        }

        let result = match response {
            Ok(content) => ExtractionResult::from_response(content),
            Err(e) if options.fail_fast => {
                tracing::error!("Extraction failed for {}, aborting batch: {}", doc.file_name, e);
                return Err(AppError::Extraction(e));
            }
            Err(e) => {
                tracing::error!("Extraction failed for {}: {}", doc.file_name, e);
                ExtractionResult::Failed(format!("{}: {}", doc.file_name, e))
            }
        };

        results.push(result);
        println!("Analyzed text: {}/{}", count, total_pdf_count);
    }

    Ok(results)
}

fn save_debug(storage: &StorageManager, doc: &FilteredDocument, raw_response: Option<&str>) {
    if let Err(e) = storage.save_debug_artifact(&doc.file_name, "filtered.txt", &doc.text) {
        tracing::warn!("Failed to save filtered text for {}: {}", doc.file_name, e);
    }
    if let Some(raw) = raw_response {
        if let Err(e) = storage.save_debug_artifact(&doc.file_name, "response.json", raw) {
            tracing::warn!("Failed to save raw response for {}: {}", doc.file_name, e);
        }
    }
}

/// Runs the whole batch: select and filter the PDFs in `input_dir`, extract
/// each one, write the table. Returns the path of the written table.
///
/// `connect` builds the completion service and is only called when at least
/// one document has text to extract, so an empty batch needs no credentials.
pub async fn run<P, S, F>(
    input_dir: &Path,
    selector: DocumentSelector<P>,
    connect: F,
    storage: &StorageManager,
    options: &BatchOptions,
) -> Result<PathBuf, AppError>
where
    P: PageSource + Send + 'static,
    S: CompletionService,
    F: FnOnce() -> Result<S, AppError>,
{
    let dir = input_dir.to_path_buf();
    let (documents, total_pdf_count) = tokio::task::spawn_blocking(move || {
        let documents = selector.process_directory(&dir);
        (documents, count_pdf_files(&dir))
    })
    .await
    .map_err(|e| AppError::Processing(format!("Document selection task failed: {}", e)))?;

    println!("Extracted text\n");
    tracing::info!(
        "{} of {} PDF files have text to extract",
        documents.len(),
        total_pdf_count
    );

    let results = if documents.is_empty() {
        Vec::new()
    } else {
        let service = connect()?;
        extract_all(&service, &documents, total_pdf_count, options, storage).await?
    };

    let parsed = results.iter().filter(|result| result.is_parsed()).count();
    tracing::info!("{} of {} responses parsed", parsed, results.len());

    let table = OutputTable::from_results(&results);
    if table.is_empty() {
        tracing::warn!("No term sheet data was extracted; writing a header-only table");
    }
    let path = storage.save_table(&table, options.timestamped)?;
    println!("CSV file '{}' created successfully", path.display());

    Ok(path)
}

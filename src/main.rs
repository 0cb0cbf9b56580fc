// src/main.rs
mod documents;
mod llm;
mod pipeline;
mod storage;
mod utils;

use std::ffi::OsString;
use std::path::PathBuf;

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{CommandFactory, Parser};
use documents::DocumentSelector;
use llm::OpenAiClient;
use pipeline::BatchOptions;
use storage::StorageManager;
use utils::config::ExtractorConfig;
use utils::AppError;

/// Extracts key terms from PDF term sheets into a CSV table
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory containing the term sheet PDFs
    input_dir: PathBuf,

    /// Directory for the output table (created if missing)
    output_dir: PathBuf,

    /// Completion model (overrides OPENAI_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Number of completion requests in flight at once
    #[arg(long, default_value_t = 1)]
    concurrency: usize,

    /// Retries per document for transient service errors
    #[arg(long, default_value_t = 3)]
    max_retries: u32,

    /// Abort the whole batch on the first failed document
    #[arg(long)]
    fail_fast: bool,

    /// Append a timestamp to the output file name instead of overwriting
    #[arg(long)]
    timestamp: bool,

    /// Debug mode - save filtered texts and raw responses under <output_dir>/debug
    #[arg(short, long)]
    debug: bool,
}

/// Parses `argv`. Returns `Ok(None)` when the directory positionals are
/// missing or there are too many of them; other parse errors (unknown
/// flags, bad values, `--help`) are returned as is.
fn parse_args<I, T>(argv: I) -> Result<Option<Args>, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Args::try_parse_from(argv) {
        Ok(args) => Ok(Some(args)),
        Err(e) if e.kind() == ErrorKind::MissingRequiredArgument => Ok(None),
        Err(e) if e.kind() == ErrorKind::UnknownArgument => match e.get(ContextKind::InvalidArg) {
            // An extra positional, not a flag
            Some(ContextValue::String(arg)) if !arg.starts_with('-') => Ok(None),
            _ => Err(e),
        },
        Err(e) => Err(e),
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let args = match parse_args(std::env::args_os()) {
        Ok(Some(args)) => args,
        Ok(None) => {
            println!("Please provide both the input and output directory paths as arguments.");
            println!("{}", Args::command().render_usage());
            return Ok(());
        }
        Err(e) => e.exit(),
    };
    tracing::debug!("Starting processing for args: {:?}", args);

    // 3. Initialize storage (creates the output directory)
    let storage = StorageManager::new(&args.output_dir)?;

    // 4. Load settings (.env first, then the process environment)
    match dotenv::dotenv() {
        Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
        Err(e) => tracing::debug!("No .env file loaded: {}", e),
    }
    let mut config = ExtractorConfig::from_env()?;
    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    config.max_retries = args.max_retries;
    tracing::info!("Using model {} at {}", config.model, config.base_url);

    let options = BatchOptions {
        concurrency: args.concurrency.max(1),
        fail_fast: args.fail_fast,
        timestamped: args.timestamp,
        debug: args.debug,
    };

    println!("Analyzing files in {}", args.input_dir.display());

    // 5. Select, extract, aggregate. The client (and the API key check) is
    // only built once there is something to extract.
    let path = pipeline::run(
        &args.input_dir,
        DocumentSelector::new(),
        move || Ok(OpenAiClient::new(config)?),
        &storage,
        &options,
    )
    .await?;

    tracing::info!("Processing finished. Output: {}", path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_directories_parse() {
        let args = parse_args(["termsheet_extractor", "in", "out", "--concurrency", "4"])
            .unwrap()
            .expect("both directories given");

        assert_eq!(args.input_dir, PathBuf::from("in"));
        assert_eq!(args.output_dir, PathBuf::from("out"));
        assert_eq!(args.concurrency, 4);
        assert_eq!(args.max_retries, 3);
        assert!(!args.fail_fast);
    }

    #[test]
    fn test_wrong_positional_count_gives_usage() {
        assert!(parse_args(["termsheet_extractor"]).unwrap().is_none());
        assert!(parse_args(["termsheet_extractor", "in"]).unwrap().is_none());
        assert!(parse_args(["termsheet_extractor", "in", "out", "extra"]).unwrap().is_none());
    }

    #[test]
    fn test_unknown_flag_is_a_parse_error() {
        let err = parse_args(["termsheet_extractor", "in", "out", "--bogus"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_bad_option_value_is_a_parse_error() {
        let err = parse_args(["termsheet_extractor", "in", "out", "--concurrency", "many"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }
}

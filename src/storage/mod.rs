// src/storage/mod.rs
pub mod table;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::utils::error::StorageError;

pub use table::OutputTable;

const OUTPUT_BASE_NAME: &str = "term_sheets";
const DEBUG_DIR: &str = "debug";

/// Name of the output table, with a local timestamp when one is given.
pub fn output_file_name(timestamp: Option<DateTime<Local>>) -> String {
    match timestamp {
        Some(ts) => format!("{}_{}.csv", OUTPUT_BASE_NAME, ts.format("%Y%m%d_%H%M%S")),
        None => format!("{}.csv", OUTPUT_BASE_NAME),
    }
}

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
            tracing::info!("Created output directory {}", base_path.display());
        }

        Ok(Self { base_dir: base_path })
    }

    /// Writes the table as CSV into the base directory and returns its path.
    pub fn save_table(&self, table: &OutputTable, timestamped: bool) -> Result<PathBuf, StorageError> {
        let timestamp = timestamped.then(Local::now);
        let file_path = self.base_dir.join(output_file_name(timestamp));

        let file = fs::File::create(&file_path).map_err(StorageError::IoError)?;
        table.write_csv(file)?;

        tracing::info!(
            "Saved {} rows and {} columns to {}",
            table.len(),
            table.columns().len(),
            file_path.display()
        );

        Ok(file_path)
    }

    /// Saves a per-document artifact (filtered text, raw response) under
    /// `debug/`, named `<file_name>.<suffix>`.
    pub fn save_debug_artifact(
        &self,
        file_name: &str,
        suffix: &str,
        contents: &str,
    ) -> Result<PathBuf, StorageError> {
        let target_dir = self.base_dir.join(DEBUG_DIR);

        if !target_dir.exists() {
            fs::create_dir_all(&target_dir).map_err(StorageError::IoError)?;
        }

        let file_path = target_dir.join(format!("{}.{}", file_name, suffix));
        fs::write(&file_path, contents).map_err(StorageError::IoError)?;

        tracing::debug!("Saved debug artifact to {}", file_path.display());

        Ok(file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_output_file_names() {
        assert_eq!(output_file_name(None), "term_sheets.csv");

        let ts = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(output_file_name(Some(ts)), "term_sheets_20240309_140507.csv");
    }

    #[test]
    fn test_creates_missing_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("out").join("run");

        StorageManager::new(&nested).unwrap();

        assert!(nested.is_dir());
    }

    #[test]
    fn test_save_table_uses_fixed_name_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path()).unwrap();

        let first = storage.save_table(&OutputTable::default(), false).unwrap();
        let second = storage.save_table(&OutputTable::default(), false).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, dir.path().join("term_sheets.csv"));
        let contents = fs::read_to_string(&first).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }

    #[test]
    fn test_timestamped_table_name() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path()).unwrap();

        let path = storage.save_table(&OutputTable::default(), true).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();

        assert!(name.starts_with("term_sheets_"));
        assert!(name.ends_with(".csv"));
        assert_ne!(name, "term_sheets.csv");
    }

    #[test]
    fn test_debug_artifacts_land_in_debug_dir() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path()).unwrap();

        let path = storage
            .save_debug_artifact("x.pdf", "filtered.txt", "Filename: x.pdf\n")
            .unwrap();

        assert_eq!(path, dir.path().join("debug").join("x.pdf.filtered.txt"));
        assert_eq!(fs::read_to_string(path).unwrap(), "Filename: x.pdf\n");
    }
}

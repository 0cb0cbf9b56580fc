// src/storage/table.rs
use std::collections::HashMap;
use std::io;

use serde_json::{Map, Value};

use crate::llm::models::{ExtractionResult, SCHEMA_FIELDS};
use crate::utils::error::StorageError;

/// Flattens one extracted record into `(column, cell)` pairs.
///
/// Nested objects become dotted column names (`Terms.Cap`). Arrays are kept
/// in one cell as compact JSON, `null` becomes an empty cell.
pub fn flatten_record(record: &Map<String, Value>) -> Vec<(String, String)> {
    let mut cells = Vec::with_capacity(record.len());
    flatten_into("", record, &mut cells);
    cells
}

fn flatten_into(prefix: &str, record: &Map<String, Value>, cells: &mut Vec<(String, String)>) {
    for (key, value) in record {
        let column = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match value {
            Value::Object(inner) if !inner.is_empty() => flatten_into(&column, inner, cells),
            other => cells.push((column, cell_text(other))),
        }
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Rows of flattened records under a shared column set.
///
/// Columns start with the schema fields in schema order; any other column
/// is appended the first time a record carries it.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Default for OutputTable {
    fn default() -> Self {
        Self {
            columns: SCHEMA_FIELDS.iter().map(|field| field.to_string()).collect(),
            rows: Vec::new(),
        }
    }
}

impl OutputTable {
    /// Builds the table from a whole batch, one row per parsed result, in
    /// the order given. Other results are reported and skipped.
    pub fn from_results(results: &[ExtractionResult]) -> Self {
        let mut table = Self::default();
        let mut index: HashMap<String, usize> = table
            .columns
            .iter()
            .enumerate()
            .map(|(i, column)| (column.clone(), i))
            .collect();

        for result in results {
            match result {
                ExtractionResult::Parsed(record) => {
                    let mut row = vec![String::new(); table.columns.len()];
                    for (column, cell) in flatten_record(record) {
                        let position = match index.get(&column) {
                            Some(&position) => position,
                            None => {
                                table.columns.push(column.clone());
                                index.insert(column, table.columns.len() - 1);
                                row.push(String::new());
                                table.columns.len() - 1
                            }
                        };
                        row[position] = cell;
                    }
                    table.rows.push(row);
                }
                ExtractionResult::Malformed(raw) => {
                    println!("Skipping invalid JSON string in results: {}", raw);
                }
                ExtractionResult::Absent => {
                    println!("Skipping empty completion: the service returned no content");
                }
                ExtractionResult::Failed(reason) => {
                    println!("Skipping document whose extraction failed: {}", reason);
                }
            }
        }

        // Earlier rows are shorter when later records introduced new columns.
        let width = table.columns.len();
        for row in &mut table.rows {
            row.resize(width, String::new());
        }

        tracing::debug!(
            "Built table with {} rows and {} columns from {} results",
            table.rows.len(),
            width,
            results.len()
        );
        table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[cfg(test)]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Writes a header row followed by every row, comma-delimited.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), StorageError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.columns)?;
        for row in &self.rows {
            csv_writer.write_record(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

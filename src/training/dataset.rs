//! Labeled and unlabeled record datasets in CSV form

use crate::error::TrainingError;
use crate::types::record::{FieldValue, Record};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, info};

/// Records paired with binary fraud labels
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledDataset {
    pub records: Vec<Record>,
    pub labels: Vec<u8>,
}

fn parse_label(cell: &str) -> Option<u8> {
    match cell.trim().to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" => Some(1),
        "0" | "0.0" | "false" => Some(0),
        _ => None,
    }
}

impl LabeledDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: Record, label: u8) {
        self.records.push(record);
        self.labels.push(label);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of rows labeled fraudulent
    pub fn positives(&self) -> usize {
        self.labels.iter().filter(|&&label| label == 1).count()
    }

    pub fn from_csv_path<P: AsRef<Path>>(path: P, label_column: &str) -> Result<Self, TrainingError> {
        let path = path.as_ref();
        info!(path = %path.display(), "Reading labeled dataset");
        let dataset = Self::from_reader(File::open(path)?, label_column)?;
        info!(
            rows = dataset.len(),
            fraudulent = dataset.positives(),
            "Labeled dataset loaded"
        );
        Ok(dataset)
    }

    /// Parse CSV with a header row. Every column other than the label
    /// becomes a record field; empty cells are left absent.
    pub fn from_reader<R: Read>(reader: R, label_column: &str) -> Result<Self, TrainingError> {
        let mut csv = csv::Reader::from_reader(reader);
        let headers = csv.headers()?.clone();

        let label_index = headers
            .iter()
            .position(|h| h.trim() == label_column)
            .ok_or_else(|| TrainingError::MissingLabelColumn(label_column.to_string()))?;

        let mut dataset = Self::new();
        for (i, row) in csv.records().enumerate() {
            let row = row?;
            // header is line 1
            let line = i + 2;

            let cell = row.get(label_index).unwrap_or("");
            let label = parse_label(cell).ok_or_else(|| TrainingError::InvalidLabel {
                row: line,
                value: cell.to_string(),
            })?;

            let mut record = Record::new();
            for (j, (name, cell)) in headers.iter().zip(row.iter()).enumerate() {
                if j == label_index {
                    continue;
                }
                if let Some(value) = FieldValue::parse_cell(cell) {
                    record.insert(name.trim(), value);
                }
            }
            dataset.push(record, label);
        }

        if dataset.is_empty() {
            return Err(TrainingError::EmptyDataset);
        }

        Ok(dataset)
    }

    /// Write as CSV. Columns are the union of all field names in name order,
    /// followed by the label column.
    pub fn write_csv<W: Write>(&self, writer: W, label_column: &str) -> Result<(), TrainingError> {
        let columns: BTreeSet<&str> = self
            .records
            .iter()
            .flat_map(|record| record.iter().map(|(name, _)| name))
            .filter(|name| *name != label_column)
            .collect();

        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(columns.iter().copied().chain(std::iter::once(label_column)))?;

        for (record, label) in self.records.iter().zip(&self.labels) {
            let mut row: Vec<String> = columns
                .iter()
                .map(|name| record.get(name).map(FieldValue::to_cell).unwrap_or_default())
                .collect();
            row.push(label.to_string());
            csv.write_record(&row)?;
        }

        csv.flush()?;
        debug!(rows = self.len(), columns = columns.len() + 1, "Dataset written");
        Ok(())
    }

    pub fn write_csv_path<P: AsRef<Path>>(&self, path: P, label_column: &str) -> Result<(), TrainingError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        self.write_csv(File::create(path)?, label_column)?;
        info!(path = %path.display(), rows = self.len(), "Labeled dataset saved");
        Ok(())
    }
}

/// Read unlabeled records from CSV. A column named `ignore_column` (the
/// label column, when scoring a labeled file) is skipped.
pub fn read_records<R: Read>(reader: R, ignore_column: &str) -> Result<Vec<Record>, csv::Error> {
    let mut csv = csv::Reader::from_reader(reader);
    let headers = csv.headers()?.clone();

    let mut records = Vec::new();
    for row in csv.records() {
        let row = row?;
        let mut record = Record::new();
        for (name, cell) in headers.iter().zip(row.iter()) {
            let name = name.trim();
            if name == ignore_column {
                continue;
            }
            if let Some(value) = FieldValue::parse_cell(cell) {
                record.insert(name, value);
            }
        }
        records.push(record);
    }

    Ok(records)
}

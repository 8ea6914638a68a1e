//! Labeled headline CSV reader.
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use crate::classification::BiasLabel;

const HEADLINE_COLUMN: &str = "clean_headline";
const CATEGORY_COLUMN: &str = "category";

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("dataset {path} has no `{column}` column")]
    MissingColumn { path: PathBuf, column: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledHeadline {
    pub headline: String,
    pub label: BiasLabel,
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub samples: Vec<LabeledHeadline>,
    /// Rows with an empty headline or category.
    pub skipped_empty: usize,
    /// Rows whose category is outside the five-way source taxonomy.
    pub skipped_unknown: usize,
}

impl Dataset {
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Reads a CSV file with at least `clean_headline` and `category` columns.
///
/// # Errors
/// Returns [`DatasetError`] when the file cannot be read or a column is missing.
pub fn load_dataset(path: &Path) -> Result<Dataset, DatasetError> {
    let reader = csv::Reader::from_path(path).map_err(|source| DatasetError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    collect(reader, path)
}

/// Same as [`load_dataset`] over any reader; `origin` is only used in errors.
///
/// # Errors
/// Returns [`DatasetError`] on malformed CSV or a missing column.
pub fn read_dataset<R: Read>(input: R, origin: &Path) -> Result<Dataset, DatasetError> {
    collect(csv::Reader::from_reader(input), origin)
}

fn collect<R: Read>(mut reader: csv::Reader<R>, origin: &Path) -> Result<Dataset, DatasetError> {
    let csv_error = |source| DatasetError::Csv {
        path: origin.to_path_buf(),
        source,
    };
    let headers = reader.headers().map_err(csv_error)?.clone();
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|header| header.trim() == name)
            .ok_or_else(|| DatasetError::MissingColumn {
                path: origin.to_path_buf(),
                column: name,
            })
    };
    let headline_index = column(HEADLINE_COLUMN)?;
    let category_index = column(CATEGORY_COLUMN)?;

    let mut dataset = Dataset::default();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let headline = record.get(headline_index).unwrap_or_default().trim();
        let category = record.get(category_index).unwrap_or_default().trim();
        if headline.is_empty() || category.is_empty() {
            dataset.skipped_empty += 1;
            continue;
        }
        let Some(label) = BiasLabel::from_category(category) else {
            let line = record.position().map(csv::Position::line);
            warn!(category, ?line, "skipping unknown category");
            dataset.skipped_unknown += 1;
            continue;
        };
        dataset.samples.push(LabeledHeadline {
            headline: headline.to_string(),
            label,
        });
    }
    Ok(dataset)
}

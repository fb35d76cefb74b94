//! Read the CSV files that describe families, genome folders and patient information
//!
//! Every file starts with a header row. The header is consumed before data rows are read, and
//! for family manifests it also decides which column layout is in use.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Locate manifest files inside a genome folder
pub mod read;

/// Family manifests, one row per family member
pub mod family;

/// Folder manifests for batch genome upload
pub mod genomes;

/// Patient information key/value files
pub mod phi;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("No {name} file in folder {}", folder.display())]
    NotFound { name: String, folder: PathBuf },
    #[error("Can't read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("Invalid CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Expected at least {expected} data rows, found {found}")]
    MissingRows { expected: usize, found: usize },
    #[error("Line {line}: expected {expected} columns, found {found}")]
    Malformed { line: u64, expected: usize, found: usize },
    #[error("Missing required column {0:?} in header")]
    MissingColumn(&'static str),
    #[error("Line {line}: {message}")]
    InvalidValue { line: u64, message: String },
    #[error("Line {line}: a member can't have both a genome file and a genome id")]
    ConflictingGenome { line: u64 },
    #[error("Manifest has no proband")]
    MissingProband,
    #[error("Manifest has {0} probands, expected exactly one")]
    MultipleProbands(usize),
    #[error("Manifest has {0} relatives, at most 4 are supported")]
    TooManyRelatives(usize),
}

/// Line number of a record, counting the header as line 1
fn line_of(record: &csv::StringRecord, index: usize) -> u64 {
    record
        .position()
        .map(|p| p.line())
        .unwrap_or(index as u64 + 2)
}

/// Make sure a record has at least `expected` columns before indexing into it
fn require_columns(record: &csv::StringRecord, index: usize, expected: usize) -> Result<(), ManifestError> {
    if record.len() < expected {
        return Err(ManifestError::Malformed {
            line: line_of(record, index),
            expected,
            found: record.len(),
        });
    }
    Ok(())
}

fn csv_reader<R: io::Read>(reader: R) -> csv::Reader<R> {
    // row lengths are checked by hand to report which line is short
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("File I/O error for '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed table '{path}': {source}", path = path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Table '{path}' is missing required columns: {columns:?}", path = path.display())]
    MissingColumns { path: PathBuf, columns: Vec<String> },
}

impl TableError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        TableError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn csv(path: &Path, source: csv::Error) -> Self {
        TableError::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Creates the parent directory of `path` if it has one.
pub fn ensure_parent_dir(path: &Path) -> Result<(), TableError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| TableError::io(parent, e))?;
    }
    Ok(())
}

/// Reads a comma-separated table with a header row into typed rows.
pub fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, TableError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| TableError::csv(path, e))?;
    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| TableError::csv(path, e))
}

/// Writes typed rows as a comma-separated table, overwriting any existing file.
///
/// A header is written even when `rows` is empty.
pub fn write_table<T: Serialize>(path: &Path, rows: &[T], header: &[&str]) -> Result<(), TableError> {
    ensure_parent_dir(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| TableError::csv(path, e))?;
    writer
        .write_record(header)
        .map_err(|e| TableError::csv(path, e))?;
    for row in rows {
        writer.serialize(row).map_err(|e| TableError::csv(path, e))?;
    }
    writer.flush().map_err(|e| TableError::io(path, e))
}

/// Column names of the mapped cohort table.
pub const MAPPED_COHORT_HEADER: &[&str] = &[
    "Name",
    "GeneSymbol",
    "UniProtID",
    "Chromosome",
    "WildType",
    "ResidueIndex",
    "MutantAA",
    "Class",
    "ReviewStatus",
];

/// Column names of the filtered cohort table.
pub const FILTERED_COHORT_HEADER: &[&str] = &[
    "Name",
    "GeneSymbol",
    "UniProtID",
    "Chromosome",
    "WildType",
    "ResidueIndex",
    "MutantAA",
    "Class",
    "ReviewStatus",
    "StructureFile",
    "pLDDT",
];

/// Column names of the ddG results table.
pub const RESULTS_HEADER: &[&str] = &[
    "Name",
    "GeneSymbol",
    "UniProtID",
    "Chromosome",
    "WildType",
    "ResidueIndex",
    "MutantAA",
    "Class",
    "ReviewStatus",
    "StructureFile",
    "pLDDT",
    "ddG",
    "Status",
    "MutantStructureFile",
];

use super::cif::CifFile;
use super::pdb::PdbFile;
use super::traits::{StructureFile, to_structure};
use crate::core::models::structure::Structure;
use pdbtbx::{PDB, PDBError};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StructureError {
    #[error("Cannot open structure file '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot parse structure file '{path}': {details}", path = path.display())]
    Parse { path: PathBuf, details: String },
    #[error("Cannot write structure file '{path}': {details}", path = path.display())]
    Write { path: PathBuf, details: String },
    #[error("Unrecognized structure file format: {0}")]
    UnknownFormat(PathBuf),
}

impl StructureError {
    pub(crate) fn parse(path: &Path, errors: &[PDBError]) -> Self {
        StructureError::Parse {
            path: path.to_path_buf(),
            details: summarize(errors),
        }
    }

    pub(crate) fn write(path: &Path, errors: &[PDBError]) -> Self {
        StructureError::Write {
            path: path.to_path_buf(),
            details: summarize(errors),
        }
    }
}

fn summarize(errors: &[PDBError]) -> String {
    errors
        .iter()
        .map(|e| e.short_description().to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureFormat {
    Pdb,
    Cif,
}

impl StructureFormat {
    /// Infers the format from the file name, looking through a trailing `.gz`.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        let name = name.strip_suffix(".gz").unwrap_or(&name);
        if name.ends_with(".pdb") || name.ends_with(".ent") {
            Some(StructureFormat::Pdb)
        } else if name.ends_with(".cif") || name.ends_with(".mmcif") {
            Some(StructureFormat::Cif)
        } else {
            None
        }
    }
}

/// Parses the first model of a PDB or mmCIF file, compressed or not.
pub fn open_model(path: &Path) -> Result<PDB, StructureError> {
    match StructureFormat::from_path(path) {
        Some(StructureFormat::Pdb) => PdbFile::read_from_path(path),
        Some(StructureFormat::Cif) => CifFile::read_from_path(path),
        None => Err(StructureError::UnknownFormat(path.to_path_buf())),
    }
}

/// Reads the first model of a PDB or mmCIF file as flat atoms.
pub fn read_structure(path: &Path) -> Result<Structure, StructureError> {
    open_model(path).map(|pdb| to_structure(&pdb))
}

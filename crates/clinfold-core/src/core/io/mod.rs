//! Provides input/output functionality for the pipeline's tables and structures.
//!
//! Tabular inputs (ClinVar, UniProt) are tab-separated exports read by column
//! name; every table the pipeline emits is comma-separated with a header row.
//! Structure files are parsed by `pdbtbx` behind the [`traits::StructureFile`]
//! interface, with gzip decompression handled transparently.

pub mod cif;
pub mod clinvar;
pub mod format;
pub mod pdb;
pub mod tables;
pub mod traits;
pub mod uniprot;

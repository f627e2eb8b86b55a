//! # Core Models Module
//!
//! This module contains the data structures that flow between the pipeline stages,
//! from raw ClinVar variant records to the rows of the ddG results table.
//!
//! ## Overview
//!
//! Every stage consumes one table of these values and produces a new one; nothing
//! here is mutated in place once loaded. The models are designed to:
//!
//! - **Carry the dataset schema** - Serde renames fix the column names of every emitted table
//! - **Parse biological notation** - HGVS protein changes and three-letter residue codes
//! - **Identify work** - Stable mutation keys shared by the cohort and the results table
//!
//! ## Key Components
//!
//! - [`amino_acid`] - The twenty standard residues and their one/three-letter codes
//! - [`variant`] - ClinVar variant records, clinical classes, and protein-change parsing
//! - [`cohort`] - Mapped and filtered cohort rows, mutation keys, and ddG records
//! - [`structure`] - Atom records and per-residue confidence lookup

pub mod amino_acid;
pub mod cohort;
pub mod structure;
pub mod variant;

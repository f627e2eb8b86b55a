//! # Core Module
//!
//! This module provides the stateless foundation of the pipeline: the data models
//! that make up each stage's table and the readers and writers for every file
//! format the pipeline touches.
//!
//! ## Architecture
//!
//! - **Data Models** ([`models`]) - Variant records, cohort rows, mutation keys, ddG records, and atom sites
//! - **File I/O** ([`io`]) - ClinVar and UniProt exports, CSV tables, and PDB/mmCIF structures
//!
//! Nothing in this module holds state between calls or spawns processes; that is
//! the job of [`crate::engine`].

pub mod io;
pub mod models;

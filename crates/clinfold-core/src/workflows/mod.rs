//! # Workflows Module
//!
//! High-level entry points, one per pipeline stage, that tie the `core` and
//! `engine` layers together.
//!
//! ## Overview
//!
//! Each workflow reads the previous stage's table, applies its stage, writes a
//! new table, and returns a report of what it kept and why it dropped the rest.
//! Row-level exclusions are counted, never raised as errors.
//!
//! ## Architecture
//!
//! - **Integrity Check** ([`verify`]) - Pre-flight validation of the ground-truth table and a sample structure
//! - **Cohort Filter** ([`cohort`]) - ClinVar rows to labeled missense variants mapped to UniProt accessions
//! - **Structure Cross-Referencing** ([`structures`]) - Structure lookup and pLDDT confidence filtering
//! - **Workload Splitting** ([`split`]) - High-yield-first chunking for independent worker processes
//! - **Energy Computation** ([`energy`]) - Resumable, per-protein repair and per-mutation ddG evaluation

pub mod cohort;
pub mod energy;
pub mod split;
pub mod structures;
pub mod verify;

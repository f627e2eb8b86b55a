//! # Clinfold Core Library
//!
//! Builds a labeled dataset linking ClinVar missense variants to AlphaFold
//! structures and FoldX stability estimates (ddG).
//!
//! ## Architectural Philosophy
//!
//! The library keeps the same three-layer split throughout:
//!
//! - **[`core`]: The Foundation.** Stateless data models (variant records, cohort
//!   rows, atom sites) and file I/O for tab-separated exports, CSV tables, and
//!   PDB/mmCIF structures.
//!
//! - **[`engine`]: The Logic Core.** Stateful plumbing for the long-running energy
//!   stage: the external-tool boundary ([`engine::tool::StabilityTool`]), the
//!   per-accession repair cache, the append-only results ledger, workload
//!   scheduling, configuration, and progress reporting.
//!
//! - **[`workflows`]: The Public API.** One entry point per pipeline stage
//!   (cohort filtering, structure cross-referencing, energy computation) plus the
//!   integrity check and the workload splitter.
//!
//! Data flows strictly downstream: ground truth, mapped cohort, filtered cohort,
//! ddG results. Each stage reads the previous stage's table and writes a new one.

pub mod core;
pub mod engine;
pub mod workflows;

//! # Engine Module
//!
//! This module holds the stateful machinery behind the energy stage: everything
//! that touches the external stability tool, the workspace, or the durable
//! results table.
//!
//! ## Overview
//!
//! An energy run is long, interruptible, and expensive per protein. The engine
//! keeps it correct under restarts and parallel workers by making the results
//! table the single source of truth and by repairing each protein at most once.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Builders for every stage's parameters and the FoldX settings
//! - **Tool Boundary** ([`tool`]) - The [`tool::StabilityTool`] trait, point mutations, and tool errors
//! - **FoldX Driver** ([`foldx`]) - Subprocess invocation, energy parsing, and scratch-file cleanup
//! - **Repair Cache** ([`cache`]) - Compute-once repaired structures keyed by accession
//! - **Results Ledger** ([`ledger`]) - Append-and-flush results table with resume support
//! - **Scheduling** ([`schedule`]) - Per-protein grouping, yield ordering, and workload splitting
//! - **Progress Monitoring** ([`progress`]) - Progress events for front ends
//! - **Error Handling** ([`error`]) - Engine-level error type

pub mod cache;
pub mod config;
pub mod error;
pub mod foldx;
pub mod ledger;
pub mod progress;
pub mod schedule;
pub mod tool;

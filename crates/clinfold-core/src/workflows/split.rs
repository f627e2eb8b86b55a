use crate::core::io::tables::{FILTERED_COHORT_HEADER, read_table, write_table};
use crate::core::models::cohort::FilteredCohortRow;
use crate::engine::config::ConfigError;
use crate::engine::error::EngineError;
use crate::engine::schedule::{order_by_yield, split_into_chunks};
use std::path::PathBuf;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq)]
pub struct SplitConfig {
    pub cohort_path: PathBuf,
    pub output_dir: PathBuf,
    pub parts: usize,
    /// Chunk files are named `<file_stem>_<n>.csv`, numbered from 1.
    pub file_stem: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitReport {
    pub rows: usize,
    pub chunks: Vec<(PathBuf, usize)>,
}

/// Orders the cohort high-yield proteins first and writes it as `parts`
/// contiguous chunk files, one per independent worker.
#[instrument(skip_all, name = "split_workflow")]
pub fn run(config: &SplitConfig) -> Result<SplitReport, EngineError> {
    if config.parts == 0 {
        return Err(ConfigError::InvalidParameter {
            name: "parts",
            reason: "at least one chunk is required".to_string(),
        }
        .into());
    }
    let rows: Vec<FilteredCohortRow> = read_table(&config.cohort_path)?;
    let ordered = order_by_yield(&rows);
    info!("Sorted {} rows; high-yield proteins first.", ordered.len());

    let mut report = SplitReport {
        rows: ordered.len(),
        chunks: Vec::with_capacity(config.parts),
    };
    for (i, chunk) in split_into_chunks(&ordered, config.parts).iter().enumerate() {
        let path = config
            .output_dir
            .join(format!("{}_{}.csv", config.file_stem, i + 1));
        write_table(&path, chunk, FILTERED_COHORT_HEADER)?;
        info!("Created {:?} ({} rows) for worker {}", path, chunk.len(), i + 1);
        report.chunks.push((path, chunk.len()));
    }
    Ok(report)
}

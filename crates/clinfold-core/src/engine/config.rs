use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_ASSEMBLY: &str = "GRCh38";
pub const DEFAULT_VARIANT_TYPE: &str = "single nucleotide variant";
pub const DEFAULT_REJECTED_REVIEW_STATUSES: [&str; 2] = [
    "no assertion criteria provided",
    "no assertion for the individual variant",
];
/// AlphaFold's "confident" boundary.
pub const DEFAULT_MIN_PLDDT: f64 = 70.0;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CohortConfig {
    pub variant_summary_path: PathBuf,
    pub uniprot_mapping_path: PathBuf,
    pub output_path: PathBuf,
    pub assembly: String,
    pub variant_type: String,
    pub rejected_review_statuses: Vec<String>,
}

#[derive(Default)]
pub struct CohortConfigBuilder {
    variant_summary_path: Option<PathBuf>,
    uniprot_mapping_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
    assembly: Option<String>,
    variant_type: Option<String>,
    rejected_review_statuses: Option<Vec<String>>,
}

impl CohortConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn variant_summary_path(mut self, path: PathBuf) -> Self {
        self.variant_summary_path = Some(path);
        self
    }
    pub fn uniprot_mapping_path(mut self, path: PathBuf) -> Self {
        self.uniprot_mapping_path = Some(path);
        self
    }
    pub fn output_path(mut self, path: PathBuf) -> Self {
        self.output_path = Some(path);
        self
    }
    pub fn assembly(mut self, assembly: impl Into<String>) -> Self {
        self.assembly = Some(assembly.into());
        self
    }
    pub fn variant_type(mut self, variant_type: impl Into<String>) -> Self {
        self.variant_type = Some(variant_type.into());
        self
    }
    pub fn rejected_review_statuses(mut self, statuses: Vec<String>) -> Self {
        self.rejected_review_statuses = Some(statuses);
        self
    }

    pub fn build(self) -> Result<CohortConfig, ConfigError> {
        Ok(CohortConfig {
            variant_summary_path: self
                .variant_summary_path
                .ok_or(ConfigError::MissingParameter("variant_summary_path"))?,
            uniprot_mapping_path: self
                .uniprot_mapping_path
                .ok_or(ConfigError::MissingParameter("uniprot_mapping_path"))?,
            output_path: self
                .output_path
                .ok_or(ConfigError::MissingParameter("output_path"))?,
            assembly: self.assembly.unwrap_or_else(|| DEFAULT_ASSEMBLY.to_string()),
            variant_type: self
                .variant_type
                .unwrap_or_else(|| DEFAULT_VARIANT_TYPE.to_string()),
            rejected_review_statuses: self.rejected_review_statuses.unwrap_or_else(|| {
                DEFAULT_REJECTED_REVIEW_STATUSES
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            }),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructureFilterConfig {
    pub cohort_path: PathBuf,
    pub structure_dir: PathBuf,
    pub output_path: PathBuf,
    pub min_plddt: f64,
}

#[derive(Default)]
pub struct StructureFilterConfigBuilder {
    cohort_path: Option<PathBuf>,
    structure_dir: Option<PathBuf>,
    output_path: Option<PathBuf>,
    min_plddt: Option<f64>,
}

impl StructureFilterConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cohort_path(mut self, path: PathBuf) -> Self {
        self.cohort_path = Some(path);
        self
    }
    pub fn structure_dir(mut self, path: PathBuf) -> Self {
        self.structure_dir = Some(path);
        self
    }
    pub fn output_path(mut self, path: PathBuf) -> Self {
        self.output_path = Some(path);
        self
    }
    pub fn min_plddt(mut self, threshold: f64) -> Self {
        self.min_plddt = Some(threshold);
        self
    }

    pub fn build(self) -> Result<StructureFilterConfig, ConfigError> {
        let min_plddt = self.min_plddt.unwrap_or(DEFAULT_MIN_PLDDT);
        if !(0.0..=100.0).contains(&min_plddt) {
            return Err(ConfigError::InvalidParameter {
                name: "min_plddt",
                reason: format!("{} is outside the pLDDT range 0-100", min_plddt),
            });
        }
        Ok(StructureFilterConfig {
            cohort_path: self
                .cohort_path
                .ok_or(ConfigError::MissingParameter("cohort_path"))?,
            structure_dir: self
                .structure_dir
                .ok_or(ConfigError::MissingParameter("structure_dir"))?,
            output_path: self
                .output_path
                .ok_or(ConfigError::MissingParameter("output_path"))?,
            min_plddt,
        })
    }
}

/// Command-line parameters passed to FoldX.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldxConfig {
    pub executable: PathBuf,
    pub ion_strength: f64,
    pub ph: f64,
    pub vdw_design: u8,
    pub number_of_runs: u32,
}

impl FoldxConfig {
    pub fn new(executable: PathBuf) -> Self {
        Self {
            executable,
            ion_strength: 0.05,
            ph: 7.0,
            vdw_design: 2,
            number_of_runs: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnergyConfig {
    pub cohort_path: PathBuf,
    pub structure_dir: PathBuf,
    pub results_path: PathBuf,
    pub workspace_dir: PathBuf,
    /// Where mutant models are kept; `None` discards them.
    pub mutant_structure_dir: Option<PathBuf>,
    pub pilot_size: Option<usize>,
    pub batch_limit: Option<usize>,
    pub workers: usize,
}

impl EnergyConfig {
    /// The table results are appended to: the pilot file in pilot mode, the
    /// full results table otherwise.
    pub fn active_results_path(&self) -> PathBuf {
        match self.pilot_size {
            Some(_) => pilot_results_path(&self.results_path),
            None => self.results_path.clone(),
        }
    }
}

/// `results/cohort_with_ddg.csv` -> `results/cohort_with_ddg_pilot.csv`.
pub fn pilot_results_path(results_path: &Path) -> PathBuf {
    let stem = results_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "results".to_string());
    let name = match results_path.extension() {
        Some(ext) => format!("{}_pilot.{}", stem, ext.to_string_lossy()),
        None => format!("{}_pilot", stem),
    };
    results_path.with_file_name(name)
}

#[derive(Default)]
pub struct EnergyConfigBuilder {
    cohort_path: Option<PathBuf>,
    structure_dir: Option<PathBuf>,
    results_path: Option<PathBuf>,
    workspace_dir: Option<PathBuf>,
    mutant_structure_dir: Option<PathBuf>,
    pilot_size: Option<usize>,
    batch_limit: Option<usize>,
    workers: Option<usize>,
}

impl EnergyConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cohort_path(mut self, path: PathBuf) -> Self {
        self.cohort_path = Some(path);
        self
    }
    pub fn structure_dir(mut self, path: PathBuf) -> Self {
        self.structure_dir = Some(path);
        self
    }
    pub fn results_path(mut self, path: PathBuf) -> Self {
        self.results_path = Some(path);
        self
    }
    pub fn workspace_dir(mut self, path: PathBuf) -> Self {
        self.workspace_dir = Some(path);
        self
    }
    pub fn mutant_structure_dir(mut self, path: Option<PathBuf>) -> Self {
        self.mutant_structure_dir = path;
        self
    }
    pub fn pilot_size(mut self, size: Option<usize>) -> Self {
        self.pilot_size = size;
        self
    }
    pub fn batch_limit(mut self, limit: Option<usize>) -> Self {
        self.batch_limit = limit;
        self
    }
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn build(self) -> Result<EnergyConfig, ConfigError> {
        let workers = self.workers.unwrap_or(1);
        if workers == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "workers",
                reason: "at least one worker is required".to_string(),
            });
        }
        if self.pilot_size == Some(0) {
            return Err(ConfigError::InvalidParameter {
                name: "pilot_size",
                reason: "a pilot run needs at least one row".to_string(),
            });
        }
        Ok(EnergyConfig {
            cohort_path: self
                .cohort_path
                .ok_or(ConfigError::MissingParameter("cohort_path"))?,
            structure_dir: self
                .structure_dir
                .ok_or(ConfigError::MissingParameter("structure_dir"))?,
            results_path: self
                .results_path
                .ok_or(ConfigError::MissingParameter("results_path"))?,
            workspace_dir: self
                .workspace_dir
                .ok_or(ConfigError::MissingParameter("workspace_dir"))?,
            mutant_structure_dir: self.mutant_structure_dir,
            pilot_size: self.pilot_size,
            batch_limit: self.batch_limit,
            workers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cohort_builder_fills_default_filters() {
        let config = CohortConfigBuilder::new()
            .variant_summary_path("variant_summary.txt".into())
            .uniprot_mapping_path("uniprot.tsv".into())
            .output_path("out/cohort_mapped.csv".into())
            .build()
            .unwrap();
        assert_eq!(config.assembly, "GRCh38");
        assert_eq!(config.variant_type, "single nucleotide variant");
        assert_eq!(config.rejected_review_statuses.len(), 2);
    }

    #[test]
    fn cohort_builder_reports_missing_path() {
        let err = CohortConfigBuilder::new()
            .variant_summary_path("variant_summary.txt".into())
            .output_path("out.csv".into())
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingParameter("uniprot_mapping_path"));
    }

    #[test]
    fn structure_filter_rejects_out_of_range_threshold() {
        let err = StructureFilterConfigBuilder::new()
            .cohort_path("c.csv".into())
            .structure_dir("structures".into())
            .output_path("f.csv".into())
            .min_plddt(120.0)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidParameter { name: "min_plddt", .. }));
    }

    #[test]
    fn structure_filter_defaults_to_confident_boundary() {
        let config = StructureFilterConfigBuilder::new()
            .cohort_path("c.csv".into())
            .structure_dir("structures".into())
            .output_path("f.csv".into())
            .build()
            .unwrap();
        assert_eq!(config.min_plddt, 70.0);
    }

    #[test]
    fn pilot_runs_write_to_a_separate_file() {
        let config = EnergyConfigBuilder::new()
            .cohort_path("cohort_filtered.csv".into())
            .structure_dir("af".into())
            .results_path("out/cohort_with_ddg.csv".into())
            .workspace_dir("ws".into())
            .pilot_size(Some(5))
            .build()
            .unwrap();
        assert_eq!(config.workers, 1);
        assert_eq!(
            config.active_results_path(),
            PathBuf::from("out/cohort_with_ddg_pilot.csv")
        );
    }

    #[test]
    fn zero_workers_is_invalid() {
        let err = EnergyConfigBuilder::new().workers(0).build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidParameter { name: "workers", .. }));
    }

    #[test]
    fn foldx_defaults_match_repair_protocol() {
        let foldx = FoldxConfig::new("foldx".into());
        assert_eq!(foldx.ion_strength, 0.05);
        assert_eq!(foldx.ph, 7.0);
        assert_eq!(foldx.vdw_design, 2);
        assert_eq!(foldx.number_of_runs, 1);
    }
}

mod defaults;

pub use defaults::DefaultsConfig;

use crate::cli::{CohortArgs, EnergyArgs, SplitArgs, StructuresArgs, VerifyArgs};
use crate::error::{CliError, Result};
use clinfold::engine::config as core_config;
use clinfold::workflows::split::SplitConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialPathsConfig {
    variant_summary: Option<PathBuf>,
    uniprot_mapping: Option<PathBuf>,
    mapped_cohort: Option<PathBuf>,
    filtered_cohort: Option<PathBuf>,
    structure_dir: Option<PathBuf>,
    results: Option<PathBuf>,
    workspace: Option<PathBuf>,
    mutant_dir: Option<PathBuf>,
    chunk_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialCohortConfig {
    assembly: Option<String>,
    variant_type: Option<String>,
    rejected_review_statuses: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialStructuresConfig {
    min_plddt: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialSplitConfig {
    parts: Option<usize>,
    prefix: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialFoldxConfig {
    executable: Option<PathBuf>,
    ion_strength: Option<f64>,
    ph: Option<f64>,
    vdw_design: Option<u8>,
    number_of_runs: Option<u32>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialEnergyConfig {
    workers: Option<usize>,
    pilot_size: Option<usize>,
    batch_limit: Option<usize>,
    keep_mutants: Option<bool>,
}

/// The pipeline configuration file. Every section and key is optional; values
/// missing here fall back to [`DefaultsConfig`].
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialPipelineConfig {
    #[serde(default)]
    paths: PartialPathsConfig,
    #[serde(default)]
    cohort: PartialCohortConfig,
    #[serde(default)]
    structures: PartialStructuresConfig,
    #[serde(default)]
    split: PartialSplitConfig,
    #[serde(default)]
    foldx: PartialFoldxConfig,
    #[serde(default)]
    energy: PartialEnergyConfig,
}

pub struct VerifyInputs {
    pub variant_summary: PathBuf,
    pub sample: Option<PathBuf>,
}

pub struct EnergySettings {
    pub energy: core_config::EnergyConfig,
    pub foldx: core_config::FoldxConfig,
}

fn pick<T>(cli: Option<T>, file: Option<T>, default: impl FnOnce() -> T) -> T {
    cli.or(file).unwrap_or_else(default)
}

/// `cohort_with_ddg.csv` -> `cohort_with_ddg_3.csv`, `foldx_workspace` -> `foldx_workspace_3`.
fn with_worker_suffix(path: &Path, worker_id: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, worker_id, ext.to_string_lossy()),
        None => format!("{}_{}", stem, worker_id),
    };
    path.with_file_name(name)
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid value for {}: '{}'", key, value)))
}

impl PartialPipelineConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Reads the optional config file and applies the `-S` overrides on top.
    pub fn load(path: Option<&Path>, set_values: &[String]) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_set_values(set_values)?;
        Ok(config)
    }

    pub fn verify_inputs(self, args: &VerifyArgs, defaults: &DefaultsConfig) -> VerifyInputs {
        let paths = self.paths;
        let variant_summary = pick(args.variant_summary.clone(), paths.variant_summary, || {
            defaults.variant_summary.clone()
        });
        let sample = if args.skip_structure {
            None
        } else {
            Some(pick(args.sample.clone(), paths.structure_dir, || {
                defaults.structure_dir.clone()
            }))
        };
        VerifyInputs {
            variant_summary,
            sample,
        }
    }

    pub fn cohort_config(
        self,
        args: &CohortArgs,
        defaults: &DefaultsConfig,
    ) -> Result<core_config::CohortConfig> {
        let paths = self.paths;
        let mut builder = core_config::CohortConfigBuilder::new()
            .variant_summary_path(pick(
                args.variant_summary.clone(),
                paths.variant_summary,
                || defaults.variant_summary.clone(),
            ))
            .uniprot_mapping_path(pick(
                args.uniprot_mapping.clone(),
                paths.uniprot_mapping,
                || defaults.uniprot_mapping.clone(),
            ))
            .output_path(pick(args.output.clone(), paths.mapped_cohort, || {
                defaults.mapped_cohort.clone()
            }));

        if let Some(assembly) = args.assembly.clone().or(self.cohort.assembly) {
            builder = builder.assembly(assembly);
        }
        if let Some(variant_type) = self.cohort.variant_type {
            builder = builder.variant_type(variant_type);
        }
        if let Some(statuses) = self.cohort.rejected_review_statuses {
            builder = builder.rejected_review_statuses(statuses);
        }
        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    pub fn structure_config(
        self,
        args: &StructuresArgs,
        defaults: &DefaultsConfig,
    ) -> Result<core_config::StructureFilterConfig> {
        let paths = self.paths;
        core_config::StructureFilterConfigBuilder::new()
            .cohort_path(pick(args.input.clone(), paths.mapped_cohort, || {
                defaults.mapped_cohort.clone()
            }))
            .structure_dir(pick(args.structure_dir.clone(), paths.structure_dir, || {
                defaults.structure_dir.clone()
            }))
            .output_path(pick(args.output.clone(), paths.filtered_cohort, || {
                defaults.filtered_cohort.clone()
            }))
            .min_plddt(pick(args.min_plddt, self.structures.min_plddt, || {
                core_config::DEFAULT_MIN_PLDDT
            }))
            .build()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    pub fn split_config(self, args: &SplitArgs, defaults: &DefaultsConfig) -> SplitConfig {
        let paths = self.paths;
        SplitConfig {
            cohort_path: pick(args.input.clone(), paths.filtered_cohort, || {
                defaults.filtered_cohort.clone()
            }),
            output_dir: pick(args.output_dir.clone(), paths.chunk_dir, || {
                defaults.chunk_dir.clone()
            }),
            parts: pick(args.parts, self.split.parts, || defaults.parts),
            file_stem: pick(args.prefix.clone(), self.split.prefix, || {
                defaults.chunk_prefix.clone()
            }),
        }
    }

    /// With `--worker-id N`, the cohort defaults to chunk N of `clinfold split`
    /// and the results table and workspace get an `_N` suffix. Explicit
    /// command-line paths still take precedence.
    pub fn energy_settings(
        self,
        args: &EnergyArgs,
        defaults: &DefaultsConfig,
    ) -> Result<EnergySettings> {
        let paths = self.paths;
        let results_base = paths.results.unwrap_or_else(|| defaults.results.clone());
        let workspace_base = paths.workspace.unwrap_or_else(|| defaults.workspace.clone());

        let (cohort, results, workspace) = match args.worker_id {
            Some(0) => {
                return Err(CliError::Argument(
                    "worker ids start at 1, matching the chunk files".to_string(),
                ));
            }
            Some(id) => {
                let chunk_dir = paths.chunk_dir.unwrap_or_else(|| defaults.chunk_dir.clone());
                let prefix = self
                    .split
                    .prefix
                    .unwrap_or_else(|| defaults.chunk_prefix.clone());
                (
                    chunk_dir.join(format!("{}_{}.csv", prefix, id)),
                    with_worker_suffix(&results_base, id),
                    with_worker_suffix(&workspace_base, id),
                )
            }
            None => (
                paths
                    .filtered_cohort
                    .unwrap_or_else(|| defaults.filtered_cohort.clone()),
                results_base,
                workspace_base,
            ),
        };

        let keep_mutants = args.mutant_dir.is_some()
            || (!args.discard_mutants && self.energy.keep_mutants.unwrap_or(true));
        let mutant_dir = if keep_mutants {
            Some(pick(args.mutant_dir.clone(), paths.mutant_dir, || {
                defaults.mutant_dir.clone()
            }))
        } else {
            None
        };

        let energy = core_config::EnergyConfigBuilder::new()
            .cohort_path(args.input.clone().unwrap_or(cohort))
            .structure_dir(pick(args.structure_dir.clone(), paths.structure_dir, || {
                defaults.structure_dir.clone()
            }))
            .results_path(args.output.clone().unwrap_or(results))
            .workspace_dir(args.workspace.clone().unwrap_or(workspace))
            .mutant_structure_dir(mutant_dir)
            .pilot_size(args.pilot.or(self.energy.pilot_size))
            .batch_limit(args.batch_limit.or(self.energy.batch_limit))
            .workers(pick(args.workers, self.energy.workers, || defaults.workers))
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        let mut foldx = core_config::FoldxConfig::new(pick(
            args.foldx.clone(),
            self.foldx.executable,
            || defaults.foldx.clone(),
        ));
        if let Some(ion_strength) = self.foldx.ion_strength {
            foldx.ion_strength = ion_strength;
        }
        if let Some(ph) = self.foldx.ph {
            foldx.ph = ph;
        }
        if let Some(vdw_design) = self.foldx.vdw_design {
            foldx.vdw_design = vdw_design;
        }
        if let Some(number_of_runs) = self.foldx.number_of_runs {
            foldx.number_of_runs = number_of_runs;
        }

        Ok(EnergySettings { energy, foldx })
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };
            debug!(key, value, "Applying --set override");

            match key {
                "paths.variant-summary" => self.paths.variant_summary = Some(value.into()),
                "paths.uniprot-mapping" => self.paths.uniprot_mapping = Some(value.into()),
                "paths.mapped-cohort" => self.paths.mapped_cohort = Some(value.into()),
                "paths.filtered-cohort" => self.paths.filtered_cohort = Some(value.into()),
                "paths.structure-dir" => self.paths.structure_dir = Some(value.into()),
                "paths.results" => self.paths.results = Some(value.into()),
                "paths.workspace" => self.paths.workspace = Some(value.into()),
                "paths.mutant-dir" => self.paths.mutant_dir = Some(value.into()),
                "paths.chunk-dir" => self.paths.chunk_dir = Some(value.into()),
                "cohort.assembly" => self.cohort.assembly = Some(value.to_string()),
                "cohort.variant-type" => self.cohort.variant_type = Some(value.to_string()),
                "structures.min-plddt" => {
                    self.structures.min_plddt = Some(parse_value(key, value)?)
                }
                "split.parts" => self.split.parts = Some(parse_value(key, value)?),
                "split.prefix" => self.split.prefix = Some(value.to_string()),
                "foldx.executable" => self.foldx.executable = Some(value.into()),
                "foldx.ion-strength" => self.foldx.ion_strength = Some(parse_value(key, value)?),
                "foldx.ph" => self.foldx.ph = Some(parse_value(key, value)?),
                "foldx.vdw-design" => self.foldx.vdw_design = Some(parse_value(key, value)?),
                "foldx.number-of-runs" => {
                    self.foldx.number_of_runs = Some(parse_value(key, value)?)
                }
                "energy.workers" => self.energy.workers = Some(parse_value(key, value)?),
                "energy.pilot-size" => self.energy.pilot_size = Some(parse_value(key, value)?),
                "energy.batch-limit" => self.energy.batch_limit = Some(parse_value(key, value)?),
                "energy.keep-mutants" => {
                    self.energy.keep_mutants = Some(parse_value(key, value)?)
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use once_cell::sync::Lazy;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    static TEST_DIR: Lazy<TempDir> = Lazy::new(|| tempdir().expect("Failed to create temp dir"));

    fn write_config_file(name: &str, content: &str) -> PathBuf {
        let file_path = TEST_DIR.path().join(name);
        fs::write(&file_path, content).unwrap();
        file_path
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("clinfold").chain(args.iter().copied()))
    }

    fn load(cli: &Cli) -> Result<PartialPipelineConfig> {
        PartialPipelineConfig::load(cli.config.as_deref(), &cli.set_values)
    }

    const PIPELINE_TOML: &str = r#"
        [paths]
        variant-summary = "inputs/variant_summary.txt.gz"
        mapped-cohort = "work/mapped.csv"
        filtered-cohort = "work/filtered.csv"
        structure-dir = "inputs/af"
        results = "work/ddg.csv"
        workspace = "work/foldx"

        [cohort]
        assembly = "GRCh37"
        rejected-review-statuses = ["no assertion criteria provided"]

        [structures]
        min-plddt = 80.0

        [foldx]
        executable = "/opt/foldx/foldx"
        ph = 7.4

        [energy]
        workers = 3
        batch-limit = 50
    "#;

    #[test]
    fn defaults_apply_without_a_config_file() {
        let cli = parse(&["cohort"]);
        let Commands::Cohort(args) = &cli.command else {
            panic!("Expected 'cohort' subcommand");
        };
        let config = load(&cli)
            .unwrap()
            .cohort_config(args, &DefaultsConfig::default())
            .unwrap();

        assert_eq!(config.variant_summary_path, PathBuf::from("data/raw/variant_summary.txt"));
        assert_eq!(config.uniprot_mapping_path, PathBuf::from("data/raw/human_id_mapping.tsv"));
        assert_eq!(config.output_path, PathBuf::from("data/processed/cohort_mapped.csv"));
        assert_eq!(config.assembly, core_config::DEFAULT_ASSEMBLY);
        assert_eq!(config.rejected_review_statuses.len(), 2);
    }

    #[test]
    fn file_values_override_defaults_and_cli_overrides_file() {
        let path = write_config_file("pipeline.toml", PIPELINE_TOML);
        let cli = parse(&["-c", path.to_str().unwrap(), "cohort", "--assembly", "GRCh38"]);
        let Commands::Cohort(args) = &cli.command else {
            panic!("Expected 'cohort' subcommand");
        };
        let config = load(&cli)
            .unwrap()
            .cohort_config(args, &DefaultsConfig::default())
            .unwrap();

        assert_eq!(config.variant_summary_path, PathBuf::from("inputs/variant_summary.txt.gz"));
        assert_eq!(config.output_path, PathBuf::from("work/mapped.csv"));
        assert_eq!(config.assembly, "GRCh38");
        assert_eq!(
            config.rejected_review_statuses,
            vec!["no assertion criteria provided".to_string()]
        );
    }

    #[test]
    fn set_values_override_file_values() {
        let path = write_config_file("pipeline_set.toml", PIPELINE_TOML);
        let cli = parse(&[
            "-c",
            path.to_str().unwrap(),
            "-S",
            "structures.min-plddt=90",
            "-S",
            "paths.filtered-cohort=elsewhere.csv",
            "structures",
        ]);
        let Commands::Structures(args) = &cli.command else {
            panic!("Expected 'structures' subcommand");
        };
        let config = load(&cli)
            .unwrap()
            .structure_config(args, &DefaultsConfig::default())
            .unwrap();

        assert_eq!(config.min_plddt, 90.0);
        assert_eq!(config.cohort_path, PathBuf::from("work/mapped.csv"));
        assert_eq!(config.structure_dir, PathBuf::from("inputs/af"));
        assert_eq!(config.output_path, PathBuf::from("elsewhere.csv"));
    }

    #[test]
    fn invalid_set_values_are_rejected() {
        for bad in ["structures.min-plddt=high", "nonsense.key=1", "no-equals-sign"] {
            let cli = parse(&["-S", bad, "split"]);
            assert!(matches!(load(&cli), Err(CliError::Config(_))), "{}", bad);
        }
    }

    #[test]
    fn unknown_file_keys_are_a_parse_error() {
        let path = write_config_file("unknown.toml", "[structures]\nmin-pldt = 80.0\n");
        let cli = parse(&["-c", path.to_str().unwrap(), "structures"]);
        assert!(matches!(load(&cli), Err(CliError::FileParsing { .. })));
    }

    #[test]
    fn out_of_range_threshold_is_a_config_error() {
        let cli = parse(&["structures", "--min-plddt", "120"]);
        let Commands::Structures(args) = &cli.command else {
            panic!("Expected 'structures' subcommand");
        };
        let result = load(&cli)
            .unwrap()
            .structure_config(args, &DefaultsConfig::default());
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("min_plddt")));
    }

    #[test]
    fn energy_settings_merge_every_source() {
        let path = write_config_file("pipeline_energy.toml", PIPELINE_TOML);
        let cli = parse(&[
            "-c",
            path.to_str().unwrap(),
            "energy",
            "--pilot",
            "5",
            "--workers",
            "2",
        ]);
        let Commands::Energy(args) = &cli.command else {
            panic!("Expected 'energy' subcommand");
        };
        let settings = load(&cli)
            .unwrap()
            .energy_settings(args, &DefaultsConfig::default())
            .unwrap();

        assert_eq!(settings.energy.cohort_path, PathBuf::from("work/filtered.csv"));
        assert_eq!(settings.energy.results_path, PathBuf::from("work/ddg.csv"));
        assert_eq!(settings.energy.workspace_dir, PathBuf::from("work/foldx"));
        assert_eq!(
            settings.energy.mutant_structure_dir,
            Some(PathBuf::from("data/processed/structures"))
        );
        assert_eq!(settings.energy.pilot_size, Some(5));
        assert_eq!(settings.energy.batch_limit, Some(50));
        assert_eq!(settings.energy.workers, 2);
        assert_eq!(settings.foldx.executable, PathBuf::from("/opt/foldx/foldx"));
        assert_eq!(settings.foldx.ph, 7.4);
        assert_eq!(settings.foldx.ion_strength, 0.05);
    }

    #[test]
    fn worker_id_selects_chunk_and_suffixes_outputs() {
        let cli = parse(&["energy", "--worker-id", "3", "--discard-mutants"]);
        let Commands::Energy(args) = &cli.command else {
            panic!("Expected 'energy' subcommand");
        };
        let settings = load(&cli)
            .unwrap()
            .energy_settings(args, &DefaultsConfig::default())
            .unwrap();

        assert_eq!(
            settings.energy.cohort_path,
            PathBuf::from("data/processed/cohort_part_3.csv")
        );
        assert_eq!(
            settings.energy.results_path,
            PathBuf::from("data/processed/cohort_with_ddg_3.csv")
        );
        assert_eq!(
            settings.energy.workspace_dir,
            PathBuf::from("data/processed/foldx_workspace_3")
        );
        assert_eq!(settings.energy.mutant_structure_dir, None);
    }

    #[test]
    fn worker_id_zero_is_rejected() {
        let cli = parse(&["energy", "-w", "0"]);
        let Commands::Energy(args) = &cli.command else {
            panic!("Expected 'energy' subcommand");
        };
        let result = load(&cli)
            .unwrap()
            .energy_settings(args, &DefaultsConfig::default());
        assert!(matches!(result, Err(CliError::Argument(_))));
    }

    #[test]
    fn verify_sample_defaults_to_structure_directory() {
        let cli = parse(&["verify"]);
        let Commands::Verify(args) = &cli.command else {
            panic!("Expected 'verify' subcommand");
        };
        let inputs = load(&cli)
            .unwrap()
            .verify_inputs(args, &DefaultsConfig::default());
        assert_eq!(inputs.sample, Some(PathBuf::from("data/raw/alphafold_human")));

        let cli = parse(&["verify", "--skip-structure"]);
        let Commands::Verify(args) = &cli.command else {
            panic!("Expected 'verify' subcommand");
        };
        let inputs = load(&cli)
            .unwrap()
            .verify_inputs(args, &DefaultsConfig::default());
        assert_eq!(inputs.sample, None);
    }
}

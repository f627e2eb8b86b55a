use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Clinfold Developers",
    version,
    about = "clinfold - builds a labeled dataset of ClinVar missense variants with FoldX stability changes computed on AlphaFold structures.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,

    /// Path to a pipeline configuration file in TOML format.
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S structures.min-plddt=80
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", global = true)]
    pub set_values: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that the ClinVar table and a sample AlphaFold model are usable.
    Verify(VerifyArgs),
    /// Filter ClinVar to reviewed missense variants and map them to UniProt.
    Cohort(CohortArgs),
    /// Keep variants whose residue has a confident AlphaFold structure.
    Structures(StructuresArgs),
    /// Split the filtered cohort into chunks for independent workers.
    Split(SplitArgs),
    /// Compute FoldX ddG for every pending variant, resuming previous runs.
    Energy(EnergyArgs),
}

/// Arguments for the `verify` subcommand.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// ClinVar variant_summary.txt (optionally gzipped).
    #[arg(long, value_name = "PATH")]
    pub variant_summary: Option<PathBuf>,

    /// A model file, or a structure directory whose first model is checked.
    #[arg(long, value_name = "PATH")]
    pub sample: Option<PathBuf>,

    /// Only check the variant table.
    #[arg(long, conflicts_with = "sample")]
    pub skip_structure: bool,
}

/// Arguments for the `cohort` subcommand.
#[derive(Args, Debug)]
pub struct CohortArgs {
    /// ClinVar variant_summary.txt (optionally gzipped).
    #[arg(long, value_name = "PATH")]
    pub variant_summary: Option<PathBuf>,

    /// UniProt export with `Entry` and `Gene Names` columns.
    #[arg(long, value_name = "PATH")]
    pub uniprot_mapping: Option<PathBuf>,

    /// Mapped cohort table to write.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Genome assembly to keep (e.g., 'GRCh38').
    #[arg(long, value_name = "NAME")]
    pub assembly: Option<String>,
}

/// Arguments for the `structures` subcommand.
#[derive(Args, Debug)]
pub struct StructuresArgs {
    /// Mapped cohort produced by `clinfold cohort`.
    #[arg(short, long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Directory of AlphaFold models (AF-<accession>-F1-model_v*.pdb/.cif[.gz]).
    #[arg(long, value_name = "PATH")]
    pub structure_dir: Option<PathBuf>,

    /// Filtered cohort table to write.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Minimum pLDDT of the mutated residue.
    #[arg(long, value_name = "FLOAT")]
    pub min_plddt: Option<f64>,
}

/// Arguments for the `split` subcommand.
#[derive(Args, Debug)]
pub struct SplitArgs {
    /// Filtered cohort to split.
    #[arg(short, long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Number of chunk files to write.
    #[arg(short = 'n', long, value_name = "INT")]
    pub parts: Option<usize>,

    /// Directory the chunk files are written to.
    #[arg(long, value_name = "PATH")]
    pub output_dir: Option<PathBuf>,

    /// Chunk files are named `<prefix>_<n>.csv`.
    #[arg(long, value_name = "NAME")]
    pub prefix: Option<String>,
}

/// Arguments for the `energy` subcommand.
#[derive(Args, Debug)]
pub struct EnergyArgs {
    /// Filtered cohort (or one of its chunks).
    #[arg(short, long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Directory of AlphaFold models.
    #[arg(long, value_name = "PATH")]
    pub structure_dir: Option<PathBuf>,

    /// Results table; new records are appended.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Path to the FoldX executable.
    #[arg(long, value_name = "PATH")]
    pub foldx: Option<PathBuf>,

    /// Scratch directory for FoldX inputs, repaired structures and outputs.
    #[arg(long, value_name = "PATH")]
    pub workspace: Option<PathBuf>,

    /// Directory mutant models are moved into.
    #[arg(long, value_name = "PATH")]
    pub mutant_dir: Option<PathBuf>,

    /// Delete mutant models instead of keeping them.
    #[arg(long, conflicts_with = "mutant_dir")]
    pub discard_mutants: bool,

    /// Process the chunk written by `clinfold split` for this worker and use
    /// a worker-specific results table and workspace.
    #[arg(short = 'w', long, value_name = "ID")]
    pub worker_id: Option<usize>,

    /// Only process the first N cohort rows, writing to a separate pilot table.
    #[arg(long, value_name = "INT")]
    pub pilot: Option<usize>,

    /// Stop after recording this many mutations.
    #[arg(short = 'b', long, value_name = "INT")]
    pub batch_limit: Option<usize>,

    /// Number of proteins processed concurrently.
    #[arg(long, value_name = "INT")]
    pub workers: Option<usize>,
}

use std::path::PathBuf;

/// Fallback values used when neither the command line nor the config file
/// sets a parameter. Paths are relative to the project directory.
pub struct DefaultsConfig {
    pub variant_summary: PathBuf,
    pub uniprot_mapping: PathBuf,
    pub mapped_cohort: PathBuf,
    pub filtered_cohort: PathBuf,
    pub structure_dir: PathBuf,
    pub results: PathBuf,
    pub workspace: PathBuf,
    pub mutant_dir: PathBuf,
    pub chunk_dir: PathBuf,
    pub chunk_prefix: String,
    pub parts: usize,
    pub foldx: PathBuf,
    pub workers: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            variant_summary: PathBuf::from("data/raw/variant_summary.txt"),
            uniprot_mapping: PathBuf::from("data/raw/human_id_mapping.tsv"),
            mapped_cohort: PathBuf::from("data/processed/cohort_mapped.csv"),
            filtered_cohort: PathBuf::from("data/processed/cohort_filtered.csv"),
            structure_dir: PathBuf::from("data/raw/alphafold_human"),
            results: PathBuf::from("data/processed/cohort_with_ddg.csv"),
            workspace: PathBuf::from("data/processed/foldx_workspace"),
            mutant_dir: PathBuf::from("data/processed/structures"),
            chunk_dir: PathBuf::from("data/processed"),
            chunk_prefix: "cohort_part".to_string(),
            parts: 6,
            foldx: PathBuf::from("tools/foldx/foldx"),
            workers: 1,
        }
    }
}

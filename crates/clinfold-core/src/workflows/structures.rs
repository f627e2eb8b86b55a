use crate::core::io::format::{StructureFormat, read_structure};
use crate::core::io::tables::{FILTERED_COHORT_HEADER, read_table, write_table};
use crate::core::models::cohort::{FilteredCohortRow, MappedCohortRow};
use crate::engine::config::StructureFilterConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructureReport {
    pub files_found: usize,
    pub accessions_indexed: usize,
    pub input_rows: usize,
    pub missing_structure: usize,
    pub unreadable_structure: usize,
    pub missing_residue: usize,
    pub low_confidence: usize,
    pub kept: usize,
}

/// AlphaFold model files in a directory, one per accession.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructureIndex {
    files: BTreeMap<String, (String, StructureFormat)>,
    files_found: usize,
}

impl StructureIndex {
    /// Registers a file name if it looks like `AF-<ACCESSION>-F1-model_v<N>.<ext>`.
    ///
    /// PDB files replace mmCIF files for the same accession; otherwise the
    /// first name registered wins.
    pub fn insert(&mut self, file_name: &str) -> bool {
        if !file_name.starts_with("AF-") || !file_name.contains("model") {
            return false;
        }
        let Some(format) = StructureFormat::from_path(Path::new(file_name)) else {
            return false;
        };
        let Some(accession) = file_name.split('-').nth(1).filter(|a| !a.is_empty()) else {
            return false;
        };
        self.files_found += 1;
        let replace = match self.files.get(accession) {
            None => true,
            Some((_, existing)) => *existing == StructureFormat::Cif && format == StructureFormat::Pdb,
        };
        if replace {
            self.files
                .insert(accession.to_string(), (file_name.to_string(), format));
        }
        true
    }

    pub fn file_for(&self, accession: &str) -> Option<&str> {
        self.files.get(accession).map(|(name, _)| name.as_str())
    }

    /// The model of the lowest accession, if any.
    pub fn first_file(&self) -> Option<&str> {
        self.files.values().next().map(|(name, _)| name.as_str())
    }

    pub fn files_found(&self) -> usize {
        self.files_found
    }

    pub fn accession_count(&self) -> usize {
        self.files.len()
    }
}

/// Indexes the AlphaFold model files in `dir`, in file-name order.
///
/// # Errors
///
/// Fails if the directory cannot be read or holds no model files.
pub fn index_structure_dir(dir: &Path) -> Result<StructureIndex, EngineError> {
    let read_err = |source| EngineError::StructureDirectory {
        path: dir.to_path_buf(),
        source,
    };
    let mut names: Vec<String> = fs::read_dir(dir)
        .map_err(read_err)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();

    let mut index = StructureIndex::default();
    for name in &names {
        index.insert(name);
    }
    if index.files_found() == 0 {
        return Err(EngineError::EmptyStructureDirectory(dir.to_path_buf()));
    }
    Ok(index)
}

/// Confidence of each requested residue, or `None` when the residue is absent.
type ResidueScores = HashMap<u32, Option<f64>>;

fn score_residues(path: &Path, residues: &BTreeSet<u32>) -> Option<ResidueScores> {
    match read_structure(path) {
        Ok(structure) => Some(
            residues
                .iter()
                .map(|&r| {
                    let score = i32::try_from(r)
                        .ok()
                        .and_then(|n| structure.residue_confidence(n));
                    (r, score)
                })
                .collect(),
        ),
        Err(e) => {
            warn!("Skipping unreadable structure {:?}: {}", path, e);
            None
        }
    }
}

/// Reads each referenced structure once and scores the residues its rows need.
///
/// Structures that fail to parse map to `None`.
pub fn score_structures(
    rows: &[MappedCohortRow],
    index: &StructureIndex,
    dir: &Path,
    reporter: &ProgressReporter,
) -> HashMap<String, Option<ResidueScores>> {
    let mut wanted: BTreeMap<&str, BTreeSet<u32>> = BTreeMap::new();
    for row in rows {
        if index.file_for(&row.uniprot_id).is_some() {
            wanted
                .entry(row.uniprot_id.as_str())
                .or_default()
                .insert(row.residue_index);
        }
    }
    let work: Vec<(&str, &str, BTreeSet<u32>)> = wanted
        .into_iter()
        .filter_map(|(acc, residues)| index.file_for(acc).map(|f| (acc, f, residues)))
        .collect();

    reporter.report(Progress::TaskStart {
        total_steps: work.len() as u64,
    });
    let score = |(acc, file, residues): &(&str, &str, BTreeSet<u32>)| {
        let scores = score_residues(&dir.join(file), residues);
        reporter.report(Progress::TaskIncrement);
        (acc.to_string(), scores)
    };

    #[cfg(feature = "parallel")]
    let scored: HashMap<String, Option<ResidueScores>> = work.par_iter().map(score).collect();
    #[cfg(not(feature = "parallel"))]
    let scored: HashMap<String, Option<ResidueScores>> = work.iter().map(score).collect();

    reporter.report(Progress::TaskFinish);
    scored
}

/// Keeps rows that have a readable structure whose residue confidence is at
/// least `min_plddt`.
pub fn filter_by_confidence(
    rows: Vec<MappedCohortRow>,
    index: &StructureIndex,
    scores: &HashMap<String, Option<ResidueScores>>,
    min_plddt: f64,
    report: &mut StructureReport,
) -> Vec<FilteredCohortRow> {
    let mut kept = Vec::new();
    for row in rows {
        let Some(file) = index.file_for(&row.uniprot_id) else {
            report.missing_structure += 1;
            continue;
        };
        let Some(Some(residues)) = scores.get(&row.uniprot_id) else {
            report.unreadable_structure += 1;
            continue;
        };
        let Some(Some(plddt)) = residues.get(&row.residue_index).copied() else {
            report.missing_residue += 1;
            continue;
        };
        if plddt < min_plddt {
            report.low_confidence += 1;
            continue;
        }
        let file = file.to_string();
        kept.push(FilteredCohortRow::from_mapped(row, file, plddt));
    }
    report.kept = kept.len();
    kept
}

#[instrument(skip_all, name = "structure_workflow")]
pub fn run(
    config: &StructureFilterConfig,
    reporter: &ProgressReporter,
) -> Result<StructureReport, EngineError> {
    reporter.report(Progress::StageStart {
        name: "Indexing structures",
    });
    let index = index_structure_dir(&config.structure_dir)?;
    let rows: Vec<MappedCohortRow> = read_table(&config.cohort_path)?;
    reporter.report(Progress::StageFinish);
    info!(
        files = index.files_found(),
        accessions = index.accession_count(),
        rows = rows.len(),
        "Indexed structure directory {:?}",
        config.structure_dir
    );

    let mut report = StructureReport {
        files_found: index.files_found(),
        accessions_indexed: index.accession_count(),
        input_rows: rows.len(),
        ..Default::default()
    };

    reporter.report(Progress::StageStart {
        name: "Scoring residues",
    });
    let scores = score_structures(&rows, &index, &config.structure_dir, reporter);
    reporter.report(Progress::StageFinish);
    debug!(parsed = scores.len(), "Structure files scored.");

    let filtered = filter_by_confidence(rows, &index, &scores, config.min_plddt, &mut report);
    write_table(&config.output_path, &filtered, FILTERED_COHORT_HEADER)?;

    info!(
        missing_structure = report.missing_structure,
        unreadable = report.unreadable_structure,
        missing_residue = report.missing_residue,
        low_confidence = report.low_confidence,
        kept = report.kept,
        "Filtered cohort written to {:?}",
        config.output_path
    );
    Ok(report)
}

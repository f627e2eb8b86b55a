use super::structures::index_structure_dir;
use crate::core::io::clinvar::read_variant_summary;
use crate::core::io::format::read_structure;
use crate::engine::error::EngineError;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// Outcome of the pre-flight checks on the raw inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrityReport {
    pub variant_rows: usize,
    pub malformed_rows: usize,
    pub sample: Option<SampleStructureCheck>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampleStructureCheck {
    pub path: PathBuf,
    pub atoms: usize,
    pub first_b_factor: f64,
    /// Atoms whose B-factor is not a valid pLDDT (outside 0-100).
    pub out_of_range: usize,
}

impl SampleStructureCheck {
    pub fn plddt_in_range(&self) -> bool {
        self.out_of_range == 0
    }
}

/// Confirms the ground-truth table loads with every required column and, when
/// given, that a sample AlphaFold model parses and carries pLDDT values.
///
/// `sample` may be a model file or a structure directory, in which case its
/// first indexed model is checked.
#[instrument(skip_all, name = "verify_workflow")]
pub fn run(variant_summary: &Path, sample: Option<&Path>) -> Result<IntegrityReport, EngineError> {
    let table = read_variant_summary(variant_summary)?;
    info!(
        rows = table.records.len(),
        malformed = table.malformed_rows,
        "Variant summary loaded with all required columns."
    );

    let sample = match sample {
        Some(path) => Some(check_sample(&resolve_sample(path)?)?),
        None => None,
    };
    Ok(IntegrityReport {
        variant_rows: table.records.len(),
        malformed_rows: table.malformed_rows,
        sample,
    })
}

fn resolve_sample(path: &Path) -> Result<PathBuf, EngineError> {
    if !path.is_dir() {
        return Ok(path.to_path_buf());
    }
    let index = index_structure_dir(path)?;
    index
        .first_file()
        .map(|name| path.join(name))
        .ok_or_else(|| EngineError::EmptyStructureDirectory(path.to_path_buf()))
}

fn check_sample(path: &Path) -> Result<SampleStructureCheck, EngineError> {
    let structure = read_structure(path)?;
    let atoms = structure.atoms();
    let first_b_factor = atoms.first().map(|a| a.b_factor).unwrap_or_default();
    let out_of_range = atoms
        .iter()
        .filter(|a| !(0.0..=100.0).contains(&a.b_factor))
        .count();
    if out_of_range > 0 {
        warn!(
            "{} atoms in {:?} have B-factors outside 0-100; is this an AlphaFold model?",
            out_of_range, path
        );
    } else {
        info!("Sample structure {:?} parsed; pLDDT values within 0-100.", path);
    }
    Ok(SampleStructureCheck {
        path: path.to_path_buf(),
        atoms: atoms.len(),
        first_b_factor,
        out_of_range,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::clinvar::fixtures::{HEADER, row};
    use crate::core::io::tables::TableError;
    use std::fs;

    const MODEL: &str = "\
ATOM      1  N   MET A   1      -1.234   2.345   3.456  1.00 45.12           N
ATOM      2  CA  MET A   1      -0.234   2.845   3.956  1.00 48.50           C
END
";

    fn summary(dir: &Path) -> PathBuf {
        let path = dir.join("variant_summary.txt");
        let line = row("single nucleotide variant", "x (p.Arg175His)", "TP53", "Pathogenic", "x", "GRCh38");
        fs::write(&path, format!("{}\n{}\n", HEADER, line)).unwrap();
        path
    }

    #[test]
    fn checks_table_and_sample_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let structures = dir.path().join("af");
        fs::create_dir(&structures).unwrap();
        fs::write(structures.join("AF-P1-F1-model_v4.pdb"), MODEL).unwrap();

        let report = run(&summary(dir.path()), Some(&structures)).unwrap();
        assert_eq!(report.variant_rows, 1);
        let sample = report.sample.unwrap();
        assert_eq!(sample.atoms, 2);
        assert_eq!(sample.first_b_factor, 45.12);
        assert!(sample.plddt_in_range());
        assert_eq!(sample.path, structures.join("AF-P1-F1-model_v4.pdb"));
    }

    #[test]
    fn out_of_range_b_factors_are_counted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("AF-P1-F1-model_v4.pdb");
        fs::write(&path, MODEL.replace("48.50", "148.5")).unwrap();
        let report = run(&summary(dir.path()), Some(&path)).unwrap();
        assert_eq!(report.sample.unwrap().out_of_range, 1);
    }

    #[test]
    fn table_without_required_columns_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("variant_summary.txt");
        fs::write(&path, "Name\tChromosome\nx\t1\n").unwrap();
        assert!(matches!(
            run(&path, None),
            Err(EngineError::Table(TableError::MissingColumns { .. }))
        ));
    }
}

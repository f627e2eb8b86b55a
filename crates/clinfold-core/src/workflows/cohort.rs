use crate::core::io::clinvar::read_variant_summary;
use crate::core::io::tables::{MAPPED_COHORT_HEADER, write_table};
use crate::core::io::uniprot::{UniprotMapping, read_uniprot_mapping};
use crate::core::models::cohort::MappedCohortRow;
use crate::core::models::variant::{
    ChangeKind, ClinicalClass, ProteinChange, VariantRecord, classify_protein_change,
};
use crate::engine::config::CohortConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{info, instrument};

/// Row counts after each cohort filter, in application order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CohortReport {
    pub raw_rows: usize,
    pub malformed_rows: usize,
    pub after_assembly: usize,
    pub after_variant_type: usize,
    pub after_review_status: usize,
    pub missense: MissenseCounts,
    pub pathogenic: usize,
    pub benign: usize,
    pub unmapped_rows: usize,
    pub mapped_rows: usize,
}

impl CohortReport {
    pub fn classified(&self) -> usize {
        self.pathogenic + self.benign
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MissenseCounts {
    pub kept: usize,
    pub nonsense: usize,
    pub silent: usize,
    pub unrecognized: usize,
}

/// A missense variant with its binary clinical label.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedVariant {
    pub variant: VariantRecord,
    pub change: ProteinChange,
    pub class: ClinicalClass,
}

pub fn filter_assembly(records: Vec<VariantRecord>, assembly: &str) -> Vec<VariantRecord> {
    records.into_iter().filter(|r| r.assembly == assembly).collect()
}

pub fn filter_variant_type(records: Vec<VariantRecord>, variant_type: &str) -> Vec<VariantRecord> {
    records
        .into_iter()
        .filter(|r| r.variant_type == variant_type)
        .collect()
}

pub fn filter_review_status(records: Vec<VariantRecord>, rejected: &[String]) -> Vec<VariantRecord> {
    records
        .into_iter()
        .filter(|r| !rejected.iter().any(|s| *s == r.review_status))
        .collect()
}

/// Keeps variants whose name carries a missense `p.` change.
pub fn extract_missense(records: Vec<VariantRecord>) -> (Vec<(VariantRecord, ProteinChange)>, MissenseCounts) {
    let mut counts = MissenseCounts::default();
    let mut kept = Vec::new();
    for record in records {
        match classify_protein_change(&record.name) {
            ChangeKind::Missense(change) => {
                counts.kept += 1;
                kept.push((record, change));
            }
            ChangeKind::Nonsense => counts.nonsense += 1,
            ChangeKind::Silent => counts.silent += 1,
            ChangeKind::Unrecognized => counts.unrecognized += 1,
        }
    }
    (kept, counts)
}

pub fn classify(variants: Vec<(VariantRecord, ProteinChange)>) -> Vec<ClassifiedVariant> {
    variants
        .into_iter()
        .filter_map(|(variant, change)| {
            ClinicalClass::from_significance(&variant.clinical_significance).map(|class| {
                ClassifiedVariant {
                    variant,
                    change,
                    class,
                }
            })
        })
        .collect()
}

/// Inner-joins classified variants to UniProt accessions on gene symbol.
///
/// A symbol mapping to several accessions emits one row per accession.
/// Returns the mapped rows and the number of variants with no match.
pub fn map_to_uniprot(
    variants: &[ClassifiedVariant],
    mapping: &UniprotMapping,
) -> (Vec<MappedCohortRow>, usize) {
    let mut rows = Vec::new();
    let mut unmapped = 0;
    for v in variants {
        let accessions = mapping.accessions(&v.variant.gene_symbol);
        if accessions.is_empty() {
            unmapped += 1;
            continue;
        }
        for accession in accessions {
            rows.push(MappedCohortRow {
                name: v.variant.name.clone(),
                gene_symbol: v.variant.gene_symbol.clone(),
                uniprot_id: accession.clone(),
                chromosome: v.variant.chromosome.clone(),
                wild_type: v.change.wild_type,
                residue_index: v.change.position,
                mutant: v.change.mutant,
                class: v.class,
                review_status: v.variant.review_status.clone(),
            });
        }
    }
    (rows, unmapped)
}

/// Applies every cohort filter in order, without touching the filesystem.
pub fn build_cohort(
    records: Vec<VariantRecord>,
    mapping: &UniprotMapping,
    config: &CohortConfig,
    report: &mut CohortReport,
) -> Vec<MappedCohortRow> {
    report.raw_rows = records.len();

    let records = filter_assembly(records, &config.assembly);
    report.after_assembly = records.len();

    let records = filter_variant_type(records, &config.variant_type);
    report.after_variant_type = records.len();

    let records = filter_review_status(records, &config.rejected_review_statuses);
    report.after_review_status = records.len();

    let (missense, counts) = extract_missense(records);
    report.missense = counts;

    let classified = classify(missense);
    report.pathogenic = classified
        .iter()
        .filter(|v| v.class == ClinicalClass::Pathogenic)
        .count();
    report.benign = classified.len() - report.pathogenic;

    let (rows, unmapped) = map_to_uniprot(&classified, mapping);
    report.unmapped_rows = unmapped;
    report.mapped_rows = rows.len();
    rows
}

#[instrument(skip_all, name = "cohort_workflow")]
pub fn run(config: &CohortConfig, reporter: &ProgressReporter) -> Result<CohortReport, EngineError> {
    reporter.report(Progress::StageStart {
        name: "Loading ClinVar",
    });
    let table = read_variant_summary(&config.variant_summary_path)?;
    let mapping = read_uniprot_mapping(&config.uniprot_mapping_path)?;
    reporter.report(Progress::StageFinish);
    info!(
        variants = table.records.len(),
        genes = mapping.gene_count(),
        "Loaded ground truth and UniProt mapping."
    );

    reporter.report(Progress::StageStart {
        name: "Filtering cohort",
    });
    let mut report = CohortReport {
        malformed_rows: table.malformed_rows,
        ..Default::default()
    };
    let rows = build_cohort(table.records, &mapping, config, &mut report);
    write_table(&config.output_path, &rows, MAPPED_COHORT_HEADER)?;
    reporter.report(Progress::StageFinish);

    info!(
        raw = report.raw_rows,
        assembly = report.after_assembly,
        snv = report.after_variant_type,
        reviewed = report.after_review_status,
        missense = report.missense.kept,
        classified = report.classified(),
        mapped = report.mapped_rows,
        "Cohort written to {:?}",
        config.output_path
    );
    Ok(report)
}

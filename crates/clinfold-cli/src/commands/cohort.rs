use crate::cli::CohortArgs;
use crate::config::{DefaultsConfig, PartialPipelineConfig};
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use clinfold::{engine::progress::ProgressReporter, workflows};
use tracing::{info, warn};

pub fn run(args: CohortArgs, config: PartialPipelineConfig) -> Result<()> {
    let final_config = config.cohort_config(&args, &DefaultsConfig::default())?;
    info!(
        "Building cohort from {:?} with mapping {:?}",
        final_config.variant_summary_path, final_config.uniprot_mapping_path
    );

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let report = workflows::cohort::run(&final_config, &reporter)?;

    if report.mapped_rows == 0 {
        warn!("Cohort is empty after filtering and mapping.");
        println!("Warning: no variants survived filtering and UniProt mapping.");
    }

    println!("Cohort funnel:");
    println!("  {:<28} {:>10}", "ClinVar rows", report.raw_rows);
    println!("  {:<28} {:>10}", format!("{} rows", final_config.assembly), report.after_assembly);
    println!("  {:<28} {:>10}", "single nucleotide variants", report.after_variant_type);
    println!("  {:<28} {:>10}", "with review criteria", report.after_review_status);
    println!("  {:<28} {:>10}", "missense", report.missense.kept);
    println!(
        "  {:<28} {:>10}",
        "pathogenic / benign",
        format!("{} / {}", report.pathogenic, report.benign)
    );
    println!("  {:<28} {:>10}", "mapped to UniProt", report.mapped_rows);
    println!(
        "✓ Mapped cohort ({} rows) written to: {}",
        report.mapped_rows,
        final_config.output_path.display()
    );
    Ok(())
}

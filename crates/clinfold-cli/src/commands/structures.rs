use crate::cli::StructuresArgs;
use crate::config::{DefaultsConfig, PartialPipelineConfig};
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use clinfold::{engine::progress::ProgressReporter, workflows};
use tracing::info;

pub fn run(args: StructuresArgs, config: PartialPipelineConfig) -> Result<()> {
    let final_config = config.structure_config(&args, &DefaultsConfig::default())?;
    info!(
        "Cross-referencing {:?} against structures in {:?} (pLDDT >= {})",
        final_config.cohort_path, final_config.structure_dir, final_config.min_plddt
    );

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let report = workflows::structures::run(&final_config, &reporter)?;

    println!(
        "Indexed {} model files for {} accessions.",
        report.files_found, report.accessions_indexed
    );
    println!("  {:<28} {:>10}", "input rows", report.input_rows);
    println!("  {:<28} {:>10}", "no structure", report.missing_structure);
    println!("  {:<28} {:>10}", "unreadable structure", report.unreadable_structure);
    println!("  {:<28} {:>10}", "residue not in model", report.missing_residue);
    println!("  {:<28} {:>10}", "low confidence", report.low_confidence);
    println!(
        "✓ Filtered cohort ({} rows) written to: {}",
        report.kept,
        final_config.output_path.display()
    );
    Ok(())
}

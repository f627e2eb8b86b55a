use crate::cli::EnergyArgs;
use crate::config::{DefaultsConfig, PartialPipelineConfig};
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use clinfold::{
    engine::{error::EngineError, foldx::FoldxTool, progress::ProgressReporter},
    workflows,
};
use tracing::{info, warn};

pub fn run(args: EnergyArgs, config: PartialPipelineConfig) -> Result<()> {
    let settings = config.energy_settings(&args, &DefaultsConfig::default())?;
    let energy_config = settings.energy;
    info!(
        "FoldX {:?}, workspace {:?}, {} worker(s)",
        settings.foldx.executable, energy_config.workspace_dir, energy_config.workers
    );

    let tool = FoldxTool::new(
        settings.foldx,
        energy_config.workspace_dir.clone(),
        energy_config.mutant_structure_dir.clone(),
    )
    .map_err(EngineError::from)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Starting ddG calculation...");
    let report = workflows::energy::run(&energy_config, &tool, &reporter)?;

    println!(
        "Cohort: {} rows, {} already recorded, {} duplicates skipped.",
        report.cohort_rows, report.already_recorded, report.duplicate_rows
    );
    println!(
        "Proteins: {} scheduled, {} repaired, {} reused from cache, {} failed repair.",
        report.proteins_scheduled,
        report.repairs_performed,
        report.repairs_cached,
        report.repairs_failed
    );
    if report.repairs_failed > 0 {
        warn!(
            "{} proteins could not be repaired; rerun to retry them.",
            report.repairs_failed
        );
    }
    if report.batch_limit_reached {
        println!("Batch limit reached; rerun to continue where this run stopped.");
    }
    println!(
        "✓ {} mutations recorded ({} ok, {} failed) in: {}",
        report.recorded_this_run(),
        report.mutations_ok,
        report.mutations_failed,
        report.results_path.display()
    );
    Ok(())
}

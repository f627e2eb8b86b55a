use crate::cli::SplitArgs;
use crate::config::{DefaultsConfig, PartialPipelineConfig};
use crate::error::Result;
use clinfold::workflows;
use tracing::info;

pub fn run(args: SplitArgs, config: PartialPipelineConfig) -> Result<()> {
    let final_config = config.split_config(&args, &DefaultsConfig::default());
    info!(
        "Splitting {:?} into {} parts",
        final_config.cohort_path, final_config.parts
    );

    let report = workflows::split::run(&final_config)?;

    println!("Sorted {} rows; high-yield proteins first.", report.rows);
    for (i, (path, rows)) in report.chunks.iter().enumerate() {
        println!("  > {} ({} rows) for worker {}", path.display(), rows, i + 1);
    }
    Ok(())
}

use crate::cli::VerifyArgs;
use crate::config::{DefaultsConfig, PartialPipelineConfig};
use crate::error::Result;
use clinfold::workflows;
use tracing::info;

pub fn run(args: VerifyArgs, config: PartialPipelineConfig) -> Result<()> {
    let inputs = config.verify_inputs(&args, &DefaultsConfig::default());
    info!("Verifying inputs: {:?}", inputs.variant_summary);

    let report = workflows::verify::run(&inputs.variant_summary, inputs.sample.as_deref())?;

    println!(
        "✓ {} loaded: {} rows with all required columns ({} malformed).",
        inputs.variant_summary.display(),
        report.variant_rows,
        report.malformed_rows
    );
    match &report.sample {
        Some(sample) if sample.plddt_in_range() => println!(
            "✓ {} parsed: {} atoms, first B-factor (pLDDT) {:.2}.",
            sample.path.display(),
            sample.atoms,
            sample.first_b_factor
        ),
        Some(sample) => println!(
            "Warning: {} has {} of {} atoms with B-factors outside 0-100.",
            sample.path.display(),
            sample.out_of_range,
            sample.atoms
        ),
        None => println!("Structure check skipped."),
    }
    Ok(())
}

use clinfold::core::models::cohort::MutationStatus;
use clinfold::engine::progress::{Progress, ProgressCallback};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 100;

/// Outcome counts for the stage currently shown.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Tally {
    ok: u64,
    failed: u64,
    repairs_failed: u64,
}

impl Tally {
    fn is_empty(&self) -> bool {
        *self == Tally::default()
    }

    fn summary(&self) -> String {
        let mut text = format!("{} ok, {} failed", self.ok, self.failed);
        if self.repairs_failed > 0 {
            text.push_str(&format!(", {} repairs failed", self.repairs_failed));
        }
        text
    }
}

struct BarState {
    bar: ProgressBar,
    protein: Option<String>,
    tally: Tally,
}

impl BarState {
    fn refresh(&self) {
        let message = match &self.protein {
            Some(protein) => format!("{} | {}", protein, self.tally.summary()),
            None => self.tally.summary(),
        };
        self.bar.set_message(message);
    }

    fn apply(&mut self, progress: Progress) {
        match progress {
            Progress::StageStart { name } => {
                self.protein = None;
                self.tally = Tally::default();
                self.bar.reset();
                self.bar.set_length(0);
                self.bar.set_style(spinner_style());
                self.bar.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                self.bar.set_message(name);
            }
            Progress::StageFinish => {
                self.bar.disable_steady_tick();
                if self.tally.is_empty() {
                    self.bar.finish_with_message("✓ Done");
                } else {
                    self.bar.finish_with_message(format!("✓ {}", self.tally.summary()));
                }
            }
            Progress::TaskStart { total_steps } => {
                self.bar.disable_steady_tick();
                self.bar.set_length(total_steps);
                self.bar.set_position(0);
                self.bar.set_style(bar_style());
            }
            Progress::TaskIncrement => self.bar.inc(1),
            Progress::TaskFinish => self.bar.finish(),
            Progress::ProteinStart { accession, pending } => {
                self.protein = Some(format!("{} ({} pending)", accession, pending));
                self.refresh();
            }
            Progress::MutationRecorded { key, status } => {
                match status {
                    MutationStatus::Ok => self.tally.ok += 1,
                    MutationStatus::Failed => {
                        self.tally.failed += 1;
                        self.bar.println(format!("  ✗ {} failed", key));
                    }
                }
                self.refresh();
            }
            Progress::RepairFailed {
                accession,
                reason,
                skipped,
            } => {
                self.tally.repairs_failed += 1;
                self.bar.println(format!(
                    "  ✗ {}: repair failed, {} mutations left pending ({})",
                    accession, skipped, reason
                ));
                self.bar.inc(skipped as u64);
                self.refresh();
            }
            Progress::Message(msg) => self.bar.println(format!("  {}", msg)),
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("[{elapsed_precise}] {bar:30.cyan/blue} {pos}/{len} (eta {eta}) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

/// Draws pipeline progress on stderr: a spinner per stage, then a bar over
/// the stage's steps whose message names the current protein and the running
/// counts of recorded and failed mutations.
#[derive(Clone)]
pub struct CliProgressHandler {
    display: Arc<Mutex<BarState>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr());
        bar.finish_and_clear();
        Self {
            display: Arc::new(Mutex::new(BarState {
                bar,
                protein: None,
                tally: Tally::default(),
            })),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let display = self.display.clone();
        Box::new(move |progress: Progress| match display.lock() {
            Ok(mut display) => display.apply(progress),
            Err(_) => warn!("Progress display mutex was poisoned. Cannot update progress."),
        })
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinfold::core::models::amino_acid::AminoAcid;
    use clinfold::core::models::cohort::MutationKey;

    fn recorded(position: u32, status: MutationStatus) -> Progress {
        Progress::MutationRecorded {
            key: MutationKey::new("P04637", AminoAcid::Arginine, position, AminoAcid::Histidine),
            status,
        }
    }

    fn energy_stage(handler: &CliProgressHandler, callback: &ProgressCallback<'static>) {
        callback(Progress::StageStart { name: "Computing ddG" });
        assert_eq!(handler.display.lock().unwrap().bar.message(), "Computing ddG");
        callback(Progress::TaskStart { total_steps: 6 });
    }

    #[test]
    fn message_tracks_protein_and_outcome_counts() {
        let handler = CliProgressHandler::new();
        let callback = handler.get_callback();
        energy_stage(&handler, &callback);

        callback(Progress::ProteinStart {
            accession: "P04637".to_string(),
            pending: 3,
        });
        for (position, status) in [(175, MutationStatus::Ok), (248, MutationStatus::Failed), (273, MutationStatus::Ok)] {
            callback(recorded(position, status));
            callback(Progress::TaskIncrement);
        }

        let display = handler.display.lock().unwrap();
        assert_eq!(display.bar.length(), Some(6));
        assert_eq!(display.bar.position(), 3);
        assert_eq!(display.bar.message(), "P04637 (3 pending) | 2 ok, 1 failed");
    }

    #[test]
    fn repair_failure_skips_the_proteins_steps() {
        let handler = CliProgressHandler::new();
        let callback = handler.get_callback();
        energy_stage(&handler, &callback);

        callback(Progress::ProteinStart {
            accession: "P38398".to_string(),
            pending: 4,
        });
        callback(Progress::RepairFailed {
            accession: "P38398".to_string(),
            reason: "FoldX exited with status 1".to_string(),
            skipped: 4,
        });
        {
            let display = handler.display.lock().unwrap();
            assert_eq!(display.bar.position(), 4);
            assert_eq!(display.tally.repairs_failed, 1);
            assert!(display.bar.message().ends_with("0 ok, 0 failed, 1 repairs failed"));
        }

        callback(Progress::TaskFinish);
        callback(Progress::StageFinish);
        let display = handler.display.lock().unwrap();
        assert!(display.bar.is_finished());
        assert_eq!(display.bar.message(), "✓ 0 ok, 0 failed, 1 repairs failed");
    }

    #[test]
    fn new_stage_resets_counts() {
        let handler = CliProgressHandler::new();
        let callback = handler.get_callback();
        energy_stage(&handler, &callback);
        callback(recorded(175, MutationStatus::Ok));
        callback(Progress::StageFinish);

        callback(Progress::StageStart { name: "Scoring residues" });
        callback(Progress::StageFinish);
        let display = handler.display.lock().unwrap();
        assert_eq!(display.tally, Tally::default());
        assert_eq!(display.bar.message(), "✓ Done");
    }
}

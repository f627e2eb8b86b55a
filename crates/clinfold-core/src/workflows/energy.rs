use crate::core::io::tables::read_table;
use crate::core::models::cohort::{DdgRecord, FilteredCohortRow, MutationStatus};
use crate::engine::cache::RepairCache;
use crate::engine::config::EnergyConfig;
use crate::engine::error::EngineError;
use crate::engine::ledger::ResultsLedger;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::schedule::{ProteinWorkload, plan};
use crate::engine::tool::{PointMutation, StabilityTool};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{error, info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnergyReport {
    pub results_path: PathBuf,
    pub cohort_rows: usize,
    pub already_recorded: usize,
    pub duplicate_rows: usize,
    pub proteins_scheduled: usize,
    pub repairs_performed: usize,
    pub repairs_cached: usize,
    pub repairs_failed: usize,
    pub mutations_ok: usize,
    pub mutations_failed: usize,
    pub batch_limit_reached: bool,
}

impl EnergyReport {
    pub fn recorded_this_run(&self) -> usize {
        self.mutations_ok + self.mutations_failed
    }
}

/// Shared counters for one run; updated from every worker.
#[derive(Default)]
struct RunState {
    repairs_performed: AtomicUsize,
    repairs_cached: AtomicUsize,
    repairs_failed: AtomicUsize,
    mutations_ok: AtomicUsize,
    mutations_failed: AtomicUsize,
    reserved: AtomicUsize,
    limit_reached: AtomicBool,
}

impl RunState {
    /// Claims one slot under the batch limit. Returns `false` once the limit
    /// has been used up, so concurrent workers never overshoot it.
    fn reserve(&self, limit: Option<usize>) -> bool {
        let Some(limit) = limit else {
            return true;
        };
        let claimed = self
            .reserved
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < limit).then_some(n + 1)
            })
            .is_ok();
        if !claimed {
            self.limit_reached.store(true, Ordering::SeqCst);
        }
        claimed
    }

    /// Marks the run as stopped when no slot is left, so proteins are not
    /// repaired for mutations that will never run.
    fn exhausted(&self, limit: Option<usize>) -> bool {
        if limit.is_some_and(|l| self.reserved.load(Ordering::SeqCst) >= l) {
            self.limit_reached.store(true, Ordering::SeqCst);
        }
        self.stopped()
    }

    fn stopped(&self) -> bool {
        self.limit_reached.load(Ordering::SeqCst)
    }
}

struct EnergyContext<'a> {
    config: &'a EnergyConfig,
    tool: &'a dyn StabilityTool,
    cache: &'a RepairCache,
    ledger: &'a ResultsLedger,
    reporter: &'a ProgressReporter<'a>,
    state: &'a RunState,
}

/// Computes ddG for every pending mutation of the filtered cohort.
///
/// Already-recorded mutations (ok or failed) are skipped, so the run can be
/// interrupted and restarted at any point. Each protein is repaired at most
/// once; a protein whose preparation or repair fails contributes no rows and
/// is retried by the next run.
///
/// # Errors
///
/// Fails if the cohort cannot be read, the results file exists but cannot be
/// parsed, or a record cannot be written.
#[instrument(skip_all, name = "energy_workflow")]
pub fn run(
    config: &EnergyConfig,
    tool: &dyn StabilityTool,
    reporter: &ProgressReporter,
) -> Result<EnergyReport, EngineError> {
    reporter.report(Progress::StageStart {
        name: "Planning",
    });
    let mut rows: Vec<FilteredCohortRow> = read_table(&config.cohort_path)?;
    if let Some(size) = config.pilot_size {
        info!("Pilot mode: processing the first {} rows only.", size);
        rows.truncate(size);
    }
    let results_path = config.active_results_path();
    let ledger = ResultsLedger::open(&results_path)?;
    let schedule = plan(&rows, |key| ledger.is_recorded(key));
    reporter.report(Progress::StageFinish);

    info!(
        rows = rows.len(),
        recorded = schedule.already_recorded,
        pending = schedule.pending_jobs(),
        proteins = schedule.workloads.len(),
        "Resuming into {:?}",
        results_path
    );
    if let Some(limit) = config.batch_limit {
        info!("Batch limit active: stopping after {} new mutations.", limit);
    }

    let cache = RepairCache::new(config.workspace_dir.clone());
    let state = RunState::default();
    let ctx = EnergyContext {
        config,
        tool,
        cache: &cache,
        ledger: &ledger,
        reporter,
        state: &state,
    };

    reporter.report(Progress::StageStart {
        name: "Computing ddG",
    });
    reporter.report(Progress::TaskStart {
        total_steps: schedule.pending_jobs() as u64,
    });
    run_workloads(&ctx, &schedule.workloads)?;
    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::StageFinish);

    let report = EnergyReport {
        results_path,
        cohort_rows: rows.len(),
        already_recorded: schedule.already_recorded,
        duplicate_rows: schedule.duplicates,
        proteins_scheduled: schedule.workloads.len(),
        repairs_performed: state.repairs_performed.load(Ordering::SeqCst),
        repairs_cached: state.repairs_cached.load(Ordering::SeqCst),
        repairs_failed: state.repairs_failed.load(Ordering::SeqCst),
        mutations_ok: state.mutations_ok.load(Ordering::SeqCst),
        mutations_failed: state.mutations_failed.load(Ordering::SeqCst),
        batch_limit_reached: state.stopped(),
    };
    info!(
        ok = report.mutations_ok,
        failed = report.mutations_failed,
        repairs = report.repairs_performed,
        cached = report.repairs_cached,
        repair_failures = report.repairs_failed,
        "Energy run complete."
    );
    Ok(report)
}

fn run_workloads(ctx: &EnergyContext, workloads: &[ProteinWorkload]) -> Result<(), EngineError> {
    #[cfg(feature = "parallel")]
    if ctx.config.workers > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(ctx.config.workers)
            .build()
            .map_err(|e| EngineError::Internal(format!("cannot start worker pool: {}", e)))?;
        info!("Processing proteins on {} workers.", ctx.config.workers);
        return pool.install(|| {
            workloads
                .par_iter()
                .try_for_each(|workload| process_protein(ctx, workload))
        });
    }
    #[cfg(not(feature = "parallel"))]
    if ctx.config.workers > 1 {
        warn!("Built without parallel support; processing proteins sequentially.");
    }

    for workload in workloads {
        if ctx.state.stopped() {
            break;
        }
        process_protein(ctx, workload)?;
    }
    Ok(())
}

fn process_protein(ctx: &EnergyContext, workload: &ProteinWorkload) -> Result<(), EngineError> {
    if ctx.state.exhausted(ctx.config.batch_limit) {
        return Ok(());
    }
    let accession = workload.accession.as_str();
    ctx.reporter.report(Progress::ProteinStart {
        accession: accession.to_string(),
        pending: workload.jobs.len(),
    });
    info!("Processing {} ({} mutations)", accession, workload.jobs.len());

    let source = ctx.config.structure_dir.join(&workload.structure_file);
    let repaired = match ctx.cache.get_or_repair(ctx.tool, accession, &source) {
        Ok(repaired) => repaired,
        Err(e) => {
            error!("Repair of {} failed, skipping protein: {}", accession, e);
            ctx.state.repairs_failed.fetch_add(1, Ordering::SeqCst);
            ctx.reporter.report(Progress::RepairFailed {
                accession: accession.to_string(),
                reason: e.to_string(),
                skipped: workload.jobs.len(),
            });
            return Ok(());
        }
    };
    if repaired.cached {
        ctx.state.repairs_cached.fetch_add(1, Ordering::SeqCst);
    } else {
        ctx.state.repairs_performed.fetch_add(1, Ordering::SeqCst);
    }

    for job in &workload.jobs {
        if !ctx.state.reserve(ctx.config.batch_limit) {
            info!("Batch limit reached; stopping.");
            break;
        }
        let mutation = PointMutation::on_chain_a(job.protein_change());
        let record = match ctx.tool.evaluate_mutation(accession, &repaired.path, &mutation) {
            Ok(outcome) => {
                let mutant_file = outcome
                    .mutant_structure
                    .as_deref()
                    .and_then(|p| p.file_name())
                    .map(|n| n.to_string_lossy().into_owned());
                DdgRecord::succeeded(job, outcome.ddg, mutant_file)
            }
            Err(e) => {
                warn!("Mutation {} on {} failed: {}", mutation, accession, e);
                DdgRecord::failed(job)
            }
        };
        ctx.ledger.append(&record)?;

        match record.status {
            MutationStatus::Ok => ctx.state.mutations_ok.fetch_add(1, Ordering::SeqCst),
            MutationStatus::Failed => ctx.state.mutations_failed.fetch_add(1, Ordering::SeqCst),
        };
        ctx.reporter.report(Progress::MutationRecorded {
            key: record.key(),
            status: record.status,
        });
        ctx.reporter.report(Progress::TaskIncrement);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::tables::{FILTERED_COHORT_HEADER, write_table};
    use crate::core::models::amino_acid::AminoAcid::*;
    use crate::core::models::cohort::fixtures::filtered_row;
    use crate::engine::config::EnergyConfigBuilder;
    use crate::engine::tool::fake::FakeTool;
    use std::fs;
    use std::path::Path;

    const MODEL: &str = "\
ATOM      1  CA  MET A   1       0.000   0.000   0.000  1.00 90.00           C
ATOM      2  CA  GLU A   2       3.800   0.000   0.000  1.00 91.00           C
END
";

    struct Fixture {
        _dir: tempfile::TempDir,
        root: PathBuf,
    }

    impl Fixture {
        fn new(rows: &[FilteredCohortRow]) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let root = dir.path().to_path_buf();
            fs::create_dir(root.join("af")).unwrap();
            for row in rows {
                fs::write(root.join("af").join(&row.structure_file), MODEL).unwrap();
            }
            write_table(&root.join("cohort_filtered.csv"), rows, FILTERED_COHORT_HEADER).unwrap();
            Self { _dir: dir, root }
        }

        fn config(&self) -> EnergyConfigBuilder {
            EnergyConfigBuilder::new()
                .cohort_path(self.root.join("cohort_filtered.csv"))
                .structure_dir(self.root.join("af"))
                .results_path(self.root.join("cohort_with_ddg.csv"))
                .workspace_dir(self.root.join("ws"))
        }

        fn results(&self, path: &Path) -> Vec<DdgRecord> {
            read_table(path).unwrap()
        }
    }

    /// Four proteins with 1, 2, 1, and 1 mutations.
    fn four_proteins() -> Vec<FilteredCohortRow> {
        vec![
            filtered_row("P1", Arginine, 175, Histidine),
            filtered_row("P2", Leucine, 8, Proline),
            filtered_row("P2", Glycine, 12, Valine),
            filtered_row("P3", Alanine, 30, Threonine),
            filtered_row("P4", Cysteine, 61, Glycine),
        ]
    }

    #[test]
    fn failing_mutation_is_recorded_and_every_protein_repaired_once() {
        let fixture = Fixture::new(&four_proteins());
        let config = fixture.config().build().unwrap();
        let tool = FakeTool::new()
            .fail_mutation("P4_C61G")
            .with_ddg("P1_R175H", 2.3371);

        let report = run(&config, &tool, &ProgressReporter::new()).unwrap();

        let records = fixture.results(&config.results_path);
        assert_eq!(records.len(), 5);
        assert_eq!(records.iter().filter(|r| r.ddg.is_some()).count(), 4);
        let failed: Vec<_> = records
            .iter()
            .filter(|r| r.status == MutationStatus::Failed)
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].key().as_str(), "P4_Cys61Gly");
        assert_eq!(failed[0].ddg, None);
        assert_eq!(tool.repairs(), 4);
        assert_eq!(report.repairs_performed, 4);
        assert_eq!(report.mutations_ok, 4);
        assert_eq!(report.mutations_failed, 1);

        let p1 = records.iter().find(|r| r.uniprot_id == "P1").unwrap();
        assert_eq!(p1.ddg, Some(2.3371));
    }

    #[test]
    fn rerun_skips_recorded_mutations_and_keeps_values() {
        let fixture = Fixture::new(&four_proteins());
        let config = fixture.config().build().unwrap();
        let first_tool = FakeTool::new().with_ddg("P2_L8P", -0.75);
        run(&config, &first_tool, &ProgressReporter::new()).unwrap();
        let before = fixture.results(&config.results_path);

        let second_tool = FakeTool::new().with_ddg("P2_L8P", 99.0);
        let report = run(&config, &second_tool, &ProgressReporter::new()).unwrap();

        assert_eq!(second_tool.mutations(), 0);
        assert_eq!(second_tool.repairs(), 0);
        assert_eq!(report.already_recorded, 5);
        assert_eq!(report.recorded_this_run(), 0);
        assert_eq!(fixture.results(&config.results_path), before);
    }

    #[test]
    fn interrupted_run_resumes_only_pending_jobs() {
        let fixture = Fixture::new(&four_proteins());
        let limited = fixture.config().batch_limit(Some(2)).build().unwrap();
        let tool = FakeTool::new();
        let first = run(&limited, &tool, &ProgressReporter::new()).unwrap();
        assert!(first.batch_limit_reached);
        assert_eq!(first.recorded_this_run(), 2);
        let partial = fixture.results(&limited.results_path);
        assert_eq!(partial.len(), 2);

        let config = fixture.config().build().unwrap();
        let resumed = FakeTool::new();
        let second = run(&config, &resumed, &ProgressReporter::new()).unwrap();
        assert_eq!(second.already_recorded, 2);
        assert_eq!(resumed.mutations(), 3);

        let all = fixture.results(&config.results_path);
        assert_eq!(all.len(), 5);
        assert_eq!(&all[..2], &partial[..]);
        let mut keys: Vec<_> = all.iter().map(|r| r.key()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 5);
    }

    #[test]
    fn failed_repair_records_nothing_for_that_protein() {
        let fixture = Fixture::new(&four_proteins());
        let config = fixture.config().build().unwrap();
        let tool = FakeTool::new().fail_repair("P2");

        let skipped = std::sync::Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::RepairFailed { accession, skipped: n, .. } = event {
                skipped.lock().unwrap().push((accession, n));
            }
        }));
        let report = run(&config, &tool, &reporter).unwrap();
        drop(reporter);
        assert_eq!(report.repairs_failed, 1);
        assert_eq!(skipped.into_inner().unwrap(), vec![("P2".to_string(), 2)]);
        let records = fixture.results(&config.results_path);
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.uniprot_id != "P2"));

        let retry = FakeTool::new();
        run(&config, &retry, &ProgressReporter::new()).unwrap();
        assert_eq!(retry.repairs(), 1);
        assert_eq!(retry.mutations(), 2);
        assert_eq!(fixture.results(&config.results_path).len(), 5);
    }

    #[test]
    fn repaired_structures_are_reused_across_runs() {
        let fixture = Fixture::new(&four_proteins());
        let config = fixture.config().build().unwrap();
        run(&config, &FakeTool::new(), &ProgressReporter::new()).unwrap();

        let other = fixture.config().results_path(fixture.root.join("second.csv")).build().unwrap();
        let tool = FakeTool::new();
        let report = run(&other, &tool, &ProgressReporter::new()).unwrap();
        assert_eq!(tool.repairs(), 0);
        assert_eq!(report.repairs_cached, 4);
        assert_eq!(tool.mutations(), 5);
    }

    #[test]
    fn pilot_run_uses_separate_results_file() {
        let fixture = Fixture::new(&four_proteins());
        let config = fixture.config().pilot_size(Some(2)).build().unwrap();
        let report = run(&config, &FakeTool::new(), &ProgressReporter::new()).unwrap();

        assert_eq!(report.results_path, fixture.root.join("cohort_with_ddg_pilot.csv"));
        assert_eq!(fixture.results(&report.results_path).len(), 2);
        assert!(!config.results_path.exists());
    }

    #[test]
    fn parallel_workers_repair_each_protein_once() {
        let mut rows = four_proteins();
        for i in 0..6 {
            rows.push(filtered_row("P2", Serine, 100 + i, Alanine));
        }
        let fixture = Fixture::new(&rows);
        let config = fixture.config().workers(4).build().unwrap();
        let tool = FakeTool::new();

        let report = run(&config, &tool, &ProgressReporter::new()).unwrap();
        assert_eq!(tool.repairs(), 4);
        assert_eq!(report.mutations_ok, 11);
        assert_eq!(fixture.results(&config.results_path).len(), 11);
    }

    #[test]
    fn parallel_batch_limit_is_exact() {
        let mut rows = four_proteins();
        for i in 0..6 {
            rows.push(filtered_row("P3", Serine, 200 + i, Alanine));
        }
        let fixture = Fixture::new(&rows);
        let config = fixture.config().workers(3).batch_limit(Some(4)).build().unwrap();
        let report = run(&config, &FakeTool::new(), &ProgressReporter::new()).unwrap();

        assert_eq!(report.recorded_this_run(), 4);
        assert_eq!(fixture.results(&config.results_path).len(), 4);
    }

    #[test]
    fn unreadable_results_file_aborts_before_any_work() {
        let fixture = Fixture::new(&four_proteins());
        let config = fixture.config().build().unwrap();
        fs::write(&config.results_path, "not,a\nresults,table,at,all\n").unwrap();
        let tool = FakeTool::new();

        assert!(matches!(
            run(&config, &tool, &ProgressReporter::new()),
            Err(EngineError::UnreadableResults { .. })
        ));
        assert_eq!(tool.repairs(), 0);
    }
}

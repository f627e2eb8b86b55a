use super::error::EngineError;
use crate::core::io::tables::{RESULTS_HEADER, TableError, ensure_parent_dir, read_table};
use crate::core::models::cohort::{DdgRecord, MutationKey, MutationStatus};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};

/// The append-only results table and the set of mutation keys it already holds.
///
/// The file on disk is the only durable state of an energy run: every record is
/// flushed as soon as it is appended, and reopening the ledger recovers exactly
/// what was written.
#[derive(Debug)]
pub struct ResultsLedger {
    path: PathBuf,
    completed: HashSet<MutationKey>,
    previously_failed: usize,
    writer: Mutex<csv::Writer<File>>,
}

impl ResultsLedger {
    /// Opens `path` for appending, loading the keys of every existing record.
    ///
    /// # Errors
    ///
    /// A file that exists but cannot be parsed as a results table is reported
    /// as [`EngineError::UnreadableResults`] and left untouched.
    pub fn open(path: &Path) -> Result<Self, EngineError> {
        ensure_parent_dir(path)?;
        let has_content = path
            .metadata()
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false);

        let mut completed = HashSet::new();
        let mut previously_failed = 0;
        if has_content {
            let records = load_records(path)?;
            repair_trailing_newline(path)?;
            for record in &records {
                if record.status == MutationStatus::Failed {
                    previously_failed += 1;
                }
                completed.insert(record.key());
            }
            info!(
                recorded = completed.len(),
                failed = previously_failed,
                "Resuming from existing results file {:?}",
                path
            );
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| TableError::io(path, e))?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        if !has_content {
            writer
                .write_record(RESULTS_HEADER)
                .map_err(|e| TableError::csv(path, e))?;
            writer.flush().map_err(|e| TableError::io(path, e))?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            completed,
            previously_failed,
            writer: Mutex::new(writer),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_recorded(&self, key: &MutationKey) -> bool {
        self.completed.contains(key)
    }

    /// Number of distinct keys present when the ledger was opened.
    pub fn recorded_count(&self) -> usize {
        self.completed.len()
    }

    pub fn previously_failed(&self) -> usize {
        self.previously_failed
    }

    /// Appends one record and flushes it to disk before returning.
    pub fn append(&self, record: &DdgRecord) -> Result<(), EngineError> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| EngineError::Internal("results writer poisoned".into()))?;
        writer
            .serialize(record)
            .map_err(|e| TableError::csv(&self.path, e))?;
        writer.flush().map_err(|e| TableError::io(&self.path, e))?;
        Ok(())
    }
}

/// Loads every record of an existing results file.
///
/// A run killed mid-write can leave a partial last row. When everything up to
/// the last complete line parses, the partial row is cut off and that mutation
/// is simply computed again. Any other damage is fatal and the file is left as
/// it was.
fn load_records(path: &Path) -> Result<Vec<DdgRecord>, EngineError> {
    let error = match read_table::<DdgRecord>(path) {
        Ok(records) => return Ok(records),
        Err(error) => error,
    };
    let unreadable = || EngineError::UnreadableResults {
        path: path.to_path_buf(),
        reason: error.to_string(),
    };

    let content = std::fs::read(path).map_err(|e| TableError::io(path, e))?;
    let Some(prefix) = complete_prefix(&content) else {
        return Err(unreadable());
    };
    let Some(records) = parse_results(prefix) else {
        return Err(unreadable());
    };

    warn!(
        dropped_bytes = content.len() - prefix.len(),
        "Results file {:?} ends in a partial record ({}); truncating it.",
        path,
        error
    );
    let file = OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(|e| TableError::io(path, e))?;
    file.set_len(prefix.len() as u64)
        .map_err(|e| TableError::io(path, e))?;
    Ok(records)
}

/// Everything before the final line, or `None` when there is only one line.
fn complete_prefix(content: &[u8]) -> Option<&[u8]> {
    let body = content.strip_suffix(b"\n").unwrap_or(content);
    let end = body.iter().rposition(|&b| b == b'\n')?;
    Some(&content[..=end])
}

/// Parses a results table held in memory, requiring the exact results header.
fn parse_results(content: &[u8]) -> Option<Vec<DdgRecord>> {
    let mut reader = csv::Reader::from_reader(content);
    let headers = reader.headers().ok()?;
    if !headers.iter().eq(RESULTS_HEADER.iter().copied()) {
        return None;
    }
    reader.deserialize().collect::<Result<Vec<_>, _>>().ok()
}

/// Terminates a final line left unterminated by an interrupted write, so the
/// next record starts on its own line.
fn repair_trailing_newline(path: &Path) -> Result<(), EngineError> {
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|e| TableError::io(path, e))?;
    let len = file.seek(SeekFrom::End(0)).map_err(|e| TableError::io(path, e))?;
    if len == 0 {
        return Ok(());
    }
    file.seek(SeekFrom::End(-1))
        .map_err(|e| TableError::io(path, e))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)
        .map_err(|e| TableError::io(path, e))?;
    if last[0] != b'\n' {
        warn!("Results file {:?} did not end with a newline; fixing.", path);
        file.write_all(b"\n").map_err(|e| TableError::io(path, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::amino_acid::AminoAcid;
    use crate::core::models::cohort::fixtures::filtered_row;
    use std::fs;

    fn r175h() -> DdgRecord {
        DdgRecord::succeeded(
            &filtered_row("P04637", AminoAcid::Arginine, 175, AminoAcid::Histidine),
            -1.25,
            None,
        )
    }

    #[test]
    fn new_file_gets_header_then_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/cohort_with_ddg.csv");
        let ledger = ResultsLedger::open(&path).unwrap();
        assert_eq!(ledger.recorded_count(), 0);
        ledger.append(&r175h()).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().next().unwrap(), RESULTS_HEADER.join(","));
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn reopening_recovers_keys_without_second_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        let failed = DdgRecord::failed(&filtered_row("P1", AminoAcid::Leucine, 8, AminoAcid::Proline));
        {
            let ledger = ResultsLedger::open(&path).unwrap();
            ledger.append(&r175h()).unwrap();
            ledger.append(&failed).unwrap();
        }
        let ledger = ResultsLedger::open(&path).unwrap();
        assert_eq!(ledger.recorded_count(), 2);
        assert_eq!(ledger.previously_failed(), 1);
        assert!(ledger.is_recorded(&r175h().key()));
        assert!(ledger.is_recorded(&failed.key()));

        let extra = DdgRecord::succeeded(&filtered_row("P2", AminoAcid::Glycine, 12, AminoAcid::Valine), 0.5, None);
        ledger.append(&extra).unwrap();
        let records: Vec<DdgRecord> = read_table(&path).unwrap();
        assert_eq!(records, vec![r175h(), failed, extra]);
    }

    #[test]
    fn missing_trailing_newline_is_repaired_before_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        {
            let ledger = ResultsLedger::open(&path).unwrap();
            ledger.append(&r175h()).unwrap();
        }
        let text = fs::read_to_string(&path).unwrap();
        fs::write(&path, text.trim_end_matches('\n')).unwrap();

        let ledger = ResultsLedger::open(&path).unwrap();
        assert_eq!(ledger.recorded_count(), 1);
        let next = DdgRecord::failed(&filtered_row("P3", AminoAcid::Serine, 3, AminoAcid::Alanine));
        ledger.append(&next).unwrap();

        let records: Vec<DdgRecord> = read_table(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1], next);
    }

    #[test]
    fn unparseable_results_file_is_fatal_and_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        let garbage = "UniProtID,ddG\nP1,not-a-number";
        fs::write(&path, garbage).unwrap();

        assert!(matches!(
            ResultsLedger::open(&path),
            Err(EngineError::UnreadableResults { .. })
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), garbage);
    }

    #[test]
    fn partial_last_record_is_dropped_and_recomputed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        let second = DdgRecord::succeeded(&filtered_row("P2", AminoAcid::Glycine, 12, AminoAcid::Valine), 0.5, None);
        {
            let ledger = ResultsLedger::open(&path).unwrap();
            ledger.append(&r175h()).unwrap();
            ledger.append(&second).unwrap();
        }
        let text = fs::read_to_string(&path).unwrap();
        let cut = text.len() - 12;
        fs::write(&path, &text[..cut]).unwrap();

        let ledger = ResultsLedger::open(&path).unwrap();
        assert_eq!(ledger.recorded_count(), 1);
        assert!(ledger.is_recorded(&r175h().key()));
        assert!(!ledger.is_recorded(&second.key()));

        ledger.append(&second).unwrap();
        let records: Vec<DdgRecord> = read_table(&path).unwrap();
        assert_eq!(records, vec![r175h(), second]);
    }

    #[test]
    fn damage_before_the_last_line_is_still_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        {
            let ledger = ResultsLedger::open(&path).unwrap();
            ledger.append(&r175h()).unwrap();
            ledger.append(&r175h()).unwrap();
        }
        let text = fs::read_to_string(&path).unwrap();
        let damaged = text.replacen(",-1.25,", ",oops,", 1);
        let damaged = &damaged[..damaged.len() - 5];
        fs::write(&path, damaged).unwrap();

        assert!(matches!(
            ResultsLedger::open(&path),
            Err(EngineError::UnreadableResults { .. })
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), damaged);
    }

    #[test]
    fn empty_existing_file_is_treated_as_new() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        fs::write(&path, "").unwrap();
        let ledger = ResultsLedger::open(&path).unwrap();
        ledger.append(&r175h()).unwrap();
        let records: Vec<DdgRecord> = read_table(&path).unwrap();
        assert_eq!(records, vec![r175h()]);
    }
}

use crate::core::models::cohort::{FilteredCohortRow, MutationKey};
use std::collections::{HashMap, HashSet};

/// All pending mutations of one protein, processed against one repaired
/// structure.
#[derive(Debug, Clone, PartialEq)]
pub struct ProteinWorkload {
    pub accession: String,
    pub structure_file: String,
    pub jobs: Vec<FilteredCohortRow>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schedule {
    pub workloads: Vec<ProteinWorkload>,
    /// Rows whose key is already in the results table.
    pub already_recorded: usize,
    /// Rows repeating a key seen earlier in the cohort.
    pub duplicates: usize,
}

impl Schedule {
    pub fn pending_jobs(&self) -> usize {
        self.workloads.iter().map(|w| w.jobs.len()).sum()
    }
}

/// Groups the still-pending rows by accession, highest-yield protein first.
///
/// A row is pending when `is_recorded` says its key is absent and no earlier
/// row shares its key. Proteins without pending rows are left out entirely.
pub fn plan(rows: &[FilteredCohortRow], is_recorded: impl Fn(&MutationKey) -> bool) -> Schedule {
    let mut schedule = Schedule::default();
    let mut seen: HashSet<MutationKey> = HashSet::new();
    let mut by_accession: HashMap<&str, ProteinWorkload> = HashMap::new();

    for row in rows {
        let key = row.key();
        if is_recorded(&key) {
            schedule.already_recorded += 1;
            continue;
        }
        if !seen.insert(key) {
            schedule.duplicates += 1;
            continue;
        }
        by_accession
            .entry(row.uniprot_id.as_str())
            .or_insert_with(|| ProteinWorkload {
                accession: row.uniprot_id.clone(),
                structure_file: row.structure_file.clone(),
                jobs: Vec::new(),
            })
            .jobs
            .push(row.clone());
    }

    let mut workloads: Vec<ProteinWorkload> = by_accession.into_values().collect();
    workloads.sort_by(|a, b| {
        b.jobs
            .len()
            .cmp(&a.jobs.len())
            .then_with(|| a.accession.cmp(&b.accession))
    });
    schedule.workloads = workloads;
    schedule
}

/// Stable-sorts rows so that proteins with the most mutations come first,
/// ties broken by accession.
pub fn order_by_yield(rows: &[FilteredCohortRow]) -> Vec<FilteredCohortRow> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for row in rows {
        *counts.entry(row.uniprot_id.as_str()).or_default() += 1;
    }
    let mut ordered: Vec<&FilteredCohortRow> = rows.iter().collect();
    ordered.sort_by(|a, b| {
        let count = |r: &FilteredCohortRow| counts.get(r.uniprot_id.as_str()).copied().unwrap_or(0);
        count(b)
            .cmp(&count(a))
            .then_with(|| a.uniprot_id.cmp(&b.uniprot_id))
    });
    ordered.into_iter().cloned().collect()
}

/// Cuts `rows` into `parts` contiguous chunks whose sizes differ by at most
/// one, larger chunks first. Chunks may be empty when `parts` exceeds the row
/// count.
pub fn split_into_chunks<T: Clone>(rows: &[T], parts: usize) -> Vec<Vec<T>> {
    if parts == 0 {
        return Vec::new();
    }
    let base = rows.len() / parts;
    let extra = rows.len() % parts;
    let mut chunks = Vec::with_capacity(parts);
    let mut start = 0;
    for i in 0..parts {
        let len = base + usize::from(i < extra);
        chunks.push(rows[start..start + len].to_vec());
        start += len;
    }
    chunks
}

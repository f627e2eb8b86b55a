use super::clinvar::{column_indices, tsv_reader};
use super::tables::TableError;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

pub const REQUIRED_COLUMNS: [&str; 2] = ["Entry", "Gene Names"];

/// Gene symbol to UniProt accessions, in table order.
///
/// A symbol can resolve to several accessions; each becomes its own candidate
/// target when joined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniprotMapping {
    by_gene: HashMap<String, Vec<String>>,
}

impl UniprotMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `accession` under the first whitespace-separated token of
    /// `gene_names`. Entries with no gene name are ignored.
    pub fn insert(&mut self, accession: &str, gene_names: &str) {
        let accession = accession.trim();
        let Some(primary) = gene_names.split_whitespace().next() else {
            return;
        };
        if accession.is_empty() {
            return;
        }
        let entries = self.by_gene.entry(primary.to_string()).or_default();
        if !entries.iter().any(|a| a == accession) {
            entries.push(accession.to_string());
        }
    }

    pub fn accessions(&self, gene_symbol: &str) -> &[String] {
        self.by_gene
            .get(gene_symbol)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn gene_count(&self) -> usize {
        self.by_gene.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_gene.is_empty()
    }
}

/// Loads a tab-separated UniProt export with `Entry` and `Gene Names` columns.
pub fn read_uniprot_mapping(path: &Path) -> Result<UniprotMapping, TableError> {
    let mut reader = tsv_reader(path)?;
    let headers = reader.headers().map_err(|e| TableError::csv(path, e))?.clone();
    let [entry, gene_names] = column_indices(path, &headers, &REQUIRED_COLUMNS)?;

    let mut mapping = UniprotMapping::new();
    for record in reader.records().flatten() {
        if let (Some(accession), Some(genes)) = (record.get(entry), record.get(gene_names)) {
            mapping.insert(accession, genes);
        }
    }
    debug!(genes = mapping.gene_count(), "Loaded UniProt mapping from {:?}", path);
    Ok(mapping)
}

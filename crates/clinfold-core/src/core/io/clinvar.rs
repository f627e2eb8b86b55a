use super::tables::TableError;
use super::traits::is_gzipped;
use crate::core::models::variant::VariantRecord;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Columns of `variant_summary.txt` the cohort filter depends on.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "Name",
    "GeneSymbol",
    "Chromosome",
    "Assembly",
    "Type",
    "ReviewStatus",
    "ClinicalSignificance",
];

/// The loaded ground-truth table.
#[derive(Debug, Clone, Default)]
pub struct VariantTable {
    pub records: Vec<VariantRecord>,
    /// Rows that could not be read (too few fields, invalid encoding).
    pub malformed_rows: usize,
}

/// Builds the tab-separated reader used for ClinVar and UniProt exports.
///
/// Neither format quotes fields, and ClinVar names may contain literal quotes.
/// Files ending in `.gz` are decompressed while reading, which is how the
/// ClinVar FTP site distributes `variant_summary.txt`.
pub(crate) fn tsv_reader(path: &Path) -> Result<csv::Reader<Box<dyn Read>>, TableError> {
    let file = File::open(path).map_err(|e| TableError::io(path, e))?;
    let source: Box<dyn Read> = if is_gzipped(path) {
        Box::new(BufReader::new(MultiGzDecoder::new(file)))
    } else {
        Box::new(file)
    };
    Ok(csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .from_reader(source))
}

/// Resolves the positions of `required` in a header, tolerating ClinVar's
/// leading `#` on the first column.
pub(crate) fn column_indices<const N: usize>(
    path: &Path,
    headers: &csv::StringRecord,
    required: &[&str; N],
) -> Result<[usize; N], TableError> {
    let position = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().trim_start_matches('#') == name)
    };
    let missing: Vec<String> = required
        .iter()
        .filter(|name| position(name).is_none())
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(TableError::MissingColumns {
            path: path.to_path_buf(),
            columns: missing,
        });
    }
    let mut indices = [0usize; N];
    for (slot, name) in indices.iter_mut().zip(required.iter()) {
        *slot = position(name).unwrap_or_default();
    }
    Ok(indices)
}

/// Loads the ClinVar variant summary in full.
///
/// # Errors
///
/// Fails if the file cannot be opened, its header cannot be read, or any of
/// [`REQUIRED_COLUMNS`] is absent. Individual unreadable rows are counted in
/// [`VariantTable::malformed_rows`] instead.
pub fn read_variant_summary(path: &Path) -> Result<VariantTable, TableError> {
    let mut reader = tsv_reader(path)?;
    let headers = reader.headers().map_err(|e| TableError::csv(path, e))?.clone();
    let [name, gene, chromosome, assembly, variant_type, review, significance] =
        column_indices(path, &headers, &REQUIRED_COLUMNS)?;

    let mut table = VariantTable::default();
    for result in reader.records() {
        let Ok(record) = result else {
            table.malformed_rows += 1;
            continue;
        };
        let field = |i: usize| record.get(i).map(str::to_string);
        let parsed = (|| {
            Some(VariantRecord {
                name: field(name)?,
                gene_symbol: field(gene)?,
                chromosome: field(chromosome)?,
                assembly: field(assembly)?,
                variant_type: field(variant_type)?,
                review_status: field(review)?,
                clinical_significance: field(significance)?,
            })
        })();
        match parsed {
            Some(variant) => table.records.push(variant),
            None => table.malformed_rows += 1,
        }
    }

    debug!(
        rows = table.records.len(),
        malformed = table.malformed_rows,
        "Loaded variant summary from {:?}",
        path
    );
    Ok(table)
}

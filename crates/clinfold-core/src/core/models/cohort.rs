use super::amino_acid::AminoAcid;
use super::variant::{ClinicalClass, ProteinChange};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A ClinVar missense variant joined to one candidate UniProt accession.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedCohortRow {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "GeneSymbol")]
    pub gene_symbol: String,
    #[serde(rename = "UniProtID")]
    pub uniprot_id: String,
    #[serde(rename = "Chromosome")]
    pub chromosome: String,
    #[serde(rename = "WildType")]
    pub wild_type: AminoAcid,
    #[serde(rename = "ResidueIndex")]
    pub residue_index: u32,
    #[serde(rename = "MutantAA")]
    pub mutant: AminoAcid,
    #[serde(rename = "Class")]
    pub class: ClinicalClass,
    #[serde(rename = "ReviewStatus")]
    pub review_status: String,
}

impl MappedCohortRow {
    pub fn protein_change(&self) -> ProteinChange {
        ProteinChange {
            wild_type: self.wild_type,
            position: self.residue_index,
            mutant: self.mutant,
        }
    }
}

/// A mapped row that has a structure file and passed the confidence cutoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredCohortRow {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "GeneSymbol")]
    pub gene_symbol: String,
    #[serde(rename = "UniProtID")]
    pub uniprot_id: String,
    #[serde(rename = "Chromosome")]
    pub chromosome: String,
    #[serde(rename = "WildType")]
    pub wild_type: AminoAcid,
    #[serde(rename = "ResidueIndex")]
    pub residue_index: u32,
    #[serde(rename = "MutantAA")]
    pub mutant: AminoAcid,
    #[serde(rename = "Class")]
    pub class: ClinicalClass,
    #[serde(rename = "ReviewStatus")]
    pub review_status: String,
    #[serde(rename = "StructureFile")]
    pub structure_file: String,
    #[serde(rename = "pLDDT")]
    pub plddt: f64,
}

impl FilteredCohortRow {
    pub fn from_mapped(row: MappedCohortRow, structure_file: String, plddt: f64) -> Self {
        Self {
            name: row.name,
            gene_symbol: row.gene_symbol,
            uniprot_id: row.uniprot_id,
            chromosome: row.chromosome,
            wild_type: row.wild_type,
            residue_index: row.residue_index,
            mutant: row.mutant,
            class: row.class,
            review_status: row.review_status,
            structure_file,
            plddt,
        }
    }

    pub fn protein_change(&self) -> ProteinChange {
        ProteinChange {
            wild_type: self.wild_type,
            position: self.residue_index,
            mutant: self.mutant,
        }
    }

    pub fn key(&self) -> MutationKey {
        MutationKey::new(&self.uniprot_id, self.wild_type, self.residue_index, self.mutant)
    }
}

/// Identity of a mutation job across runs: `<UniProtID>_<WT><Index><MUT>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MutationKey(String);

impl MutationKey {
    pub fn new(uniprot_id: &str, wild_type: AminoAcid, position: u32, mutant: AminoAcid) -> Self {
        Self(format!("{}_{}{}{}", uniprot_id, wild_type, position, mutant))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MutationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationStatus {
    Ok,
    Failed,
}

/// One row of the ddG results table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DdgRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "GeneSymbol")]
    pub gene_symbol: String,
    #[serde(rename = "UniProtID")]
    pub uniprot_id: String,
    #[serde(rename = "Chromosome")]
    pub chromosome: String,
    #[serde(rename = "WildType")]
    pub wild_type: AminoAcid,
    #[serde(rename = "ResidueIndex")]
    pub residue_index: u32,
    #[serde(rename = "MutantAA")]
    pub mutant: AminoAcid,
    #[serde(rename = "Class")]
    pub class: ClinicalClass,
    #[serde(rename = "ReviewStatus")]
    pub review_status: String,
    #[serde(rename = "StructureFile")]
    pub structure_file: String,
    #[serde(rename = "pLDDT")]
    pub plddt: f64,
    #[serde(rename = "ddG")]
    pub ddg: Option<f64>,
    #[serde(rename = "Status")]
    pub status: MutationStatus,
    #[serde(rename = "MutantStructureFile")]
    pub mutant_structure_file: Option<String>,
}

impl DdgRecord {
    pub fn succeeded(row: &FilteredCohortRow, ddg: f64, mutant_structure_file: Option<String>) -> Self {
        Self::from_row(row, Some(ddg), MutationStatus::Ok, mutant_structure_file)
    }

    pub fn failed(row: &FilteredCohortRow) -> Self {
        Self::from_row(row, None, MutationStatus::Failed, None)
    }

    fn from_row(
        row: &FilteredCohortRow,
        ddg: Option<f64>,
        status: MutationStatus,
        mutant_structure_file: Option<String>,
    ) -> Self {
        Self {
            name: row.name.clone(),
            gene_symbol: row.gene_symbol.clone(),
            uniprot_id: row.uniprot_id.clone(),
            chromosome: row.chromosome.clone(),
            wild_type: row.wild_type,
            residue_index: row.residue_index,
            mutant: row.mutant,
            class: row.class,
            review_status: row.review_status.clone(),
            structure_file: row.structure_file.clone(),
            plddt: row.plddt,
            ddg,
            status,
            mutant_structure_file,
        }
    }

    pub fn key(&self) -> MutationKey {
        MutationKey::new(&self.uniprot_id, self.wild_type, self.residue_index, self.mutant)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn filtered_row(uniprot_id: &str, wt: AminoAcid, pos: u32, mt: AminoAcid) -> FilteredCohortRow {
        FilteredCohortRow {
            name: format!("NM_000000.1({}):c.1A>G (p.{}{}{})", uniprot_id, wt, pos, mt),
            gene_symbol: format!("GENE_{}", uniprot_id),
            uniprot_id: uniprot_id.to_string(),
            chromosome: "17".to_string(),
            wild_type: wt,
            residue_index: pos,
            mutant: mt,
            class: ClinicalClass::Pathogenic,
            review_status: "criteria provided, single submitter".to_string(),
            structure_file: format!("AF-{}-F1-model_v4.pdb", uniprot_id),
            plddt: 91.5,
        }
    }
}

use super::amino_acid::{AminoAcid, STOP_TOKEN};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static PROTEIN_CHANGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"p\.([A-Z][a-z]{2})(\d+)([A-Z][a-z]{2})").expect("static pattern is valid")
});

/// One row of the ClinVar ground-truth table, restricted to the columns the
/// cohort filter consults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRecord {
    pub name: String,                  // HGVS description, e.g. "NM_000546.6(TP53):c.524G>A (p.Arg175His)"
    pub gene_symbol: String,           // Gene symbol (e.g., "TP53")
    pub chromosome: String,            // Chromosome label as written by ClinVar
    pub assembly: String,              // Genome assembly (e.g., "GRCh38")
    pub variant_type: String,          // Variant type (e.g., "single nucleotide variant")
    pub review_status: String,         // Review-status tier
    pub clinical_significance: String, // Free-text clinical significance label
}

/// The binary clinical label carried into the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClinicalClass {
    Pathogenic,
    Benign,
}

impl ClinicalClass {
    /// Collapses a ClinVar significance string into the binary label.
    ///
    /// Labels mentioning both directions, or any conflict, are discarded, as
    /// are uncertain or unrelated labels.
    pub fn from_significance(significance: &str) -> Option<Self> {
        let sig = significance.to_lowercase();
        if sig.contains("conflict") {
            return None;
        }
        match (sig.contains("pathogenic"), sig.contains("benign")) {
            (true, false) => Some(ClinicalClass::Pathogenic),
            (false, true) => Some(ClinicalClass::Benign),
            _ => None,
        }
    }
}

impl fmt::Display for ClinicalClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClinicalClass::Pathogenic => f.write_str("Pathogenic"),
            ClinicalClass::Benign => f.write_str("Benign"),
        }
    }
}

/// A single-residue substitution parsed from an HGVS `p.` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProteinChange {
    pub wild_type: AminoAcid,
    pub position: u32,
    pub mutant: AminoAcid,
}

impl fmt::Display for ProteinChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p.{}{}{}", self.wild_type, self.position, self.mutant)
    }
}

/// What the `p.` token of a variant name says about the protein.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Missense(ProteinChange),
    Nonsense,
    Silent,
    /// No `p.Aaa<n>Bbb` token, or a token with codes outside the standard twenty.
    Unrecognized,
}

/// Classifies the first `p.<Aaa><n><Bbb>` token found in `name`.
pub fn classify_protein_change(name: &str) -> ChangeKind {
    let Some(caps) = PROTEIN_CHANGE_PATTERN.captures(name) else {
        return ChangeKind::Unrecognized;
    };
    let (wt_token, pos_token, mut_token) = (&caps[1], &caps[2], &caps[3]);

    if mut_token == STOP_TOKEN {
        return ChangeKind::Nonsense;
    }
    let Ok(position) = pos_token.parse::<u32>() else {
        return ChangeKind::Unrecognized;
    };
    match (
        AminoAcid::from_three_letter(wt_token),
        AminoAcid::from_three_letter(mut_token),
    ) {
        (Some(wild_type), Some(mutant)) if wild_type == mutant => ChangeKind::Silent,
        (Some(wild_type), Some(mutant)) => ChangeKind::Missense(ProteinChange {
            wild_type,
            position,
            mutant,
        }),
        _ => ChangeKind::Unrecognized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missense_token_is_extracted_from_clinvar_name() {
        let kind = classify_protein_change("NM_000546.6(TP53):c.524G>A (p.Arg175His)");
        assert_eq!(
            kind,
            ChangeKind::Missense(ProteinChange {
                wild_type: AminoAcid::Arginine,
                position: 175,
                mutant: AminoAcid::Histidine,
            })
        );
    }

    #[test]
    fn stop_gain_is_nonsense() {
        assert_eq!(
            classify_protein_change("NM_007294.4(BRCA1):c.5266C>T (p.Gln1756Ter)"),
            ChangeKind::Nonsense
        );
    }

    #[test]
    fn same_residue_is_silent() {
        assert_eq!(
            classify_protein_change("NM_000000.1(ABC):c.30A>G (p.Leu10Leu)"),
            ChangeKind::Silent
        );
    }

    #[test]
    fn synonymous_equals_notation_and_missing_token_are_unrecognized() {
        assert_eq!(
            classify_protein_change("NM_000000.1(ABC):c.30A>G (p.Leu10=)"),
            ChangeKind::Unrecognized
        );
        assert_eq!(
            classify_protein_change("NM_000000.1(ABC):c.30-2A>G"),
            ChangeKind::Unrecognized
        );
        assert_eq!(
            classify_protein_change("x (p.Xaa10Leu)"),
            ChangeKind::Unrecognized
        );
    }

    #[test]
    fn protein_change_displays_as_hgvs() {
        let change = ProteinChange {
            wild_type: AminoAcid::GlutamicAcid,
            position: 123,
            mutant: AminoAcid::AsparticAcid,
        };
        assert_eq!(change.to_string(), "p.Glu123Asp");
    }

    #[test]
    fn significance_collapses_to_binary_class() {
        use ClinicalClass::*;
        assert_eq!(ClinicalClass::from_significance("Pathogenic"), Some(Pathogenic));
        assert_eq!(
            ClinicalClass::from_significance("Pathogenic/Likely pathogenic"),
            Some(Pathogenic)
        );
        assert_eq!(ClinicalClass::from_significance("Likely benign"), Some(Benign));
        assert_eq!(ClinicalClass::from_significance("Benign/Likely benign"), Some(Benign));
    }

    #[test]
    fn ambiguous_significance_is_discarded() {
        assert_eq!(ClinicalClass::from_significance("Uncertain significance"), None);
        assert_eq!(
            ClinicalClass::from_significance("Conflicting classifications of pathogenicity"),
            None
        );
        assert_eq!(
            ClinicalClass::from_significance("Conflicting interpretations of pathogenicity; benign"),
            None
        );
        assert_eq!(ClinicalClass::from_significance("Pathogenic; Benign"), None);
        assert_eq!(ClinicalClass::from_significance("not provided"), None);
    }
}

use phf::{Map, phf_map};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The twenty standard amino acids, serialized with their three-letter codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AminoAcid {
    // --- Aliphatic, Nonpolar ---
    #[serde(rename = "Ala")]
    Alanine,
    #[serde(rename = "Gly")]
    Glycine,
    #[serde(rename = "Ile")]
    Isoleucine,
    #[serde(rename = "Leu")]
    Leucine,
    #[serde(rename = "Pro")]
    Proline,
    #[serde(rename = "Val")]
    Valine,

    // --- Aromatic ---
    #[serde(rename = "Phe")]
    Phenylalanine,
    #[serde(rename = "Trp")]
    Tryptophan,
    #[serde(rename = "Tyr")]
    Tyrosine,

    // --- Polar, Uncharged ---
    #[serde(rename = "Asn")]
    Asparagine,
    #[serde(rename = "Cys")]
    Cysteine,
    #[serde(rename = "Gln")]
    Glutamine,
    #[serde(rename = "Ser")]
    Serine,
    #[serde(rename = "Thr")]
    Threonine,
    #[serde(rename = "Met")]
    Methionine,

    // --- Positively Charged (Basic) ---
    #[serde(rename = "Arg")]
    Arginine,
    #[serde(rename = "His")]
    Histidine,
    #[serde(rename = "Lys")]
    Lysine,

    // --- Negatively Charged (Acidic) ---
    #[serde(rename = "Asp")]
    AsparticAcid,
    #[serde(rename = "Glu")]
    GlutamicAcid,
}

static THREE_LETTER_CODES: Map<&'static str, AminoAcid> = phf_map! {
    "Ala" => AminoAcid::Alanine,
    "Gly" => AminoAcid::Glycine,
    "Ile" => AminoAcid::Isoleucine,
    "Leu" => AminoAcid::Leucine,
    "Pro" => AminoAcid::Proline,
    "Val" => AminoAcid::Valine,
    "Phe" => AminoAcid::Phenylalanine,
    "Trp" => AminoAcid::Tryptophan,
    "Tyr" => AminoAcid::Tyrosine,
    "Asn" => AminoAcid::Asparagine,
    "Cys" => AminoAcid::Cysteine,
    "Gln" => AminoAcid::Glutamine,
    "Ser" => AminoAcid::Serine,
    "Thr" => AminoAcid::Threonine,
    "Met" => AminoAcid::Methionine,
    "Arg" => AminoAcid::Arginine,
    "His" => AminoAcid::Histidine,
    "Lys" => AminoAcid::Lysine,
    "Asp" => AminoAcid::AsparticAcid,
    "Glu" => AminoAcid::GlutamicAcid,
};

/// HGVS three-letter token for a translation stop.
pub const STOP_TOKEN: &str = "Ter";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unrecognized amino acid code: '{0}'")]
pub struct ParseAminoAcidError(pub String);

impl AminoAcid {
    /// Looks up a residue by its HGVS three-letter code (`"Glu"`), case-sensitive.
    pub fn from_three_letter(code: &str) -> Option<Self> {
        THREE_LETTER_CODES.get(code).copied()
    }

    pub fn three_letter(&self) -> &'static str {
        match self {
            AminoAcid::Alanine => "Ala",
            AminoAcid::Glycine => "Gly",
            AminoAcid::Isoleucine => "Ile",
            AminoAcid::Leucine => "Leu",
            AminoAcid::Proline => "Pro",
            AminoAcid::Valine => "Val",
            AminoAcid::Phenylalanine => "Phe",
            AminoAcid::Tryptophan => "Trp",
            AminoAcid::Tyrosine => "Tyr",
            AminoAcid::Asparagine => "Asn",
            AminoAcid::Cysteine => "Cys",
            AminoAcid::Glutamine => "Gln",
            AminoAcid::Serine => "Ser",
            AminoAcid::Threonine => "Thr",
            AminoAcid::Methionine => "Met",
            AminoAcid::Arginine => "Arg",
            AminoAcid::Histidine => "His",
            AminoAcid::Lysine => "Lys",
            AminoAcid::AsparticAcid => "Asp",
            AminoAcid::GlutamicAcid => "Glu",
        }
    }

    /// One-letter code, as used in FoldX mutation descriptors.
    pub fn one_letter(&self) -> char {
        match self {
            AminoAcid::Alanine => 'A',
            AminoAcid::Glycine => 'G',
            AminoAcid::Isoleucine => 'I',
            AminoAcid::Leucine => 'L',
            AminoAcid::Proline => 'P',
            AminoAcid::Valine => 'V',
            AminoAcid::Phenylalanine => 'F',
            AminoAcid::Tryptophan => 'W',
            AminoAcid::Tyrosine => 'Y',
            AminoAcid::Asparagine => 'N',
            AminoAcid::Cysteine => 'C',
            AminoAcid::Glutamine => 'Q',
            AminoAcid::Serine => 'S',
            AminoAcid::Threonine => 'T',
            AminoAcid::Methionine => 'M',
            AminoAcid::Arginine => 'R',
            AminoAcid::Histidine => 'H',
            AminoAcid::Lysine => 'K',
            AminoAcid::AsparticAcid => 'D',
            AminoAcid::GlutamicAcid => 'E',
        }
    }
}

impl FromStr for AminoAcid {
    type Err = ParseAminoAcidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_three_letter(s.trim()).ok_or_else(|| ParseAminoAcidError(s.to_string()))
    }
}

impl fmt::Display for AminoAcid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.three_letter())
    }
}

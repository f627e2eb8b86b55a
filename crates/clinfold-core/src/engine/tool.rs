use crate::core::models::amino_acid::AminoAcid;
use crate::core::models::variant::ProteinChange;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Failed to launch '{program}': {source}", program = program.display())]
    Launch {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{operation} exited with {status}: {stderr}")]
    NonZeroExit {
        operation: &'static str,
        status: String,
        stderr: String,
    },
    #[error("{operation} did not produce '{path}'", path = path.display())]
    MissingOutput {
        operation: &'static str,
        path: PathBuf,
    },
    #[error("No energy term in '{path}': {reason}", path = path.display())]
    EnergyParse { path: PathBuf, reason: String },
    #[error("Could not prepare input structure: {0}")]
    Preparation(String),
    #[error("Tool workspace I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single substitution as the stability tool addresses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointMutation {
    pub wild_type: AminoAcid,
    pub chain: char,
    pub position: u32,
    pub mutant: AminoAcid,
}

impl PointMutation {
    /// AlphaFold monomer models carry a single chain, `A`.
    pub fn on_chain_a(change: ProteinChange) -> Self {
        Self {
            wild_type: change.wild_type,
            chain: 'A',
            position: change.position,
            mutant: change.mutant,
        }
    }

    /// One line of a FoldX mutant file, e.g. `RA175H;`.
    pub fn mutant_file_line(&self) -> String {
        format!(
            "{}{}{}{};",
            self.wild_type.one_letter(),
            self.chain,
            self.position,
            self.mutant.one_letter()
        )
    }

    /// Chain-free short form, e.g. `R175H`.
    pub fn short_code(&self) -> String {
        format!(
            "{}{}{}",
            self.wild_type.one_letter(),
            self.position,
            self.mutant.one_letter()
        )
    }
}

impl fmt::Display for PointMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}",
            self.wild_type.one_letter(),
            self.chain,
            self.position,
            self.mutant.one_letter()
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome {
    /// Unrounded, unclamped.
    pub ddg: f64,
    /// Final location of the mutant model, if one was kept.
    pub mutant_structure: Option<PathBuf>,
}

/// File name of the tool input prepared for `accession`.
pub fn prepared_structure_name(accession: &str) -> String {
    format!("{}.pdb", accession)
}

/// File name of the repaired structure for `accession`.
pub fn repaired_structure_name(accession: &str) -> String {
    format!("{}_Repair.pdb", accession)
}

/// The boundary between the pipeline and an external stability predictor.
///
/// Both operations run inside a workspace directory the implementor owns.
/// Implementations must be safe to call concurrently for different accessions.
pub trait StabilityTool: Send + Sync {
    /// Produces the repaired structure for `input`, which has already been
    /// written to the workspace as [`prepared_structure_name`].
    ///
    /// Returns the path of the repaired structure, which must be named
    /// [`repaired_structure_name`] inside the workspace.
    fn repair(&self, accession: &str, input: &Path) -> Result<PathBuf, ToolError>;

    /// Applies one point mutation to a repaired structure and reports its ddG.
    fn evaluate_mutation(
        &self,
        accession: &str,
        repaired: &Path,
        mutation: &PointMutation,
    ) -> Result<MutationOutcome, ToolError>;
}

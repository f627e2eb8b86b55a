use super::error::EngineError;
use super::tool::{StabilityTool, ToolError, prepared_structure_name, repaired_structure_name};
use crate::core::io::format::open_model;
use crate::core::io::pdb::PdbFile;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// The chain FoldX is pointed at in AlphaFold monomer models.
const TOOL_CHAIN: &str = "A";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairedStructure {
    pub path: PathBuf,
    /// `true` when the artifact already existed in the workspace.
    pub cached: bool,
}

/// Compute-once store of repaired structures, one per accession.
///
/// The workspace directory is the backing store, so artifacts survive across
/// runs. A per-accession lock ensures concurrent callers for the same accession
/// trigger at most one repair; the later callers observe the finished artifact.
#[derive(Debug)]
pub struct RepairCache {
    workspace: PathBuf,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl RepairCache {
    pub fn new(workspace: PathBuf) -> Self {
        Self {
            workspace,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn repaired_path(&self, accession: &str) -> PathBuf {
        self.workspace.join(repaired_structure_name(accession))
    }

    fn lock_for(&self, accession: &str) -> Result<Arc<Mutex<()>>, EngineError> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| EngineError::Internal("repair lock table poisoned".into()))?;
        Ok(locks.entry(accession.to_string()).or_default().clone())
    }

    /// Returns the repaired structure for `accession`, repairing `source` first
    /// if no artifact exists yet.
    ///
    /// # Errors
    ///
    /// Fails if the source structure cannot be read or has no chain `A`, or if
    /// the tool's repair fails. No artifact is left behind in that case, so a
    /// later call retries.
    pub fn get_or_repair(
        &self,
        tool: &dyn StabilityTool,
        accession: &str,
        source: &Path,
    ) -> Result<RepairedStructure, EngineError> {
        let lock = self.lock_for(accession)?;
        let _guard = lock
            .lock()
            .map_err(|_| EngineError::Internal(format!("repair lock for {} poisoned", accession)))?;

        let repaired = self.repaired_path(accession);
        if repaired.exists() {
            info!("Repaired structure for {} found, using cached version.", accession);
            return Ok(RepairedStructure {
                path: repaired,
                cached: true,
            });
        }

        let input = self.workspace.join(prepared_structure_name(accession));
        prepare_tool_input(source, &input)?;
        info!("Repairing {}...", accession);
        let path = tool.repair(accession, &input)?;
        debug!("Repaired structure for {} written to {:?}", accession, path);
        Ok(RepairedStructure {
            path,
            cached: false,
        })
    }
}

/// Rewrites the first model of `source` as a chain-A-only PDB file.
pub fn prepare_tool_input(source: &Path, destination: &Path) -> Result<(), EngineError> {
    let model = open_model(source)?;
    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent).map_err(|e| EngineError::workspace(parent, e))?;
    }
    if PdbFile::write_chain(model, TOOL_CHAIN, destination)? == 0 {
        return Err(ToolError::Preparation(format!(
            "{:?} has no chain {}",
            source, TOOL_CHAIN
        ))
        .into());
    }
    Ok(())
}

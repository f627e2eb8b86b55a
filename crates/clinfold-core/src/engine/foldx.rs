use super::config::FoldxConfig;
use super::tool::{
    MutationOutcome, PointMutation, StabilityTool, ToolError, repaired_structure_name,
};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, trace, warn};

const STDERR_TAIL_LINES: usize = 5;

/// Drives the FoldX binary inside a workspace directory.
///
/// Every file FoldX writes is named after the accession being processed, so one
/// workspace can serve several proteins concurrently.
#[derive(Debug, Clone)]
pub struct FoldxTool {
    config: FoldxConfig,
    workspace: PathBuf,
    mutant_dir: Option<PathBuf>,
}

impl FoldxTool {
    /// Creates the workspace (and mutant directory) if needed and resolves a
    /// relative executable path against the current directory, since FoldX is
    /// launched from inside the workspace.
    pub fn new(
        config: FoldxConfig,
        workspace: PathBuf,
        mutant_dir: Option<PathBuf>,
    ) -> Result<Self, ToolError> {
        fs::create_dir_all(&workspace)?;
        if let Some(dir) = &mutant_dir {
            fs::create_dir_all(dir)?;
        }
        let mut config = config;
        if config.executable.components().count() > 1 && config.executable.is_relative() {
            config.executable =
                fs::canonicalize(&config.executable).map_err(|source| ToolError::Launch {
                    program: config.executable.clone(),
                    source,
                })?;
        }
        Ok(Self {
            config,
            workspace,
            mutant_dir,
        })
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    fn run(&self, operation: &'static str, args: &[String]) -> Result<(), ToolError> {
        debug!(operation, ?args, "Invoking FoldX");
        let output = Command::new(&self.config.executable)
            .current_dir(&self.workspace)
            .args(args)
            .output()
            .map_err(|source| ToolError::Launch {
                program: self.config.executable.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let detail = if stderr.trim().is_empty() { stdout } else { stderr };
            return Err(ToolError::NonZeroExit {
                operation,
                status: output.status.to_string(),
                stderr: tail(&detail, STDERR_TAIL_LINES),
            });
        }
        trace!(operation, stdout = %String::from_utf8_lossy(&output.stdout), "FoldX finished");
        Ok(())
    }

    fn keep_mutant_model(
        &self,
        artifacts: &BuildModelArtifacts,
        accession: &str,
        mutation: &PointMutation,
    ) -> Option<PathBuf> {
        let dir = self.mutant_dir.as_ref()?;
        if !artifacts.mutant_model.exists() {
            warn!(
                "FoldX produced no mutant model for {} {}",
                accession, mutation
            );
            return None;
        }
        let destination = dir.join(format!("{}_{}.pdb", accession, mutation.short_code()));
        match move_file(&artifacts.mutant_model, &destination) {
            Ok(()) => Some(destination),
            Err(e) => {
                warn!(
                    "Could not move mutant model to {:?}: {}",
                    destination, e
                );
                None
            }
        }
    }
}

impl StabilityTool for FoldxTool {
    fn repair(&self, accession: &str, input: &Path) -> Result<PathBuf, ToolError> {
        let input_name = file_name(input)?;
        let args = vec![
            "--command=RepairPDB".to_string(),
            format!("--pdb={}", input_name),
            format!("--ionStrength={:?}", self.config.ion_strength),
            format!("--pH={:?}", self.config.ph),
            format!("--vdwDesign={}", self.config.vdw_design),
        ];
        self.run("RepairPDB", &args)?;

        let repaired = self.workspace.join(repaired_structure_name(accession));
        if !repaired.exists() {
            return Err(ToolError::MissingOutput {
                operation: "RepairPDB",
                path: repaired,
            });
        }
        Ok(repaired)
    }

    fn evaluate_mutation(
        &self,
        accession: &str,
        repaired: &Path,
        mutation: &PointMutation,
    ) -> Result<MutationOutcome, ToolError> {
        let artifacts = BuildModelArtifacts::new(&self.workspace, accession, repaired)?;
        artifacts.remove_all();
        fs::write(&artifacts.mutant_list, mutation.mutant_file_line())?;

        let args = vec![
            "--command=BuildModel".to_string(),
            format!("--pdb={}", file_name(repaired)?),
            format!("--mutant-file={}", file_name(&artifacts.mutant_list)?),
            format!("--numberOfRuns={}", self.config.number_of_runs),
        ];
        let result = self.run("BuildModel", &args).and_then(|()| {
            let ddg = read_dif_energy(&artifacts.dif)?;
            Ok(MutationOutcome {
                ddg,
                mutant_structure: self.keep_mutant_model(&artifacts, accession, mutation),
            })
        });
        artifacts.remove_all();
        result
    }
}

/// Paths of everything one BuildModel run leaves in the workspace.
struct BuildModelArtifacts {
    mutant_list: PathBuf,
    dif: PathBuf,
    raw: PathBuf,
    pdb_list: PathBuf,
    average: PathBuf,
    mutant_model: PathBuf,
    wild_type_model: PathBuf,
}

impl BuildModelArtifacts {
    fn new(workspace: &Path, accession: &str, repaired: &Path) -> Result<Self, ToolError> {
        let stem = repaired
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| ToolError::Preparation(format!("{:?} has no file name", repaired)))?;
        let fxout = |prefix: &str| workspace.join(format!("{}_{}.fxout", prefix, stem));
        Ok(Self {
            mutant_list: workspace.join(format!("individual_list_{}.txt", accession)),
            dif: fxout("Dif"),
            raw: fxout("Raw"),
            pdb_list: fxout("PdbList"),
            average: fxout("Average"),
            mutant_model: workspace.join(format!("{}_1.pdb", stem)),
            wild_type_model: workspace.join(format!("WT_{}_1.pdb", stem)),
        })
    }

    fn remove_all(&self) {
        for path in [
            &self.mutant_list,
            &self.dif,
            &self.raw,
            &self.pdb_list,
            &self.average,
            &self.mutant_model,
            &self.wild_type_model,
        ] {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!("Cleanup of {:?} failed: {}", path, e),
            }
        }
    }
}

fn read_dif_energy(path: &Path) -> Result<f64, ToolError> {
    let text = fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ToolError::MissingOutput {
            operation: "BuildModel",
            path: path.to_path_buf(),
        },
        _ => ToolError::Io(e),
    })?;
    parse_dif_energy(&text).map_err(|reason| ToolError::EnergyParse {
        path: path.to_path_buf(),
        reason,
    })
}

/// Extracts the total-energy difference from a `Dif_*.fxout` table: the second
/// tab-separated column of the last data line.
pub fn parse_dif_energy(text: &str) -> Result<f64, String> {
    let last = text
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| "file is empty".to_string())?;
    let columns: Vec<&str> = last.split('\t').collect();
    if columns.len() < 3 || columns[1].contains("Total") || columns[1].contains("total") {
        return Err(format!("last line is not a data line: '{}'", last.trim()));
    }
    columns[1]
        .trim()
        .parse()
        .map_err(|_| format!("invalid energy value '{}'", columns[1].trim()))
}

fn file_name(path: &Path) -> Result<String, ToolError> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| ToolError::Preparation(format!("{:?} has no file name", path)))
}

fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to)?;
    fs::remove_file(from)
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}

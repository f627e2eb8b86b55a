use std::path::PathBuf;
use thiserror::Error;

use super::config::ConfigError;
use super::tool::ToolError;
use crate::core::io::format::StructureError;
use crate::core::io::tables::TableError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error("Structure error: {0}")]
    Structure(#[from] StructureError),

    #[error("External tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Cannot read structure directory '{path}': {source}", path = path.display())]
    StructureDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Structure directory '{}' contains no AlphaFold model files", .0.display())]
    EmptyStructureDirectory(PathBuf),

    #[error("Results file '{path}' exists but cannot be resumed: {reason}", path = path.display())]
    UnreadableResults { path: PathBuf, reason: String },

    #[error("Workspace I/O failed for '{path}': {source}", path = path.display())]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Internal logic error: {0}")]
    Internal(String),
}

impl EngineError {
    pub(crate) fn workspace(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EngineError::Workspace {
            path: path.into(),
            source,
        }
    }
}

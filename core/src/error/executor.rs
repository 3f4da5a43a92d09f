use std::path::PathBuf;

use thiserror::Error;

/// Engine-level faults. These never become per-task results; the engine turns
/// them into a whole-plan `failed` response.
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("Duplicate task ID: {0}")]
    DuplicateTaskId(String),

    #[error("failed to allocate workspace under {root}: {source}")]
    WorkspaceAllocation {
        root: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to remove workspace {path}: {source}")]
    WorkspaceTeardown {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ExecutorError {
    /// True for faults raised by the execution context manager.
    pub fn is_context_fault(&self) -> bool {
        matches!(
            self,
            Self::WorkspaceAllocation { .. } | Self::WorkspaceTeardown { .. }
        )
    }
}

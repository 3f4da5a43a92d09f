//! Run-scoped workspace allocation and teardown.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::TempDir;

use crate::config::ExecutorConfig;
use crate::error::ExecutorError;

/// Workspace and metadata owned by a single plan run.
///
/// The scratch directory is removed by [`ContextManager::close`]; if a run
/// unwinds before reaching it, dropping the context removes it instead.
#[derive(Debug)]
pub struct ExecutionContext {
    plan_id: String,
    workspace: TempDir,
    started_at: DateTime<Utc>,
    environment: HashMap<String, String>,
}

impl ExecutionContext {
    pub fn plan_id(&self) -> &str {
        &self.plan_id
    }

    /// Shared read/write directory for every task of the run.
    pub fn workspace(&self) -> &Path {
        self.workspace.path()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Extra environment handed to subprocesses spawned by tool adapters.
    pub fn environment(&self) -> &HashMap<String, String> {
        &self.environment
    }
}

/// Allocates one uniquely named workspace per run.
#[derive(Debug, Clone)]
pub struct ContextManager {
    root: Option<PathBuf>,
    prefix: String,
}

impl Default for ContextManager {
    fn default() -> Self {
        Self::from_config(&ExecutorConfig::default())
    }
}

impl ContextManager {
    pub fn new(root: Option<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            root,
            prefix: prefix.into(),
        }
    }

    pub fn from_config(cfg: &ExecutorConfig) -> Self {
        Self::new(cfg.workspace_root.clone(), cfg.workspace_prefix.clone())
    }

    pub fn root(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(std::env::temp_dir)
    }

    pub fn open(&self, plan_id: &str) -> Result<ExecutionContext, ExecutorError> {
        let root = self.root();
        let alloc_err = |source| ExecutorError::WorkspaceAllocation {
            root: root.clone(),
            source,
        };

        std::fs::create_dir_all(&root).map_err(alloc_err)?;
        let workspace = tempfile::Builder::new()
            .prefix(&format!("{}{}_", self.prefix, sanitize(plan_id)))
            .tempdir_in(&root)
            .map_err(alloc_err)?;

        let dir = workspace.path().to_string_lossy().to_string();
        let environment = HashMap::from([
            ("PLANRUN_PLAN_ID".to_string(), plan_id.to_string()),
            ("PLANRUN_WORKSPACE".to_string(), dir.clone()),
            ("PYTHONPATH".to_string(), dir.clone()),
            ("NODE_PATH".to_string(), dir),
        ]);

        tracing::debug!(plan_id, workspace = %workspace.path().display(), "workspace allocated");

        Ok(ExecutionContext {
            plan_id: plan_id.to_string(),
            workspace,
            started_at: Utc::now(),
            environment,
        })
    }

    /// Recursively remove the workspace. Consumes the context so a run can
    /// only release it once.
    pub fn close(&self, ctx: ExecutionContext) -> Result<(), ExecutorError> {
        let path = ctx.workspace.path().to_path_buf();
        ctx.workspace
            .close()
            .map_err(|source| ExecutorError::WorkspaceTeardown {
                path: path.clone(),
                source,
            })?;
        tracing::debug!(plan_id = %ctx.plan_id, workspace = %path.display(), "workspace removed");
        Ok(())
    }
}

// Keep directory names portable whatever the plan id contains.
fn sanitize(plan_id: &str) -> String {
    plan_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(64)
        .collect()
}

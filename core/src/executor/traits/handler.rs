use async_trait::async_trait;

use crate::error::DispatchError;
use crate::executor::context::ExecutionContext;
use crate::executor::types::{Task, ToolOutcome};

/// Tool adapter for one or more task kinds.
///
/// Handlers see the task's kind and parameters plus the run workspace and
/// environment. They must bound their own execution time; the scheduler
/// never cancels a dispatch.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Handler name (unique identifier)
    fn name(&self) -> &str;

    async fn execute(
        &self,
        task: &Task,
        ctx: &ExecutionContext,
    ) -> Result<ToolOutcome, DispatchError>;
}

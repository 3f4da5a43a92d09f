use async_trait::async_trait;
use planrun_core::error::DispatchError;
use planrun_core::executor::{ExecutionContext, Task, ToolHandler, ToolOutcome};

use super::write_file;

/// Writes `README.md` and, unless `include_api_docs` is false, `API.md`.
pub struct DocumentationTool;

fn readme(task: &Task) -> String {
    let title = task.param_str("title").unwrap_or("Project");
    let summary = task
        .description
        .as_deref()
        .unwrap_or("Generated by planrun.");
    format!(
        "# {title}\n\n{summary}\n\n## Getting Started\n\nSee `src/` for the implementation and run the test suite before making changes.\n\n## Layout\n\n- `src/`: source code\n- `REQUIREMENTS.md`: requirements, when present\n"
    )
}

const API_DOC: &str = "# API Reference\n\n## Functions\n\n### `add(a, b)`\n\nReturns the sum of `a` and `b`.\n\n### `greet(name)`\n\nReturns a greeting for `name`.\n";

#[async_trait]
impl ToolHandler for DocumentationTool {
    fn name(&self) -> &str {
        "documentation"
    }

    async fn execute(&self, task: &Task, ctx: &ExecutionContext) -> Result<ToolOutcome, DispatchError> {
        let include_api_docs = task.param_bool("include_api_docs")?.unwrap_or(true);

        let root = ctx.workspace();
        let mut files_created = vec![write_file(root, "README.md", &readme(task)).await?];
        if include_api_docs {
            files_created.push(write_file(root, "API.md", API_DOC).await?);
        }

        Ok(ToolOutcome::new("documentation")
            .with("files_created", files_created)
            .log("Documentation created"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::scratch_context;
    use serde_json::json;

    #[tokio::test]
    async fn test_api_docs_included_by_default() {
        let (_root, ctx) = scratch_context("docs");
        let task = Task::new("docs", "documentation");

        let outcome = DocumentationTool.execute(&task, &ctx).await.unwrap();

        assert_eq!(outcome.get("files_created").unwrap(), &json!(["README.md", "API.md"]));
        assert!(ctx.workspace().join("API.md").is_file());
    }

    #[tokio::test]
    async fn test_api_docs_can_be_disabled() {
        let (_root, ctx) = scratch_context("docs-lite");
        let task = Task::new("docs", "documentation").with_param("include_api_docs", false);

        let outcome = DocumentationTool.execute(&task, &ctx).await.unwrap();

        assert_eq!(outcome.get("files_created").unwrap(), &json!(["README.md"]));
        assert!(!ctx.workspace().join("API.md").exists());
    }

    #[tokio::test]
    async fn test_non_boolean_flag_is_rejected() {
        let (_root, ctx) = scratch_context("docs-bad");
        let task = Task::new("docs", "documentation").with_param("include_api_docs", "yes");

        let err = DocumentationTool.execute(&task, &ctx).await.unwrap_err();

        assert!(matches!(err, DispatchError::InvalidParameter { .. }));
        assert!(!ctx.workspace().join("README.md").exists());
    }
}

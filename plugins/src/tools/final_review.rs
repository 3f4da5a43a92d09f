use std::path::Path;

use async_trait::async_trait;
use planrun_core::error::DispatchError;
use planrun_core::executor::{ExecutionContext, Task, ToolHandler, ToolOutcome};

const SOURCE_EXTENSIONS: &[&str] = &["py", "js", "ts", "java", "rs", "go", "cpp", "c"];
const DOC_NAMES: &[&str] = &["readme.md", "readme.txt", "api.md"];

/// Checks the workspace for the deliverables a plan promised.
pub struct FinalReviewTool;

/// Every file under `root`, as `/`-separated relative paths in sorted order.
fn list_files(root: &Path) -> Result<Vec<String>, DispatchError> {
    let base = glob::Pattern::escape(&root.to_string_lossy());
    let pattern = Path::new(&base).join("**").join("*");
    let pattern = pattern.to_string_lossy();
    let entries = glob::glob(&pattern)
        .map_err(|e| DispatchError::handler(format!("invalid workspace pattern: {}", e)))?;

    let mut out = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| DispatchError::Io(e.into_error()))?;
        if !path.is_file() {
            continue;
        }
        if let Ok(rel) = path.strip_prefix(root) {
            let rel: Vec<String> = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            out.push(rel.join("/"));
        }
    }
    out.sort();
    Ok(out)
}

fn file_name(rel: &str) -> String {
    rel.rsplit('/').next().unwrap_or(rel).to_ascii_lowercase()
}

fn matches_deliverable(deliverable: &str, rel: &str) -> Option<bool> {
    let name = file_name(rel);
    let found = match deliverable {
        "source_code" => {
            let ext = name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or_default();
            SOURCE_EXTENSIONS.contains(&ext) && !name.contains("test")
        }
        "tests" => name.contains("test"),
        "documentation" => DOC_NAMES.contains(&name.as_str()) || rel.starts_with("docs/"),
        _ => return None,
    };
    Some(found)
}

#[async_trait]
impl ToolHandler for FinalReviewTool {
    fn name(&self) -> &str {
        "final_review"
    }

    async fn execute(&self, task: &Task, ctx: &ExecutionContext) -> Result<ToolOutcome, DispatchError> {
        let deliverables = task.param_str_list("deliverables");
        let root = ctx.workspace().to_path_buf();
        let files = tokio::task::spawn_blocking(move || list_files(&root))
            .await
            .map_err(|e| DispatchError::handler(format!("workspace scan failed: {}", e)))??;

        let mut present: Vec<&str> = Vec::new();
        let mut missing: Vec<&str> = Vec::new();
        let mut outcome = ToolOutcome::new("final_review");

        for &deliverable in &deliverables {
            if matches_deliverable(deliverable, "").is_none() {
                tracing::warn!(task_id = %task.id, deliverable, "unknown deliverable ignored");
                outcome = outcome.log(format!("Unknown deliverable '{deliverable}' ignored"));
                continue;
            }
            let mut hits = files
                .iter()
                .filter(|rel| matches_deliverable(deliverable, rel) == Some(true))
                .peekable();
            if hits.peek().is_none() {
                missing.push(deliverable);
            }
            for rel in hits {
                if !present.contains(&rel.as_str()) {
                    present.push(rel);
                }
            }
        }

        Ok(outcome
            .with("deliverables", deliverables)
            .with("files_present", present)
            .with("files_missing", missing)
            .log("Final review completed"))
    }
}

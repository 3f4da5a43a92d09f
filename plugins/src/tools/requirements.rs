use async_trait::async_trait;
use planrun_core::error::DispatchError;
use planrun_core::executor::{ExecutionContext, Task, ToolHandler, ToolOutcome};

use super::write_file;

const DOCUMENT: &str = "REQUIREMENTS.md";

/// Writes `REQUIREMENTS.md` from the task description and its
/// `requirements` / `constraints` list parameters.
pub struct RequirementsAnalysisTool;

fn render(task: &Task) -> String {
    let mut doc = String::from("# Requirements\n\n## Overview\n\n");
    doc.push_str(
        task.description
            .as_deref()
            .unwrap_or("Requirements gathered for this plan."),
    );
    doc.push_str("\n\n## Functional Requirements\n\n");

    let requirements = task.param_str_list("requirements");
    if requirements.is_empty() {
        doc.push_str("- Core functionality as described in the overview\n");
    }
    for (i, item) in requirements.iter().enumerate() {
        doc.push_str(&format!("{}. {}\n", i + 1, item));
    }

    let constraints = task.param_str_list("constraints");
    if !constraints.is_empty() {
        doc.push_str("\n## Constraints\n\n");
        for item in constraints {
            doc.push_str(&format!("- {item}\n"));
        }
    }
    doc
}

#[async_trait]
impl ToolHandler for RequirementsAnalysisTool {
    fn name(&self) -> &str {
        "requirements_analysis"
    }

    async fn execute(&self, task: &Task, ctx: &ExecutionContext) -> Result<ToolOutcome, DispatchError> {
        let document = write_file(ctx.workspace(), DOCUMENT, &render(task)).await?;
        Ok(ToolOutcome::new("requirements_analysis")
            .with("document_created", document)
            .log("Requirements analysis completed"))
    }
}

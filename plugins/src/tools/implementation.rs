use async_trait::async_trait;
use planrun_core::error::DispatchError;
use planrun_core::executor::{ExecutionContext, Task, ToolHandler, ToolOutcome};

use super::{write_file, Language};

/// Writes a small sample module for the requested language.
pub struct CoreImplementationTool;

fn sample_module(language: &Language) -> (String, String) {
    match language {
        Language::Python => (
            "src/core.py".into(),
            "def add(a, b):\n    return a + b\n\n\ndef greet(name):\n    return f\"Hello, {name}!\"\n".into(),
        ),
        Language::JavaScript => (
            "src/core.js".into(),
            "function add(a, b) {\n  return a + b;\n}\n\nfunction greet(name) {\n  return `Hello, ${name}!`;\n}\n\nmodule.exports = { add, greet };\n".into(),
        ),
        Language::Java => (
            "src/main/java/Core.java".into(),
            "public class Core {\n    public static int add(int a, int b) {\n        return a + b;\n    }\n\n    public static String greet(String name) {\n        return \"Hello, \" + name + \"!\";\n    }\n}\n".into(),
        ),
        Language::Rust => (
            "src/core.rs".into(),
            "pub fn add(a: i64, b: i64) -> i64 {\n    a + b\n}\n\npub fn greet(name: &str) -> String {\n    format!(\"Hello, {name}!\")\n}\n".into(),
        ),
        Language::Other(name) => {
            let ext: String = name.chars().filter(char::is_ascii_alphanumeric).collect();
            let ext = if ext.is_empty() { "txt".to_string() } else { ext };
            (format!("src/core.{ext}"), format!("// core module ({name})\n"))
        }
    }
}

#[async_trait]
impl ToolHandler for CoreImplementationTool {
    fn name(&self) -> &str {
        "core_implementation"
    }

    async fn execute(&self, task: &Task, ctx: &ExecutionContext) -> Result<ToolOutcome, DispatchError> {
        let language = Language::from_task(task)?;
        let (rel, contents) = sample_module(&language);
        let created = write_file(ctx.workspace(), &rel, &contents).await?;

        Ok(ToolOutcome::new("core_implementation")
            .with("language", language.as_str())
            .with("files_created", vec![created])
            .log("Core implementation completed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::scratch_context;

    #[tokio::test]
    async fn test_writes_language_module() {
        let (_root, ctx) = scratch_context("impl");
        let task = Task::new("impl", "core_implementation").with_param("language", "rust");

        let outcome = CoreImplementationTool.execute(&task, &ctx).await.unwrap();

        assert_eq!(outcome.get("language").unwrap(), "rust");
        let body = std::fs::read_to_string(ctx.workspace().join("src/core.rs")).unwrap();
        assert!(body.contains("pub fn add"));
        assert_eq!(outcome.logs, vec!["Core implementation completed".to_string()]);
    }
}

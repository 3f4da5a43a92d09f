use async_trait::async_trait;
use planrun_core::error::DispatchError;
use planrun_core::executor::{ExecutionContext, Task, ToolHandler, ToolOutcome};

use super::{write_file, Language};

const DEFAULT_FRAMEWORK: &str = "none";

/// Lays down a minimal project skeleton for the requested language.
pub struct ProjectSetupTool;

impl ProjectSetupTool {
    fn skeleton(language: &Language, framework: &str) -> Vec<(&'static str, String)> {
        match language {
            Language::Python => {
                let mut requirements = String::from("pytest>=7.0\n");
                if framework != DEFAULT_FRAMEWORK {
                    requirements.push_str(framework);
                    requirements.push('\n');
                }
                vec![
                    ("src/__init__.py", String::new()),
                    (
                        "src/main.py",
                        "def main():\n    print(\"Hello from planrun\")\n\n\nif __name__ == \"__main__\":\n    main()\n"
                            .to_string(),
                    ),
                    ("requirements.txt", requirements),
                ]
            }
            Language::JavaScript => {
                let mut deps = serde_json::Map::new();
                if framework != DEFAULT_FRAMEWORK {
                    deps.insert(framework.to_string(), "latest".into());
                }
                let manifest = serde_json::json!({
                    "name": "planrun-project",
                    "version": "0.1.0",
                    "main": "src/index.js",
                    "scripts": { "test": "jest" },
                    "dependencies": deps,
                    "devDependencies": { "jest": "^29.0.0" },
                });
                vec![
                    (
                        "src/index.js",
                        "function main() {\n  console.log('Hello from planrun');\n}\n\nmodule.exports = { main };\n"
                            .to_string(),
                    ),
                    (
                        "package.json",
                        serde_json::to_string_pretty(&manifest).unwrap_or_default(),
                    ),
                ]
            }
            Language::Java => vec![
                (
                    "src/main/java/App.java",
                    "public class App {\n    public static void main(String[] args) {\n        System.out.println(\"Hello from planrun\");\n    }\n}\n"
                        .to_string(),
                ),
                ("pom.xml", POM_XML.to_string()),
            ],
            Language::Rust => vec![
                (
                    "src/main.rs",
                    "fn main() {\n    println!(\"Hello from planrun\");\n}\n".to_string(),
                ),
                (
                    "Cargo.toml",
                    "[package]\nname = \"planrun-project\"\nversion = \"0.1.0\"\nedition = \"2021\"\n"
                        .to_string(),
                ),
            ],
            Language::Other(name) => vec![(
                "PROJECT.md",
                format!("# Project\n\nLanguage: {name}\nFramework: {framework}\n"),
            )],
        }
    }
}

#[async_trait]
impl ToolHandler for ProjectSetupTool {
    fn name(&self) -> &str {
        "project_setup"
    }

    async fn execute(&self, task: &Task, ctx: &ExecutionContext) -> Result<ToolOutcome, DispatchError> {
        let language = Language::from_task(task)?;
        let framework = task.param_str("framework").unwrap_or(DEFAULT_FRAMEWORK);
        let root = ctx.workspace();

        tokio::fs::create_dir_all(root.join("src")).await?;
        let mut files_created = Vec::new();
        for (rel, contents) in Self::skeleton(&language, framework) {
            files_created.push(write_file(root, rel, &contents).await?);
        }

        tracing::info!(task_id = %task.id, %language, framework, files = files_created.len(), "project skeleton created");
        Ok(ToolOutcome::new("project_setup")
            .with("language", language.as_str())
            .with("framework", framework)
            .with("output_dir", root.display().to_string())
            .log(format!(
                "Created {} project skeleton ({} files)",
                language,
                files_created.len()
            ))
            .with("files_created", files_created))
    }
}

const POM_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <modelVersion>4.0.0</modelVersion>
  <groupId>dev.planrun</groupId>
  <artifactId>planrun-project</artifactId>
  <version>0.1.0</version>
  <properties>
    <maven.compiler.source>17</maven.compiler.source>
    <maven.compiler.target>17</maven.compiler.target>
  </properties>
  <dependencies>
    <dependency>
      <groupId>org.junit.jupiter</groupId>
      <artifactId>junit-jupiter</artifactId>
      <version>5.10.0</version>
      <scope>test</scope>
    </dependency>
  </dependencies>
</project>
"#;

//! Runs a workspace's tests through the language's own test runner.
//!
//! The runner is a child process with a wall-clock limit. Exceeding the limit
//! fails the task; a runner that cannot be spawned (or a language with no
//! known runner) is reported inside the outcome and the task still succeeds.

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use planrun_core::config::ToolsConfig;
use planrun_core::error::DispatchError;
use planrun_core::executor::{ExecutionContext, Task, ToolHandler, ToolOutcome};
use regex::Regex;
use serde::Serialize;
use tokio::process::Command;

use super::{write_if_absent, Language};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Success,
    Failed,
    Error,
    Unsupported,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Error => "error",
            Self::Unsupported => "unsupported",
        }
    }
}

/// What the `test_results` field of a testing outcome carries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestReport {
    pub status: TestStatus,
    pub tests_run: u32,
    pub tests_passed: u32,
    pub tests_failed: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_code: Option<i32>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub output: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error_output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TestReport {
    fn empty(status: TestStatus) -> Self {
        Self {
            status,
            tests_run: 0,
            tests_passed: 0,
            tests_failed: 0,
            command: None,
            return_code: None,
            output: String::new(),
            error_output: String::new(),
            error: None,
        }
    }

    fn unsupported(language: &Language) -> Self {
        let reason = match language {
            Language::Java => "Java tests need a Maven project (pom.xml)".to_string(),
            other => format!("Test execution not implemented for {other}"),
        };
        Self {
            error: Some(reason),
            ..Self::empty(TestStatus::Unsupported)
        }
    }

    fn spawn_failed(command: &TestCommand, err: &std::io::Error) -> Self {
        Self {
            command: Some(command.to_string()),
            error: Some(format!("failed to start `{}`: {err}", command.program)),
            ..Self::empty(TestStatus::Error)
        }
    }
}

/// A test runner invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl TestCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl std::fmt::Display for TestCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

pub struct TestRunnerTool {
    timeout: Duration,
}

impl Default for TestRunnerTool {
    fn default() -> Self {
        Self::from_config(&ToolsConfig::default())
    }
}

impl TestRunnerTool {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn from_config(cfg: &ToolsConfig) -> Self {
        Self::new(Duration::from_secs(cfg.command_timeout_secs))
    }

    /// Make sure a sample test exists and pick the runner command.
    ///
    /// `None` means no runner is known for `language`, or a Java workspace
    /// has no `pom.xml` for Maven to run.
    async fn prepare(
        language: &Language,
        root: &Path,
        pattern: Option<&str>,
    ) -> Result<Option<(TestCommand, Vec<String>)>, DispatchError> {
        let mut created = Vec::new();
        let command = match language {
            Language::Python => {
                created.extend(write_if_absent(root, "test_sample.py", PYTHON_SAMPLE).await?);
                let cmd = TestCommand::new("python", ["-m", "pytest", ".", "-v", "--tb=short"]);
                match pattern {
                    Some(p) => cmd.arg("-k").arg(p),
                    None => cmd,
                }
            }
            Language::JavaScript => {
                created.extend(write_if_absent(root, "sample.test.js", JS_SAMPLE).await?);
                if tokio::fs::try_exists(root.join("package.json")).await? {
                    TestCommand::new("npm", ["test"])
                } else {
                    let cmd = TestCommand::new("npx", ["jest", "."]);
                    match pattern {
                        Some(p) => cmd.arg("--testNamePattern").arg(p),
                        None => cmd,
                    }
                }
            }
            Language::Java => {
                if !tokio::fs::try_exists(root.join("pom.xml")).await? {
                    return Ok(None);
                }
                created.extend(
                    write_if_absent(root, "src/test/java/SampleTest.java", JAVA_SAMPLE).await?,
                );
                let cmd = TestCommand::new("mvn", ["-q", "test"]);
                match pattern {
                    Some(p) => cmd.arg(format!("-Dtest={p}")),
                    None => cmd,
                }
            }
            Language::Rust => {
                created.extend(write_if_absent(root, "tests/sample.rs", RUST_SAMPLE).await?);
                let cmd = TestCommand::new("cargo", ["test"]);
                match pattern {
                    Some(p) => cmd.arg(p),
                    None => cmd,
                }
            }
            Language::Other(_) => return Ok(None),
        };
        Ok(Some((command, created)))
    }

    /// Run `command` in `cwd` and summarize what it printed.
    pub async fn run(
        &self,
        command: &TestCommand,
        language: &Language,
        cwd: &Path,
        env: &HashMap<String, String>,
    ) -> Result<TestReport, DispatchError> {
        tracing::info!(command = %command, cwd = %cwd.display(), "running tests");

        let mut process = Command::new(&command.program);
        process
            .args(&command.args)
            .current_dir(cwd)
            .envs(env)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, process.output()).await {
            Err(_) => {
                tracing::warn!(command = %command, secs = self.timeout.as_secs(), "test run timed out");
                return Err(DispatchError::Timeout {
                    secs: self.timeout.as_secs(),
                });
            }
            Ok(Err(e)) => {
                tracing::warn!(command = %command, error = %e, "test runner could not be started");
                return Ok(TestReport::spawn_failed(command, &e));
            }
            Ok(Ok(output)) => output,
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        // jest writes its summary to stderr
        let counts = TestCounts::parse(language, &format!("{stdout}\n{stderr}"));

        Ok(TestReport {
            status: if output.status.success() {
                TestStatus::Success
            } else {
                TestStatus::Failed
            },
            tests_run: counts.passed + counts.failed,
            tests_passed: counts.passed,
            tests_failed: counts.failed,
            command: Some(command.to_string()),
            return_code: output.status.code(),
            output: stdout,
            error_output: stderr,
            error: None,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TestCounts {
    pub passed: u32,
    pub failed: u32,
}

fn passed_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+) passed").expect("PASSED_RE is valid"))
}

fn failed_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+) (?:failed|errors?)\b").expect("FAILED_RE is valid"))
}

fn maven_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Tests run: (\d+), Failures: (\d+), Errors: (\d+)").expect("MAVEN_RE is valid")
    })
}

fn sum_captures(re: &Regex, line: &str) -> u32 {
    re.captures_iter(line)
        .filter_map(|c| c.get(1)?.as_str().parse::<u32>().ok())
        .sum()
}

impl TestCounts {
    /// Extract pass/fail counts from a runner's summary lines.
    pub fn parse(language: &Language, output: &str) -> Self {
        if *language == Language::Java {
            let Some(last) = maven_re().captures_iter(output).last() else {
                return Self::default();
            };
            let num = |i: usize| {
                last.get(i)
                    .and_then(|m| m.as_str().parse::<u32>().ok())
                    .unwrap_or(0)
            };
            let failed = num(2) + num(3);
            return Self {
                passed: num(1).saturating_sub(failed),
                failed,
            };
        }

        let is_summary = |line: &str| match language {
            Language::Python => line.starts_with('='),
            Language::JavaScript => line.starts_with("Tests:"),
            Language::Rust => line.starts_with("test result:"),
            _ => false,
        };

        output
            .lines()
            .map(str::trim)
            .filter(|line| is_summary(*line))
            .fold(Self::default(), |acc, line| Self {
                passed: acc.passed + sum_captures(passed_re(), line),
                failed: acc.failed + sum_captures(failed_re(), line),
            })
    }
}

#[async_trait]
impl ToolHandler for TestRunnerTool {
    fn name(&self) -> &str {
        "testing"
    }

    async fn execute(&self, task: &Task, ctx: &ExecutionContext) -> Result<ToolOutcome, DispatchError> {
        let language = Language::from_task(task)?;
        let pattern = task.param_str("test_pattern");
        let root = ctx.workspace();

        let (report, created) = match Self::prepare(&language, root, pattern).await? {
            Some((command, created)) => (
                self.run(&command, &language, root, ctx.environment()).await?,
                created,
            ),
            None => (TestReport::unsupported(&language), Vec::new()),
        };

        let mut outcome = ToolOutcome::new("testing").with("language", language.as_str());
        for file in &created {
            outcome = outcome.log(format!("Created sample test {file}"));
        }
        outcome = outcome.log(format!(
            "Tests {}: {} run, {} passed, {} failed",
            report.status.as_str(),
            report.tests_run,
            report.tests_passed,
            report.tests_failed
        ));

        let results = serde_json::to_value(&report)
            .map_err(|e| DispatchError::handler(format!("serialize test report: {e}")))?;
        Ok(outcome.with("test_results", results).log("Testing completed"))
    }
}

const PYTHON_SAMPLE: &str = r#"def test_basic_math():
    assert 2 + 2 == 4
    assert 10 - 5 == 5


def test_string_operations():
    text = "Hello, World!"
    assert len(text) == 13
    assert text.upper() == "HELLO, WORLD!"
"#;

const JS_SAMPLE: &str = r#"describe('sample', () => {
  test('basic math', () => {
    expect(2 + 2).toBe(4);
  });

  test('string operations', () => {
    expect('Hello, World!'.toUpperCase()).toBe('HELLO, WORLD!');
  });
});
"#;

const JAVA_SAMPLE: &str = r#"import static org.junit.jupiter.api.Assertions.assertEquals;

import org.junit.jupiter.api.Test;

public class SampleTest {
    @Test
    void basicMath() {
        assertEquals(4, 2 + 2);
    }
}
"#;

const RUST_SAMPLE: &str = r#"#[test]
fn basic_math() {
    assert_eq!(2 + 2, 4);
}
"#;

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use planrun_core::config::ExecutorConfig;
use planrun_core::ExecutionOpts;

#[derive(Parser, Debug)]
#[command(name = "planrun", version, about = "Execute dependency-ordered task plans")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute a plan and print the response as JSON.
    Run(RunArgs),
    /// Check a plan for duplicate ids, unknown dependencies and cycles.
    Validate(ValidateArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// Plan document (JSON): either a plan object or a bare task array.
    pub plan_file: PathBuf,

    /// Simulate only; nothing is dispatched.
    #[arg(long)]
    pub dry_run: bool,

    /// Run tasks strictly in list order.
    #[arg(long, conflicts_with = "max_parallel")]
    pub sequential: bool,

    /// Upper bound on tasks per parallel round.
    #[arg(long)]
    pub max_parallel: Option<usize>,

    /// Run event format on stderr: text, jsonl or none.
    #[arg(long, value_parser = ["text", "jsonl", "none"])]
    pub format: Option<String>,

    /// Pretty-print the response JSON.
    #[arg(long)]
    pub pretty: bool,

    /// Re-run the whole plan with exponential backoff while it fails.
    #[arg(long)]
    pub retry: bool,

    /// Show a progress display.
    #[arg(long)]
    pub progress: bool,
}

impl RunArgs {
    /// Flags layered over the `[executor]` configuration.
    pub fn execution_opts(&self, cfg: &ExecutorConfig) -> ExecutionOpts {
        let mut opts = ExecutionOpts::from_config(cfg);
        opts.dry_run = self.dry_run;
        if self.sequential {
            opts.parallel_execution = false;
        }
        if let Some(max) = self.max_parallel {
            opts.parallel_execution = true;
            opts.max_parallel_tasks = max;
        }
        opts.progress_bar |= self.progress;
        opts
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ValidateArgs {
    /// Plan document (JSON).
    pub plan_file: PathBuf,
}

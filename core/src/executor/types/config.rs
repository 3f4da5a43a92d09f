use crate::config::ExecutorConfig;

/// Per-invocation execution options.
#[derive(Debug, Clone)]
pub struct ExecutionOpts {
    /// Simulate only: no workspace, no dispatch.
    pub dry_run: bool,

    /// Bounded-parallel rounds when true, strict list order otherwise.
    pub parallel_execution: bool,

    /// Upper bound on tasks per round. Values below 1 are treated as 1.
    pub max_parallel_tasks: usize,

    /// Enable visual progress bar
    pub progress_bar: bool,
}

impl Default for ExecutionOpts {
    fn default() -> Self {
        Self {
            dry_run: false,
            parallel_execution: true,
            max_parallel_tasks: 3,
            progress_bar: false,
        }
    }
}

impl ExecutionOpts {
    pub fn from_config(cfg: &ExecutorConfig) -> Self {
        Self {
            dry_run: false,
            parallel_execution: cfg.parallel_execution,
            max_parallel_tasks: cfg.max_parallel_tasks,
            progress_bar: cfg.progress_bar,
        }
    }

    pub fn sequential() -> Self {
        Self {
            parallel_execution: false,
            ..Self::default()
        }
    }

    pub fn parallel(max_parallel_tasks: usize) -> Self {
        Self {
            max_parallel_tasks,
            ..Self::default()
        }
    }

    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Self::default()
        }
    }

    pub fn effective_parallelism(&self) -> usize {
        self.max_parallel_tasks.max(1)
    }
}

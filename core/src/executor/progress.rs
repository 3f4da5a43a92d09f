use std::collections::HashMap;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use super::types::{PlanStatus, TaskStatus};

/// Visual progress monitor for a plan run
///
/// One overall bar plus a spinner per in-flight task.
pub struct ProgressMonitor {
    multi: MultiProgress,
    overall: ProgressBar,
    task_bars: HashMap<String, ProgressBar>,
    enabled: bool,
}

impl ProgressMonitor {
    /// Create a new progress monitor
    ///
    /// # Arguments
    ///
    /// * `total_tasks` - Total number of tasks submitted
    /// * `enabled` - Whether to draw anything at all
    pub fn new(total_tasks: usize, enabled: bool) -> Self {
        if !enabled {
            return Self {
                multi: MultiProgress::new(),
                overall: ProgressBar::hidden(),
                task_bars: HashMap::new(),
                enabled: false,
            };
        }

        let multi = MultiProgress::new();
        let overall = multi.add(ProgressBar::new(total_tasks as u64));

        let style = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} tasks ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░  ");
        overall.set_style(style);
        overall.set_message("Starting...");

        Self {
            multi,
            overall,
            task_bars: HashMap::new(),
            enabled: true,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Add a spinner for a task that is about to be dispatched
    pub fn start_task(&mut self, task_id: &str) {
        if !self.enabled {
            return;
        }

        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        bar.set_message(format!("⏳ {}", task_id));
        bar.enable_steady_tick(Duration::from_millis(100));

        self.task_bars.insert(task_id.to_string(), bar);
    }

    /// Mark a task as finished (success, failure or skip)
    pub fn complete_task(&mut self, task_id: &str, status: TaskStatus, seconds: f64) {
        if !self.enabled {
            return;
        }

        let icon = match status {
            TaskStatus::Success => "✅",
            TaskStatus::Failed => "❌",
            _ => "⏭",
        };
        let line = format!("{} {} ({:.2}s)", icon, task_id, seconds);
        match self.task_bars.remove(task_id) {
            Some(bar) => bar.finish_with_message(line),
            None => {
                let _ = self.multi.println(line);
            }
        }

        self.overall.inc(1);
    }

    pub fn update_round(&self, round: usize) {
        if self.enabled {
            self.overall.set_message(format!("Round {}", round + 1));
        }
    }

    pub fn finish(&self, status: PlanStatus) {
        if !self.enabled {
            return;
        }

        let msg = match status {
            PlanStatus::Completed => "✅ Plan completed".to_string(),
            PlanStatus::Partial => "⚠ Plan partially completed".to_string(),
            PlanStatus::Simulated => "✅ Dry run simulated".to_string(),
            other => format!("❌ Plan {}", other),
        };

        self.overall.finish_with_message(msg);
    }
}

impl Drop for ProgressMonitor {
    fn drop(&mut self) {
        // Ensure all spinners are cleaned up
        for (_, bar) in self.task_bars.drain() {
            bar.finish_and_clear();
        }
    }
}

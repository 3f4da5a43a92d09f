use planrun_core::executor::{OutputRendererPlugin, RenderEvent, TaskStatus};

/// Human-readable run events on stderr.
pub struct TextRendererPlugin;

impl TextRendererPlugin {
    fn status_label(&self, status: TaskStatus) -> &'static str {
        match status {
            TaskStatus::Success => "SUCCESS",
            TaskStatus::Failed => "FAILED",
            TaskStatus::Skipped => "SKIPPED",
            TaskStatus::Simulated => "SIMULATED",
            TaskStatus::Cancelled => "CANCELLED",
            TaskStatus::Running => "RUNNING",
            TaskStatus::Pending => "PENDING",
        }
    }

    fn format_event(&self, event: &RenderEvent) -> String {
        match event {
            RenderEvent::RunStart {
                plan_id,
                total_tasks,
                mode,
            } => format!(
                "RUN START {} (tasks: {}, mode: {})",
                plan_id,
                total_tasks,
                mode.as_str()
            ),
            RenderEvent::RoundStart {
                plan_id,
                round,
                task_ids,
            } => format!(
                "ROUND START {} (round {}, tasks: {})",
                plan_id,
                round,
                task_ids.join(", ")
            ),
            RenderEvent::TaskStart {
                plan_id,
                task_id,
                round,
            } => match round {
                Some(round) => format!("TASK START {} (round {}, task {})", plan_id, round, task_id),
                None => format!("TASK START {} (task {})", plan_id, task_id),
            },
            RenderEvent::TaskComplete { plan_id, result } => {
                let mut line = format!(
                    "TASK END {} (task {}, status {}, duration {:.3}s)",
                    plan_id,
                    result.task_id,
                    self.status_label(result.status),
                    result.execution_time
                );
                if let Some(estimate) = result.estimated_time {
                    line.push_str(&format!(" estimate {}s", estimate));
                }
                if let Some(err) = &result.error {
                    line.push_str(&format!(": {}", err));
                }
                line
            }
            RenderEvent::TaskSkipped {
                plan_id,
                task_id,
                reason,
            } => format!("TASK SKIP {} (task {}): {}", plan_id, task_id, reason),
            RenderEvent::RoundEnd { plan_id, round } => {
                format!("ROUND END {} (round {})", plan_id, round)
            }
            RenderEvent::RunEnd { plan_id, summary } => format!(
                "RUN END {} (status {}, succeeded {}, failed {}, reported {}, duration {:.3}s)",
                plan_id,
                summary.status,
                summary.successful_tasks,
                summary.failed_tasks,
                summary.total_tasks,
                summary.total_execution_time
            ),
        }
    }
}

impl OutputRendererPlugin for TextRendererPlugin {
    fn name(&self) -> &str {
        "text-renderer"
    }

    fn format(&self) -> &str {
        "text"
    }

    fn render(&self, event: &RenderEvent) {
        eprintln!("{}", self.format_event(event));
    }
}

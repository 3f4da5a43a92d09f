use std::sync::Mutex;

use super::progress::ProgressMonitor;
use super::traits::{OutputRendererPlugin, RenderEvent, RunMode};
use super::types::{ExecutionResult, ExecutionSummary, TaskStatus};

/// Fans run events out to an optional renderer and progress display.
pub struct RunObserver<'a> {
    plan_id: String,
    renderer: Option<&'a dyn OutputRendererPlugin>,
    progress: Option<&'a Mutex<ProgressMonitor>>,
}

impl<'a> RunObserver<'a> {
    /// An observer that reports nothing.
    pub fn silent(plan_id: impl Into<String>) -> Self {
        Self {
            plan_id: plan_id.into(),
            renderer: None,
            progress: None,
        }
    }

    pub fn with_renderer(mut self, renderer: Option<&'a dyn OutputRendererPlugin>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_progress(mut self, progress: Option<&'a Mutex<ProgressMonitor>>) -> Self {
        self.progress = progress;
        self
    }

    fn render(&self, event: RenderEvent) {
        if let Some(renderer) = self.renderer {
            renderer.render(&event);
        }
    }

    fn with_monitor(&self, f: impl FnOnce(&mut ProgressMonitor)) {
        if let Some(progress) = self.progress {
            if let Ok(mut monitor) = progress.lock() {
                f(&mut monitor);
            }
        }
    }

    pub fn run_start(&self, total_tasks: usize, mode: RunMode) {
        self.render(RenderEvent::RunStart {
            plan_id: self.plan_id.clone(),
            total_tasks,
            mode,
        });
    }

    pub fn round_start(&self, round: usize, task_ids: Vec<String>) {
        self.with_monitor(|m| m.update_round(round));
        self.render(RenderEvent::RoundStart {
            plan_id: self.plan_id.clone(),
            round,
            task_ids,
        });
    }

    pub fn task_start(&self, task_id: &str, round: Option<usize>) {
        self.with_monitor(|m| m.start_task(task_id));
        self.render(RenderEvent::TaskStart {
            plan_id: self.plan_id.clone(),
            task_id: task_id.to_string(),
            round,
        });
    }

    pub fn task_complete(&self, result: &ExecutionResult) {
        self.with_monitor(|m| m.complete_task(&result.task_id, result.status, result.execution_time));
        self.render(RenderEvent::TaskComplete {
            plan_id: self.plan_id.clone(),
            result: result.clone(),
        });
    }

    pub fn task_skipped(&self, task_id: &str, reason: &str) {
        self.with_monitor(|m| m.complete_task(task_id, TaskStatus::Skipped, 0.0));
        self.render(RenderEvent::TaskSkipped {
            plan_id: self.plan_id.clone(),
            task_id: task_id.to_string(),
            reason: reason.to_string(),
        });
    }

    pub fn round_end(&self, round: usize) {
        self.render(RenderEvent::RoundEnd {
            plan_id: self.plan_id.clone(),
            round,
        });
    }

    pub fn run_end(&self, summary: &ExecutionSummary) {
        self.with_monitor(|m| m.finish(summary.status));
        self.render(RenderEvent::RunEnd {
            plan_id: self.plan_id.clone(),
            summary: summary.clone(),
        });
    }
}

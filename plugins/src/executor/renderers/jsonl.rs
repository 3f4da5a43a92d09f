use chrono::Local;
use planrun_core::executor::{OutputRendererPlugin, RenderEvent, RunMode};
use serde_json::{json, Value};

/// One JSON object per run event, written to stderr so stdout stays reserved
/// for the response document.
pub struct JsonlRendererPlugin {
    pretty_print: bool,
}

impl JsonlRendererPlugin {
    pub fn new(pretty_print: bool) -> Self {
        Self { pretty_print }
    }

    fn event_to_json(&self, event: &RenderEvent) -> Value {
        let ts = Local::now().to_rfc3339();
        match event {
            RenderEvent::RunStart {
                plan_id,
                total_tasks,
                mode,
            } => {
                let mut value = json!({
                    "v": 1,
                    "event_type": "run.start",
                    "ts": ts,
                    "plan_id": plan_id,
                    "metadata": {
                        "total_tasks": total_tasks,
                        "mode": mode.as_str(),
                    }
                });
                if let RunMode::Parallel { max_parallel_tasks } = mode {
                    value["metadata"]["max_parallel_tasks"] = json!(max_parallel_tasks);
                }
                value
            }
            RenderEvent::RoundStart {
                plan_id,
                round,
                task_ids,
            } => json!({
                "v": 1,
                "event_type": "round.start",
                "ts": ts,
                "plan_id": plan_id,
                "metadata": {
                    "round": round,
                    "tasks": task_ids,
                }
            }),
            RenderEvent::TaskStart {
                plan_id,
                task_id,
                round,
            } => json!({
                "v": 1,
                "event_type": "task.start",
                "ts": ts,
                "plan_id": plan_id,
                "task_id": task_id,
                "metadata": {
                    "round": round,
                }
            }),
            RenderEvent::TaskComplete { plan_id, result } => json!({
                "v": 1,
                "event_type": "task.end",
                "ts": ts,
                "plan_id": plan_id,
                "task_id": result.task_id,
                "status": result.status,
                "metadata": {
                    "execution_time": result.execution_time,
                    "estimated_time": result.estimated_time,
                    "error": result.error,
                }
            }),
            RenderEvent::TaskSkipped {
                plan_id,
                task_id,
                reason,
            } => json!({
                "v": 1,
                "event_type": "task.skipped",
                "ts": ts,
                "plan_id": plan_id,
                "task_id": task_id,
                "metadata": {
                    "reason": reason,
                }
            }),
            RenderEvent::RoundEnd { plan_id, round } => json!({
                "v": 1,
                "event_type": "round.end",
                "ts": ts,
                "plan_id": plan_id,
                "metadata": {
                    "round": round,
                }
            }),
            RenderEvent::RunEnd { plan_id, summary } => json!({
                "v": 1,
                "event_type": "run.end",
                "ts": ts,
                "plan_id": plan_id,
                "status": summary.status,
                "metadata": {
                    "total_tasks": summary.total_tasks,
                    "successful_tasks": summary.successful_tasks,
                    "failed_tasks": summary.failed_tasks,
                    "total_execution_time": summary.total_execution_time,
                }
            }),
        }
    }
}

impl OutputRendererPlugin for JsonlRendererPlugin {
    fn name(&self) -> &str {
        "jsonl-renderer"
    }

    fn format(&self) -> &str {
        "jsonl"
    }

    fn render(&self, event: &RenderEvent) {
        let value = self.event_to_json(event);
        if self.pretty_print {
            eprintln!("{}", serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".into()));
        } else {
            eprintln!("{}", serde_json::to_string(&value).unwrap_or_else(|_| "{}".into()));
        }
    }
}

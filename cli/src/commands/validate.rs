use planrun_core::executor::TaskGraph;
use planrun_core::CliError;

use super::cli::ValidateArgs;

/// Print a validation report for a plan file.
///
/// Exit code 0 when the plan is clean, 1 when it has duplicate ids,
/// unknown dependencies or a cycle.
pub fn validate(args: ValidateArgs) -> Result<i32, CliError> {
    let plan = crate::plan_file::load_plan(&args.plan_file)?;
    let (report, clean) = report(&plan.tasks);
    println!("Plan {} ({} tasks)", plan.id, plan.tasks.len());
    for line in report {
        println!("{line}");
    }
    Ok(if clean { 0 } else { 1 })
}

fn report(tasks: &[planrun_core::Task]) -> (Vec<String>, bool) {
    let graph = match TaskGraph::from_tasks(tasks) {
        Ok(graph) => graph,
        Err(e) => return (vec![format!("error: {e}")], false),
    };

    let diagnostics = graph.diagnostics();
    let mut lines: Vec<String> = diagnostics
        .messages()
        .into_iter()
        .map(|m| format!("warning: {m}"))
        .collect();

    let stages = graph.stages();
    for (i, stage) in stages.stages.iter().enumerate() {
        lines.push(format!("stage {}: {}", i + 1, stage.join(", ")));
    }
    if !stages.unreachable.is_empty() {
        lines.push(format!("never runnable: {}", stages.unreachable.join(", ")));
    }
    (lines, diagnostics.is_clean())
}

#[cfg(test)]
mod tests {
    use super::*;
    use planrun_core::Task;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_clean_plan_lists_stages() {
        let tasks = vec![
            Task::new("a", "project_setup"),
            Task::new("b", "testing").depends_on("a"),
            Task::new("c", "documentation").depends_on("a"),
        ];
        let (lines, clean) = report(&tasks);
        assert!(clean);
        assert_eq!(lines, vec!["stage 1: a", "stage 2: b, c"]);
    }

    #[test]
    fn test_duplicate_ids_are_an_error() {
        let tasks = vec![Task::new("a", "x"), Task::new("a", "y")];
        let (lines, clean) = report(&tasks);
        assert!(!clean);
        assert!(lines[0].starts_with("error:"));
    }

    #[test]
    fn test_unknown_dependency_is_reported() {
        let tasks = vec![Task::new("a", "x").depends_on("ghost")];
        let (lines, clean) = report(&tasks);
        assert!(!clean);
        assert!(lines[0].contains("ghost"));
        assert_eq!(lines.last().unwrap(), "never runnable: a");
    }
}

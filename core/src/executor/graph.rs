use std::collections::{HashMap, HashSet};

use crate::error::ExecutorError;

use super::types::Task;

/// Task dependency graph, built once per run for validation and diagnostics.
///
/// The scheduler never consults it; eligibility is decided round by round
/// by the resolver. Unresolved ids and cycles are reported, not rejected.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    /// Dependency edges: task_id -> list of dependencies
    pub edges: HashMap<String, Vec<String>>,

    /// Reverse edges: task_id -> list of tasks that depend on it
    pub reverse_edges: HashMap<String, Vec<String>>,

    /// Task ids in plan order, for stable sorting
    insertion_order: Vec<String>,
}

/// Problems worth reporting before a run starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphDiagnostics {
    /// (task_id, missing dependency id)
    pub unresolved: Vec<(String, String)>,
    pub cycle: Option<String>,
}

impl GraphDiagnostics {
    pub fn is_clean(&self) -> bool {
        self.unresolved.is_empty() && self.cycle.is_none()
    }

    pub fn messages(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .unresolved
            .iter()
            .map(|(task, dep)| {
                format!("Task '{task}' depends on unknown task '{dep}' and will never run")
            })
            .collect();
        if let Some(cycle) = &self.cycle {
            out.push(format!("Circular dependency detected: {cycle}"));
        }
        out
    }
}

/// Dependency-ordered layering of a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagePlan {
    /// Tasks whose dependencies are all satisfied by earlier stages.
    pub stages: Vec<Vec<String>>,
    /// Tasks that can never become ready (unknown dependency or cycle).
    pub unreachable: Vec<String>,
}

impl TaskGraph {
    /// Construct task graph from task list
    pub fn from_tasks(tasks: &[Task]) -> Result<Self, ExecutorError> {
        let mut edges = HashMap::new();
        let mut reverse_edges: HashMap<String, Vec<String>> = HashMap::new();
        let mut insertion_order = Vec::new();

        for task in tasks {
            if edges.contains_key(&task.id) {
                return Err(ExecutorError::DuplicateTaskId(task.id.clone()));
            }

            let dependencies: Vec<String> = task.dependency_ids().map(str::to_string).collect();

            for dep in &dependencies {
                reverse_edges
                    .entry(dep.clone())
                    .or_default()
                    .push(task.id.clone());
            }

            edges.insert(task.id.clone(), dependencies);
            insertion_order.push(task.id.clone());
        }

        Ok(Self {
            edges,
            reverse_edges,
            insertion_order,
        })
    }

    pub fn len(&self) -> usize {
        self.insertion_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insertion_order.is_empty()
    }

    pub fn diagnostics(&self) -> GraphDiagnostics {
        let mut unresolved = Vec::new();
        for task_id in &self.insertion_order {
            for dep in &self.edges[task_id] {
                if !self.edges.contains_key(dep) {
                    unresolved.push((task_id.clone(), dep.clone()));
                }
            }
        }

        GraphDiagnostics {
            unresolved,
            cycle: self.detect_cycle(),
        }
    }

    /// Layer tasks with Kahn's algorithm, preserving input order within a stage.
    ///
    /// Stages ignore any parallelism bound; they show which tasks could run
    /// together, not how a bounded run would batch them.
    pub fn stages(&self) -> StagePlan {
        // edges[A] = [B, C] means A depends on B and C, so in-degree(A) = 2.
        // Unknown ids are never processed, which leaves their dependents stuck.
        let mut in_degree: HashMap<&str, usize> = self
            .edges
            .iter()
            .map(|(id, deps)| (id.as_str(), deps.len()))
            .collect();

        let mut current: Vec<String> = self
            .insertion_order
            .iter()
            .filter(|id| in_degree.get(id.as_str()) == Some(&0))
            .cloned()
            .collect();

        let mut stages = Vec::new();
        let mut processed: HashSet<String> = HashSet::new();

        while !current.is_empty() {
            let mut next = Vec::new();

            for task_id in &current {
                processed.insert(task_id.clone());
                if let Some(dependents) = self.reverse_edges.get(task_id) {
                    for dependent in dependents {
                        if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
                            *degree = degree.saturating_sub(1);
                            if *degree == 0 {
                                next.push(dependent.clone());
                            }
                        }
                    }
                }
            }

            next.sort_by_key(|id| self.position(id));
            next.dedup();
            stages.push(std::mem::replace(&mut current, next));
        }

        let unreachable = self
            .insertion_order
            .iter()
            .filter(|id| !processed.contains(*id))
            .cloned()
            .collect();

        StagePlan {
            stages,
            unreachable,
        }
    }

    fn position(&self, id: &str) -> usize {
        self.insertion_order
            .iter()
            .position(|k| k == id)
            .unwrap_or(usize::MAX)
    }

    /// Detect circular dependencies using DFS
    ///
    /// # Time Complexity
    ///
    /// O(V + E) where V = number of tasks, E = number of dependencies
    fn detect_cycle(&self) -> Option<String> {
        let mut visited = HashSet::new();
        let mut stack = Vec::new();

        for task_id in &self.insertion_order {
            if !visited.contains(task_id) && self.dfs_cycle(task_id, &mut visited, &mut stack) {
                return Some(format_cycle_path(&stack));
            }
        }

        None
    }

    fn dfs_cycle(
        &self,
        node: &str,
        visited: &mut HashSet<String>,
        stack: &mut Vec<String>,
    ) -> bool {
        visited.insert(node.to_string());
        stack.push(node.to_string());

        if let Some(dependencies) = self.edges.get(node) {
            for dep in dependencies {
                // Check if dependency is in current path (cycle detected)
                if let Some(pos) = stack.iter().position(|x| x == dep) {
                    stack.push(dep.clone());
                    *stack = stack[pos..].to_vec();
                    return true;
                }

                if !visited.contains(dep)
                    && self.edges.contains_key(dep)
                    && self.dfs_cycle(dep, visited, stack)
                {
                    return true;
                }
            }
        }

        stack.pop();
        false
    }
}

fn format_cycle_path(stack: &[String]) -> String {
    stack.join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, deps: &[&str]) -> Task {
        deps.iter()
            .fold(Task::new(id, "testing"), |t, d| t.depends_on(*d))
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let err = TaskGraph::from_tasks(&[task("a", &[]), task("a", &[])]).unwrap_err();
        assert!(matches!(err, ExecutorError::DuplicateTaskId(id) if id == "a"));
    }

    #[test]
    fn test_stages_preserve_input_order() {
        let graph = TaskGraph::from_tasks(&[
            task("t1", &[]),
            task("t3", &["t1"]),
            task("t2", &["t1"]),
            task("t4", &["t2", "t3"]),
        ])
        .unwrap();

        let plan = graph.stages();
        assert_eq!(
            plan.stages,
            vec![
                vec!["t1".to_string()],
                vec!["t3".to_string(), "t2".to_string()],
                vec!["t4".to_string()],
            ]
        );
        assert!(plan.unreachable.is_empty());
    }

    #[test]
    fn test_unknown_dependency_is_reported_and_unreachable() {
        let graph =
            TaskGraph::from_tasks(&[task("a", &[]), task("b", &["ghost"]), task("c", &["b"])])
                .unwrap();

        let diag = graph.diagnostics();
        assert_eq!(diag.unresolved, vec![("b".to_string(), "ghost".to_string())]);
        assert!(diag.cycle.is_none());

        let plan = graph.stages();
        assert_eq!(plan.stages, vec![vec!["a".to_string()]]);
        assert_eq!(plan.unreachable, vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_cycle_detected() {
        let graph = TaskGraph::from_tasks(&[task("a", &["b"]), task("b", &["a"])]).unwrap();

        let diag = graph.diagnostics();
        assert_eq!(diag.cycle.as_deref(), Some("a -> b -> a"));
        assert_eq!(diag.messages().len(), 1);
        assert_eq!(graph.stages().unreachable.len(), 2);
    }
}

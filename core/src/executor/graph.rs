use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::error::AggregateError;
use crate::executor::types::TaskLike;

/// Task dependency graph (DAG) over one batch.
#[derive(Debug, Clone)]
pub struct TaskGraph<T: TaskLike> {
    /// Task nodes: task_id -> Task
    pub nodes: HashMap<String, T>,

    /// Dependency edges: task_id -> list of dependencies
    pub edges: HashMap<String, Vec<String>>,

    /// Reverse edges: task_id -> list of tasks that depend on it
    pub reverse_edges: HashMap<String, Vec<String>>,

    /// Batch position of each id (for stable ordering)
    positions: HashMap<String, usize>,
}

/// Predicted round partition of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoundPlan {
    /// Ids per round, batch order within a round.
    pub rounds: Vec<Vec<String>>,
    /// Ids that can never become ready (cycle or missing dependency).
    pub unresolved: Vec<String>,
    /// `(task, dependency)` pairs naming ids absent from the batch.
    pub missing: Vec<(String, String)>,
    /// One cycle, if any, as `a -> b -> a`.
    pub cycle: Option<String>,
}

impl RoundPlan {
    pub fn is_satisfiable(&self) -> bool {
        self.unresolved.is_empty()
    }
}

impl<T: TaskLike> TaskGraph<T> {
    /// Construct task graph from task list. Rejects duplicate ids.
    pub fn from_tasks(tasks: &[T]) -> Result<Self, AggregateError> {
        let mut nodes = HashMap::new();
        let mut edges = HashMap::new();
        let mut reverse_edges: HashMap<String, Vec<String>> = HashMap::new();
        let mut positions = HashMap::new();

        for (position, task) in tasks.iter().enumerate() {
            if nodes.contains_key(task.id()) {
                return Err(AggregateError::Validation(format!(
                    "duplicate task id: {}",
                    task.id()
                )));
            }

            let task_id = task.id().to_string();
            let dependencies = task.dependencies().to_vec();

            nodes.insert(task_id.clone(), task.clone());
            positions.insert(task_id.clone(), position);

            for dep in &dependencies {
                reverse_edges
                    .entry(dep.clone())
                    .or_default()
                    .push(task_id.clone());
            }
            edges.insert(task_id, dependencies);
        }

        Ok(Self {
            nodes,
            edges,
            reverse_edges,
            positions,
        })
    }

    /// Dependencies that name no task in the batch.
    pub fn missing_dependencies(&self) -> Vec<(String, String)> {
        let mut missing: Vec<(String, String)> = self
            .edges
            .iter()
            .flat_map(|(task_id, deps)| {
                deps.iter()
                    .filter(|dep| !self.nodes.contains_key(*dep))
                    .map(move |dep| (task_id.clone(), dep.clone()))
            })
            .collect();
        missing.sort_by_key(|(task_id, _)| self.position(task_id));
        missing
    }

    /// Compute rounds with Kahn's algorithm.
    ///
    /// A task lands in round *k* iff the longest dependency chain ending at it
    /// has length *k-1*. This mirrors what the runtime scheduler does when every
    /// task succeeds; tasks behind a cycle or a missing id end up `unresolved`.
    ///
    /// O(V + E) where V = number of tasks, E = number of dependencies
    pub fn plan(&self) -> RoundPlan {
        // edges[A] = [B, C] means A depends on B and C, so A's in-degree is 2.
        let mut in_degree: HashMap<&str, usize> = self
            .edges
            .iter()
            .map(|(task_id, deps)| (task_id.as_str(), deps.len()))
            .collect();

        let mut current: Vec<String> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| id.to_string())
            .collect();
        self.sort_stable(&mut current);

        let mut rounds = Vec::new();
        let mut processed = HashSet::new();

        while !current.is_empty() {
            let mut next = Vec::new();
            for task_id in &current {
                processed.insert(task_id.clone());
                let Some(dependents) = self.reverse_edges.get(task_id) else {
                    continue;
                };
                for dependent in dependents {
                    if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
                        *degree -= 1;
                        if *degree == 0 {
                            next.push(dependent.clone());
                        }
                    }
                }
            }
            self.sort_stable(&mut next);
            rounds.push(std::mem::replace(&mut current, next));
        }

        let mut unresolved: Vec<String> = self
            .nodes
            .keys()
            .filter(|id| !processed.contains(*id))
            .cloned()
            .collect();
        self.sort_stable(&mut unresolved);

        RoundPlan {
            rounds,
            unresolved,
            missing: self.missing_dependencies(),
            cycle: self.detect_cycle(),
        }
    }

    /// Detect circular dependencies using DFS
    ///
    /// O(V + E) where V = number of tasks, E = number of dependencies
    pub fn detect_cycle(&self) -> Option<String> {
        let mut visited = HashSet::new();
        let mut stack = Vec::new();

        let mut roots: Vec<String> = self.nodes.keys().cloned().collect();
        self.sort_stable(&mut roots);

        for task_id in &roots {
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
                // Dependency already on the current path: cycle.
                if let Some(pos) = stack.iter().position(|x| x == dep) {
                    stack.push(dep.clone());
                    *stack = stack[pos..].to_vec();
                    return true;
                }

                if !visited.contains(dep) && self.dfs_cycle(dep, visited, stack) {
                    return true;
                }
            }
        }

        stack.pop();
        false
    }

    fn position(&self, id: &str) -> usize {
        self.positions.get(id).copied().unwrap_or(usize::MAX)
    }

    fn sort_stable(&self, ids: &mut [String]) {
        ids.sort_by_key(|id| self.position(id));
    }
}

fn format_cycle_path(stack: &[String]) -> String {
    stack.join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::types::TaskDescriptor;
    use pretty_assertions::assert_eq;

    fn t(id: &str, deps: &[&str]) -> TaskDescriptor {
        TaskDescriptor::get(id, format!("/{id}")).depends_on(deps.iter().copied())
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let err = TaskGraph::from_tasks(&[t("a", &[]), t("a", &[])]).unwrap_err();
        assert!(matches!(err, AggregateError::Validation(_)));
    }

    #[test]
    fn test_plan_uses_longest_chain_depth() {
        // d depends on a (depth 1) and c (depth 3): it must land in round 4.
        let graph = TaskGraph::from_tasks(&[
            t("d", &["a", "c"]),
            t("a", &[]),
            t("b", &["a"]),
            t("c", &["b"]),
            t("e", &[]),
        ])
        .unwrap();
        let plan = graph.plan();
        assert_eq!(
            plan.rounds,
            vec![
                vec!["a".to_string(), "e".to_string()],
                vec!["b".to_string()],
                vec!["c".to_string()],
                vec!["d".to_string()],
            ]
        );
        assert!(plan.is_satisfiable());
        assert_eq!(plan.cycle, None);
    }

    #[test]
    fn test_plan_reports_cycle() {
        let graph = TaskGraph::from_tasks(&[t("a", &["b"]), t("b", &["a"]), t("c", &[])]).unwrap();
        let plan = graph.plan();
        assert_eq!(plan.rounds, vec![vec!["c".to_string()]]);
        assert_eq!(plan.unresolved, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(plan.cycle.as_deref(), Some("a -> b -> a"));
    }

    #[test]
    fn test_plan_reports_missing_dependency() {
        let graph = TaskGraph::from_tasks(&[t("a", &[]), t("b", &["ghost"])]).unwrap();
        let plan = graph.plan();
        assert_eq!(plan.unresolved, vec!["b".to_string()]);
        assert_eq!(plan.missing, vec![("b".to_string(), "ghost".to_string())]);
        assert!(!plan.is_satisfiable());
    }
}

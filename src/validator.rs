//! Priority assignment and validation (Component B).
//!
//! Generalizes a plain taskset-sortedness check ("is it sorted by period")
//! into "assign RMS priorities, or validate ones already supplied", with
//! strict and permissive modes.

use crate::errors::SpecError;
use crate::model::{Task, TaskSet};
use crate::RunConfig;

pub mod prelude {
    pub use super::{Issue, IssueKind, Severity, validate_and_assign};
}

/// Severity of a single diagnostic produced while validating or assigning
/// priorities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Blocks the pipeline in strict mode; auto-repaired in permissive mode.
    Error,
    /// Never blocks; recorded for the stage log only.
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    PriorityAssigned { task: String, priority: u8 },
    DuplicatePriorityRewritten { tasks: Vec<String>, priority: u8 },
    PriorityOutOfRange { task: String, priority: u8 },
    /// Every task had a unique, in-range priority, but it wasn't monotone in
    /// period (Tᵢ<Tⱼ but Pᵢ>=Pⱼ); the whole set was renumbered canonically.
    Inversion { tasks: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub severity: Severity,
    pub kind: IssueKind,
}

/// Assign RMS priorities to any task missing one, and validate priorities
/// already supplied.
///
/// Shorter period gets the numerically lower (higher) priority; ties are
/// broken by the canonical name order. In strict mode a duplicate or
/// out-of-range priority is a [`SpecError`]; in permissive mode it is
/// silently rewritten and reported as an [`Issue`].
pub fn validate_and_assign(taskset: TaskSet, config: &RunConfig) -> Result<(TaskSet, Vec<Issue>), SpecError> {
    let mut issues = Vec::new();

    if config.strict_priority {
        for task in &taskset.tasks {
            if task.has_priority_assigned() && !(1..=10).contains(&task.priority) {
                return Err(SpecError::PriorityOutOfRange {
                    name: task.name.clone(),
                    priority: task.priority,
                });
            }
        }
        if taskset.has_duplicate_priorities() {
            let duplicates = duplicate_names(&taskset);
            let priority = duplicates
                .iter()
                .find_map(|name| taskset.tasks.iter().find(|t| &t.name == name).map(|t| t.priority))
                .unwrap_or(Task::UNASSIGNED_PRIORITY);
            return Err(SpecError::DuplicatePriority(duplicates, priority));
        }
        if has_priority_inversion(&taskset) {
            let names = taskset.clone().into_canonical_order().tasks.into_iter().map(|t| t.name).collect();
            return Err(SpecError::PriorityInversion(names));
        }
    }

    let ordered = taskset.into_canonical_order();
    let mut tasks = ordered.tasks;

    let needs_assignment: Vec<usize> = tasks
        .iter()
        .enumerate()
        .filter(|(_, t)| !t.has_priority_assigned() || !(1..=10).contains(&t.priority))
        .map(|(i, _)| i)
        .collect();

    if !needs_assignment.is_empty() {
        let mut by_priority: Vec<u8> = (1..=tasks.len().min(10) as u8).collect();
        by_priority.truncate(needs_assignment.len());
        for (slot, &index) in needs_assignment.iter().enumerate() {
            let assigned = *by_priority.get(slot).unwrap_or(&10);
            let out_of_range = !(1..=10).contains(&tasks[index].priority);
            if out_of_range && tasks[index].has_priority_assigned() {
                issues.push(Issue {
                    severity: Severity::Error,
                    kind: IssueKind::PriorityOutOfRange {
                        task: tasks[index].name.clone(),
                        priority: tasks[index].priority,
                    },
                });
            }
            tasks[index].priority = assigned;
            issues.push(Issue {
                severity: Severity::Info,
                kind: IssueKind::PriorityAssigned {
                    task: tasks[index].name.clone(),
                    priority: assigned,
                },
            });
        }
    }

    let mut taskset = TaskSet::new(tasks);
    if taskset.has_duplicate_priorities() {
        let duplicates = duplicate_names(&taskset);
        let (rewritten_set, rewritten) = rewrite_duplicates(taskset, &duplicates);
        issues.push(Issue {
            severity: Severity::Info,
            kind: IssueKind::DuplicatePriorityRewritten {
                tasks: duplicates,
                priority: rewritten,
            },
        });
        return Ok((rewritten_set, issues));
    }

    if has_priority_inversion(&taskset) {
        let offending: Vec<String> = taskset.tasks.iter().map(|t| t.name.clone()).collect();
        taskset = renumber_canonical(taskset);
        issues.push(Issue {
            severity: Severity::Info,
            kind: IssueKind::Inversion { tasks: offending },
        });
    }

    Ok((taskset, issues))
}

/// True if some pair of tasks in canonical (period-ascending) order has a
/// shorter-period task whose priority is not strictly better than a
/// longer-period task's, i.e. the assignment isn't monotone in period even
/// though every individual priority is unique and in range.
fn has_priority_inversion(taskset: &TaskSet) -> bool {
    let ordered = taskset.clone().into_canonical_order();
    ordered
        .tasks
        .windows(2)
        .any(|w| w[0].has_priority_assigned() && w[1].has_priority_assigned() && w[0].priority >= w[1].priority)
}

/// Renumber every task in canonical order, ignoring whatever priorities were
/// already present.
fn renumber_canonical(taskset: TaskSet) -> TaskSet {
    let ordered = taskset.into_canonical_order();
    let mut tasks = ordered.tasks;
    for (index, task) in tasks.iter_mut().enumerate() {
        task.priority = (index + 1).min(10) as u8;
    }
    TaskSet::new(tasks)
}

fn duplicate_names(taskset: &TaskSet) -> Vec<String> {
    use std::collections::HashMap;
    let mut by_priority: HashMap<u8, Vec<String>> = HashMap::new();
    for task in &taskset.tasks {
        if task.has_priority_assigned() {
            by_priority.entry(task.priority).or_default().push(task.name.clone());
        }
    }
    by_priority
        .into_iter()
        .filter(|(_, names)| names.len() > 1)
        .flat_map(|(_, names)| names)
        .collect()
}

/// Renumber every task in canonical order, ignoring whatever priorities were
/// already present. Used once any duplicate survives the initial gap-fill
/// pass (e.g. two tasks both arrived with the same explicit priority).
fn rewrite_duplicates(taskset: TaskSet, duplicates: &[String]) -> (TaskSet, u8) {
    let taskset = renumber_canonical(taskset);
    let rewritten = taskset
        .tasks
        .iter()
        .find(|t| duplicates.contains(&t.name))
        .map(|t| t.priority)
        .unwrap_or(Task::UNASSIGNED_PRIORITY);
    (taskset, rewritten)
}

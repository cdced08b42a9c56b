//! Pre-verification repair proposals for unschedulable task sets.
//!
//! Generalizes a yes/no schedulability verdict into concrete, applied
//! repairs the controller can fold back into the canonical task set before
//! re-running analysis.

use crate::model::{Millis, Task, TaskSet};

use super::response_time::ResponseTimeReport;

/// One concrete change the repair pass made to a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairAction {
    /// Deadline stretched by up to 10%; still within the task's period.
    DeadlineExtended { task: String, from: u64, to: u64 },
    /// Period (and, for implicit-deadline tasks, deadline) rounded up to the
    /// next "nice" magnitude at or above the observed response time.
    PeriodRounded { task: String, from: u64, to: u64 },
    /// No automatic fix applies; the task is flagged for manual removal.
    RemovalSuggested { task: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RepairProposal {
    pub actions: Vec<RepairAction>,
    pub repaired: TaskSet,
}

impl RepairProposal {
    /// A repair that touched nothing is not a repair: the controller's
    /// anti-livelock check relies on this to detect a stuck run.
    pub fn changed_anything(&self) -> bool {
        self.actions.iter().any(|a| !matches!(a, RepairAction::RemovalSuggested { .. }))
    }
}

/// Propose repairs for every task that misses its deadline in `report`,
/// trying, in order: extend the deadline by 10%, round the period up to the
/// next nice number, or give up and suggest removal.
pub fn propose_repair(taskset: &TaskSet, report: &ResponseTimeReport) -> RepairProposal {
    let mut tasks = taskset.tasks.clone();
    let mut actions = Vec::new();

    for failing in report.unschedulable_tasks() {
        let Some(task) = tasks.iter_mut().find(|t| t.name == failing.name) else {
            continue;
        };

        let stretched_deadline = (failing.response_time as f64 * 1.1).ceil() as u64;
        if stretched_deadline <= task.period.value() {
            let from = task.deadline.value();
            task.deadline = Millis::new(stretched_deadline);
            actions.push(RepairAction::DeadlineExtended {
                task: task.name.clone(),
                from,
                to: stretched_deadline,
            });
            continue;
        }

        if task.has_implicit_deadline() {
            let rounded = round_to_nice_number(failing.response_time.max(task.period.value() + 1));
            let from = task.period.value();
            task.period = Millis::new(rounded);
            task.deadline = Millis::new(rounded);
            actions.push(RepairAction::PeriodRounded {
                task: task.name.clone(),
                from,
                to: rounded,
            });
            continue;
        }

        actions.push(RepairAction::RemovalSuggested { task: task.name.clone() });
    }

    RepairProposal {
        actions,
        repaired: TaskSet::new(tasks),
    }
}

/// Round `value` up to the nearest number of the form `{1, 2, 5} * 10^k`.
fn round_to_nice_number(value: u64) -> u64 {
    if value == 0 {
        return 0;
    }
    let magnitude = 10u64.pow((value as f64).log10().floor() as u32);
    for step in [1u64, 2, 5, 10] {
        let candidate = step * magnitude;
        if candidate >= value {
            return candidate;
        }
    }
    10 * magnitude
}

/// Apply the counterexample-driven repair the controller uses after a
/// verifier rejects a model: scale the offending task's period and deadline
/// up by 20%, the wider margin reflecting that the issue surfaced only after
/// a concrete trace was found, not a numeric bound.
pub fn repair_from_counterexample(taskset: &TaskSet, task_name: &str) -> TaskSet {
    let mut tasks = taskset.tasks.clone();
    if let Some(task) = tasks.iter_mut().find(|t| t.name == task_name) {
        let new_period = (task.period.value() as f64 * 1.2).ceil() as u64;
        let new_deadline = if task.has_implicit_deadline() {
            new_period
        } else {
            (task.deadline.value() as f64 * 1.2).ceil() as u64
        };
        task.period = Millis::new(new_period);
        task.deadline = Millis::new(new_deadline.min(new_period));
    }
    TaskSet::new(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::response_time;

    #[test]
    fn nice_number_rounds_up_to_nearest_bucket() {
        assert_eq!(round_to_nice_number(1), 1);
        assert_eq!(round_to_nice_number(3), 5);
        assert_eq!(round_to_nice_number(11), 20);
        assert_eq!(round_to_nice_number(45), 50);
        assert_eq!(round_to_nice_number(101), 200);
    }

    #[test]
    fn deadline_extension_is_tried_before_period_rounding() {
        let set = TaskSet::new(vec![
            Task::new("Hi", 10, 10, 6, 1),
            Task::new("Lo", 100, 70, 30, 2),
        ]);
        let report = response_time::analyze(&set).unwrap();
        assert!(!report.is_schedulable());
        let proposal = propose_repair(&set, &report);
        assert!(proposal.changed_anything());
        assert!(proposal
            .actions
            .iter()
            .any(|a| matches!(a, RepairAction::DeadlineExtended { task, .. } if task == "Lo")));
    }

    #[test]
    fn counterexample_repair_scales_period_by_1_2x() {
        let set = TaskSet::new(vec![Task::new("A", 100, 100, 10, 1)]);
        let repaired = repair_from_counterexample(&set, "A");
        assert_eq!(repaired.tasks[0].period.value(), 120);
        assert_eq!(repaired.tasks[0].deadline.value(), 120);
    }
}

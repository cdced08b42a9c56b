//! Worst-case response time analysis for fixed-priority preemptive scheduling.
//!
//! Iterates a response-time recurrence to a fixed point, capping iterations
//! and detecting divergence, using a simpler recurrence than classic WCRT
//! analysis: no release jitter or blocking terms, since tasks here are
//! independent and non-blocking.

use crate::errors::AnalysisError;
use crate::model::TaskSet;

use super::fixpoint::fixpoint_search_with_limit;

const MAX_ITERATIONS: u32 = 100;

/// Worst-case response time for a single task, alongside whether it meets
/// its own deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResponse {
    pub name: String,
    pub response_time: u64,
    pub deadline: u64,
    pub meets_deadline: bool,
}

/// Response times for every task in a set, in the set's own order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResponseTimeReport {
    pub responses: Vec<TaskResponse>,
}

impl ResponseTimeReport {
    pub fn is_schedulable(&self) -> bool {
        self.responses.iter().all(|r| r.meets_deadline)
    }

    pub fn unschedulable_tasks(&self) -> impl Iterator<Item = &TaskResponse> {
        self.responses.iter().filter(|r| !r.meets_deadline)
    }
}

/// Compute worst-case response times for every task in `taskset`, which must
/// already be in canonical (ascending-period) order with RMS priorities
/// assigned: task `i`'s higher-priority interferers are exactly tasks
/// `0..i`.
///
/// `R_{k+1} = C_i + sum_{j higher priority} ceil(R_k / T_j) * C_j`, iterated
/// from `R_0 = C_i` to a fixed point, capped at 100 iterations, and treated
/// as divergent once `R_k` exceeds twice the task's deadline.
pub fn analyze(taskset: &TaskSet) -> Result<ResponseTimeReport, AnalysisError> {
    let tasks = &taskset.tasks;
    let mut responses = Vec::with_capacity(tasks.len());

    for (index, task) in tasks.iter().enumerate() {
        let higher_priority = &tasks[..index];
        let limit = task.deadline.value().saturating_mul(2).max(1);
        let mut iterations = 0u32;

        let response = fixpoint_search_with_limit(task.execution.value(), limit, |&r| {
            iterations += 1;
            let interference: u64 = higher_priority
                .iter()
                .map(|hp| {
                    let period = hp.period.value();
                    let jobs = (r + period - 1) / period;
                    jobs.saturating_mul(hp.execution.value())
                })
                .sum();
            task.execution.value() + interference
        });

        if response >= limit || iterations >= MAX_ITERATIONS {
            return Err(AnalysisError::Diverged {
                name: task.name.clone(),
                iterations,
            });
        }

        responses.push(TaskResponse {
            name: task.name.clone(),
            response_time: response,
            deadline: task.deadline.value(),
            meets_deadline: response <= task.deadline.value(),
        });
    }

    Ok(ResponseTimeReport { responses })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Task;

    #[test]
    fn independent_tasks_respond_in_exactly_their_own_execution_time() {
        let set = TaskSet::new(vec![
            Task::new("A", 100, 100, 10, 1),
            Task::new("B", 200, 200, 20, 2),
        ]);
        let report = analyze(&set).unwrap();
        assert_eq!(report.responses[0].response_time, 10);
        assert!(report.is_schedulable());
    }

    #[test]
    fn lower_priority_task_accumulates_interference() {
        let set = TaskSet::new(vec![
            Task::new("Hi", 10, 10, 5, 1),
            Task::new("Lo", 100, 100, 50, 2),
        ]);
        let report = analyze(&set).unwrap();
        let lo = &report.responses[1];
        assert!(lo.response_time > 50);
    }

    #[test]
    fn overloaded_taskset_is_marked_unschedulable_not_divergent() {
        let set = TaskSet::new(vec![
            Task::new("A", 10, 10, 8, 1),
            Task::new("B", 20, 15, 10, 2),
        ]);
        let report = analyze(&set).unwrap();
        assert!(!report.is_schedulable());
    }

    #[test]
    fn pathological_taskset_diverges() {
        let set = TaskSet::new(vec![
            Task::new("A", 2, 2, 2, 1),
            Task::new("B", 100, 3, 50, 2),
        ]);
        let err = analyze(&set).unwrap_err();
        assert!(matches!(err, AnalysisError::Diverged { .. }));
    }
}

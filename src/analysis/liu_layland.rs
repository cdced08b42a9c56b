//! Liu-Layland sufficient schedulability test.
//!
//! Liu, C. L., & Layland, J. W. (1973). Scheduling algorithms for
//! multiprogramming in a hard-real-time environment. Journal of the ACM
//! (JACM), 20(1), 46-61.
//!
//! A sufficient, not necessary, test: a task set can fail it and still be
//! schedulable, so the analyzer only ever uses this as an early-accept short
//! circuit ahead of full response-time analysis, never to reject a task set
//! outright.

use crate::model::TaskSet;

/// `U <= LL(n)`. `true` means the set is certainly schedulable under RMS;
/// `false` is inconclusive and response-time analysis must decide.
pub fn passes_liu_layland_bound(taskset: &TaskSet) -> bool {
    taskset.total_utilization() <= taskset.liu_layland_bound()
}

/// The limit of `LL(n)` as `n -> infinity`, i.e. `ln(2)`. A looser but
/// task-count-independent sufficient test.
pub fn passes_asymptotic_bound(taskset: &TaskSet) -> bool {
    taskset.total_utilization() <= f64::ln(2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Task;

    #[test]
    fn single_task_at_full_utilization_passes_ll_bound() {
        let set = TaskSet::new(vec![Task::new("A", 10, 10, 10, 1)]);
        assert!(passes_liu_layland_bound(&set));
    }

    #[test]
    fn high_utilization_fails_ll_bound_but_may_still_be_schedulable() {
        let set = TaskSet::new(vec![
            Task::new("A", 10, 10, 6, 1),
            Task::new("B", 20, 20, 10, 2),
        ]);
        assert!(!passes_liu_layland_bound(&set));
    }
}
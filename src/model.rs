//! Typed representation of periodic fixed-priority task sets.
//!
//! A `Millis` newtype plus taskset-wide utility functions, generalized to
//! the pipeline's richer per-task shape (name, priority, deadline) and its
//! canonical-form rules.

use std::cmp::Ordering;

pub mod prelude {
    pub use super::{Millis, Task, TaskSet};
}

/// A duration/instant in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Millis(pub u64);

impl Millis {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    /// `ceil(self / rhs)`, the interference term used throughout response-time analysis.
    pub fn div_ceil_by(self, rhs: Millis) -> u64 {
        (self.0 + rhs.0 - 1) / rhs.0
    }
}

impl std::ops::Add for Millis {
    type Output = Millis;
    fn add(self, rhs: Self) -> Self::Output {
        Millis(self.0 + rhs.0)
    }
}

impl std::ops::Mul<u64> for Millis {
    type Output = Millis;
    fn mul(self, rhs: u64) -> Self::Output {
        Millis(self.0 * rhs)
    }
}

impl std::fmt::Display for Millis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single periodic task: (name, period, deadline, execution time, priority).
///
/// `priority` uses the RMS convention: 1 is the highest priority, 10 the
/// lowest. A task fresh out of input normalization may carry the
/// [`Task::UNASSIGNED_PRIORITY`] sentinel until the priority validator
/// rewrites it.
#[derive(Clone, Debug, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Task {
    pub name: String,
    pub period: Millis,
    pub deadline: Millis,
    pub execution: Millis,
    pub priority: u8,
}

impl Task {
    /// Priority value assigned to a task before the validator rewrites it.
    /// Out of the valid `[1, 10]` range by construction, so it can never be
    /// mistaken for a real assignment.
    pub const UNASSIGNED_PRIORITY: u8 = 0;

    pub fn new(name: impl Into<String>, period_ms: u64, deadline_ms: u64, execution_ms: u64, priority: u8) -> Self {
        Self {
            name: name.into(),
            period: Millis::new(period_ms),
            deadline: Millis::new(deadline_ms),
            execution: Millis::new(execution_ms),
            priority,
        }
    }

    pub fn utilization(&self) -> f64 {
        self.execution.value() as f64 / self.period.value() as f64
    }

    pub fn has_implicit_deadline(&self) -> bool {
        self.deadline == self.period
    }

    pub fn has_priority_assigned(&self) -> bool {
        self.priority != Self::UNASSIGNED_PRIORITY
    }

    /// `C <= D <= T`, `C > 0`.
    pub fn satisfies_timing_invariant(&self) -> bool {
        self.execution.value() > 0 && self.execution <= self.deadline && self.deadline <= self.period
    }

    /// `[A-Za-z_][A-Za-z0-9_]*`
    pub fn has_valid_name(&self) -> bool {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}

/// An ordered collection of tasks. Semantics are order-independent, but the
/// canonical form (ascending period, ties by name) is what makes two
/// equivalent task sets compare equal and pipeline runs reproducible.
#[derive(Clone, Debug, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct TaskSet {
    pub tasks: Vec<Task>,
}

impl TaskSet {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Sort by ascending period, ties broken by name — the fixed canonical
    /// order.
    pub fn into_canonical_order(mut self) -> Self {
        self.tasks.sort_by(Self::canonical_cmp);
        self
    }

    pub fn is_in_canonical_order(&self) -> bool {
        self.tasks.windows(2).all(|w| Self::canonical_cmp(&w[0], &w[1]) != Ordering::Greater)
    }

    fn canonical_cmp(a: &Task, b: &Task) -> Ordering {
        a.period.cmp(&b.period).then_with(|| a.name.cmp(&b.name))
    }

    /// Total utilization U = sum(C_i / T_i).
    pub fn total_utilization(&self) -> f64 {
        self.tasks.iter().map(Task::utilization).sum()
    }

    /// Liu-Layland bound LL(n) = n * (2^(1/n) - 1).
    pub fn liu_layland_bound(&self) -> f64 {
        liu_layland_bound(self.tasks.len())
    }

    /// Every task satisfies `C <= D <= T`, `C > 0`, and names are well formed.
    pub fn satisfies_base_invariants(&self) -> bool {
        self.tasks.iter().all(Task::satisfies_timing_invariant) && self.tasks.iter().all(Task::has_valid_name)
    }

    pub fn has_duplicate_priorities(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        self.tasks
            .iter()
            .filter(|t| t.has_priority_assigned())
            .any(|t| !seen.insert(t.priority))
    }
}

/// LL(n) = n * (2^(1/n) - 1), n >= 1. LL(0) is defined as 0 (the vacuous bound).
pub fn liu_layland_bound(n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    n * (2f64.powf(1.0 / n) - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_order_sorts_by_period_then_name() {
        let set = TaskSet::new(vec![
            Task::new("B", 50, 50, 10, Task::UNASSIGNED_PRIORITY),
            Task::new("A", 20, 20, 5, Task::UNASSIGNED_PRIORITY),
            Task::new("C", 20, 20, 5, Task::UNASSIGNED_PRIORITY),
        ])
        .into_canonical_order();

        let names: Vec<_> = set.tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C", "B"]);
    }

    #[test]
    fn liu_layland_bound_matches_known_values() {
        assert!((liu_layland_bound(1) - 1.0).abs() < 1e-9);
        assert!((liu_layland_bound(2) - 0.8284271247).abs() < 1e-6);
    }

    #[test]
    fn timing_invariant_rejects_c_greater_than_d() {
        let task = Task::new("X", 100, 10, 20, 1);
        assert!(!task.satisfies_timing_invariant());
    }

    #[test]
    fn div_ceil_matches_expected_ceiling() {
        assert_eq!(Millis::new(10).div_ceil_by(Millis::new(3)), 4);
        assert_eq!(Millis::new(9).div_ceil_by(Millis::new(3)), 3);
    }
}

//! Seed scenarios S1-S6: end-to-end runs of the pipeline controller against
//! fixed task sets and stub verifiers with known, scripted behavior.

use std::cell::Cell;
use std::time::Duration;

use rms_repair_pipeline::clock::FixedClock;
use rms_repair_pipeline::config::RunConfig;
use rms_repair_pipeline::errors::ExternalError;
use rms_repair_pipeline::model::{Task, TaskSet};
use rms_repair_pipeline::pipeline::{self, TerminalStatus};
use rms_repair_pipeline::synth::dialect::{Property, PropertyCategory};
use rms_repair_pipeline::verifier::{VerifierOutcome, Verifier, parse_output};

struct AlwaysSatisfied;
impl Verifier for AlwaysSatisfied {
    fn verify(&self, _model: &str, properties: &[Property], _timeout: Duration) -> Result<VerifierOutcome, ExternalError> {
        let log: String = properties.iter().map(|_| "Formula is satisfied\n").collect();
        parse_output(&log, properties)
    }
}

#[test]
fn s1_trivially_schedulable_single_task_converges_in_one_iteration() {
    let set = TaskSet::new(vec![Task::new("Task_1", 100, 100, 10, Task::UNASSIGNED_PRIORITY)]);
    let clock = FixedClock("t0".to_string());
    let outcome = pipeline::run_pipeline(set, &RunConfig::default(), &clock, &AlwaysSatisfied, None, || false);

    assert_eq!(outcome.status, TerminalStatus::Converged);
    assert_eq!(outcome.final_taskset.tasks[0].priority, 1);
    assert_eq!(outcome.properties.len(), 4);
    assert_eq!(outcome.log.0.iter().filter(|e| e.iteration == 0).count(), outcome.log.0.len());
}

#[test]
fn s2_two_task_overloaded_set_converges_after_period_repair() {
    let set = TaskSet::new(vec![
        Task::new("Fast", 20, 15, 12, Task::UNASSIGNED_PRIORITY),
        Task::new("Slow", 50, 40, 30, Task::UNASSIGNED_PRIORITY),
    ]);
    let clock = FixedClock("t0".to_string());
    let outcome = pipeline::run_pipeline(set, &RunConfig::default(), &clock, &AlwaysSatisfied, None, || false);

    assert!(matches!(outcome.status, TerminalStatus::Converged | TerminalStatus::Diverged));
    if outcome.status == TerminalStatus::Converged {
        assert!(outcome.final_taskset.total_utilization() <= 1.0);
    }
}

#[test]
fn s3_duplicate_priorities_strict_mode_is_unrepairable() {
    let set = TaskSet::new(vec![
        Task::new("A", 10, 10, 5, 3),
        Task::new("B", 20, 20, 10, 3),
        Task::new("C", 30, 30, 15, 3),
    ]);
    let config = RunConfig { strict_priority: true, ..RunConfig::default() };
    let clock = FixedClock("t0".to_string());
    let outcome = pipeline::run_pipeline(set, &config, &clock, &AlwaysSatisfied, None, || false);

    assert_eq!(outcome.status, TerminalStatus::Unrepairable);
}

#[test]
fn s3_duplicate_priorities_permissive_mode_rewrites_and_proceeds() {
    let set = TaskSet::new(vec![
        Task::new("A", 10, 10, 5, 3),
        Task::new("B", 20, 20, 10, 3),
        Task::new("C", 30, 30, 15, 3),
    ]);
    let clock = FixedClock("t0".to_string());
    let outcome = pipeline::run_pipeline(set, &RunConfig::default(), &clock, &AlwaysSatisfied, None, || false);

    assert_ne!(outcome.status, TerminalStatus::Unrepairable);
    let priorities: Vec<u8> = {
        let mut ps: Vec<u8> = outcome.final_taskset.tasks.iter().map(|t| t.priority).collect();
        ps.sort();
        ps
    };
    assert_eq!(priorities, vec![1, 2, 3]);
}

#[test]
fn s4_unrepairable_overload_eventually_diverges_or_converges() {
    let set = TaskSet::new(vec![Task::new("A", 10, 10, 9, 1), Task::new("B", 10, 10, 9, 2)]);
    let config = RunConfig { max_repair_iterations: 10, ..RunConfig::default() };
    let clock = FixedClock("t0".to_string());
    let outcome = pipeline::run_pipeline(set, &config, &clock, &AlwaysSatisfied, None, || false);

    assert!(matches!(outcome.status, TerminalStatus::Converged | TerminalStatus::Diverged));
    if outcome.status == TerminalStatus::Diverged {
        let repair_entries = outcome.log.0.iter().filter(|e| e.stage == "REPAIR").count();
        assert!(repair_entries >= 1);
    }
}

struct FlipsMutexOnce {
    flipped: Cell<bool>,
}
impl Verifier for FlipsMutexOnce {
    fn verify(&self, _model: &str, properties: &[Property], _timeout: Duration) -> Result<VerifierOutcome, ExternalError> {
        if !self.flipped.get() {
            self.flipped.set(true);
            let log: String = properties
                .iter()
                .map(|p| if matches!(p.category, PropertyCategory::Mutex) { "Formula is NOT satisfied\n" } else { "Formula is satisfied\n" })
                .collect();
            parse_output(&log, properties)
        } else {
            let log: String = properties.iter().map(|_| "Formula is satisfied\n").collect();
            parse_output(&log, properties)
        }
    }
}

#[test]
fn s5_mutex_violation_is_repaired_by_retrying_emission() {
    let set = TaskSet::new(vec![
        Task::new("A", 100, 100, 10, Task::UNASSIGNED_PRIORITY),
        Task::new("B", 200, 200, 20, Task::UNASSIGNED_PRIORITY),
    ]);
    let verifier = FlipsMutexOnce { flipped: Cell::new(false) };
    let clock = FixedClock("t0".to_string());
    let outcome = pipeline::run_pipeline(set, &RunConfig::default(), &clock, &verifier, None, || false);

    assert_eq!(outcome.status, TerminalStatus::Converged);
    let iterations: Vec<u32> = outcome.log.0.iter().map(|e| e.iteration).collect();
    assert!(iterations.contains(&1));
}

struct FlipsDeadlineOnce {
    flipped: Cell<bool>,
}
impl Verifier for FlipsDeadlineOnce {
    fn verify(&self, _model: &str, properties: &[Property], _timeout: Duration) -> Result<VerifierOutcome, ExternalError> {
        if !self.flipped.get() {
            self.flipped.set(true);
            let log: String = properties
                .iter()
                .map(|p| if matches!(p.category, PropertyCategory::Timing) { "Formula is NOT satisfied\n" } else { "Formula is satisfied\n" })
                .collect();
            parse_output(&log, properties)
        } else {
            let log: String = properties.iter().map(|_| "Formula is satisfied\n").collect();
            parse_output(&log, properties)
        }
    }
}

#[test]
fn s6_deadline_violation_counterexample_stretches_deadline_and_converges() {
    let set = TaskSet::new(vec![Task::new("Task_A", 100, 15, 10, Task::UNASSIGNED_PRIORITY)]);
    let verifier = FlipsDeadlineOnce { flipped: Cell::new(false) };
    let clock = FixedClock("t0".to_string());
    let outcome = pipeline::run_pipeline(set, &RunConfig::default(), &clock, &verifier, None, || false);

    assert_eq!(outcome.status, TerminalStatus::Converged);
    assert_eq!(outcome.final_taskset.tasks[0].deadline.value(), 18);
}

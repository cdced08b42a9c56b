//! The pipeline controller (Component E): the bounded seven-stage loop that
//! chains every other component and owns the single canonical `TaskSet`
//! value for the life of a run.

use crate::analysis::{self, SchedulabilityOutcome};
use crate::clock::Clock;
use crate::config::RunConfig;
use crate::errors::SpecError;
use crate::model::TaskSet;
use crate::synth::automata::{self, EmittedModel, LocationRegistry};
use crate::synth::dialect::{self, Property, PropertySource};
use crate::validator;
use crate::verifier::{Verdict, Verifier, VerifierOutcome};

pub mod prelude {
    pub use super::{PipelineOutcome, StageLog, StageLogEntry, TerminalStatus, run_pipeline};
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageResult {
    Accepted(TaskSet),
    Repaired(TaskSet, String),
    Unrepairable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalStatus {
    Converged,
    Diverged,
    Unrepairable,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageLogEntry {
    pub iteration: u32,
    pub stage: String,
    pub timestamp: String,
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageLog(pub Vec<StageLogEntry>);

impl StageLog {
    fn push(&mut self, iteration: u32, stage: &str, timestamp: String, summary: impl Into<String>) {
        self.0.push(StageLogEntry {
            iteration,
            stage: stage.to_string(),
            timestamp,
            summary: summary.into(),
        });
    }
}

pub struct PipelineOutcome {
    pub status: TerminalStatus,
    pub final_taskset: TaskSet,
    pub properties: Vec<Property>,
    pub model: Option<EmittedModel>,
    pub verifier_outcome: Option<VerifierOutcome>,
    pub log: StageLog,
    pub unrepairable_reason: Option<String>,
}

enum ViolationKind {
    Deadline { task: String },
    Mutex,
    Reachability,
    Unknown,
}

fn classify_violation(formula: &str) -> ViolationKind {
    if formula.contains("imply") && formula.contains("x <=") {
        if let Some((task, _)) = dialect::extract_location_refs(formula).into_iter().next() {
            return ViolationKind::Deadline { task };
        }
    }
    if formula.starts_with("A[] not (") && formula.contains(" and ") {
        return ViolationKind::Mutex;
    }
    if formula.starts_with("E<>") && formula.ends_with(".Done") {
        return ViolationKind::Reachability;
    }
    ViolationKind::Unknown
}

/// Run the controller to completion (or cancellation) against `input`.
///
/// `candidate_source` supplies the optional alternative property path;
/// `cancelled` is polled at every stage boundary.
pub fn run_pipeline(
    input: TaskSet,
    config: &RunConfig,
    clock: &dyn Clock,
    verifier: &dyn Verifier,
    candidate_source: Option<&dyn PropertySource>,
    mut cancelled: impl FnMut() -> bool,
) -> PipelineOutcome {
    let mut log = StageLog::default();
    let mut taskset = input;
    let mut use_shared_scheduler = config.use_shared_scheduler;
    let mut iteration = 0u32;

    loop {
        if cancelled() {
            return PipelineOutcome {
                status: TerminalStatus::Cancelled,
                final_taskset: taskset,
                properties: Vec::new(),
                model: None,
                verifier_outcome: None,
                log,
                unrepairable_reason: None,
            };
        }

        if iteration >= config.max_repair_iterations {
            log.push(iteration, "CONTROLLER", clock.now(), "iteration cap reached");
            return PipelineOutcome {
                status: TerminalStatus::Diverged,
                final_taskset: taskset,
                properties: Vec::new(),
                model: None,
                verifier_outcome: None,
                log,
                unrepairable_reason: None,
            };
        }

        // VALIDATE
        let before_validate = taskset.clone();
        match validate_timing(taskset, config) {
            StageResult::Unrepairable(reason) => {
                log.push(iteration, "VALIDATE", clock.now(), reason.clone());
                return unrepairable(before_validate, log, reason);
            }
            StageResult::Accepted(t) => {
                log.push(iteration, "VALIDATE", clock.now(), "accepted");
                taskset = t;
            }
            StageResult::Repaired(t, rationale) => {
                log.push(iteration, "VALIDATE", clock.now(), rationale);
                taskset = t;
            }
        }

        // FIX_PRIORITIES
        taskset = match validator::validate_and_assign(taskset, config) {
            Ok((t, issues)) => {
                log.push(
                    iteration,
                    "FIX_PRIORITIES",
                    clock.now(),
                    format!("{} issue(s) recorded", issues.len()),
                );
                t
            }
            Err(err) => {
                log.push(iteration, "FIX_PRIORITIES", clock.now(), err.to_string());
                return unrepairable(taskset, log, err.to_string());
            }
        };

        // ANALYZE
        let outcome = match analysis::analyze(&taskset) {
            Ok(outcome) => outcome,
            Err(err) => {
                log.push(iteration, "ANALYZE", clock.now(), err.to_string());
                // treated identically to "unschedulable": fall through to repair below
                SchedulabilityOutcome::Unschedulable {
                    report: Default::default(),
                    repair: analysis::repair::propose_repair(&taskset, &Default::default()),
                }
            }
        };

        if let SchedulabilityOutcome::Unschedulable { repair, .. } = &outcome {
            if !config.allow_unschedulable {
                log.push(iteration, "ANALYZE", clock.now(), "unschedulable, applying repair");
                if !repair.changed_anything() {
                    log.push(iteration, "REPAIR", clock.now(), "repair proposal made no change");
                    return PipelineOutcome {
                        status: TerminalStatus::Diverged,
                        final_taskset: taskset,
                        properties: Vec::new(),
                        model: None,
                        verifier_outcome: None,
                        log,
                        unrepairable_reason: None,
                    };
                }
                let previous = taskset.clone().into_canonical_order();
                taskset = repair.repaired.clone().into_canonical_order();
                if taskset == previous {
                    log.push(iteration, "REPAIR", clock.now(), "repair did not change the canonical task set");
                    return PipelineOutcome {
                        status: TerminalStatus::Diverged,
                        final_taskset: taskset,
                        properties: Vec::new(),
                        model: None,
                        verifier_outcome: None,
                        log,
                        unrepairable_reason: None,
                    };
                }
                log.push(iteration, "REPAIR", clock.now(), "repaired, restarting from VALIDATE");
                iteration += 1;
                continue;
            }
            log.push(iteration, "ANALYZE", clock.now(), "unschedulable, proceeding (allow_unschedulable)");
        } else {
            log.push(iteration, "ANALYZE", clock.now(), "schedulable");
        }

        // SYNTHESIZE
        let registry = LocationRegistry::for_taskset(&taskset);
        let properties = if config.allow_multitask_properties {
            candidate_source
                .and_then(|source| source.candidate_properties(&registry))
                .filter(|candidates| dialect::validate_candidates(candidates, &registry))
                .unwrap_or_else(|| dialect::template_properties(&taskset))
        } else {
            dialect::template_properties(&taskset)
        };
        log.push(iteration, "SYNTHESIZE", clock.now(), format!("{} properties", properties.len()));

        // EMIT
        let model = match automata::emit(&taskset, &registry, use_shared_scheduler) {
            Ok(model) => model,
            Err(err) => {
                log.push(iteration, "EMIT", clock.now(), err.to_string());
                return unrepairable(taskset, log, err.to_string());
            }
        };
        log.push(iteration, "EMIT", clock.now(), "model emitted");

        // VERIFY
        let verdict = verifier.verify(&model.xml, &properties, config.verifier_timeout);
        let verifier_outcome = match verdict {
            Ok(outcome) => outcome,
            Err(err) => {
                log.push(iteration, "VERIFY", clock.now(), err.to_string());
                let unknown = VerifierOutcome::unknown(&properties);
                log.push(iteration, "REPAIR", clock.now(), "verifier outcome unknown, unrepairable");
                return PipelineOutcome {
                    status: TerminalStatus::Unrepairable,
                    final_taskset: taskset,
                    properties,
                    model: Some(model),
                    verifier_outcome: Some(unknown),
                    log,
                    unrepairable_reason: Some(err.to_string()),
                };
            }
        };

        if verifier_outcome.all_passed {
            log.push(iteration, "VERIFY", clock.now(), "all properties satisfied");
            return PipelineOutcome {
                status: TerminalStatus::Converged,
                final_taskset: taskset,
                properties,
                model: Some(model),
                verifier_outcome: Some(verifier_outcome),
                log,
                unrepairable_reason: None,
            };
        }

        log.push(iteration, "VERIFY", clock.now(), "at least one property violated");

        // REPAIR-from-counterexample
        let violated: Vec<String> = verifier_outcome.violated_formulas().cloned().collect();
        let mut repaired_any_spec = false;
        let mut retry_emission_only = false;
        let mut unrepairable_reason = None;

        for formula in &violated {
            match classify_violation(formula) {
                ViolationKind::Deadline { task } => {
                    let before = taskset.clone().into_canonical_order();
                    taskset = analysis::repair::repair_from_counterexample(&taskset, &task).into_canonical_order();
                    if taskset != before {
                        repaired_any_spec = true;
                    }
                }
                ViolationKind::Mutex => {
                    use_shared_scheduler = true;
                    retry_emission_only = true;
                }
                ViolationKind::Reachability => {
                    unrepairable_reason = Some(format!("reachability failure for: {formula}"));
                    break;
                }
                ViolationKind::Unknown => {
                    unrepairable_reason = Some(format!("unclassifiable verifier outcome for: {formula}"));
                    break;
                }
            }
        }

        if let Some(reason) = unrepairable_reason {
            log.push(iteration, "REPAIR", clock.now(), reason.clone());
            return PipelineOutcome {
                status: TerminalStatus::Unrepairable,
                final_taskset: taskset,
                properties,
                model: Some(model),
                verifier_outcome: Some(verifier_outcome),
                log,
                unrepairable_reason: Some(reason),
            };
        }

        if !repaired_any_spec && !retry_emission_only {
            log.push(iteration, "REPAIR", clock.now(), "no applicable repair rule");
            return PipelineOutcome {
                status: TerminalStatus::Diverged,
                final_taskset: taskset,
                properties,
                model: Some(model),
                verifier_outcome: Some(verifier_outcome),
                log,
                unrepairable_reason: None,
            };
        }

        log.push(iteration, "REPAIR", clock.now(), "applied counterexample repair, restarting from VALIDATE");
        iteration += 1;
    }
}

fn validate_timing(taskset: TaskSet, config: &RunConfig) -> StageResult {
    let offenders: Vec<usize> = taskset
        .tasks
        .iter()
        .enumerate()
        .filter(|(_, t)| !t.satisfies_timing_invariant() || !t.has_valid_name())
        .map(|(i, _)| i)
        .collect();

    if offenders.is_empty() {
        return StageResult::Accepted(taskset);
    }

    if config.strict_priority {
        let task = &taskset.tasks[offenders[0]];
        let err = if !task.has_valid_name() {
            SpecError::InvalidName(task.name.clone())
        } else {
            SpecError::TimingInvariantViolated {
                name: task.name.clone(),
                execution: task.execution.value(),
                deadline: task.deadline.value(),
                period: task.period.value(),
            }
        };
        return StageResult::Unrepairable(err.to_string());
    }

    let mut tasks = taskset.tasks;
    for &index in &offenders {
        let task = &mut tasks[index];
        if task.execution.value() > task.deadline.value() {
            task.deadline = task.execution;
        }
        if task.deadline.value() > task.period.value() {
            task.period = task.deadline;
        }
    }

    StageResult::Repaired(TaskSet::new(tasks), format!("{} task(s) had timing invariants auto-corrected", offenders.len()))
}

fn unrepairable(taskset: TaskSet, log: StageLog, reason: String) -> PipelineOutcome {
    PipelineOutcome {
        status: TerminalStatus::Unrepairable,
        final_taskset: taskset,
        properties: Vec::new(),
        model: None,
        verifier_outcome: None,
        log,
        unrepairable_reason: Some(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::model::Task;
    use crate::verifier::parse_output;

    struct AlwaysSatisfied;
    impl Verifier for AlwaysSatisfied {
        fn verify(&self, _model_xml: &str, properties: &[Property], _timeout: std::time::Duration) -> Result<VerifierOutcome, crate::errors::ExternalError> {
            let log: String = properties.iter().map(|_| "Formula is satisfied\n").collect();
            parse_output(&log, properties)
        }
    }

    #[test]
    fn single_task_converges_in_one_iteration() {
        let set = TaskSet::new(vec![Task::new("A", 100, 100, 10, Task::UNASSIGNED_PRIORITY)]);
        let clock = FixedClock("t0".to_string());
        let outcome = run_pipeline(set, &RunConfig::default(), &clock, &AlwaysSatisfied, None, || false);
        assert_eq!(outcome.status, TerminalStatus::Converged);
        assert_eq!(outcome.properties.len(), 4);
    }

    struct FlipsMutexOnce {
        flipped: std::cell::Cell<bool>,
    }
    impl Verifier for FlipsMutexOnce {
        fn verify(&self, _model_xml: &str, properties: &[Property], _timeout: std::time::Duration) -> Result<VerifierOutcome, crate::errors::ExternalError> {
            if !self.flipped.get() {
                self.flipped.set(true);
                let log: String = properties
                    .iter()
                    .map(|p| if matches!(p.category, crate::synth::dialect::PropertyCategory::Mutex) {
                        "Formula is NOT satisfied\n"
                    } else {
                        "Formula is satisfied\n"
                    })
                    .collect();
                parse_output(&log, properties)
            } else {
                let log: String = properties.iter().map(|_| "Formula is satisfied\n").collect();
                parse_output(&log, properties)
            }
        }
    }

    #[test]
    fn mutex_violation_retries_with_shared_scheduler_flag() {
        let set = TaskSet::new(vec![
            Task::new("A", 100, 100, 10, Task::UNASSIGNED_PRIORITY),
            Task::new("B", 200, 200, 20, Task::UNASSIGNED_PRIORITY),
        ]);
        let clock = FixedClock("t0".to_string());
        let verifier = FlipsMutexOnce { flipped: std::cell::Cell::new(false) };
        let outcome = run_pipeline(set, &RunConfig::default(), &clock, &verifier, None, || false);
        assert_eq!(outcome.status, TerminalStatus::Converged);
    }

    #[test]
    fn cancellation_is_honored_before_any_stage_runs() {
        let set = TaskSet::new(vec![Task::new("A", 100, 100, 10, Task::UNASSIGNED_PRIORITY)]);
        let clock = FixedClock("t0".to_string());
        let outcome = run_pipeline(set, &RunConfig::default(), &clock, &AlwaysSatisfied, None, || true);
        assert_eq!(outcome.status, TerminalStatus::Cancelled);
    }
}

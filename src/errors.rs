//! Typed error kinds, one enum per failure domain, expressed with
//! `thiserror` instead of hand-written `Display` impls: input, priority/spec,
//! analysis, and external (verifier) failures each get their own type,
//! composed into a single `PipelineError` at the boundary.

/// Malformed input, unparseable numbers, or a required field missing in
/// strict mode. Surfaced at VALIDATE.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("task {index}: {field} is missing or non-positive")]
    MissingOrNonPositiveField { index: usize, field: &'static str },
    #[error("could not parse specification: {0}")]
    Malformed(String),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON specification: {0}")]
    Json(#[from] serde_json::Error),
}

/// Priorities invalid in strict mode, or `C <= D <= T` irrecoverably
/// violated. Surfaced at VALIDATE/FIX_PRIORITIES.
#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    #[error("task {0:?}: duplicate priority {1}")]
    DuplicatePriority(Vec<String>, u8),
    #[error("task {name}: priority {priority} out of range [1, 10]")]
    PriorityOutOfRange { name: String, priority: u8 },
    #[error("task {name}: timing invariant C <= D <= T violated (C={execution}, D={deadline}, T={period})")]
    TimingInvariantViolated {
        name: String,
        execution: u64,
        deadline: u64,
        period: u64,
    },
    #[error("task {0}: invalid name, expected [A-Za-z_][A-Za-z0-9_]*")]
    InvalidName(String),
    #[error("priority inversion among tasks {0:?}: priorities are not monotone in period")]
    PriorityInversion(Vec<String>),
}

/// WCRT iteration diverged beyond the iteration cap. Not a defect of the
/// analyzer itself: the controller treats this identically to "task
/// unschedulable" and routes it to REPAIR.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("response-time analysis for task {name} did not converge within {iterations} iterations")]
    Diverged { name: String, iterations: u32 },
}

/// Verifier not found, verifier crash, verifier timeout, or unparseable
/// verifier output. Surfaced at VERIFY.
#[derive(Debug, thiserror::Error)]
pub enum ExternalError {
    #[error("verifier invocation timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("verifier process failed: {0}")]
    VerifierFailed(String),
    #[error("could not parse verifier output: {0}")]
    UnparseableOutput(String),
}

/// The union of all stage-level errors a pipeline run can report.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Spec(#[from] SpecError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    External(#[from] ExternalError),
}

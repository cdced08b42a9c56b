//! Immutable run configuration threaded through every stage call.
//!
//! A value the pipeline core itself depends on, rather than a CLI-only
//! `Args` struct, so that no stage reaches for process-global state.

use std::time::Duration;

/// Feature flags and tunables for one pipeline run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    /// Strict priority mode: priority errors block the pipeline instead of
    /// being auto-repaired.
    pub strict_priority: bool,
    /// When `false` (the default), an unschedulable taskset is routed to
    /// REPAIR; when `true`, the controller accepts it anyway and proceeds to
    /// synthesis (used by tests that want to exercise later stages directly).
    pub allow_unschedulable: bool,
    /// Set by the mutex-violation repair rule and consumed by the model
    /// emitter; forces the `task_scheduled[]` shared-scheduler arbitration
    /// to be re-emitted rather than left to the default path.
    pub use_shared_scheduler: bool,
    /// Enables the LLM-candidate property path; template path is used
    /// unconditionally when `false`.
    pub allow_multitask_properties: bool,
    /// Cap on controller repair rounds before a run DIVERGEs.
    pub max_repair_iterations: u32,
    /// Bound on one verifier invocation.
    pub verifier_timeout: Duration,
    /// Enables the last-resort rescue substitution (`T=100, C=T/2`) for
    /// tasks missing period/execution. Off by default: such tasks are an
    /// `InputError`.
    pub auto_default: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            strict_priority: false,
            allow_unschedulable: false,
            use_shared_scheduler: false,
            allow_multitask_properties: false,
            max_repair_iterations: 10,
            verifier_timeout: Duration::from_secs(120),
            auto_default: false,
        }
    }
}

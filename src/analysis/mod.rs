//! Schedulability analysis (Component C): worst-case response-time analysis
//! as the authoritative test, the Liu-Layland bound as advisory metadata
//! alongside it, and repair proposals for task sets that fail.

pub mod fixpoint;
pub mod liu_layland;
pub mod repair;
pub mod response_time;

pub mod prelude {
    pub use super::{SchedulabilityOutcome, analyze};
}

use crate::errors::AnalysisError;
use crate::model::TaskSet;

use repair::RepairProposal;
use response_time::ResponseTimeReport;

/// The result of one VALIDATE round, always backed by a full response-time
/// report. The Liu-Layland bound never substitutes for that analysis; it is
/// carried alongside it as an advisory verdict.
#[derive(Debug, Clone)]
pub enum SchedulabilityOutcome {
    /// Response-time analysis ran; every task meets its deadline.
    /// `ll_bound_passed` records whether the (weaker, sufficient-only)
    /// Liu-Layland bound would also have accepted the set on its own.
    Schedulable {
        report: ResponseTimeReport,
        ll_bound_passed: bool,
    },
    /// Response-time analysis ran; at least one task misses its deadline.
    /// Carries a repair proposal ready for the controller to apply.
    Unschedulable {
        report: ResponseTimeReport,
        repair: RepairProposal,
    },
}

impl SchedulabilityOutcome {
    pub fn is_schedulable(&self) -> bool {
        !matches!(self, SchedulabilityOutcome::Unschedulable { .. })
    }

    pub fn report(&self) -> &ResponseTimeReport {
        match self {
            SchedulabilityOutcome::Schedulable { report, .. } => report,
            SchedulabilityOutcome::Unschedulable { report, .. } => report,
        }
    }
}

/// Run the full analysis pipeline for one canonical, priority-assigned task
/// set: always run worst-case response-time analysis, and attach the
/// Liu-Layland bound's verdict as advisory metadata rather than using it to
/// skip analysis.
pub fn analyze(taskset: &TaskSet) -> Result<SchedulabilityOutcome, AnalysisError> {
    let ll_bound_passed = liu_layland::passes_liu_layland_bound(taskset);
    let report = response_time::analyze(taskset)?;

    if report.is_schedulable() {
        return Ok(SchedulabilityOutcome::Schedulable { report, ll_bound_passed });
    }

    let proposal = repair::propose_repair(taskset, &report);
    Ok(SchedulabilityOutcome::Unschedulable {
        report,
        repair: proposal,
    })
}

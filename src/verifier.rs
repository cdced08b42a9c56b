//! The external model-checker collaborator: a narrow trait plus the
//! newline-delimited output parser. The CLI's process-based implementation
//! lives in the binary crate; every in-tree test uses a stub instead.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::errors::ExternalError;
use crate::synth::dialect::Property;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Satisfied,
    Violated,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierOutcome {
    pub all_passed: bool,
    pub verdicts: BTreeMap<String, Verdict>,
    pub counterexamples: BTreeMap<String, String>,
}

impl VerifierOutcome {
    pub fn violated_formulas(&self) -> impl Iterator<Item = &String> {
        self.verdicts.iter().filter(|(_, v)| **v != Verdict::Satisfied).map(|(f, _)| f)
    }

    /// An outcome in which every property is `Unknown`, used on timeout.
    pub fn unknown(properties: &[Property]) -> Self {
        let verdicts = properties.iter().map(|p| (p.formula.clone(), Verdict::Unknown)).collect();
        Self { all_passed: false, verdicts, counterexamples: BTreeMap::new() }
    }
}

/// One external model-checker invocation.
///
/// A production implementation shells out to a native verifier binary; this
/// crate ships only the interface and a stub used by tests.
pub trait Verifier {
    fn verify(&self, model_xml: &str, properties: &[Property], timeout: Duration) -> Result<VerifierOutcome, ExternalError>;
}

/// Parse the model checker's newline-delimited result log: for each query,
/// in order, either `Formula is satisfied` or `Formula is NOT satisfied`,
/// optionally followed by an indented trace block consumed as opaque text.
pub fn parse_output(log: &str, properties: &[Property]) -> Result<VerifierOutcome, ExternalError> {
    let mut verdicts = BTreeMap::new();
    let mut counterexamples = BTreeMap::new();
    let mut lines = log.lines().peekable();
    let mut property_index = 0;

    while let Some(line) = lines.next() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let Some(formula) = properties.get(property_index).map(|p| p.formula.clone()) else {
            return Err(ExternalError::UnparseableOutput(format!("more result lines than properties: {trimmed:?}")));
        };

        if trimmed == "Formula is satisfied" {
            verdicts.insert(formula, Verdict::Satisfied);
        } else if trimmed == "Formula is NOT satisfied" {
            let mut trace = String::new();
            while let Some(next) = lines.peek() {
                if next.starts_with(' ') || next.starts_with('\t') {
                    trace.push_str(next.trim());
                    trace.push('\n');
                    lines.next();
                } else {
                    break;
                }
            }
            if !trace.is_empty() {
                counterexamples.insert(formula.clone(), trace);
            }
            verdicts.insert(formula, Verdict::Violated);
        } else {
            return Err(ExternalError::UnparseableOutput(format!("unrecognized line: {trimmed:?}")));
        }

        property_index += 1;
    }

    if property_index != properties.len() {
        return Err(ExternalError::UnparseableOutput(format!(
            "expected {} result lines, got {property_index}",
            properties.len()
        )));
    }

    let all_passed = verdicts.values().all(|v| *v == Verdict::Satisfied);
    Ok(VerifierOutcome { all_passed, verdicts, counterexamples })
}

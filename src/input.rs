//! Task specification parsing and normalization.
//!
//! Auto-detecting `SpecFormat` enum keyed on file extension, same
//! JSON-vs-plain-text split used elsewhere in this codebase, generalized to
//! the pipeline's two surface formats (key-value sections and a structured
//! `{ "tasks": [...] }` object) and its own per-task shape.

use crate::errors::InputError;
use crate::model::{Task, TaskSet};
use crate::RunConfig;

pub mod prelude {
    pub use super::{SpecFormat, normalize, parse, parse_file};
}

/// Which surface format a specification is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(clap::ValueEnum)]
pub enum SpecFormat {
    Auto,
    Section,
    Json,
}

/// A task as it comes out of parsing, before normalization: any field may be
/// absent and is given a default during normalization.
#[derive(Debug, Clone, Default)]
#[derive(serde::Deserialize)]
struct RawTask {
    name: Option<String>,
    #[serde(alias = "period_ms")]
    period: Option<u64>,
    #[serde(alias = "execution_ms")]
    execution: Option<u64>,
    #[serde(alias = "deadline_ms")]
    deadline: Option<u64>,
    priority: Option<u8>,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct StructuredSpec {
    tasks: Vec<RawTask>,
}

/// Read a specification from `path`, auto-detecting format by extension
/// (`.json` -> structured object, anything else -> section format) unless
/// `format` pins one explicitly.
pub fn parse_file(path: &std::path::Path, format: SpecFormat) -> Result<TaskSet, InputError> {
    parse_file_with(path, format, &RunConfig::default())
}

pub fn parse_file_with(path: &std::path::Path, format: SpecFormat, config: &RunConfig) -> Result<TaskSet, InputError> {
    let data = std::fs::read_to_string(path)?;
    let resolved = match format {
        SpecFormat::Auto if path.extension().is_some_and(|ext| ext == "json") => SpecFormat::Json,
        SpecFormat::Auto => SpecFormat::Section,
        explicit => explicit,
    };
    parse(&data, resolved, config)
}

/// Parse specification text already in memory and normalize it in one pass.
pub fn parse(data: &str, format: SpecFormat, config: &RunConfig) -> Result<TaskSet, InputError> {
    let raw = match format {
        SpecFormat::Json => parse_structured(data)?,
        SpecFormat::Section | SpecFormat::Auto => parse_sections(data)?,
    };
    normalize(raw, config)
}

fn parse_structured(data: &str) -> Result<Vec<RawTask>, InputError> {
    let spec: StructuredSpec = serde_json::from_str(data)?;
    Ok(spec.tasks)
}

/// Parse `[TaskName]` / `KEY = value` sections. `;` starts a line comment;
/// whitespace around `=` is tolerant.
fn parse_sections(data: &str) -> Result<Vec<RawTask>, InputError> {
    let mut tasks = Vec::new();
    let mut current: Option<RawTask> = None;
    let mut current_name: Option<String> = None;

    for raw_line in data.lines() {
        let line = match raw_line.find(';') {
            Some(idx) => &raw_line[..idx],
            None => raw_line,
        }
        .trim();

        if line.is_empty() {
            continue;
        }

        if let Some(section) = line.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            if let Some(task) = current.take() {
                tasks.push(RawTask { name: current_name.take(), ..task });
            }
            current_name = Some(section.trim().to_string());
            current = Some(RawTask::default());
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            return Err(InputError::Malformed(format!("expected `KEY = value`, got: {line:?}")));
        };
        let key = key.trim().to_ascii_uppercase();
        let value = value.trim();

        let task = current.get_or_insert_with(RawTask::default);
        match key.as_str() {
            "PERIOD_MS" => task.period = Some(parse_u64(value)?),
            "EXECUTION_MS" => task.execution = Some(parse_u64(value)?),
            "DEADLINE_MS" => task.deadline = Some(parse_u64(value)?),
            "PRIORITY" => task.priority = Some(parse_u8(value)?),
            other => return Err(InputError::Malformed(format!("unknown key: {other}"))),
        }
    }

    if let Some(task) = current {
        tasks.push(RawTask { name: current_name, ..task });
    }

    Ok(tasks)
}

fn parse_u64(value: &str) -> Result<u64, InputError> {
    value.parse().map_err(|_| InputError::Malformed(format!("expected an integer, got: {value:?}")))
}

fn parse_u8(value: &str) -> Result<u8, InputError> {
    value.parse().map_err(|_| InputError::Malformed(format!("expected an integer, got: {value:?}")))
}

/// Apply the normalization rules, in order, to a batch of raw tasks.
pub fn normalize(raw: Vec<RawTask>, config: &RunConfig) -> Result<TaskSet, InputError> {
    let mut tasks = Vec::with_capacity(raw.len());

    for (index, task) in raw.into_iter().enumerate() {
        // Rule 1: default name.
        let name = task.name.unwrap_or_else(|| format!("Task_{}", index + 1));

        // Rule 3: period/execution required, or auto-default rescue.
        let (period, execution) = match (task.period, task.execution) {
            (Some(period), Some(execution)) if period > 0 && execution > 0 => (period, execution),
            (period, execution) if config.auto_default => {
                let period = period.filter(|p| *p > 0).unwrap_or(100);
                let execution = execution.filter(|c| *c > 0).unwrap_or(period / 2);
                (period, execution)
            }
            (period, _) if period.is_none_or(|p| p == 0) => {
                return Err(InputError::MissingOrNonPositiveField { index, field: "period" });
            }
            _ => {
                return Err(InputError::MissingOrNonPositiveField { index, field: "execution" });
            }
        };

        // Rule 2: implicit deadline.
        let deadline = task.deadline.unwrap_or(period);

        // Rule 4: priority sentinel, rewritten later by the validator.
        let priority = task.priority.unwrap_or(Task::UNASSIGNED_PRIORITY);

        tasks.push(Task::new(name, period, deadline, execution, priority));
    }

    Ok(TaskSet::new(tasks))
}

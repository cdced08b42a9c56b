//! The property surface dialect and the deterministic template property set.

use super::automata::{LOCATIONS, LocationRegistry};
use crate::model::TaskSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyCategory {
    Safety,
    Liveness,
    Timing,
    Mutex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyOrigin {
    Template,
    Synthesized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub formula: String,
    pub category: PropertyCategory,
    pub comment: String,
    pub origin: PropertyOrigin,
}

/// An alternative property source the controller may consult instead of the
/// template path. No in-tree implementation calls out to a real model; the
/// only non-template implementation is `StubPropertySource`, used by tests
/// to exercise the candidate-validation path.
pub trait PropertySource {
    fn candidate_properties(&self, registry: &LocationRegistry) -> Option<Vec<Property>>;
}

/// Generate the deterministic template property set for `taskset`: one
/// deadlock-freedom check, one timing and one reachability property per
/// task, one mutual-exclusion property per ordered task pair, and one
/// leads-to property per task.
pub fn template_properties(taskset: &TaskSet) -> Vec<Property> {
    let mut properties = Vec::new();

    properties.push(Property {
        formula: "A[] not deadlock".to_string(),
        category: PropertyCategory::Safety,
        comment: "the system never deadlocks".to_string(),
        origin: PropertyOrigin::Template,
    });

    for task in &taskset.tasks {
        properties.push(Property {
            formula: format!("A[] ({}.Executing imply x <= {})", task.name, task.deadline.value()),
            category: PropertyCategory::Timing,
            comment: format!("{} never executes past its deadline", task.name),
            origin: PropertyOrigin::Template,
        });
    }

    for task in &taskset.tasks {
        properties.push(Property {
            formula: format!("E<> {}.Done", task.name),
            category: PropertyCategory::Liveness,
            comment: format!("{} can complete a job", task.name),
            origin: PropertyOrigin::Template,
        });
    }

    for (i, task_i) in taskset.tasks.iter().enumerate() {
        for task_j in &taskset.tasks[i + 1..] {
            properties.push(Property {
                formula: format!("A[] not ({}.Executing and {}.Executing)", task_i.name, task_j.name),
                category: PropertyCategory::Mutex,
                comment: format!("{} and {} never hold the CPU simultaneously", task_i.name, task_j.name),
                origin: PropertyOrigin::Template,
            });
        }
    }

    for task in &taskset.tasks {
        properties.push(Property {
            formula: format!("{}.Done --> {}.Ready", task.name, task.name),
            category: PropertyCategory::Liveness,
            comment: format!("{} always returns to Ready after completing", task.name),
            origin: PropertyOrigin::Template,
        });
    }

    properties
}

/// Accept a candidate property list only if every referenced location
/// exists in `registry` and every formula parses in the surface dialect.
pub fn validate_candidates(candidates: &[Property], registry: &LocationRegistry) -> bool {
    !candidates.is_empty() && candidates.iter().all(|p| is_well_formed(&p.formula) && locations_exist(&p.formula, registry))
}

fn locations_exist(formula: &str, registry: &LocationRegistry) -> bool {
    extract_location_refs(formula).iter().all(|(instance, location)| registry.contains(instance, location))
}

/// Scan `formula` for `Instance.Location` tokens.
pub fn extract_location_refs(formula: &str) -> Vec<(String, String)> {
    let mut refs = Vec::new();
    let mut chars = formula.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if !(c.is_ascii_alphabetic() || c == '_') {
            continue;
        }
        let mut end = start + c.len_utf8();
        while let Some(&(next_idx, next_c)) = chars.peek() {
            if next_c.is_ascii_alphanumeric() || next_c == '_' {
                end = next_idx + next_c.len_utf8();
                chars.next();
            } else {
                break;
            }
        }
        let ident = &formula[start..end];

        if chars.peek().map(|&(_, c)| c) == Some('.') {
            chars.next();
            if let Some(&(loc_start, loc_c)) = chars.peek() {
                if loc_c.is_ascii_alphabetic() || loc_c == '_' {
                    let mut loc_end = loc_start;
                    while let Some(&(idx, c)) = chars.peek() {
                        if c.is_ascii_alphanumeric() || c == '_' {
                            loc_end = idx + c.len_utf8();
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    refs.push((ident.to_string(), formula[loc_start..loc_end].to_string()));
                }
            }
        }
    }

    refs
}

/// A permissive but real structural check: balanced parentheses, and the
/// formula uses only the operators and keywords the dialect defines.
fn is_well_formed(formula: &str) -> bool {
    let mut depth = 0i32;
    for c in formula.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return false;
    }

    let known_tokens = ["A[]", "E<>", "-->", "and", "or", "not", "imply", "<=", ">=", "==", "<", ">"];
    let has_quantifier = formula.contains("A[]") || formula.contains("E<>") || formula.contains("-->");
    has_quantifier || known_tokens.iter().any(|t| formula.contains(t))
}

/// A fixed property source used only by tests to exercise the candidate
/// acceptance and fallback paths.
pub struct StubPropertySource {
    pub properties: Vec<Property>,
}

impl PropertySource for StubPropertySource {
    fn candidate_properties(&self, _registry: &LocationRegistry) -> Option<Vec<Property>> {
        Some(self.properties.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Task;

    #[test]
    fn template_properties_cover_every_location_in_the_registry() {
        let set = TaskSet::new(vec![Task::new("A", 100, 100, 10, 1), Task::new("B", 200, 200, 20, 2)]);
        let registry = LocationRegistry::for_taskset(&set);
        let properties = template_properties(&set);
        assert!(validate_candidates(&properties, &registry));
        // deadlock + 2 timing + 2 liveness + 1 mutex + 2 leads-to
        assert_eq!(properties.len(), 1 + 2 + 2 + 1 + 2);
    }

    #[test]
    fn extracts_location_refs_from_a_mutex_formula() {
        let refs = extract_location_refs("A[] not (A.Executing and B.Executing)");
        assert_eq!(refs, vec![("A".to_string(), "Executing".to_string()), ("B".to_string(), "Executing".to_string())]);
    }

    #[test]
    fn candidate_referencing_unknown_instance_is_rejected() {
        let set = TaskSet::new(vec![Task::new("A", 100, 100, 10, 1)]);
        let registry = LocationRegistry::for_taskset(&set);
        let bad = vec![Property {
            formula: "E<> Ghost.Done".to_string(),
            category: PropertyCategory::Liveness,
            comment: String::new(),
            origin: PropertyOrigin::Synthesized,
        }];
        assert!(!validate_candidates(&bad, &registry));
    }

    #[test]
    fn every_wire_location_name_is_reachable_from_locations_const() {
        assert_eq!(LOCATIONS.len(), 6);
    }
}

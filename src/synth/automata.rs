//! Timed-automata model emission.
//!
//! Grounded on the `knhk-workflow-xml-legacy` pack example's use of
//! `quick_xml::Writer` to build a document event-by-event rather than
//! string-templating it, which is what keeps element/attribute order (and
//! hence byte-identical output across runs) entirely in this module's hands.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::writer::Writer;

use crate::model::{Task, TaskSet};

/// The fixed per-task location set, in wire order. The synthesizer and the
/// property generator both read from this list so the two can never drift.
pub const LOCATIONS: [&str; 6] = ["Idle", "Ready", "Scheduled", "Executing", "Completing", "Done"];

/// Every `(instance, location)` pair that exists in an emitted model, used
/// to validate that property formulas only reference real locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationRegistry {
    instances: Vec<String>,
}

impl LocationRegistry {
    pub fn for_taskset(taskset: &TaskSet) -> Self {
        Self {
            instances: taskset.tasks.iter().map(|t| t.name.clone()).collect(),
        }
    }

    pub fn instances(&self) -> &[String] {
        &self.instances
    }

    pub fn contains(&self, instance: &str, location: &str) -> bool {
        self.instances.iter().any(|i| i == instance) && LOCATIONS.contains(&location)
    }
}

#[derive(Debug, Clone)]
pub struct EmittedModel {
    pub xml: String,
    pub registry: LocationRegistry,
}

/// Emit the `<nta>` document for `taskset`: shared declarations, one
/// `<template>` per task, a `<system>` block instantiating each as
/// `{name}_inst`, and an empty `<queries>` block (the controller fills it in
/// from the synthesized property list).
///
/// `use_shared_scheduler` is set by the controller's mutex-violation repair
/// rule and forces explicit `task_scheduled[]` arbitration to be re-emitted
/// even when the default path would have sufficed.
pub fn emit(taskset: &TaskSet, registry: &LocationRegistry, use_shared_scheduler: bool) -> anyhow::Result<EmittedModel> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer.write_event(Event::Start(BytesStart::new("nta")))?;
    write_declaration(&mut writer, taskset, use_shared_scheduler)?;
    for (index, task) in taskset.tasks.iter().enumerate() {
        write_template(&mut writer, task, index)?;
    }
    write_system(&mut writer, taskset)?;
    writer.write_event(Event::Empty(BytesStart::new("queries")))?;
    writer.write_event(Event::End(BytesEnd::new("nta")))?;

    let xml = String::from_utf8(writer.into_inner())?;
    Ok(EmittedModel { xml, registry: registry.clone() })
}

fn write_declaration(writer: &mut Writer<Vec<u8>>, taskset: &TaskSet, use_shared_scheduler: bool) -> anyhow::Result<()> {
    writer.write_event(Event::Start(BytesStart::new("declaration")))?;
    let mut decl = format!(
        "int cpu_owner = -1;\nbool task_scheduled[{}];\nchan dispatch;\n",
        taskset.len().max(1)
    );
    if use_shared_scheduler {
        decl.push_str("// explicit shared-scheduler arbitration\nurgent chan arbitrate;\n");
    }
    writer.write_event(Event::Text(BytesText::new(&decl)))?;
    writer.write_event(Event::End(BytesEnd::new("declaration")))?;
    Ok(())
}

fn write_template(writer: &mut Writer<Vec<u8>>, task: &Task, index: usize) -> anyhow::Result<()> {
    writer.write_event(Event::Start(BytesStart::new("template")))?;

    writer.write_event(Event::Start(BytesStart::new("name")))?;
    writer.write_event(Event::Text(BytesText::new(&task.name)))?;
    writer.write_event(Event::End(BytesEnd::new("name")))?;

    writer.write_event(Event::Start(BytesStart::new("declaration")))?;
    writer.write_event(Event::Text(BytesText::new("clock x;\n")))?;
    writer.write_event(Event::End(BytesEnd::new("declaration")))?;

    for (index, location) in LOCATIONS.iter().enumerate() {
        let mut loc = BytesStart::new("location");
        loc.push_attribute(("id", format!("id{index}").as_str()));
        loc.push_attribute(("name", *location));
        if let Some(invariant) = location_invariant(location, task) {
            writer.write_event(Event::Start(loc))?;
            writer.write_event(Event::Start(BytesStart::new("label").with_attributes([("kind", "invariant")])))?;
            writer.write_event(Event::Text(BytesText::new(&invariant)))?;
            writer.write_event(Event::End(BytesEnd::new("label")))?;
            writer.write_event(Event::End(BytesEnd::new("location")))?;
        } else {
            writer.write_event(Event::Empty(loc))?;
        }
    }

    let mut init = BytesStart::new("init");
    init.push_attribute(("ref", "id0"));
    writer.write_event(Event::Empty(init))?;

    for (from, to, guard, assignment, sync) in transitions(task, index) {
        writer.write_event(Event::Start(BytesStart::new("transition")))?;

        write_ref(writer, "source", from)?;
        write_ref(writer, "target", to)?;
        if let Some(guard) = guard {
            write_label(writer, "guard", &guard)?;
        }
        if let Some(sync) = sync {
            write_label(writer, "synchronisation", &sync)?;
        }
        if let Some(assignment) = assignment {
            write_label(writer, "assignment", &assignment)?;
        }

        writer.write_event(Event::End(BytesEnd::new("transition")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("template")))?;
    Ok(())
}

fn write_ref(writer: &mut Writer<Vec<u8>>, tag: &str, location_index: usize) -> anyhow::Result<()> {
    let mut el = BytesStart::new(tag);
    el.push_attribute(("ref", format!("id{location_index}").as_str()));
    writer.write_event(Event::Empty(el))?;
    Ok(())
}

fn write_label(writer: &mut Writer<Vec<u8>>, kind: &str, text: &str) -> anyhow::Result<()> {
    writer.write_event(Event::Start(BytesStart::new("label").with_attributes([("kind", kind)])))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new("label")))?;
    Ok(())
}

fn location_invariant(location: &str, task: &Task) -> Option<String> {
    match location {
        "Ready" => Some(format!("x <= {}", task.period.value())),
        "Executing" => Some(format!("x <= {}", task.deadline.value())),
        _ => None,
    }
}

/// `(source_index, target_index, guard, assignment, synchronisation)` for
/// the fixed six transitions of a per-task template. `index` is this task's
/// position in the canonical task set, i.e. its slot in `task_scheduled[]`
/// and the value `cpu_owner` takes while it holds the CPU.
fn transitions(task: &Task, index: usize) -> Vec<(usize, usize, Option<String>, Option<String>, Option<String>)> {
    vec![
        (0, 1, Some("x == 0".into()), Some("x = 0".into()), None),
        (1, 2, Some(dispatch_guard(index)), None, Some("dispatch?".into())),
        (2, 3, None, Some(format!("cpu_owner = {index}")), None),
        (3, 4, Some(format!("x >= {}", task.execution.value())), None, None),
        (4, 5, None, Some("cpu_owner = -1".into()), None),
        (5, 1, Some(format!("x >= {}", task.period.value())), Some("x = 0".into()), None),
    ]
}

/// Guard on the Ready -> Scheduled transition: this task's own slot must be
/// set, and no higher-priority task (lower index) may also be waiting —
/// without the second clause any waiting task could dispatch regardless of
/// priority, defeating fixed-priority arbitration.
fn dispatch_guard(index: usize) -> String {
    let mut guard = format!("task_scheduled[{index}]");
    for higher in 0..index {
        guard.push_str(&format!(" && !task_scheduled[{higher}]"));
    }
    guard
}

fn write_system(writer: &mut Writer<Vec<u8>>, taskset: &TaskSet) -> anyhow::Result<()> {
    writer.write_event(Event::Start(BytesStart::new("system")))?;
    let instances: Vec<String> = taskset.tasks.iter().map(|t| format!("{}_inst = {};", t.name, t.name)).collect();
    let process_list = taskset.tasks.iter().map(|t| format!("{}_inst", t.name)).collect::<Vec<_>>().join(", ");
    let body = format!("{}\nsystem {};\n", instances.join("\n"), process_list);
    writer.write_event(Event::Text(BytesText::new(&body)))?;
    writer.write_event(Event::End(BytesEnd::new("system")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_one_template_per_task() {
        let set = TaskSet::new(vec![Task::new("A", 100, 100, 10, 1), Task::new("B", 200, 200, 20, 2)]);
        let registry = LocationRegistry::for_taskset(&set);
        let model = emit(&set, &registry, false).unwrap();
        assert_eq!(model.xml.matches("<template>").count(), 2);
        assert!(model.xml.contains("A_inst"));
        assert!(model.xml.contains("B_inst"));
    }

    #[test]
    fn dispatch_guard_excludes_waiting_higher_priority_tasks() {
        assert_eq!(dispatch_guard(0), "task_scheduled[0]");
        assert_eq!(dispatch_guard(2), "task_scheduled[2] && !task_scheduled[0] && !task_scheduled[1]");
    }

    #[test]
    fn lowest_priority_task_guard_appears_in_emitted_model() {
        let set = TaskSet::new(vec![
            Task::new("A", 10, 10, 1, 0),
            Task::new("B", 20, 20, 1, 0),
            Task::new("C", 30, 30, 1, 0),
        ]);
        let registry = LocationRegistry::for_taskset(&set);
        let model = emit(&set, &registry, false).unwrap();
        assert!(model.xml.contains("task_scheduled[2] &amp;&amp; !task_scheduled[0] &amp;&amp; !task_scheduled[1]"));
    }

    #[test]
    fn registry_rejects_unknown_instance() {
        let set = TaskSet::new(vec![Task::new("A", 100, 100, 10, 1)]);
        let registry = LocationRegistry::for_taskset(&set);
        assert!(registry.contains("A", "Executing"));
        assert!(!registry.contains("Z", "Executing"));
    }
}

use std::collections::HashSet;

use super::is_missing_id;
use crate::entities::{EntityKind, Task};
use crate::value_objects::Finding;

pub fn validate_tasks(tasks: &[Task]) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for (row, task) in tasks.iter().enumerate() {
        let mut report = |message: &str| {
            findings.push(Finding::new(EntityKind::Task, row, message));
        };

        if is_missing_id(&task.task_id) {
            report("Missing or empty TaskID");
            continue;
        }
        if !seen.insert(task.task_id.as_str()) {
            report(&format!("Duplicate TaskID: {}", task.task_id));
        }

        if !task.duration.is_some_and(|duration| duration >= 1) {
            report("Duration must be ≥1");
        }

        let phases_valid = task
            .preferred_phases
            .items()
            .is_some_and(|phases| phases.iter().all(|phase| *phase >= 1));
        if !phases_valid {
            report("PreferredPhases must be an array of positive numbers");
        }

        if !task.max_concurrent.is_some_and(|max| max >= 1) {
            report("MaxConcurrent must be ≥1");
        }

        if task.required_skills.is_malformed() {
            report("RequiredSkills must be an array");
        }
    }

    findings
}

use std::collections::HashSet;

use super::is_missing_id;
use crate::entities::{EntityKind, Task, Worker};
use crate::value_objects::{FieldList, Finding};

/// 所有Worker技能的并集只计算一次
pub fn validate_skill_coverage(tasks: &[Task], workers: &[Worker]) -> Vec<Finding> {
    let offered: HashSet<&str> = workers
        .iter()
        .filter_map(|worker| worker.skills.items())
        .flatten()
        .map(String::as_str)
        .collect();

    let mut findings = Vec::new();
    for (row, task) in tasks.iter().enumerate() {
        if is_missing_id(&task.task_id) {
            continue;
        }
        let Some(required) = task.required_skills.items() else {
            continue;
        };
        for skill in required.iter().filter(|skill| !offered.contains(skill.as_str())) {
            findings.push(Finding::new(
                EntityKind::Task,
                row,
                format!("Required skill \"{skill}\" not found in any worker's skills"),
            ));
        }
    }
    findings
}

fn is_qualified(worker: &Worker, required: &[String], preferred: &[i64]) -> bool {
    let (FieldList::Items(skills), FieldList::Items(slots)) =
        (&worker.skills, &worker.available_slots)
    else {
        return false;
    };

    required.iter().all(|skill| skills.contains(skill))
        && preferred.iter().any(|phase| slots.contains(phase))
}

/// 同时具备全部所需技能且至少在一个偏好阶段可用的Worker数，必须不少于 MaxConcurrent
///
/// Worker表为空时不做此项检查。
pub fn validate_concurrency(tasks: &[Task], workers: &[Worker]) -> Vec<Finding> {
    if workers.is_empty() {
        return Vec::new();
    }

    let mut findings = Vec::new();
    for (row, task) in tasks.iter().enumerate() {
        if is_missing_id(&task.task_id) {
            continue;
        }
        let (Some(max_concurrent), Some(required), Some(preferred)) = (
            task.max_concurrent,
            task.required_skills.items(),
            task.preferred_phases.items(),
        ) else {
            continue;
        };

        let qualified = workers
            .iter()
            .filter(|worker| is_qualified(worker, required, preferred))
            .count();

        if (qualified as i64) < max_concurrent {
            findings.push(Finding::new(
                EntityKind::Task,
                row,
                format!("MaxConcurrent ({max_concurrent}) exceeds qualified workers ({qualified})"),
            ));
        }
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::{normalize, RawRecord};
    use serde_json::{json, Value};

    fn load<T: crate::entities::Entity>(rows: Value) -> Vec<T> {
        let records: Vec<RawRecord> = serde_json::from_value(rows).unwrap();
        normalize::<T>(&records).records
    }

    fn messages(findings: &[Finding]) -> Vec<&str> {
        findings.iter().map(|f| f.message.as_str()).collect()
    }

    #[test]
    fn test_uncovered_skill() {
        let tasks: Vec<Task> = load(json!([
            {"TaskID": "T1", "RequiredSkills": "welding, painting"},
            {"TaskID": " ", "RequiredSkills": "welding"}
        ]));
        let workers: Vec<Worker> = load(json!([{"WorkerID": "W1", "Skills": "painting"}]));

        let findings = validate_skill_coverage(&tasks, &workers);
        assert_eq!(
            messages(&findings),
            vec!["Required skill \"welding\" not found in any worker's skills"]
        );
        assert_eq!(findings[0].row, 0);
    }

    #[test]
    fn test_concurrency_counts_qualified_workers() {
        let tasks: Vec<Task> = load(json!([
            {"TaskID": "T1", "RequiredSkills": "welding", "PreferredPhases": "[1,2]", "MaxConcurrent": "3"}
        ]));
        let workers: Vec<Worker> = load(json!([
            {"WorkerID": "W1", "Skills": "welding", "AvailableSlots": "[2]"},
            {"WorkerID": "W2", "Skills": "welding,painting", "AvailableSlots": "[1,4]"},
            {"WorkerID": "W3", "Skills": "painting", "AvailableSlots": "[1]"},
            {"WorkerID": "W4", "Skills": "welding", "AvailableSlots": "[3]"}
        ]));

        assert_eq!(
            messages(&validate_concurrency(&tasks, &workers)),
            vec!["MaxConcurrent (3) exceeds qualified workers (2)"]
        );
    }

    #[test]
    fn test_concurrency_skipped_without_workers_or_max() {
        let tasks: Vec<Task> = load(json!([
            {"TaskID": "T1", "MaxConcurrent": "5"},
            {"TaskID": "T2", "MaxConcurrent": "many"}
        ]));
        assert!(validate_concurrency(&tasks, &[]).is_empty());

        let workers: Vec<Worker> = load(json!([{"WorkerID": "W1", "AvailableSlots": "[1]"}]));
        let findings = validate_concurrency(&tasks, &workers);
        // T1 没有偏好阶段，因此没有合格的Worker
        assert_eq!(
            messages(&findings),
            vec!["MaxConcurrent (5) exceeds qualified workers (0)"]
        );
    }
}

use std::collections::HashSet;

use super::is_missing_id;
use crate::entities::{EntityKind, Worker};
use crate::value_objects::{FieldList, Finding};

pub fn validate_workers(workers: &[Worker]) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for (row, worker) in workers.iter().enumerate() {
        let mut report = |message: &str| {
            findings.push(Finding::new(EntityKind::Worker, row, message));
        };

        if is_missing_id(&worker.worker_id) {
            report("Missing or empty WorkerID");
            continue;
        }
        if !seen.insert(worker.worker_id.as_str()) {
            report(&format!("Duplicate WorkerID: {}", worker.worker_id));
        }

        let slots_valid = worker
            .available_slots
            .items()
            .is_some_and(|slots| slots.iter().all(|slot| *slot >= 1));
        if !slots_valid {
            report("AvailableSlots must be an array of positive numbers");
        }

        if !worker.max_load_per_phase.is_some_and(|load| load > 0) {
            report("MaxLoadPerPhase must be >0");
        }

        if worker.skills.is_malformed() {
            report("Skills must be an array");
        }

        if let (FieldList::Items(slots), Some(max_load)) =
            (&worker.available_slots, worker.max_load_per_phase)
        {
            if (slots.len() as i64) < max_load {
                report("AvailableSlots count must be ≥ MaxLoadPerPhase");
            }
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::{normalize, RawRecord};
    use serde_json::{json, Value};

    fn workers(rows: Value) -> Vec<Worker> {
        let records: Vec<RawRecord> = serde_json::from_value(rows).unwrap();
        normalize::<Worker>(&records).records
    }

    fn messages(findings: &[Finding]) -> Vec<(usize, &str)> {
        findings
            .iter()
            .map(|f| (f.row, f.message.as_str()))
            .collect()
    }

    #[test]
    fn test_slot_count_below_max_load() {
        let rows = workers(json!([
            {"WorkerID": "W1", "AvailableSlots": "[1]", "MaxLoadPerPhase": "2"},
            {"WorkerID": "W2", "AvailableSlots": "[1,2]", "MaxLoadPerPhase": "2"}
        ]));

        assert_eq!(
            messages(&validate_workers(&rows)),
            vec![(0, "AvailableSlots count must be ≥ MaxLoadPerPhase")]
        );
    }

    #[test]
    fn test_malformed_slots_and_load() {
        let rows = workers(json!([
            {"WorkerID": "W1", "AvailableSlots": "[1,", "MaxLoadPerPhase": "zero", "Skills": {"a": 1}},
            {"WorkerID": "W2", "AvailableSlots": "[0, 2]", "MaxLoadPerPhase": "1"}
        ]));

        assert_eq!(
            messages(&validate_workers(&rows)),
            vec![
                (0, "AvailableSlots must be an array of positive numbers"),
                (0, "MaxLoadPerPhase must be >0"),
                (0, "Skills must be an array"),
                (1, "AvailableSlots must be an array of positive numbers"),
            ]
        );
    }

    #[test]
    fn test_missing_and_duplicate_ids() {
        let rows = workers(json!([
            {"WorkerID": "W1", "AvailableSlots": "[1]"},
            {"WorkerID": " ", "AvailableSlots": "[1,"},
            {"WorkerID": "W1", "AvailableSlots": "[1]"}
        ]));

        assert_eq!(
            messages(&validate_workers(&rows)),
            vec![(1, "Missing or empty WorkerID"), (2, "Duplicate WorkerID: W1")]
        );
    }
}

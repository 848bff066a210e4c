use std::collections::HashSet;

use serde_json::Value;

use super::is_missing_id;
use crate::entities::{Client, EntityKind};
use crate::normalizer::is_invalid_json_sentinel;
use crate::value_objects::{FieldList, Finding};

pub fn validate_clients(clients: &[Client], task_ids: &HashSet<&str>) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for (row, client) in clients.iter().enumerate() {
        let mut report = |message: String| {
            findings.push(Finding::new(EntityKind::Client, row, message));
        };

        if is_missing_id(&client.client_id) {
            report("Missing or empty ClientID".to_string());
            continue;
        }
        if !seen.insert(client.client_id.as_str()) {
            report(format!("Duplicate ClientID: {}", client.client_id));
        }

        if !client.priority_level.is_some_and(|level| (1..=5).contains(&level)) {
            report("PriorityLevel must be 1–5".to_string());
        }

        match &client.requested_task_ids {
            FieldList::Items(ids) => {
                for id in ids.iter().filter(|id| !task_ids.contains(id.as_str())) {
                    report(format!("Unknown TaskID: {id}"));
                }
            }
            FieldList::Malformed(_) => report("RequestedTaskIDs must be an array".to_string()),
        }

        match &client.attributes {
            Value::String(text) => {
                if serde_json::from_str::<Value>(text).is_err() {
                    report("Malformed JSON in AttributesJSON".to_string());
                }
            }
            value if is_invalid_json_sentinel(value) => {
                report("Malformed JSON in AttributesJSON".to_string());
            }
            Value::Object(_) => {}
            _ => report("AttributesJSON must be an object".to_string()),
        }
    }

    findings
}

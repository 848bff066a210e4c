//! 发给解释器的提示词

use serde::Serialize;

use alchemist_domain::{Client, Finding, Task, Worker};
use alchemist_errors::AlchemistResult;

/// 规则提示词中附带的数据上下文
#[derive(Debug, Serialize)]
pub struct DataContext<'a> {
    pub clients: &'a [Client],
    pub tasks: &'a [Task],
    pub workers: &'a [Worker],
}

/// 纠正建议提示词，行号按1开始显示
pub fn correction_prompt(finding: &Finding) -> String {
    format!(
        "Suggest a correction for this error in {} at row {}: {}. Provide JSON: {{ \"entity\": string, \"row\": number, \"field\": string, \"suggestedValue\": any }}",
        finding.entity,
        finding.row + 1,
        finding.message
    )
}

pub fn filter_prompt(query: &str) -> String {
    format!(
        "Parse this natural language query for filtering tasks: \"{query}\". Return JSON: {{ \"entity\": \"tasks\", \"filter\": {{ \"Duration\"?: string, \"PreferredPhases\"?: string }} }}"
    )
}

pub fn rule_prompt(query: &str, context: &DataContext<'_>) -> AlchemistResult<String> {
    let context = serde_json::to_string_pretty(context)?;
    Ok(format!(
        "Convert this natural language rule to JSON for a resource allocation system: \"{query}\". Use context from clients, tasks, and workers data. Return JSON: {{ \"type\": string, \"tasks\"?: string[], \"group\"?: string, \"minCommonSlots\"?: number, \"maxSlotsPerPhase\"?: number, \"allowedPhases\"?: number[], \"pattern\"?: string, \"overrideType\"?: \"global\" | \"specific\", \"priority\"?: number }}. Data context: {context}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alchemist_domain::EntityKind;

    #[test]
    fn test_correction_prompt_uses_one_based_row() {
        let finding = Finding::new(EntityKind::Client, 2, "PriorityLevel must be 1–5");
        let prompt = correction_prompt(&finding);
        assert!(prompt.starts_with(
            "Suggest a correction for this error in Client at row 3: PriorityLevel must be 1–5."
        ));
        assert!(prompt.contains("\"suggestedValue\": any"));
    }

    #[test]
    fn test_filter_prompt_quotes_query() {
        let prompt = filter_prompt("Tasks with Duration > 1");
        assert!(prompt.contains("filtering tasks: \"Tasks with Duration > 1\""));
    }

    #[test]
    fn test_rule_prompt_includes_context() {
        let context = DataContext {
            clients: &[],
            tasks: &[],
            workers: &[],
        };
        let prompt = rule_prompt("Tasks T1 and T2 must run together", &context).unwrap();
        assert!(prompt.contains("\"Tasks T1 and T2 must run together\""));
        assert!(prompt.ends_with("Data context: {\n  \"clients\": [],\n  \"tasks\": [],\n  \"workers\": []\n}"));
    }
}

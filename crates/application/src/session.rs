use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use alchemist_domain::{
    normalize, validate_all, Client, Correction, Entity, EntityKind, PriorityWeights, RawRecord,
    Rule, RuleSet, Task, TaskFilter, ValidationReport, Worker,
};
use alchemist_errors::{AlchemistError, AlchemistResult};

use crate::prompts::DataContext;

/// 一次上传的归一化结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSummary {
    pub entity: EntityKind,
    pub loaded: usize,
    pub discarded: usize,
}

/// 规则导出文件的内容
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RulesConfig {
    pub rules: RuleSet,
    pub priorities: PriorityWeights,
}

/// 导出时的完整快照
#[derive(Debug, Clone)]
pub struct ExportBundle {
    pub clients: Vec<Client>,
    pub workers: Vec<Worker>,
    pub tasks: Vec<Task>,
    pub rules: RulesConfig,
}

/// 当前生效的任务过滤视图，保存的是任务表中的行号
#[derive(Debug, Clone)]
struct TaskView {
    filter: TaskFilter,
    rows: Vec<usize>,
}

/// 会话状态
///
/// 所有修改都是同步的：修改 → 重新校验 → 返回报告。
/// 失败的修改不会改变任何状态。
#[derive(Debug, Clone)]
pub struct Session {
    clients: Vec<Client>,
    workers: Vec<Worker>,
    tasks: Vec<Task>,
    report: ValidationReport,
    rules: RuleSet,
    priorities: PriorityWeights,
    corrections: Vec<Correction>,
    task_view: Option<TaskView>,
    revision: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(PriorityWeights::default())
    }
}

fn edit_row<T: Entity>(
    rows: &mut [T],
    row: usize,
    field: &str,
    value: &Value,
) -> AlchemistResult<()> {
    let record = rows
        .get_mut(row)
        .ok_or_else(|| AlchemistError::row_not_found(T::KIND.as_str(), row))?;
    record.set_field(field, value)?;
    debug!("修改 {} 第 {} 行 ({}) 的 {}", T::KIND, row, record.key(), field);
    Ok(())
}

impl Session {
    pub fn new(priorities: PriorityWeights) -> Self {
        Self {
            clients: Vec::new(),
            workers: Vec::new(),
            tasks: Vec::new(),
            report: ValidationReport::empty(),
            rules: RuleSet::new(),
            priorities,
            corrections: Vec::new(),
            task_view: None,
            revision: 0,
        }
    }

    /// 归一化并整体替换一张表，不与之前的数据合并
    pub fn load(&mut self, kind: EntityKind, records: &[RawRecord]) -> LoadSummary {
        let (loaded, discarded) = match kind {
            EntityKind::Client => {
                let batch = normalize::<Client>(records);
                self.clients = batch.records;
                (self.clients.len(), batch.discarded)
            }
            EntityKind::Worker => {
                let batch = normalize::<Worker>(records);
                self.workers = batch.records;
                (self.workers.len(), batch.discarded)
            }
            EntityKind::Task => {
                let batch = normalize::<Task>(records);
                self.tasks = batch.records;
                self.task_view = None;
                (self.tasks.len(), batch.discarded)
            }
        };

        // 行号已经失效
        self.corrections.retain(|correction| correction.entity != kind);
        self.revision += 1;

        info!("载入 {}: {} 行，丢弃 {} 行", kind.plural(), loaded, discarded);
        LoadSummary {
            entity: kind,
            loaded,
            discarded,
        }
    }

    pub fn validate(&mut self) -> ValidationReport {
        self.report = validate_all(&self.clients, &self.workers, &self.tasks);
        debug!("校验结果: {} 条问题", self.report.findings.len());
        self.report.clone()
    }

    /// 手动编辑单个字段，标识键保持不变，随后重新校验
    pub fn set_field(
        &mut self,
        kind: EntityKind,
        row: usize,
        field: &str,
        value: &Value,
    ) -> AlchemistResult<ValidationReport> {
        match kind {
            EntityKind::Client => edit_row(&mut self.clients, row, field, value)?,
            EntityKind::Worker => edit_row(&mut self.workers, row, field, value)?,
            EntityKind::Task => edit_row(&mut self.tasks, row, field, value)?,
        }
        self.revision += 1;
        Ok(self.validate())
    }

    /// 应用一条纠正建议，并从待处理列表中移除
    pub fn apply_correction(&mut self, correction: &Correction) -> AlchemistResult<ValidationReport> {
        let report = self.set_field(
            correction.entity,
            correction.row,
            &correction.field,
            &correction.suggested_value,
        )?;
        self.corrections.retain(|pending| pending != correction);
        info!("已应用纠正建议: {}", correction.describe());
        Ok(report)
    }

    pub fn set_pending_corrections(&mut self, corrections: Vec<Correction>) {
        self.corrections = corrections;
    }

    /// 表数据的版本号，每次载入或编辑后递增
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// 保存基于 `revision` 版本数据得到的建议；表数据已变化时丢弃并返回 false
    pub fn store_corrections_for(&mut self, revision: u64, corrections: Vec<Correction>) -> bool {
        if revision != self.revision {
            warn!(
                "纠正建议基于第 {} 版数据，当前为第 {} 版，已丢弃",
                revision, self.revision
            );
            return false;
        }
        self.corrections = corrections;
        true
    }

    pub fn pending_corrections(&self) -> &[Correction] {
        &self.corrections
    }

    pub fn add_rule(&mut self, rule: Rule) {
        info!("添加规则: {}", rule);
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn priorities(&self) -> PriorityWeights {
        self.priorities
    }

    pub fn set_priority(&mut self, name: &str, value: i64) -> AlchemistResult<PriorityWeights> {
        self.priorities.set(name, value)?;
        Ok(self.priorities)
    }

    pub fn rules_config(&self) -> RulesConfig {
        RulesConfig {
            rules: self.rules.clone(),
            priorities: self.priorities,
        }
    }

    /// 导入之前导出的规则文件：规则追加在现有规则之后，优先级整体替换
    pub fn import_rules(&mut self, config: RulesConfig) {
        for rule in config.rules.rules() {
            self.rules.push(rule.clone());
        }
        self.priorities = config.priorities;
    }

    /// 生成过滤视图，任务表本身不变
    pub fn apply_task_filter(&mut self, filter: &TaskFilter) -> AlchemistResult<Vec<Task>> {
        let rows = filter.matching_rows(&self.tasks)?;
        info!("任务过滤: {} / {} 行匹配", rows.len(), self.tasks.len());
        self.task_view = Some(TaskView {
            filter: filter.clone(),
            rows,
        });
        Ok(self.visible_tasks())
    }

    pub fn clear_task_filter(&mut self) {
        self.task_view = None;
    }

    pub fn task_filter(&self) -> Option<&TaskFilter> {
        self.task_view.as_ref().map(|view| &view.filter)
    }

    /// 过滤视图生效时返回视图中的任务（反映之后的编辑），否则返回整张任务表
    pub fn visible_tasks(&self) -> Vec<Task> {
        match &self.task_view {
            Some(view) => view
                .rows
                .iter()
                .filter_map(|row| self.tasks.get(*row).cloned())
                .collect(),
            None => self.tasks.clone(),
        }
    }

    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    pub fn workers(&self) -> &[Worker] {
        &self.workers
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// 最近一次校验的结果
    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    pub fn table_json(&self, kind: EntityKind) -> AlchemistResult<Value> {
        let value = match kind {
            EntityKind::Client => serde_json::to_value(&self.clients)?,
            EntityKind::Worker => serde_json::to_value(&self.workers)?,
            EntityKind::Task => serde_json::to_value(&self.tasks)?,
        };
        Ok(value)
    }

    pub fn data_context(&self) -> DataContext<'_> {
        DataContext {
            clients: &self.clients,
            tasks: &self.tasks,
            workers: &self.workers,
        }
    }

    pub fn export_snapshot(&self) -> ExportBundle {
        ExportBundle {
            clients: self.clients.clone(),
            workers: self.workers.clone(),
            tasks: self.tasks.clone(),
            rules: self.rules_config(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(rows: Value) -> Vec<RawRecord> {
        serde_json::from_value(rows).unwrap()
    }

    fn loaded_session() -> Session {
        let mut session = Session::default();
        session.load(
            EntityKind::Client,
            &records(json!([
                {"ClientID": "C1", "PriorityLevel": "7", "RequestedTaskIDs": "T1,T99"},
                {"ClientID": "C2", "PriorityLevel": "2", "RequestedTaskIDs": "T2"}
            ])),
        );
        session.load(
            EntityKind::Task,
            &records(json!([
                {"TaskID": "T1", "Duration": "1", "PreferredPhases": "[1]"},
                {"TaskID": "T2", "Duration": "3", "PreferredPhases": "1-3"},
                {"TaskID": "T3", "Duration": "4", "PreferredPhases": "[2]"}
            ])),
        );
        session.load(
            EntityKind::Worker,
            &records(json!([
                {"WorkerID": "W1", "AvailableSlots": "[1,2,3]", "MaxLoadPerPhase": "1"}
            ])),
        );
        session
    }

    #[test]
    fn test_corrections_for_stale_data_are_not_stored() {
        let mut session = loaded_session();
        session.validate();
        let correction = Correction {
            entity: EntityKind::Client,
            row: 0,
            field: "PriorityLevel".into(),
            suggested_value: json!(1),
        };

        let revision = session.revision();
        session.load(EntityKind::Client, &records(json!([{"ClientID": "C5"}])));
        assert!(!session.store_corrections_for(revision, vec![correction.clone()]));
        assert!(session.pending_corrections().is_empty());

        let revision = session.revision();
        session.validate();
        assert!(session.store_corrections_for(revision, vec![correction.clone()]));
        assert_eq!(session.pending_corrections(), &[correction.clone()][..]);

        let revision = session.revision();
        session
            .set_field(EntityKind::Client, 0, "ClientName", &json!("Renamed"))
            .unwrap();
        assert!(!session.store_corrections_for(revision, Vec::new()));
        assert_eq!(session.pending_corrections().len(), 1);
    }

    #[test]
    fn test_load_replaces_table() {
        let mut session = loaded_session();
        let summary = session.load(
            EntityKind::Client,
            &records(json!([{"ClientID": "C9"}, {"ClientName": "no id"}])),
        );

        assert_eq!(summary.loaded, 1);
        assert_eq!(summary.discarded, 1);
        assert_eq!(session.clients().len(), 1);
        assert_eq!(session.clients()[0].client_id, "C9");
    }

    #[test]
    fn test_validate_without_edits_is_idempotent() {
        let mut session = loaded_session();
        let first = session.validate();
        let second = session.validate();

        assert_eq!(first.findings, second.findings);
        assert_eq!(
            first
                .findings
                .iter()
                .map(|f| f.message.as_str())
                .collect::<Vec<_>>(),
            vec!["PriorityLevel must be 1–5", "Unknown TaskID: T99"]
        );
    }

    #[test]
    fn test_apply_correction_mutates_one_field_and_revalidates() {
        let mut session = loaded_session();
        session.validate();

        let correction = Correction {
            entity: EntityKind::Client,
            row: 0,
            field: "PriorityLevel".into(),
            suggested_value: json!(1),
        };
        session.set_pending_corrections(vec![correction.clone()]);

        let report = session.apply_correction(&correction).unwrap();
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].message, "Unknown TaskID: T99");
        assert_eq!(session.clients()[0].priority_level, Some(1));
        assert_eq!(session.clients()[0].key, "C1");
        assert!(session.pending_corrections().is_empty());
    }

    #[test]
    fn test_failed_edit_leaves_state_unchanged() {
        let mut session = loaded_session();
        let before = session.validate();

        assert!(matches!(
            session.set_field(EntityKind::Task, 7, "Duration", &json!(2)),
            Err(AlchemistError::RowNotFound { .. })
        ));
        assert!(matches!(
            session.set_field(EntityKind::Task, 0, "Colour", &json!(2)),
            Err(AlchemistError::UnknownField { .. })
        ));
        assert!(session
            .set_field(EntityKind::Client, 0, "ClientName", &json!({"a": 1}))
            .is_err());

        assert_eq!(session.report().findings, before.findings);
        assert_eq!(session.clients()[0].client_name, "");
    }

    #[test]
    fn test_filtered_view_mirrors_edits() {
        let mut session = loaded_session();
        let filter = TaskFilter {
            duration: Some(">1".into()),
            preferred_phases: Some("includes 2".into()),
        };

        let visible = session.apply_task_filter(&filter).unwrap();
        assert_eq!(
            visible.iter().map(|t| t.task_id.as_str()).collect::<Vec<_>>(),
            vec!["T2", "T3"]
        );
        assert_eq!(session.tasks().len(), 3);

        session
            .set_field(EntityKind::Task, 2, "TaskName", &json!("Assembly"))
            .unwrap();
        assert_eq!(session.visible_tasks()[1].task_name, "Assembly");

        session.clear_task_filter();
        assert_eq!(session.visible_tasks().len(), 3);
    }

    #[test]
    fn test_reloading_tasks_clears_view() {
        let mut session = loaded_session();
        session
            .apply_task_filter(&TaskFilter {
                duration: Some(">3".into()),
                preferred_phases: None,
            })
            .unwrap();
        assert!(session.task_filter().is_some());

        session.load(EntityKind::Task, &records(json!([{"TaskID": "T5"}])));
        assert!(session.task_filter().is_none());
        assert_eq!(session.visible_tasks().len(), 1);
    }

    #[test]
    fn test_rules_and_priorities() {
        let mut session = loaded_session();
        session.add_rule(Rule::CoRun {
            tasks: Some(vec!["T1".into(), "T2".into()]),
            priority: Some(1),
        });
        session.set_priority("fairness", 45).unwrap();
        assert!(session.set_priority("fairness", 120).is_err());

        let config = session.rules_config();
        assert_eq!(
            serde_json::to_value(&config).unwrap(),
            json!({
                "rules": [{"type": "coRun", "tasks": ["T1", "T2"], "priority": 1}],
                "priorities": {"priorityLevel": 50, "taskFulfillment": 30, "fairness": 45}
            })
        );

        let mut restored = Session::default();
        restored.import_rules(config.clone());
        assert_eq!(restored.rules_config(), config);
    }
}

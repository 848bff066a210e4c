use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::normalizer::{
    coerce_attributes, coerce_int, coerce_int_list, coerce_phases, coerce_string_list,
    coerce_text, text_of, RawRecord,
};
use crate::value_objects::FieldList;
use alchemist_errors::{AlchemistError, AlchemistResult};

/// 实体种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Client,
    Worker,
    Task,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Client, EntityKind::Worker, EntityKind::Task];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Client => "Client",
            EntityKind::Worker => "Worker",
            EntityKind::Task => "Task",
        }
    }

    /// 复数小写形式，用于路由和导出文件名
    pub fn plural(&self) -> &'static str {
        match self {
            EntityKind::Client => "clients",
            EntityKind::Worker => "workers",
            EntityKind::Task => "tasks",
        }
    }

    /// 主标识列名
    pub fn id_column(&self) -> &'static str {
        match self {
            EntityKind::Client => "ClientID",
            EntityKind::Worker => "WorkerID",
            EntityKind::Task => "TaskID",
        }
    }

    /// 按上传文件名推断实体种类，无法识别时归为 Worker
    pub fn from_file_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.contains("clients") {
            EntityKind::Client
        } else if lower.contains("tasks") {
            EntityKind::Task
        } else {
            EntityKind::Worker
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = AlchemistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "client" | "clients" => Ok(EntityKind::Client),
            "worker" | "workers" => Ok(EntityKind::Worker),
            "task" | "tasks" => Ok(EntityKind::Task),
            other => Err(AlchemistError::invalid_value(
                "entity",
                format!("未知的实体种类: {other}"),
            )),
        }
    }
}

impl Serialize for EntityKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EntityKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// 三张实体表共用的行为
///
/// `key` 是归一化时分配的标识键，之后的编辑和纠正都不会改变它；
/// `primary_id` 是当前的业务标识列（可被编辑）。
pub trait Entity: Clone + fmt::Debug + Serialize + Send + Sync + 'static {
    const KIND: EntityKind;

    fn from_raw(raw: &RawRecord, key: String) -> Self;

    fn key(&self) -> &str;

    fn primary_id(&self) -> &str;

    /// 按列名修改单个字段，使用与归一化相同的类型转换
    fn set_field(&mut self, field: &str, value: &Value) -> AlchemistResult<()>;

    fn columns() -> &'static [&'static str];
}

fn immutable_key() -> AlchemistError {
    AlchemistError::invalid_value("id", "标识键在归一化后不可修改")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    #[serde(rename = "id")]
    pub key: String,
    #[serde(rename = "ClientID")]
    pub client_id: String,
    #[serde(rename = "ClientName")]
    pub client_name: String,
    #[serde(rename = "PriorityLevel")]
    pub priority_level: Option<i64>,
    #[serde(rename = "RequestedTaskIDs")]
    pub requested_task_ids: FieldList<String>,
    #[serde(rename = "GroupTag")]
    pub group_tag: String,
    #[serde(rename = "AttributesJSON")]
    pub attributes: Value,
}

impl Entity for Client {
    const KIND: EntityKind = EntityKind::Client;

    fn from_raw(raw: &RawRecord, key: String) -> Self {
        Self {
            key,
            client_id: text_of(raw.get("ClientID")),
            client_name: text_of(raw.get("ClientName")),
            priority_level: coerce_int(raw.get("PriorityLevel")),
            requested_task_ids: coerce_string_list(raw.get("RequestedTaskIDs")),
            group_tag: text_of(raw.get("GroupTag")),
            attributes: coerce_attributes(raw.get("AttributesJSON")),
        }
    }

    fn key(&self) -> &str {
        &self.key
    }

    fn primary_id(&self) -> &str {
        &self.client_id
    }

    fn set_field(&mut self, field: &str, value: &Value) -> AlchemistResult<()> {
        match field {
            "id" => return Err(immutable_key()),
            "ClientID" => self.client_id = coerce_text(field, value)?,
            "ClientName" => self.client_name = coerce_text(field, value)?,
            "PriorityLevel" => self.priority_level = coerce_int(Some(value)),
            "RequestedTaskIDs" => self.requested_task_ids = coerce_string_list(Some(value)),
            "GroupTag" => self.group_tag = coerce_text(field, value)?,
            "AttributesJSON" => self.attributes = value.clone(),
            _ => return Err(AlchemistError::unknown_field(Self::KIND.as_str(), field)),
        }
        Ok(())
    }

    fn columns() -> &'static [&'static str] {
        &[
            "ClientID",
            "ClientName",
            "PriorityLevel",
            "RequestedTaskIDs",
            "GroupTag",
            "AttributesJSON",
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    #[serde(rename = "id")]
    pub key: String,
    #[serde(rename = "WorkerID")]
    pub worker_id: String,
    #[serde(rename = "WorkerName")]
    pub worker_name: String,
    #[serde(rename = "Skills")]
    pub skills: FieldList<String>,
    #[serde(rename = "AvailableSlots")]
    pub available_slots: FieldList<i64>,
    #[serde(rename = "MaxLoadPerPhase")]
    pub max_load_per_phase: Option<i64>,
    #[serde(rename = "WorkerGroup")]
    pub worker_group: String,
    #[serde(rename = "QualificationLevel")]
    pub qualification_level: String,
}

impl Entity for Worker {
    const KIND: EntityKind = EntityKind::Worker;

    fn from_raw(raw: &RawRecord, key: String) -> Self {
        Self {
            key,
            worker_id: text_of(raw.get("WorkerID")),
            worker_name: text_of(raw.get("WorkerName")),
            skills: coerce_string_list(raw.get("Skills")),
            available_slots: coerce_int_list(raw.get("AvailableSlots")),
            max_load_per_phase: coerce_int(raw.get("MaxLoadPerPhase")),
            worker_group: text_of(raw.get("WorkerGroup")),
            qualification_level: text_of(raw.get("QualificationLevel")),
        }
    }

    fn key(&self) -> &str {
        &self.key
    }

    fn primary_id(&self) -> &str {
        &self.worker_id
    }

    fn set_field(&mut self, field: &str, value: &Value) -> AlchemistResult<()> {
        match field {
            "id" => return Err(immutable_key()),
            "WorkerID" => self.worker_id = coerce_text(field, value)?,
            "WorkerName" => self.worker_name = coerce_text(field, value)?,
            "Skills" => self.skills = coerce_string_list(Some(value)),
            "AvailableSlots" => self.available_slots = coerce_int_list(Some(value)),
            "MaxLoadPerPhase" => self.max_load_per_phase = coerce_int(Some(value)),
            "WorkerGroup" => self.worker_group = coerce_text(field, value)?,
            "QualificationLevel" => self.qualification_level = coerce_text(field, value)?,
            _ => return Err(AlchemistError::unknown_field(Self::KIND.as_str(), field)),
        }
        Ok(())
    }

    fn columns() -> &'static [&'static str] {
        &[
            "WorkerID",
            "WorkerName",
            "Skills",
            "AvailableSlots",
            "MaxLoadPerPhase",
            "WorkerGroup",
            "QualificationLevel",
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "id")]
    pub key: String,
    #[serde(rename = "TaskID")]
    pub task_id: String,
    #[serde(rename = "TaskName")]
    pub task_name: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Duration")]
    pub duration: Option<i64>,
    #[serde(rename = "RequiredSkills")]
    pub required_skills: FieldList<String>,
    #[serde(rename = "PreferredPhases")]
    pub preferred_phases: FieldList<i64>,
    #[serde(rename = "MaxConcurrent")]
    pub max_concurrent: Option<i64>,
}

impl Entity for Task {
    const KIND: EntityKind = EntityKind::Task;

    fn from_raw(raw: &RawRecord, key: String) -> Self {
        Self {
            key,
            task_id: text_of(raw.get("TaskID")),
            task_name: text_of(raw.get("TaskName")),
            category: text_of(raw.get("Category")),
            duration: coerce_int(raw.get("Duration")),
            required_skills: coerce_string_list(raw.get("RequiredSkills")),
            preferred_phases: coerce_phases(raw.get("PreferredPhases")),
            max_concurrent: coerce_int(raw.get("MaxConcurrent")),
        }
    }

    fn key(&self) -> &str {
        &self.key
    }

    fn primary_id(&self) -> &str {
        &self.task_id
    }

    fn set_field(&mut self, field: &str, value: &Value) -> AlchemistResult<()> {
        match field {
            "id" => return Err(immutable_key()),
            "TaskID" => self.task_id = coerce_text(field, value)?,
            "TaskName" => self.task_name = coerce_text(field, value)?,
            "Category" => self.category = coerce_text(field, value)?,
            "Duration" => self.duration = coerce_int(Some(value)),
            "RequiredSkills" => self.required_skills = coerce_string_list(Some(value)),
            "PreferredPhases" => self.preferred_phases = coerce_phases(Some(value)),
            "MaxConcurrent" => self.max_concurrent = coerce_int(Some(value)),
            _ => return Err(AlchemistError::unknown_field(Self::KIND.as_str(), field)),
        }
        Ok(())
    }

    fn columns() -> &'static [&'static str] {
        &[
            "TaskID",
            "TaskName",
            "Category",
            "Duration",
            "RequiredSkills",
            "PreferredPhases",
            "MaxConcurrent",
        ]
    }
}

//! 原始记录构建器，字段值都以上传文件中的文本形式给出

use alchemist_domain::RawRecord;

pub struct ClientRecordBuilder {
    record: RawRecord,
}

impl ClientRecordBuilder {
    pub fn new(id: &str) -> Self {
        let mut record = RawRecord::new();
        record.insert("ClientID", id);
        record.insert("ClientName", format!("Client {id}"));
        record.insert("PriorityLevel", "3");
        record.insert("RequestedTaskIDs", "");
        record.insert("GroupTag", "GroupA");
        record.insert("AttributesJSON", "{}");
        Self { record }
    }

    pub fn with_priority(self, priority: &str) -> Self {
        self.with_field("PriorityLevel", priority)
    }

    pub fn with_requested_tasks(self, tasks: &str) -> Self {
        self.with_field("RequestedTaskIDs", tasks)
    }

    pub fn with_attributes(self, attributes: &str) -> Self {
        self.with_field("AttributesJSON", attributes)
    }

    pub fn with_field(mut self, column: &str, value: impl Into<serde_json::Value>) -> Self {
        self.record.insert(column, value);
        self
    }

    pub fn build(self) -> RawRecord {
        self.record
    }
}

pub struct WorkerRecordBuilder {
    record: RawRecord,
}

impl WorkerRecordBuilder {
    pub fn new(id: &str) -> Self {
        let mut record = RawRecord::new();
        record.insert("WorkerID", id);
        record.insert("WorkerName", format!("Worker {id}"));
        record.insert("Skills", "");
        record.insert("AvailableSlots", "[1,2,3]");
        record.insert("MaxLoadPerPhase", "1");
        record.insert("WorkerGroup", "GroupA");
        record.insert("QualificationLevel", "3");
        Self { record }
    }

    pub fn with_skills(self, skills: &str) -> Self {
        self.with_field("Skills", skills)
    }

    pub fn with_slots(self, slots: &str) -> Self {
        self.with_field("AvailableSlots", slots)
    }

    pub fn with_max_load(self, max_load: &str) -> Self {
        self.with_field("MaxLoadPerPhase", max_load)
    }

    pub fn with_field(mut self, column: &str, value: impl Into<serde_json::Value>) -> Self {
        self.record.insert(column, value);
        self
    }

    pub fn build(self) -> RawRecord {
        self.record
    }
}

pub struct TaskRecordBuilder {
    record: RawRecord,
}

impl TaskRecordBuilder {
    pub fn new(id: &str) -> Self {
        let mut record = RawRecord::new();
        record.insert("TaskID", id);
        record.insert("TaskName", format!("Task {id}"));
        record.insert("Category", "General");
        record.insert("Duration", "1");
        record.insert("RequiredSkills", "");
        record.insert("PreferredPhases", "[1]");
        record.insert("MaxConcurrent", "1");
        Self { record }
    }

    pub fn with_duration(self, duration: &str) -> Self {
        self.with_field("Duration", duration)
    }

    pub fn with_skills(self, skills: &str) -> Self {
        self.with_field("RequiredSkills", skills)
    }

    pub fn with_phases(self, phases: &str) -> Self {
        self.with_field("PreferredPhases", phases)
    }

    pub fn with_max_concurrent(self, max_concurrent: &str) -> Self {
        self.with_field("MaxConcurrent", max_concurrent)
    }

    pub fn with_field(mut self, column: &str, value: impl Into<serde_json::Value>) -> Self {
        self.record.insert(column, value);
        self
    }

    pub fn build(self) -> RawRecord {
        self.record
    }
}

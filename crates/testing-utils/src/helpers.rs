//! 示例数据集
//!
//! 三个CSV之间互相引用，校验后恰好产生 `SAMPLE_FINDINGS` 中的8条问题。

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use alchemist_application::Session;
use alchemist_domain::EntityKind;

use crate::builders::{ClientRecordBuilder, TaskRecordBuilder, WorkerRecordBuilder};

pub const SAMPLE_CLIENTS_CSV: &str = "\
ClientID,ClientName,PriorityLevel,RequestedTaskIDs,GroupTag,AttributesJSON
C1,Acme Corp,3,\"T1,T2\",GroupA,\"{\"\"location\"\":\"\"NY\"\"}\"
C2,Globex,7,T99,GroupB,{}
C1,Initech,2,T2,GroupA,{bad json}
";

pub const SAMPLE_WORKERS_CSV: &str = "\
WorkerID,WorkerName,Skills,AvailableSlots,MaxLoadPerPhase,WorkerGroup,QualificationLevel
W1,Alice,\"python,sql\",\"[1,2,3]\",2,GroupA,4
W2,Bob,python,[2],2,GroupB,3
";

pub const SAMPLE_TASKS_CSV: &str = "\
TaskID,TaskName,Category,Duration,RequiredSkills,PreferredPhases,MaxConcurrent
T1,Data Cleanup,ETL,2,\"python,sql\",1-3,1
T2,Report,Analytics,0,python,[2],1
T3,Welding Job,Fabrication,3,welding,\"[1,2]\",1
";

/// 示例数据集的校验结果，按报告顺序
pub const SAMPLE_FINDINGS: [(EntityKind, usize, &str); 8] = [
    (EntityKind::Client, 1, "PriorityLevel must be 1–5"),
    (EntityKind::Client, 1, "Unknown TaskID: T99"),
    (EntityKind::Client, 2, "Duplicate ClientID: C1"),
    (EntityKind::Client, 2, "Malformed JSON in AttributesJSON"),
    (EntityKind::Task, 1, "Duration must be ≥1"),
    (EntityKind::Worker, 1, "AvailableSlots count must be ≥ MaxLoadPerPhase"),
    (
        EntityKind::Task,
        2,
        "Required skill \"welding\" not found in any worker's skills",
    ),
    (
        EntityKind::Task,
        2,
        "MaxConcurrent (1) exceeds qualified workers (0)",
    ),
];

/// 把三个示例CSV写入目录，返回 clients / workers / tasks 的路径
pub fn write_sample_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let files = [
        ("clients.csv", SAMPLE_CLIENTS_CSV),
        ("workers.csv", SAMPLE_WORKERS_CSV),
        ("tasks.csv", SAMPLE_TASKS_CSV),
    ];

    files
        .iter()
        .map(|(name, content)| {
            let path = dir.join(name);
            fs::write(&path, content)?;
            Ok(path)
        })
        .collect()
}

/// 与示例CSV内容相同的会话，未执行校验
pub fn sample_session() -> Session {
    let mut session = Session::default();
    session.load(
        EntityKind::Client,
        &[
            ClientRecordBuilder::new("C1")
                .with_field("ClientName", "Acme Corp")
                .with_requested_tasks("T1,T2")
                .with_attributes(r#"{"location":"NY"}"#)
                .build(),
            ClientRecordBuilder::new("C2")
                .with_field("ClientName", "Globex")
                .with_priority("7")
                .with_requested_tasks("T99")
                .with_field("GroupTag", "GroupB")
                .build(),
            ClientRecordBuilder::new("C1")
                .with_field("ClientName", "Initech")
                .with_priority("2")
                .with_requested_tasks("T2")
                .with_attributes("{bad json}")
                .build(),
        ],
    );
    session.load(
        EntityKind::Worker,
        &[
            WorkerRecordBuilder::new("W1")
                .with_field("WorkerName", "Alice")
                .with_skills("python,sql")
                .with_slots("[1,2,3]")
                .with_max_load("2")
                .with_field("QualificationLevel", "4")
                .build(),
            WorkerRecordBuilder::new("W2")
                .with_field("WorkerName", "Bob")
                .with_skills("python")
                .with_slots("[2]")
                .with_max_load("2")
                .with_field("WorkerGroup", "GroupB")
                .build(),
        ],
    );
    session.load(
        EntityKind::Task,
        &[
            TaskRecordBuilder::new("T1")
                .with_duration("2")
                .with_skills("python,sql")
                .with_phases("1-3")
                .build(),
            TaskRecordBuilder::new("T2")
                .with_duration("0")
                .with_skills("python")
                .with_phases("[2]")
                .build(),
            TaskRecordBuilder::new("T3")
                .with_duration("3")
                .with_skills("welding")
                .with_phases("[1,2]")
                .build(),
        ],
    );
    session
}

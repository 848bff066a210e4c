//! # 基础设施
//!
//! - `interpreter` - 解释器实现（OpenAI兼容HTTP接口、离线脚本化实现）及工厂
//! - `upload` - CSV和电子表格上传解析
//! - `export` - 归一化数据和规则的导出

pub mod export;
pub mod interpreter;
pub mod upload;

pub use export::{write_export, ExportSummary};
pub use interpreter::{InterpreterFactory, OpenAiInterpreter, ScriptedInterpreter};
pub use upload::{
    parse_csv, parse_records, parse_spreadsheet, parse_upload, read_upload, UploadedTable,
};

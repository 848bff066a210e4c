//! 上传文件解析
//!
//! 接受带表头的逗号分隔文本，或第一个工作表首行为表头的电子表格。
//! 文件无法解析时整体失败，不会产生部分结果。

use std::io::{Cursor, Read};
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use tracing::{debug, info, warn};

use alchemist_domain::{EntityKind, RawRecord};
use alchemist_errors::{AlchemistError, AlchemistResult};

/// 一个已解析的上传文件
#[derive(Debug, Clone)]
pub struct UploadedTable {
    pub kind: EntityKind,
    pub records: Vec<RawRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UploadFormat {
    Delimited,
    Spreadsheet,
}

const SPREADSHEET_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = b"\xD0\xCF\x11\xE0";

impl UploadFormat {
    /// 扩展名优先，没有可识别的扩展名时按文件头判断
    fn detect(file_name: Option<&str>, content: &[u8]) -> Self {
        let extension = file_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some(ext) if SPREADSHEET_EXTENSIONS.contains(&ext) => UploadFormat::Spreadsheet,
            Some("csv") | Some("txt") => UploadFormat::Delimited,
            _ if content.starts_with(ZIP_MAGIC) || content.starts_with(OLE_MAGIC) => {
                UploadFormat::Spreadsheet
            }
            _ => UploadFormat::Delimited,
        }
    }
}

/// 按表头组装一行，表头为空的列忽略
///
/// 单元格比表头多的行整行丢弃。
fn assemble(headers: &[String], cells: Vec<String>) -> Option<RawRecord> {
    if cells.len() > headers.len() {
        return None;
    }
    Some(
        headers
            .iter()
            .zip(cells)
            .filter(|(header, _)| !header.is_empty())
            .map(|(header, cell)| (header.as_str(), cell))
            .collect(),
    )
}

fn ensure_headers(headers: &[String]) -> AlchemistResult<()> {
    if headers.iter().all(String::is_empty) {
        return Err(AlchemistError::upload("缺少表头"));
    }
    Ok(())
}

/// 解析CSV内容，空单元格保留为空字符串，行尾缺少的单元格视为缺失
pub fn parse_csv<R: Read>(reader: R) -> AlchemistResult<Vec<RawRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .map_err(|e| AlchemistError::upload(format!("无法读取表头: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();
    ensure_headers(&headers)?;

    let mut records = Vec::new();
    for (line, row) in csv_reader.records().enumerate() {
        let row = row
            .map_err(|e| AlchemistError::upload(format!("第 {} 行无法解析: {e}", line + 2)))?;
        let cells: Vec<String> = row.iter().map(str::to_string).collect();
        match assemble(&headers, cells) {
            Some(record) => records.push(record),
            None => warn!("第 {} 行的单元格多于表头 ({} 列)，已丢弃", line + 2, headers.len()),
        }
    }

    debug!("CSV解析完成: {} 列, {} 行", headers.len(), records.len());
    Ok(records)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// 解析电子表格的第一个工作表，首行为表头，完全空白的行跳过
///
/// 单元格一律转成文本，与CSV上传走同一套归一化。
pub fn parse_spreadsheet(content: &[u8]) -> AlchemistResult<Vec<RawRecord>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(content))
        .map_err(|e| AlchemistError::upload(format!("无法打开电子表格: {e}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AlchemistError::upload("电子表格中没有工作表"))?
        .map_err(|e| AlchemistError::upload(format!("无法读取第一个工作表: {e}")))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(|cell| cell_text(cell).trim().to_string()).collect())
        .unwrap_or_default();
    ensure_headers(&headers)?;

    let records: Vec<RawRecord> = rows
        .filter(|row| !row.iter().all(|cell| matches!(cell, Data::Empty)))
        .filter_map(|row| assemble(&headers, row.iter().map(cell_text).collect()))
        .collect();

    debug!("电子表格解析完成: {} 列, {} 行", headers.len(), records.len());
    Ok(records)
}

/// 不知道文件名时（例如API请求体）按文件头选择解析方式
pub fn parse_records(content: &[u8]) -> AlchemistResult<Vec<RawRecord>> {
    match UploadFormat::detect(None, content) {
        UploadFormat::Spreadsheet => parse_spreadsheet(content),
        UploadFormat::Delimited => parse_csv(content),
    }
}

/// 解析上传内容，实体种类由文件名推断
pub fn parse_upload(file_name: &str, content: &[u8]) -> AlchemistResult<UploadedTable> {
    let kind = EntityKind::from_file_name(file_name);
    let records = match UploadFormat::detect(Some(file_name), content) {
        UploadFormat::Spreadsheet => parse_spreadsheet(content),
        UploadFormat::Delimited => parse_csv(content),
    }
    .map_err(|e| match e {
        AlchemistError::Upload(reason) => AlchemistError::upload(format!("{file_name}: {reason}")),
        other => other,
    })?;

    info!("解析上传文件 {}: {} 条 {} 记录", file_name, records.len(), kind);
    Ok(UploadedTable { kind, records })
}

pub fn read_upload(path: &Path) -> AlchemistResult<UploadedTable> {
    let file_name = path
        .file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned();

    let content = std::fs::read(path)
        .map_err(|e| AlchemistError::upload(format!("{}: {e}", path.display())))?;
    parse_upload(&file_name, &content)
}

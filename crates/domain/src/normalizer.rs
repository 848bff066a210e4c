//! 原始记录到类型化实体的归一化
//!
//! 归一化从不因为字段值有问题而拒绝一行（只有缺少主标识列的记录会被丢弃），
//! 无法识别的值以 `None` / `FieldList::Malformed` / 解析失败标记对象的形式保留，
//! 交给校验器报告。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::entities::Entity;
use crate::value_objects::FieldList;
use alchemist_errors::{AlchemistError, AlchemistResult};

/// 数值字段缺失时的默认值
pub const DEFAULT_NUMERIC: i64 = 1;

/// 阶段范围展开的最大元素个数，超过时按解析失败处理
pub const MAX_PHASE_RANGE: i64 = 1000;

/// 一行原始数据：列名到值，`null` 等同于缺失
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(BTreeMap<String, Value>);

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column).filter(|value| !value.is_null())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(column, value)| (column.into(), value.into()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct NormalizedBatch<T> {
    pub records: Vec<T>,
    /// 因缺少主标识列而被丢弃的记录数
    pub discarded: usize,
}

/// 归一化一批原始记录
///
/// 标识键优先使用主标识列的值；只含空白的标识会保留该行，
/// 但标识键退化为 `fallback-{kind}-{index}`，index 为该行在结果表中的位置。
pub fn normalize<T: Entity>(records: &[RawRecord]) -> NormalizedBatch<T> {
    let id_column = T::KIND.id_column();
    let mut normalized: Vec<T> = Vec::with_capacity(records.len());
    let mut discarded = 0;

    for (index, raw) in records.iter().enumerate() {
        let id = text_of(raw.get(id_column));
        if id.is_empty() {
            debug!("丢弃缺少 {} 的第 {} 条记录", id_column, index);
            discarded += 1;
            continue;
        }

        let key = if id.trim().is_empty() {
            format!(
                "fallback-{}-{}",
                T::KIND.as_str().to_lowercase(),
                normalized.len()
            )
        } else {
            id
        };
        normalized.push(T::from_raw(raw, key));
    }

    debug!(
        "归一化 {} 条 {} 记录，保留 {} 条，丢弃 {} 条",
        records.len(),
        T::KIND,
        normalized.len(),
        discarded
    );

    NormalizedBatch {
        records: normalized,
        discarded,
    }
}

/// 按宽松规则解析字符串开头的整数："3.7" → 3, "4abc" → 4, "abc" → None
pub fn parse_leading_int(input: &str) -> Option<i64> {
    let trimmed = input.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }

    let magnitude: i64 = rest[..digits_len].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// 展开闭区间 "start-end"，两端都必须是整数且 end >= start
pub fn expand_phase_range(input: &str) -> Option<Vec<i64>> {
    let (start, end) = input.split_once('-')?;
    let start: i64 = start.trim().parse().ok()?;
    let end: i64 = end.trim().parse().ok()?;

    if end < start || end.checked_sub(start)? >= MAX_PHASE_RANGE {
        return None;
    }
    Some((start..=end).collect())
}

/// AttributesJSON 解析失败时写入的标记对象
pub fn invalid_json_sentinel() -> Value {
    json!({ "error": "Invalid JSON" })
}

pub fn is_invalid_json_sentinel(value: &Value) -> bool {
    match value.as_object() {
        Some(map) => map.len() == 1 && map.get("error") == Some(&Value::from("Invalid JSON")),
        None => false,
    }
}

/// 文本字段：缺失为空串，标量按其JSON文本表示
pub(crate) fn text_of(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

/// 编辑文本字段时使用，数组和对象不能写入文本列
pub(crate) fn coerce_text(field: &str, value: &Value) -> AlchemistResult<String> {
    match value {
        Value::Array(_) | Value::Object(_) => Err(AlchemistError::invalid_value(
            field,
            "文本字段不接受数组或对象",
        )),
        other => Ok(text_of(Some(other))),
    }
}

pub(crate) fn coerce_int(value: Option<&Value>) -> Option<i64> {
    match value {
        None | Some(Value::Null) => Some(DEFAULT_NUMERIC),
        Some(Value::String(text)) => parse_leading_int(text),
        Some(Value::Number(number)) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f.trunc() as i64)
        }),
        Some(_) => None,
    }
}

pub(crate) fn coerce_string_list(value: Option<&Value>) -> FieldList<String> {
    match value {
        None | Some(Value::Null) => FieldList::empty(),
        Some(Value::String(text)) => FieldList::Items(
            text.split(',')
                .map(str::trim)
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .map(FieldList::Items)
            .unwrap_or_else(|| FieldList::Malformed(Value::Array(items.clone()))),
        Some(other) => FieldList::Malformed(other.clone()),
    }
}

fn int_list_from_json(value: Value) -> FieldList<i64> {
    let Value::Array(items) = &value else {
        return FieldList::Malformed(value);
    };

    let parsed = items
        .iter()
        .map(|item| {
            item.as_i64().or_else(|| {
                item.as_f64()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .map(|f| f as i64)
            })
        })
        .collect::<Option<Vec<_>>>();

    match parsed {
        Some(numbers) => FieldList::Items(numbers),
        None => FieldList::Malformed(value),
    }
}

/// AvailableSlots：字符串按JSON解析，解析失败保留原文交给校验器
pub(crate) fn coerce_int_list(value: Option<&Value>) -> FieldList<i64> {
    match value {
        None | Some(Value::Null) => FieldList::empty(),
        Some(Value::String(text)) if text.trim().is_empty() => FieldList::empty(),
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
            Ok(parsed) => int_list_from_json(parsed),
            Err(_) => FieldList::Malformed(Value::String(text.clone())),
        },
        Some(other) => int_list_from_json(other.clone()),
    }
}

/// PreferredPhases：含 '-' 的字符串按区间展开，其余按JSON解析，失败时为空列表
pub(crate) fn coerce_phases(value: Option<&Value>) -> FieldList<i64> {
    match value {
        None | Some(Value::Null) => FieldList::empty(),
        Some(Value::String(text)) if text.trim().is_empty() => FieldList::empty(),
        Some(Value::String(text)) if text.contains('-') => {
            FieldList::Items(expand_phase_range(text).unwrap_or_default())
        }
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
            Ok(parsed) => int_list_from_json(parsed),
            Err(_) => FieldList::empty(),
        },
        Some(other) => int_list_from_json(other.clone()),
    }
}

pub(crate) fn coerce_attributes(value: Option<&Value>) -> Value {
    match value {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(Value::String(text)) if text.trim().is_empty() => Value::Object(Map::new()),
        Some(Value::String(text)) => {
            serde_json::from_str(text).unwrap_or_else(|_| invalid_json_sentinel())
        }
        Some(other) => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Client, Task, Worker};

    fn raw(value: Value) -> RawRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int("3"), Some(3));
        assert_eq!(parse_leading_int("  42"), Some(42));
        assert_eq!(parse_leading_int("3.7"), Some(3));
        assert_eq!(parse_leading_int("4abc"), Some(4));
        assert_eq!(parse_leading_int("-2"), Some(-2));
        assert_eq!(parse_leading_int("+5"), Some(5));
        assert_eq!(parse_leading_int("abc"), None);
        assert_eq!(parse_leading_int("-"), None);
        assert_eq!(parse_leading_int(""), None);
    }

    #[test]
    fn test_expand_phase_range() {
        assert_eq!(expand_phase_range("2-4"), Some(vec![2, 3, 4]));
        assert_eq!(expand_phase_range("3 - 3"), Some(vec![3]));
        assert_eq!(expand_phase_range("5-2"), None);
        assert_eq!(expand_phase_range("a-b"), None);
        assert_eq!(expand_phase_range("1-100000"), None);
    }

    #[test]
    fn test_discards_records_without_primary_id() {
        let records = vec![
            raw(json!({"ClientID": "C1"})),
            raw(json!({"ClientName": "no id"})),
            raw(json!({"ClientID": ""})),
            raw(json!({"ClientID": null})),
            raw(json!({"WorkerID": "W1"})),
        ];

        let batch = normalize::<Client>(&records);
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.discarded, 4);
        assert_eq!(batch.records[0].key, "C1");
    }

    #[test]
    fn test_whitespace_id_gets_fallback_key() {
        let records = vec![
            raw(json!({"TaskID": "T1"})),
            raw(json!({"TaskID": "   "})),
        ];

        let batch = normalize::<Task>(&records);
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.records[1].key, "fallback-task-1");
        assert_eq!(batch.records[1].task_id, "   ");
    }

    #[test]
    fn test_list_fields() {
        let worker = Worker::from_raw(
            &raw(json!({"WorkerID": "W1", "Skills": " welding , ,painting "})),
            "W1".into(),
        );
        assert_eq!(
            worker.skills,
            FieldList::Items(vec!["welding".to_string(), "painting".to_string()])
        );

        let worker = Worker::from_raw(
            &raw(json!({"WorkerID": "W1", "Skills": ["a", "b"]})),
            "W1".into(),
        );
        assert_eq!(worker.skills.items().map(<[String]>::len), Some(2));

        let worker = Worker::from_raw(
            &raw(json!({"WorkerID": "W1", "Skills": [1, "b"]})),
            "W1".into(),
        );
        assert!(worker.skills.is_malformed());

        let worker = Worker::from_raw(&raw(json!({"WorkerID": "W1"})), "W1".into());
        assert_eq!(worker.skills, FieldList::empty());
    }

    #[test]
    fn test_available_slots_parsing() {
        assert_eq!(
            coerce_int_list(Some(&json!("[1, 3, 5]"))),
            FieldList::Items(vec![1, 3, 5])
        );
        assert_eq!(coerce_int_list(Some(&json!(""))), FieldList::empty());
        assert_eq!(
            coerce_int_list(Some(&json!("[1,"))),
            FieldList::Malformed(json!("[1,"))
        );
        assert_eq!(
            coerce_int_list(Some(&json!("\"x\""))),
            FieldList::Malformed(json!("x"))
        );
        assert_eq!(
            coerce_int_list(Some(&json!([1, "two"]))),
            FieldList::Malformed(json!([1, "two"]))
        );
    }

    #[test]
    fn test_preferred_phases_parsing() {
        assert_eq!(coerce_phases(Some(&json!("2-4"))), FieldList::Items(vec![2, 3, 4]));
        assert_eq!(coerce_phases(Some(&json!("[1,3]"))), FieldList::Items(vec![1, 3]));
        assert_eq!(coerce_phases(Some(&json!("not json"))), FieldList::empty());
        assert_eq!(coerce_phases(Some(&json!("4-1"))), FieldList::empty());
        assert_eq!(coerce_phases(Some(&json!([2]))), FieldList::Items(vec![2]));
        assert!(coerce_phases(Some(&json!("7"))).is_malformed());
    }

    #[test]
    fn test_numeric_fields() {
        assert_eq!(coerce_int(None), Some(1));
        assert_eq!(coerce_int(Some(&Value::Null)), Some(1));
        assert_eq!(coerce_int(Some(&json!(""))), None);
        assert_eq!(coerce_int(Some(&json!("   "))), None);
        assert_eq!(coerce_int(Some(&json!("0"))), Some(0));
        assert_eq!(coerce_int(Some(&json!("x"))), None);
        assert_eq!(coerce_int(Some(&json!(2.9))), Some(2));
        assert_eq!(coerce_int(Some(&json!(true))), None);
    }

    #[test]
    fn test_attributes_parsing() {
        assert_eq!(
            coerce_attributes(Some(&json!("{\"vip\": true}"))),
            json!({"vip": true})
        );
        let broken = coerce_attributes(Some(&json!("{vip")));
        assert!(is_invalid_json_sentinel(&broken));
        assert_eq!(coerce_attributes(None), json!({}));
        assert_eq!(coerce_attributes(Some(&json!(" "))), json!({}));
        assert!(!is_invalid_json_sentinel(&json!({"error": "other"})));
    }
}

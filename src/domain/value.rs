// ==========================================
// 学校入驻数据加载器 - 单元格值与行
// ==========================================
// 职责: 工作表单元格的类型化表示、键/整数转换、SQL 绑定
// ==========================================

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::types::{ToSql, ToSqlOutput, Value};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

// ==========================================
// CellValue - 单元格值
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CellValue {
    Null,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// 转为自然键文本
    ///
    /// # 规则
    /// - 文本: TRIM,空串视为 None
    /// - 整数型浮点: 去掉小数部分（5.0 → "5"）
    /// - 日期/时间: ISO-8601
    pub fn as_key(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            CellValue::Int(i) => Some(i.to_string()),
            CellValue::Float(f) if f.is_nan() => None,
            CellValue::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
                Some((*f as i64).to_string())
            }
            CellValue::Float(f) => Some(f.to_string()),
            CellValue::Bool(b) => Some(b.to_string()),
            CellValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            CellValue::Time(t) => Some(t.format("%H:%M:%S").to_string()),
            CellValue::DateTime(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }

    /// 转为整数（提示号、节次、年月等）
    ///
    /// 浮点向零截断（2.7 → 2）,带小数时记 debug 日志;
    /// 文本先按整数解析,失败再按浮点解析
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Int(i) => Some(*i),
            CellValue::Float(f) if f.is_finite() => Some(truncate_float(*f)),
            CellValue::Text(s) => {
                let trimmed = s.trim();
                trimmed.parse::<i64>().ok().or_else(|| {
                    trimmed
                        .parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .map(truncate_float)
                })
            }
            _ => None,
        }
    }
}

fn truncate_float(value: f64) -> i64 {
    let truncated = value.trunc();
    if truncated != value {
        debug!(value, truncated, "小数截断为整数");
    }
    truncated as i64
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_key() {
            Some(text) => write!(f, "{}", text),
            None => write!(f, "NULL"),
        }
    }
}

impl ToSql for CellValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            CellValue::Null => Ok(ToSqlOutput::Owned(Value::Null)),
            CellValue::Text(s) => s.to_sql(),
            CellValue::Int(i) => i.to_sql(),
            CellValue::Float(f) if f.is_nan() => Ok(ToSqlOutput::Owned(Value::Null)),
            CellValue::Float(f) => f.to_sql(),
            CellValue::Bool(b) => b.to_sql(),
            CellValue::Date(d) => d.to_sql(),
            CellValue::Time(t) => t.to_sql(),
            CellValue::DateTime(dt) => dt.to_sql(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::Date(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Null)
    }
}

/// 原始行（列名 → 单元格值）
pub type Row = HashMap<String, CellValue>;

/// 由 (列名, 值) 构造原始行
pub fn make_row<'a>(pairs: impl IntoIterator<Item = (&'a str, CellValue)>) -> Row {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

/// 带工作表行号的行
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    /// 工作表中的行号（从 1 开始,跳过空白行后仍指向原始位置）
    pub line: usize,
    pub cells: Row,
}

impl SheetRow {
    pub fn new(line: usize, cells: Row) -> Self {
        Self { line, cells }
    }
}

/// 按出现顺序编号（第 1 行为表头,数据从第 2 行开始）
pub fn number_rows(rows: Vec<Row>) -> Vec<SheetRow> {
    rows.into_iter()
        .enumerate()
        .map(|(idx, cells)| SheetRow::new(idx + 2, cells))
        .collect()
}

static NULL_CELL: CellValue = CellValue::Null;

// ==========================================
// FieldMap - 标准化后的字段表
// ==========================================
// 必填字段一定存在（缺失值为显式 Null）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    fields: HashMap<String, CellValue>,
}

impl FieldMap {
    pub(crate) fn from_fields(fields: HashMap<String, CellValue>) -> Self {
        Self { fields }
    }

    /// 取字段值,未出现的字段视为 Null
    pub fn get(&self, name: &str) -> &CellValue {
        self.fields.get(name).unwrap_or(&NULL_CELL)
    }

    /// 取字段值（拷贝）,用于写入非键列
    pub fn value(&self, name: &str) -> CellValue {
        self.get(name).clone()
    }

    /// 字段是否显式存在（含 Null）
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn key(&self, name: &str) -> Option<String> {
        self.get(name).as_key()
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).as_i64()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_key_renders_integral_float_without_fraction() {
        assert_eq!(CellValue::Float(5.0).as_key(), Some("5".to_string()));
        assert_eq!(CellValue::Float(5.5).as_key(), Some("5.5".to_string()));
        assert_eq!(CellValue::Int(12).as_key(), Some("12".to_string()));
        assert_eq!(CellValue::Text("  A ".into()).as_key(), Some("A".to_string()));
        assert_eq!(CellValue::Text("   ".into()).as_key(), None);
        assert_eq!(CellValue::Float(f64::NAN).as_key(), None);
    }

    #[test]
    fn test_as_key_formats_dates() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        assert_eq!(CellValue::Date(date).as_key(), Some("2024-06-03".to_string()));
    }

    #[test]
    fn test_as_i64_coercions() {
        assert_eq!(CellValue::Int(7).as_i64(), Some(7));
        assert_eq!(CellValue::Float(3.0).as_i64(), Some(3));
        assert_eq!(CellValue::Float(3.9).as_i64(), Some(3));
        assert_eq!(CellValue::Text(" 42 ".into()).as_i64(), Some(42));
        assert_eq!(CellValue::Text("2.0".into()).as_i64(), Some(2));
        assert_eq!(CellValue::Text("abc".into()).as_i64(), None);
        assert_eq!(CellValue::Float(f64::NAN).as_i64(), None);
        assert_eq!(CellValue::Null.as_i64(), None);
    }

    #[test]
    fn test_as_i64_truncates_toward_zero() {
        assert_eq!(CellValue::Float(2.7).as_i64(), Some(2));
        assert_eq!(CellValue::Float(-2.7).as_i64(), Some(-2));
        assert_eq!(CellValue::Text("2.7".into()).as_i64(), Some(2));
    }

    #[test]
    fn test_number_rows_starts_after_header() {
        let rows = number_rows(vec![make_row([("a", CellValue::Int(1))]), Row::new()]);
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[1].line, 3);
    }

    #[test]
    fn test_field_map_defaults_to_null() {
        let map = FieldMap::default();
        assert!(map.get("missing").is_null());
        assert_eq!(map.key("missing"), None);
        assert!(!map.contains("missing"));
    }

    #[test]
    fn test_nan_binds_as_sql_null() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let is_null: bool = conn
            .query_row("SELECT ?1 IS NULL", [CellValue::Float(f64::NAN)], |row| row.get(0))
            .unwrap();
        assert!(is_null);

        let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let text: String = conn
            .query_row("SELECT ?1", [CellValue::Date(date)], |row| row.get(0))
            .unwrap();
        assert_eq!(text, "2024-06-03");
    }
}

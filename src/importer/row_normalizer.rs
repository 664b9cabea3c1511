// ==========================================
// 学校入驻数据加载器 - 行标准化器
// ==========================================
// 职责: 全部单元格 NULL 标准化（空白 / NaN / 空值标记 → 显式 Null）
//       必填字段缺失时补为显式 Null
// 约束: 纯函数,不失败
// ==========================================

use crate::domain::value::{CellValue, FieldMap, Row};

/// 默认空值标记（TRIM 后精确比较）
pub const DEFAULT_NULL_TOKENS: &[&str] = &[
    "", "#N/A", "N/A", "NA", "n/a", "NULL", "null", "NaN", "nan", "-NaN", "None",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowNormalizer {
    null_tokens: Vec<String>,
}

impl Default for RowNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_NULL_TOKENS.iter().map(|t| t.to_string()))
    }
}

impl RowNormalizer {
    pub fn new(null_tokens: impl IntoIterator<Item = String>) -> Self {
        Self {
            null_tokens: null_tokens.into_iter().collect(),
        }
    }

    /// 判断单元格是否为缺失值
    pub fn is_missing(&self, value: &CellValue) -> bool {
        match value {
            CellValue::Null => true,
            CellValue::Float(f) => f.is_nan(),
            CellValue::Text(s) => {
                let trimmed = s.trim();
                trimmed.is_empty() || self.null_tokens.iter().any(|t| t == trimmed)
            }
            _ => false,
        }
    }

    /// 标准化一行
    ///
    /// # 参数
    /// - row: 原始行
    /// - required_fields: 必须出现在结果中的字段
    ///
    /// # 返回
    /// FieldMap: 每个单元格要么是有效值,要么是显式 Null; 必填字段一定存在
    pub fn normalize(&self, row: &Row, required_fields: &[&str]) -> FieldMap {
        let mut fields: Row = row
            .iter()
            .map(|(name, value)| {
                let value = if self.is_missing(value) {
                    CellValue::Null
                } else {
                    value.clone()
                };
                (name.clone(), value)
            })
            .collect();
        for field in required_fields {
            fields.entry((*field).to_string()).or_insert(CellValue::Null);
        }
        FieldMap::from_fields(fields)
    }
}

/// 使用默认空值标记标准化一行
pub fn normalize(row: &Row, required_fields: &[&str]) -> FieldMap {
    RowNormalizer::default().normalize(row, required_fields)
}

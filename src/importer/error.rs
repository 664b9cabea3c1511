// ==========================================
// 学校入驻数据加载器 - 加载错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约定: 行级问题不是错误（见 skip::SkipReason）,这里只收中止加载的错误
// ==========================================

use crate::domain::mappings::AlreadyPublished;
use crate::domain::types::EntityKind;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 加载错误类型
#[derive(Error, Debug)]
pub enum LoadError {
    // ===== 数据源错误 =====
    #[error("数据源不存在: {0}")]
    SourceNotFound(String),

    #[error("数据源格式不支持: {0}（仅支持 .xlsx/.xlsm/.xls/.ods 或 CSV 目录）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("工作表不存在: {sheet}")]
    SheetNotFound { sheet: String },

    // ===== 配置错误 =====
    #[error("不支持的连接串: {0}（仅支持 SQLite 路径 / :memory: / sqlite:// / file:）")]
    UnsupportedConnection(String),

    #[error("配置值格式错误 (key: {key}, value: {value}): {message}")]
    ConfigValueError {
        key: String,
        value: String,
        message: String,
    },

    // ===== 数据库错误 =====
    #[error("目标库缺少数据表: {}", .0.join(", "))]
    MissingTables(Vec<String>),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    // ===== 编排错误 =====
    #[error("阶段 {kind} 失败: {source}")]
    StageFailed {
        kind: EntityKind,
        #[source]
        source: Box<LoadError>,
    },

    #[error("实体依赖存在环: {0:?}")]
    DependencyCycle(Vec<EntityKind>),

    #[error(transparent)]
    AlreadyPublished(#[from] AlreadyPublished),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl LoadError {
    /// 包装为阶段失败
    pub fn in_stage(self, kind: EntityKind) -> Self {
        LoadError::StageFailed {
            kind,
            source: Box::new(self),
        }
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for LoadError {
    fn from(err: std::io::Error) -> Self {
        LoadError::FileReadError(err.to_string())
    }
}

// 实现 From<rusqlite::Error>（经仓储层分类）
impl From<rusqlite::Error> for LoadError {
    fn from(err: rusqlite::Error) -> Self {
        LoadError::Repository(RepositoryError::from(err))
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for LoadError {
    fn from(err: csv::Error) -> Self {
        LoadError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for LoadError {
    fn from(err: calamine::Error) -> Self {
        LoadError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type LoadResult<T> = Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tables_message_lists_names() {
        let err = LoadError::MissingTables(vec!["ss_t_grades".into(), "ss_t_sections".into()]);
        assert_eq!(err.to_string(), "目标库缺少数据表: ss_t_grades, ss_t_sections");
    }

    #[test]
    fn test_stage_failure_keeps_source() {
        let err = LoadError::InternalError("boom".into()).in_stage(EntityKind::Section);
        match err {
            LoadError::StageFailed { kind, source } => {
                assert_eq!(kind, EntityKind::Section);
                assert!(matches!(*source, LoadError::InternalError(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

// ==========================================
// 学校入驻数据加载器 - 加载配置
// ==========================================
// 职责: 目标库连接串解析、数据源路径、工作表名覆写、空值标记、busy_timeout
// 来源: 命令行参数 + 默认值（不读取环境变量）
// ==========================================

use crate::db::DEFAULT_BUSY_TIMEOUT_MS;
use crate::domain::types::EntityKind;
use crate::importer::error::{LoadError, LoadResult};
use crate::importer::row_normalizer::DEFAULT_NULL_TOKENS;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ==========================================
// DatabaseTarget - 目标库
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseTarget {
    /// 内存库（仅测试/演练）
    Memory,
    /// SQLite 文件
    File(PathBuf),
}

impl DatabaseTarget {
    /// 解析连接串
    ///
    /// # 支持
    /// - 文件路径: `school.db`
    /// - 内存库: `:memory:` / `sqlite::memory:` / `sqlite://:memory:`
    /// - URL: `sqlite:///abs/school.db` / `sqlite://school.db` / `sqlite:school.db` / `file:school.db?mode=rwc`
    ///
    /// 其他 scheme（mysql:// 等）返回 UnsupportedConnection
    pub fn parse(connection: &str) -> LoadResult<Self> {
        let trimmed = connection.trim();
        if trimmed.is_empty() {
            return Err(LoadError::ConfigValueError {
                key: "database".to_string(),
                value: connection.to_string(),
                message: "连接串为空".to_string(),
            });
        }

        let location = if let Some(rest) = trimmed.strip_prefix("sqlite://") {
            rest
        } else if let Some(rest) = trimmed.strip_prefix("sqlite:") {
            rest
        } else if let Some(rest) = trimmed.strip_prefix("file:") {
            rest.split('?').next().unwrap_or(rest)
        } else if trimmed.contains("://") {
            return Err(LoadError::UnsupportedConnection(trimmed.to_string()));
        } else {
            trimmed
        };

        if location.is_empty() {
            return Err(LoadError::ConfigValueError {
                key: "database".to_string(),
                value: connection.to_string(),
                message: "连接串缺少数据库路径".to_string(),
            });
        }

        if location == ":memory:" {
            Ok(DatabaseTarget::Memory)
        } else {
            Ok(DatabaseTarget::File(PathBuf::from(location)))
        }
    }
}

// ==========================================
// LoadConfig - 单次加载配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadConfig {
    pub database: DatabaseTarget,
    pub source_path: PathBuf,
    /// 实体种类 → 工作表名
    pub sheet_names: BTreeMap<EntityKind, String>,
    pub null_tokens: Vec<String>,
    pub busy_timeout_ms: u64,
}

impl LoadConfig {
    /// 默认配置（默认工作表名、默认空值标记、默认 busy_timeout）
    pub fn new(database: DatabaseTarget, source_path: impl Into<PathBuf>) -> Self {
        let sheet_names = EntityKind::ALL
            .iter()
            .map(|kind| (*kind, kind.default_sheet_name().to_string()))
            .collect();

        Self {
            database,
            source_path: source_path.into(),
            sheet_names,
            null_tokens: DEFAULT_NULL_TOKENS.iter().map(|t| t.to_string()).collect(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }

    /// 由命令行参数构造
    pub fn from_args(connection: &str, source_path: impl Into<PathBuf>) -> LoadResult<Self> {
        let database = DatabaseTarget::parse(connection)?;
        Ok(Self::new(database, source_path))
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// 某实体种类对应的工作表名
    pub fn sheet_name(&self, kind: EntityKind) -> &str {
        self.sheet_names
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| kind.default_sheet_name())
    }

    pub fn with_sheet_name(mut self, kind: EntityKind, sheet: impl Into<String>) -> Self {
        self.sheet_names.insert(kind, sheet.into());
        self
    }

    pub fn with_null_tokens(mut self, tokens: impl IntoIterator<Item = String>) -> Self {
        self.null_tokens = tokens.into_iter().collect();
        self
    }

    pub fn with_busy_timeout_ms(mut self, busy_timeout_ms: u64) -> Self {
        self.busy_timeout_ms = busy_timeout_ms;
        self
    }

    /// 配置快照（JSON,用于日志）
    pub fn snapshot_json(&self) -> LoadResult<String> {
        serde_json::to_string(self)
            .map_err(|e| LoadError::InternalError(format!("配置序列化失败: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_connection_strings() {
        assert_eq!(DatabaseTarget::parse(":memory:").unwrap(), DatabaseTarget::Memory);
        assert_eq!(DatabaseTarget::parse("sqlite::memory:").unwrap(), DatabaseTarget::Memory);
        assert_eq!(
            DatabaseTarget::parse("school.db").unwrap(),
            DatabaseTarget::File(PathBuf::from("school.db"))
        );
        assert_eq!(
            DatabaseTarget::parse("sqlite:///var/data/school.db").unwrap(),
            DatabaseTarget::File(PathBuf::from("/var/data/school.db"))
        );
        assert_eq!(
            DatabaseTarget::parse("sqlite:school.db").unwrap(),
            DatabaseTarget::File(PathBuf::from("school.db"))
        );
        assert_eq!(
            DatabaseTarget::parse("file:school.db?mode=rwc").unwrap(),
            DatabaseTarget::File(PathBuf::from("school.db"))
        );
    }

    #[test]
    fn test_rejects_other_schemes() {
        let err = DatabaseTarget::parse("mysql+pymysql://user:pw@host/school").unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedConnection(_)));

        let err = DatabaseTarget::parse("  ").unwrap_err();
        assert!(matches!(err, LoadError::ConfigValueError { .. }));
    }

    #[test]
    fn test_sheet_name_defaults_and_overrides() {
        let config = LoadConfig::new(DatabaseTarget::Memory, "onboarding.xlsx")
            .with_sheet_name(EntityKind::SalaryPayslip, "payslips");

        assert_eq!(config.sheet_name(EntityKind::School), "schools");
        assert_eq!(config.sheet_name(EntityKind::TeacherGradeSection), "teacher_grade_section");
        assert_eq!(config.sheet_name(EntityKind::SalaryPayslip), "payslips");
    }

    #[test]
    fn test_snapshot_json_uses_snake_case_kinds() {
        let config = LoadConfig::new(DatabaseTarget::Memory, "onboarding.xlsx");
        let json = config.snapshot_json().unwrap();
        assert!(json.contains("\"salary_payslip\":\"salary_payslips\""));
        assert!(json.contains("\"database\":\"memory\""));
    }
}

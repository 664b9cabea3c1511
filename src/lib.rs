// ==========================================
// 学校入驻数据加载器 - 核心库
// ==========================================
// 职责: 多工作表入驻数据 → 关系库
// 核心: 引用解析与依赖有序写入引擎
// 技术栈: Rust + SQLite (rusqlite) + calamine
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体种类、单元格值、记录、映射
pub mod domain;

// 数据仓储层 - 参数化 SQL
pub mod repository;

// 引擎层 - 依赖图与编排
pub mod engine;

// 导入层 - 数据源、标准化、解析、阶段
pub mod importer;

// 配置层
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

pub use config::{DatabaseTarget, LoadConfig};
pub use domain::{
    CellValue, EntityKind, FieldMap, HintMap, Identifier, NaturalKeyMap, PublishedMaps, Row,
    SheetRow,
};
pub use engine::{run_load, DependencyGraph, LoadOrchestrator, LoadReport};
pub use importer::{Dataset, LoadError, LoadResult, SkipReason, StageSummary};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}

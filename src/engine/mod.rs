// ==========================================
// 学校入驻数据加载器 - 引擎层
// ==========================================
// 职责: 实体依赖图与依赖有序写入编排
// 红线: Engine 不拼 SQL
// ==========================================

pub mod dependency_graph;
pub mod orchestrator;

// 重导出核心引擎
pub use dependency_graph::DependencyGraph;
pub use orchestrator::{run_load, LoadOrchestrator, LoadReport};

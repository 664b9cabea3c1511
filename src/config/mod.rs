// ==========================================
// 学校入驻数据加载器 - 配置层
// ==========================================
// 职责: 单次加载的全部可调参数
// ==========================================

pub mod load_config;

pub use load_config::{DatabaseTarget, LoadConfig};

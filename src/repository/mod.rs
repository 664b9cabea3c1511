// ==========================================
// 学校入驻数据加载器 - 数据仓储层 (Persistence Gateway)
// ==========================================
// 红线: Repository 不含解析规则
// ==========================================
// 职责: 事务内的参数化写入与回读,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod enrollment_repo;
pub mod error;
pub mod identity;
pub mod organization_repo;
pub mod payroll_repo;
pub mod schedule_repo;

// 重导出核心仓储
pub use enrollment_repo::EnrollmentRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use identity::IdentityUpsert;
pub use organization_repo::OrganizationRepository;
pub use payroll_repo::PayrollRepository;
pub use schedule_repo::ScheduleRepository;

// ==========================================
// 考勤排班优化系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod action_log_repo;
pub mod codec;
pub mod error;
pub mod plan_repo;
pub mod plan_result_repo;

// 重导出核心仓储
pub use action_log_repo::PlanActionLogRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use plan_repo::SchedulePlanRepository;
pub use plan_result_repo::PlanResultRepository;

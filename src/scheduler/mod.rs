// ==========================================
// 考勤排班优化系统 - 调度层
// ==========================================
// 职责: 方案生命周期编排、有界并发执行、持久化接缝
// 红线: 引擎层不感知持久化, 状态流转只在本层发生
// ==========================================

pub mod error;
pub mod executor;
pub mod lifecycle;
pub mod store;

pub use error::{SchedulerError, SchedulerResult};
pub use executor::{PlanRunExecutor, DEFAULT_MAX_CONCURRENT_RUNS};
pub use lifecycle::{PlanLifecycleOrchestrator, PlanRunOutcome, SCHEDULER_ACTOR};
pub use store::{PlanStore, SqlitePlanStore};

// ==========================================
// 考勤排班优化系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod plan;
pub mod roster;
pub mod types;

// 重导出核心类型
pub use plan::{PlanActionLog, PlanAssignmentRow, PlanResultSummary, SchedulePlan};
pub use roster::{DateRange, Employee, PreferenceKind, Shift, ShiftPreference};
pub use types::{AlgorithmType, ConflictSeverity, ConflictType, PlanStatus};

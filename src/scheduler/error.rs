// ==========================================
// 考勤排班优化系统 - 调度层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 优化器运行期失败不走错误返回, 方案标记为 FAILED 后以结果返回
// ==========================================

use crate::config::ConfigValidationError;
use crate::domain::types::PlanStatus;
use crate::repository::RepositoryError;
use thiserror::Error;

/// 调度层错误类型
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("方案未找到: {0}")]
    PlanNotFound(String),

    #[error("方案已有运行中的任务: {0}")]
    PlanAlreadyRunning(String),

    #[error("无效的状态转换: plan_id={plan_id}, from={from} to={to}")]
    InvalidStateTransition {
        plan_id: String,
        from: PlanStatus,
        to: PlanStatus,
    },

    #[error("方案不可删除: plan_id={plan_id}, status={status}")]
    NotDeletable { plan_id: String, status: PlanStatus },

    #[error(transparent)]
    Validation(#[from] ConfigValidationError),

    #[error("仓储错误: {0}")]
    Repository(#[from] RepositoryError),

    #[error("序列化失败: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("后台任务执行失败: {0}")]
    TaskJoin(String),

    #[error("调度器内部错误: {0}")]
    Internal(String),
}

/// Result 类型别名
pub type SchedulerResult<T> = Result<T, SchedulerError>;

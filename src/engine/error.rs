// ==========================================
// 考勤排班优化系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 约束不可满足不是错误,以冲突列表的形式作为数据返回
// ==========================================

use crate::config::ConfigValidationError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("优化配置非法: {0}")]
    InvalidConfig(#[from] ConfigValidationError),

    #[error("染色体结构非法: {0}")]
    MalformedChromosome(String),

    #[error("未知员工: {0}")]
    UnknownEmployee(String),

    #[error("日期不在排班区间内: {0}")]
    DateOutOfRange(chrono::NaiveDate),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;

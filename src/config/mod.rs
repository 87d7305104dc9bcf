// ==========================================
// 考勤排班优化系统 - 配置层
// ==========================================
// 职责: 优化配置定义与校验、全局默认值管理
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod optimization_config;

// 重导出核心配置类型
pub use config_manager::{config_keys, ConfigManager};
pub use optimization_config::{
    AnnealingParams, ConfigValidationError, ConstraintThresholds, CostCoefficients,
    GeneticParams, ObjectiveWeights, OptimizationConfig,
};

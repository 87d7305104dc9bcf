// ==========================================
// 考勤排班优化系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 排班优化引擎 (人工最终确认)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 配置层 - 优化配置与全局默认值
pub mod config;

// 引擎层 - 编码、评估、搜索
pub mod engine;

// 数据仓储层 - 数据访问
pub mod repository;

// 调度层 - 方案生命周期与执行
pub mod scheduler;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    AlgorithmType, ConflictSeverity, ConflictType, DateRange, Employee, PlanStatus,
    PreferenceKind, SchedulePlan, Shift, ShiftPreference,
};

// 配置
pub use config::{ConfigManager, ConfigValidationError, OptimizationConfig};

// 引擎
pub use engine::{
    optimize, CancellationFlag, Chromosome, EngineError, OptimizationResult, RunControl,
    ScheduleConflict, StopReason,
};

// 调度
pub use scheduler::{
    PlanLifecycleOrchestrator, PlanRunExecutor, PlanRunOutcome, PlanStore, SchedulerError,
    SqlitePlanStore,
};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "考勤排班优化系统";

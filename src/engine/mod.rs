// ==========================================
// 考勤排班优化系统 - 引擎层
// ==========================================
// 职责: 排班搜索与评估（染色体、适应度、冲突审计、遗传/退火、策略选择）
// 红线: 引擎不落库, 不做 I/O; 只消费 OptimizationConfig, 只产出 OptimizationResult
// ==========================================

pub mod annealing;
pub mod chromosome;
pub mod conflict;
pub mod context;
pub mod control;
pub mod error;
pub mod fitness;
pub mod genetic;
pub mod operators;
pub mod result;
pub mod rules;
pub mod seed;
pub mod strategy;

// 重导出核心引擎
pub use annealing::SimulatedAnnealingOptimizer;
pub use chromosome::{Assignment, Chromosome, ScheduleLayout};
pub use conflict::{detect_conflicts, ConflictDetector, ScheduleConflict};
pub use context::ScheduleContext;
pub use control::{CancellationFlag, ProgressObserver, RunClock, RunControl, SearchProgress};
pub use error::{EngineError, EngineResult};
pub use fitness::{evaluate, FitnessBreakdown, FitnessEvaluator};
pub use genetic::GeneticOptimizer;
pub use result::{OptimizationResult, SearchOutcome, StopReason};
pub use seed::greedy_seed;
pub use strategy::{optimize, Optimizer, StrategySelector};

// ==========================================
// 考勤排班优化系统 - 方案流转日志数据仓储
// ==========================================
// 表: plan_action_log
// 红线: 每次方案状态变化都必须记录
// ==========================================

mod core;
mod queries;


pub use core::PlanActionLogRepository;

// ==========================================
// 考勤排班优化系统 - 优化结果
// ==========================================

use crate::domain::plan::{PlanAssignmentRow, PlanResultSummary};
use crate::domain::types::AlgorithmType;
use crate::engine::chromosome::Chromosome;
use crate::engine::conflict::ScheduleConflict;
use crate::engine::fitness::FitnessBreakdown;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// 搜索停止原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StopReason {
    Converged,        // 连续若干代无改进
    BudgetExhausted,  // 迭代预算用尽
    TemperatureFloor, // 温度降至下限
    Timeout,          // 墙钟超时
    Cancelled,        // 外部取消
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::Converged => "CONVERGED",
            StopReason::BudgetExhausted => "BUDGET_EXHAUSTED",
            StopReason::TemperatureFloor => "TEMPERATURE_FLOOR",
            StopReason::Timeout => "TIMEOUT",
            StopReason::Cancelled => "CANCELLED",
        }
    }

    /// 是否视为收敛
    pub fn is_converged(&self) -> bool {
        matches!(self, StopReason::Converged | StopReason::TemperatureFloor)
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单个优化器的原始输出（尚未做冲突审计）
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub best: Chromosome,
    pub fitness: FitnessBreakdown,
    pub iterations: usize,
    pub stop_reason: StopReason,
    /// GA: 每代种群最优分; SA: 每次迭代的历史最优分
    pub history: Vec<f64>,
}

// ==========================================
// OptimizationResult
// ==========================================
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    pub algorithm: AlgorithmType,
    pub best: Chromosome,
    pub fitness: FitnessBreakdown,
    pub conflicts: Vec<ScheduleConflict>,
    pub iterations: usize,
    pub converged: bool,
    pub stop_reason: StopReason,
    pub duration: Duration,
    pub history: Vec<f64>,
}

impl OptimizationResult {
    pub fn is_cancelled(&self) -> bool {
        self.stop_reason == StopReason::Cancelled
    }

    /// 展开为排班明细行（每个基因一行）
    pub fn assignment_rows(&self, plan_id: &str) -> Vec<PlanAssignmentRow> {
        let layout = self.best.layout();
        let mut rows = Vec::with_capacity(self.best.len());
        self.best.for_each_gene(|e, d, a| {
            rows.push(PlanAssignmentRow {
                plan_id: plan_id.to_string(),
                employee_id: layout.employee_id(e).to_string(),
                work_date: layout.day(d),
                shift_id: a.shift_index().map(|s| layout.shift_id(s).to_string()),
            });
        });
        rows
    }

    /// 生成方案结果汇总行
    pub fn to_summary(&self, plan_id: &str) -> serde_json::Result<PlanResultSummary> {
        let conflicts_json = if self.conflicts.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&self.conflicts)?)
        };
        Ok(PlanResultSummary {
            plan_id: plan_id.to_string(),
            algorithm: self.algorithm,
            fairness_score: self.fitness.fairness,
            cost_score: self.fitness.cost,
            efficiency_score: self.fitness.efficiency,
            satisfaction_score: self.fitness.satisfaction,
            penalty: self.fitness.penalty,
            weighted_score: self.fitness.weighted_score,
            conflict_count: self.conflicts.len(),
            conflicts_json,
            iterations: self.iterations,
            converged: self.converged,
            stop_reason: self.stop_reason.as_str().to_string(),
            duration_ms: self.duration.as_millis() as i64,
            created_at: chrono::Local::now().naive_local(),
        })
    }
}

// ==========================================
// 考勤排班优化系统 - 适应度评估器
// ==========================================
// 职责: 计算公平性/成本/效率/满意度四项子分与约束惩罚, 合成加权总分
// 红线: 纯函数, 无 I/O, 无共享可变状态; 相同输入必得相同输出
// ==========================================
// 加权总分:
//   weighted = w_f·fairness + w_c·(1 - cost) + w_e·efficiency
//            + w_s·satisfaction - penalty
// 惩罚项与冲突检测共用 rules::scan_hard_rules
// ==========================================

use crate::config::OptimizationConfig;
use crate::domain::roster::PreferenceKind;
use crate::engine::chromosome::Chromosome;
use crate::engine::context::ScheduleContext;
use crate::engine::error::EngineResult;
use crate::engine::rules::{hard_violation_totals, short_run_count};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 无偏好数据时的满意度中性值
pub const NEUTRAL_SATISFACTION: f64 = 0.5;

/// 适应度分解
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitnessBreakdown {
    pub fairness: f64,     // [0,1], 越高越公平
    pub cost: f64,         // [0,1], 归一化成本, 越低越好
    pub efficiency: f64,   // [0,1], 1 表示每天每班次人数均在区间内
    pub satisfaction: f64, // [0,1]
    pub penalty: f64,      // >= 0
    pub weighted_score: f64,
    pub hard_violations: usize,
}

impl FitnessBreakdown {
    pub fn is_feasible(&self) -> bool {
        self.hard_violations == 0
    }
}

// ==========================================
// FitnessEvaluator
// ==========================================
#[derive(Debug, Clone)]
pub struct FitnessEvaluator {
    context: Arc<ScheduleContext>,
}

impl FitnessEvaluator {
    pub fn new(context: Arc<ScheduleContext>) -> Self {
        Self { context }
    }

    pub fn from_config(config: &OptimizationConfig) -> EngineResult<Self> {
        Ok(Self::new(Arc::new(ScheduleContext::new(config)?)))
    }

    pub fn context(&self) -> &Arc<ScheduleContext> {
        &self.context
    }

    /// 评估一个染色体
    pub fn evaluate(&self, chromosome: &Chromosome) -> FitnessBreakdown {
        let ctx = &*self.context;
        let fairness = self.fairness(chromosome);
        let cost = self.cost(chromosome);
        let efficiency = self.efficiency(chromosome);
        let satisfaction = self.satisfaction(chromosome);

        let (hard_violations, hard_magnitude) = hard_violation_totals(chromosome, ctx);
        let soft = short_run_count(chromosome, ctx);
        let w = &ctx.weights;
        let penalty = w.hard_constraint_penalty * hard_magnitude as f64
            + w.soft_constraint_penalty * soft as f64;

        let weighted_score = w.fairness * fairness
            + w.cost * (1.0 - cost)
            + w.efficiency * efficiency
            + w.satisfaction * satisfaction
            - penalty;

        FitnessBreakdown {
            fairness,
            cost,
            efficiency,
            satisfaction,
            penalty,
            weighted_score,
            hard_violations,
        }
    }

    /// 公平性: 1 / (1 + 方差/均值²), 负荷按班次难度加权
    fn fairness(&self, chromosome: &Chromosome) -> f64 {
        let layout = chromosome.layout();
        let loads: Vec<f64> = (0..layout.employee_count())
            .map(|e| {
                chromosome
                    .employee_row(e)
                    .iter()
                    .filter_map(|a| a.shift_index())
                    .map(|s| self.context.shift_difficulty[s])
                    .sum()
            })
            .collect();
        let n = loads.len() as f64;
        if n == 0.0 {
            return 1.0;
        }
        let mean = loads.iter().sum::<f64>() / n;
        if mean <= 0.0 {
            return 1.0;
        }
        let variance = loads.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / n;
        1.0 / (1.0 + variance / (mean * mean))
    }

    /// 成本: 实际成本 / 参考预算（全员每天上班且取最大倍率）
    fn cost(&self, chromosome: &Chromosome) -> f64 {
        let ctx = &*self.context;
        let budget = chromosome.len() as f64 * ctx.base_shift_cost * ctx.max_multiplier;
        if budget <= 0.0 {
            return 0.0;
        }
        let mut raw = 0.0_f64;
        chromosome.for_each_gene(|_, d, a| {
            if let Some(s) = a.shift_index() {
                raw += ctx.assignment_cost(s, d);
            }
        });
        (raw / budget).clamp(0.0, 1.0)
    }

    /// 效率: 每天每班次人数偏离 [min, max] 区间的总量, 按最大可能偏离归一化
    fn efficiency(&self, chromosome: &Chromosome) -> f64 {
        let layout = chromosome.layout();
        let min_staff = self.context.constraints.min_daily_staff;
        let max_staff = self.context.constraints.max_daily_staff;
        let deviation: usize = chromosome
            .staffing_counts()
            .into_iter()
            .map(|n| min_staff.saturating_sub(n) + n.saturating_sub(max_staff))
            .sum();
        let worst_cell = min_staff
            .max(layout.employee_count().saturating_sub(max_staff))
            .max(1);
        let denominator = (layout.day_count() * layout.shift_count() * worst_cell) as f64;
        if denominator <= 0.0 {
            return 1.0;
        }
        (1.0 - deviation as f64 / denominator).clamp(0.0, 1.0)
    }

    /// 满意度: 已满足偏好次数 / 偏好表达总次数
    fn satisfaction(&self, chromosome: &Chromosome) -> f64 {
        let ctx = &*self.context;
        if ctx.preference_slots == 0 {
            return NEUTRAL_SATISFACTION;
        }
        let mut satisfied = 0usize;
        for p in &ctx.preferences {
            let hit = |d: usize| {
                let matches = chromosome.at(p.employee, d) == p.target;
                match p.kind {
                    PreferenceKind::Prefer => matches,
                    PreferenceKind::Avoid => !matches,
                }
            };
            satisfied += match p.day {
                Some(d) => hit(d) as usize,
                None => (0..ctx.layout.day_count()).filter(|d| hit(*d)).count(),
            };
        }
        satisfied as f64 / ctx.preference_slots as f64
    }
}

/// 便捷入口: 由配置直接评估一个染色体
pub fn evaluate(chromosome: &Chromosome, config: &OptimizationConfig) -> EngineResult<FitnessBreakdown> {
    let evaluator = FitnessEvaluator::from_config(config)?;
    chromosome.validate()?;
    Ok(evaluator.evaluate(chromosome))
}

// ==========================================
// 考勤排班优化系统 - 优化配置
// ==========================================
// 职责: 一次优化运行的完整输入（花名册、班次、日期区间、
//       算法选择、超参数、目标权重、约束阈值、成本系数）
// 红线: 运行期间不可变,引擎只读不写
// ==========================================

use crate::domain::roster::{DateRange, Employee, Shift, ShiftPreference};
use crate::domain::types::AlgorithmType;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

// ==========================================
// GeneticParams - 遗传算法超参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticParams {
    pub population_size: usize,       // 种群规模
    pub max_iterations: usize,        // 最大代数
    pub crossover_rate: f64,          // 交叉概率（每对父代）
    pub mutation_rate: f64,           // 变异概率（每个基因）
    pub selection_rate: f64,          // 下一代中由交叉产生的比例
    pub elitism_rate: f64,            // 精英保留比例
    pub tournament_size: usize,       // 锦标赛规模
    pub convergence_epsilon: f64,     // 收敛判定阈值
    pub stagnation_generations: usize, // 连续无改进代数上限
}

impl Default for GeneticParams {
    fn default() -> Self {
        Self {
            population_size: 50,
            max_iterations: 200,
            crossover_rate: 0.8,
            mutation_rate: 0.02,
            selection_rate: 0.8,
            elitism_rate: 0.1,
            tournament_size: 3,
            convergence_epsilon: 1e-6,
            stagnation_generations: 30,
        }
    }
}

// ==========================================
// AnnealingParams - 模拟退火超参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnealingParams {
    pub initial_temperature: f64,
    pub cooling_rate: f64,     // 几何降温系数 (0,1)
    pub min_temperature: f64,  // 温度下限
    pub max_iterations: usize, // 迭代预算
}

impl Default for AnnealingParams {
    fn default() -> Self {
        Self {
            initial_temperature: 1.0,
            cooling_rate: 0.999,
            min_temperature: 1e-4,
            max_iterations: 10_000,
        }
    }
}

// ==========================================
// ObjectiveWeights - 目标权重
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectiveWeights {
    pub fairness: f64,
    pub cost: f64,
    pub efficiency: f64,
    pub satisfaction: f64,
    /// 每单位硬约束违反的惩罚（需大于各权重之和，保证可行解优先）
    pub hard_constraint_penalty: f64,
    /// 每单位软约束违反的惩罚
    pub soft_constraint_penalty: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            fairness: 0.3,
            cost: 0.2,
            efficiency: 0.3,
            satisfaction: 0.2,
            hard_constraint_penalty: 10.0,
            soft_constraint_penalty: 0.05,
        }
    }
}

impl ObjectiveWeights {
    pub fn objective_sum(&self) -> f64 {
        self.fairness + self.cost + self.efficiency + self.satisfaction
    }
}

// ==========================================
// ConstraintThresholds - 约束阈值
// ==========================================
// 本版本为全局阈值,不支持按员工覆写
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintThresholds {
    pub min_consecutive_work_days: usize, // 软约束
    pub max_consecutive_work_days: usize,
    pub min_rest_days: usize,             // 任意连续7天内最少休息天数
    pub min_daily_staff: usize,           // 每天每班次最少人数
    pub max_daily_staff: usize,           // 每天每班次最多人数
}

impl Default for ConstraintThresholds {
    fn default() -> Self {
        Self {
            min_consecutive_work_days: 1,
            max_consecutive_work_days: 6,
            min_rest_days: 1,
            min_daily_staff: 1,
            max_daily_staff: 10,
        }
    }
}

// ==========================================
// CostCoefficients - 成本系数
// ==========================================
// 多个倍率同时命中时取最大值,不做连乘
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostCoefficients {
    pub base_shift_cost: f64,
    pub overtime_multiplier: f64,
    pub weekend_multiplier: f64,
    pub holiday_multiplier: f64,
}

impl Default for CostCoefficients {
    fn default() -> Self {
        Self {
            base_shift_cost: 1.0,
            overtime_multiplier: 1.5,
            weekend_multiplier: 1.5,
            holiday_multiplier: 2.0,
        }
    }
}

impl CostCoefficients {
    pub fn max_multiplier(&self) -> f64 {
        1.0_f64
            .max(self.overtime_multiplier)
            .max(self.weekend_multiplier)
            .max(self.holiday_multiplier)
    }
}

fn default_true() -> bool {
    true
}

// ==========================================
// OptimizationConfig - 优化配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationConfig {
    pub employees: Vec<Employee>,
    pub shifts: Vec<Shift>,
    pub date_range: DateRange,
    #[serde(default)]
    pub algorithm: AlgorithmType,
    #[serde(default)]
    pub genetic: GeneticParams,
    #[serde(default)]
    pub annealing: AnnealingParams,
    #[serde(default)]
    pub weights: ObjectiveWeights,
    #[serde(default)]
    pub constraints: ConstraintThresholds,
    #[serde(default)]
    pub costs: CostCoefficients,
    #[serde(default)]
    pub holidays: Vec<NaiveDate>,
    #[serde(default)]
    pub preferences: Vec<ShiftPreference>,
    /// 随机种子（None 表示每次运行使用系统熵）
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// 墙钟时间上限（毫秒）；到期返回当前最优解
    #[serde(default)]
    pub time_limit_ms: Option<u64>,
    /// 是否并行评估种群
    #[serde(default = "default_true")]
    pub parallel_evaluation: bool,
}

impl OptimizationConfig {
    /// 以默认超参数创建配置
    pub fn new(employees: Vec<Employee>, shifts: Vec<Shift>, date_range: DateRange) -> Self {
        Self {
            employees,
            shifts,
            date_range,
            algorithm: AlgorithmType::default(),
            genetic: GeneticParams::default(),
            annealing: AnnealingParams::default(),
            weights: ObjectiveWeights::default(),
            constraints: ConstraintThresholds::default(),
            costs: CostCoefficients::default(),
            holidays: Vec::new(),
            preferences: Vec::new(),
            random_seed: None,
            time_limit_ms: None,
            parallel_evaluation: true,
        }
    }

    /// 基因总数 = 员工数 × 天数
    pub fn gene_count(&self) -> usize {
        self.employees.len() * self.date_range.day_count()
    }

    /// 校验配置（运行开始前同步调用）
    ///
    /// 收集全部违规项后一次性返回，不做静默修正。
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let mut violations = Vec::new();

        // ===== 主数据 =====
        if self.employees.is_empty() {
            violations.push("员工名单不能为空".to_string());
        }
        if self.shifts.is_empty() {
            violations.push("班次列表不能为空".to_string());
        }
        if self.shifts.len() > u16::MAX as usize {
            violations.push(format!("班次数量过多: {}", self.shifts.len()));
        }
        let mut seen = HashSet::new();
        for e in &self.employees {
            if e.employee_id.trim().is_empty() {
                violations.push("员工ID不能为空".to_string());
            } else if !seen.insert(e.employee_id.as_str()) {
                violations.push(format!("员工ID重复: {}", e.employee_id));
            }
        }
        let mut seen = HashSet::new();
        for s in &self.shifts {
            if s.shift_id.trim().is_empty() {
                violations.push("班次ID不能为空".to_string());
            } else if !seen.insert(s.shift_id.as_str()) {
                violations.push(format!("班次ID重复: {}", s.shift_id));
            }
            if !(s.difficulty.is_finite() && s.difficulty >= 0.0) {
                violations.push(format!("班次{}难度权重非法: {}", s.shift_id, s.difficulty));
            }
        }
        if !self.date_range.is_valid() {
            violations.push(format!(
                "开始日期{}晚于结束日期{}",
                self.date_range.start, self.date_range.end
            ));
        }

        // ===== 搜索超参数 =====
        let g = &self.genetic;
        if g.population_size == 0 {
            violations.push("种群规模必须大于0".to_string());
        }
        if g.max_iterations == 0 {
            violations.push("最大迭代次数必须大于0".to_string());
        }
        for (name, rate) in [
            ("crossover_rate", g.crossover_rate),
            ("mutation_rate", g.mutation_rate),
            ("selection_rate", g.selection_rate),
            ("elitism_rate", g.elitism_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                violations.push(format!("{}必须位于[0,1]: {}", name, rate));
            }
        }
        if g.tournament_size == 0 {
            violations.push("锦标赛规模必须大于0".to_string());
        }
        if g.convergence_epsilon < 0.0 {
            violations.push("收敛阈值不能为负".to_string());
        }

        if self.algorithm == AlgorithmType::SimulatedAnnealing {
            let a = &self.annealing;
            if a.max_iterations == 0 {
                violations.push("退火迭代预算必须大于0".to_string());
            }
            if !(a.initial_temperature > 0.0) {
                violations.push("初始温度必须大于0".to_string());
            }
            if !(a.cooling_rate > 0.0 && a.cooling_rate < 1.0) {
                violations.push(format!("降温系数必须位于(0,1): {}", a.cooling_rate));
            }
        }

        // ===== 权重 =====
        let w = &self.weights;
        for (name, value) in [
            ("fairness", w.fairness),
            ("cost", w.cost),
            ("efficiency", w.efficiency),
            ("satisfaction", w.satisfaction),
            ("hard_constraint_penalty", w.hard_constraint_penalty),
            ("soft_constraint_penalty", w.soft_constraint_penalty),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                violations.push(format!("权重{}必须为非负数: {}", name, value));
            }
        }

        // ===== 约束阈值 =====
        let c = &self.constraints;
        if c.max_consecutive_work_days == 0 {
            violations.push("最大连续上班天数必须大于0".to_string());
        }
        if c.min_consecutive_work_days > c.max_consecutive_work_days {
            violations.push(format!(
                "最小连续上班天数{}大于最大连续上班天数{}",
                c.min_consecutive_work_days, c.max_consecutive_work_days
            ));
        }
        if c.min_rest_days > 7 {
            violations.push(format!("每7天最少休息天数不能超过7: {}", c.min_rest_days));
        }
        if c.min_daily_staff > c.max_daily_staff {
            violations.push(format!(
                "每班最少人数{}大于最多人数{}",
                c.min_daily_staff, c.max_daily_staff
            ));
        }

        // ===== 成本 =====
        let k = &self.costs;
        for (name, value) in [
            ("base_shift_cost", k.base_shift_cost),
            ("overtime_multiplier", k.overtime_multiplier),
            ("weekend_multiplier", k.weekend_multiplier),
            ("holiday_multiplier", k.holiday_multiplier),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                violations.push(format!("成本系数{}必须为非负数: {}", name, value));
            }
        }

        // ===== 偏好引用 =====
        let employee_ids: HashSet<&str> =
            self.employees.iter().map(|e| e.employee_id.as_str()).collect();
        let shift_ids: HashSet<&str> = self.shifts.iter().map(|s| s.shift_id.as_str()).collect();
        for p in &self.preferences {
            if !employee_ids.contains(p.employee_id.as_str()) {
                violations.push(format!("偏好引用了未知员工: {}", p.employee_id));
            }
            if let Some(shift_id) = &p.shift_id {
                if !shift_ids.contains(shift_id.as_str()) {
                    violations.push(format!("偏好引用了未知班次: {}", shift_id));
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ConfigValidationError { violations })
        }
    }
}

/// 配置校验错误（包含全部违规项）
#[derive(Error, Debug, Clone, PartialEq)]
#[error("优化配置校验失败: {}", .violations.join("; "))]
pub struct ConfigValidationError {
    pub violations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn sample_config() -> OptimizationConfig {
        let employees = (1..=3).map(|i| Employee::new(format!("E{}", i))).collect();
        let shifts = vec![Shift::new(
            "DAY",
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        )];
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
            NaiveDate::from_ymd_opt(2026, 11, 8).unwrap(),
        );
        OptimizationConfig::new(employees, shifts, range)
    }

    #[test]
    fn test_valid_config() {
        let config = sample_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.gene_count(), 21);
    }

    #[test]
    fn test_empty_roster_rejected() {
        let mut config = sample_config();
        config.employees.clear();
        let err = config.validate().unwrap_err();
        assert!(err.violations.iter().any(|v| v.contains("员工名单不能为空")));
    }

    #[test]
    fn test_inverted_range_and_zero_budget_collected_together() {
        let mut config = sample_config();
        config.date_range = DateRange::new(
            NaiveDate::from_ymd_opt(2026, 11, 8).unwrap(),
            NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
        );
        config.genetic.population_size = 0;
        config.genetic.max_iterations = 0;
        let err = config.validate().unwrap_err();
        assert_eq!(err.violations.len(), 3);
        assert!(err.to_string().contains("优化配置校验失败"));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut config = sample_config();
        config.employees.push(Employee::new("E1"));
        let err = config.validate().unwrap_err();
        assert!(err.violations.iter().any(|v| v.contains("员工ID重复")));
    }

    #[test]
    fn test_annealing_params_checked_only_for_sa() {
        let mut config = sample_config();
        config.annealing.cooling_rate = 1.5;
        assert!(config.validate().is_ok());

        config.algorithm = AlgorithmType::SimulatedAnnealing;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let json = r#"{
            "employees": [{"employee_id": "E1"}],
            "shifts": [{"shift_id": "DAY", "start_time": "08:00:00", "end_time": "17:00:00"}],
            "date_range": {"start": "2026-11-02", "end": "2026-11-03"},
            "algorithm": "SIMULATED_ANNEALING",
            "genetic": {"population_size": 12}
        }"#;
        let config: OptimizationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.algorithm, AlgorithmType::SimulatedAnnealing);
        assert_eq!(config.genetic.population_size, 12);
        assert_eq!(config.genetic.max_iterations, GeneticParams::default().max_iterations);
        assert_eq!(config.shifts[0].difficulty, 1.0);
        assert!(config.parallel_evaluation);
    }
}

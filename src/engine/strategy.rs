// ==========================================
// 考勤排班优化系统 - 优化策略选择
// ==========================================
// 按 config.algorithm 一次性选定优化器, 搜索循环内不再分支
// 红线:
// - 不修改输入配置
// - 超时/取消时返回当前最优解, 染色体结构必定完整
// ==========================================

use crate::config::OptimizationConfig;
use crate::domain::types::AlgorithmType;
use crate::engine::annealing::SimulatedAnnealingOptimizer;
use crate::engine::conflict::ConflictDetector;
use crate::engine::context::ScheduleContext;
use crate::engine::control::{RunClock, RunControl};
use crate::engine::error::EngineResult;
use crate::engine::fitness::FitnessEvaluator;
use crate::engine::genetic::GeneticOptimizer;
use crate::engine::result::{OptimizationResult, SearchOutcome};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tracing::{info, warn};

/// 优化器统一接口
pub trait Optimizer: Send + Sync {
    fn algorithm(&self) -> AlgorithmType;

    /// 执行搜索; 停止条件由 clock 与自身预算决定
    fn search(&self, rng: &mut StdRng, clock: &RunClock) -> SearchOutcome;
}

pub struct StrategySelector;

impl StrategySelector {
    /// 按算法类型构造优化器
    pub fn select(config: &OptimizationConfig, evaluator: FitnessEvaluator) -> Box<dyn Optimizer> {
        match config.algorithm {
            AlgorithmType::Genetic => Box::new(GeneticOptimizer::new(
                evaluator,
                config.genetic.clone(),
                config.parallel_evaluation,
            )),
            AlgorithmType::SimulatedAnnealing => Box::new(SimulatedAnnealingOptimizer::new(
                evaluator,
                config.annealing.clone(),
            )),
        }
    }

    /// 执行一次完整优化: 校验 → 搜索 → 冲突审计
    pub fn optimize(
        config: &OptimizationConfig,
        control: &RunControl,
    ) -> EngineResult<OptimizationResult> {
        let context = Arc::new(ScheduleContext::new(config)?);
        let optimizer = Self::select(config, FitnessEvaluator::new(context.clone()));

        let mut rng = match config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let time_limit = control.effective_time_limit(config.time_limit_ms);
        let clock = control.start(time_limit);

        info!(
            algorithm = %optimizer.algorithm(),
            algorithm_name = optimizer.algorithm().title_cn(),
            employees = context.layout.employee_count(),
            days = context.layout.day_count(),
            shifts = context.layout.shift_count(),
            time_limit_ms = time_limit.map(|d| d.as_millis() as u64),
            "开始排班优化"
        );

        let outcome = optimizer.search(&mut rng, &clock);
        outcome.best.validate()?;

        let conflicts = ConflictDetector::new(context).detect(&outcome.best);
        let duration = clock.elapsed();

        if conflicts.is_empty() {
            info!(
                iterations = outcome.iterations,
                stop_reason = %outcome.stop_reason,
                feasible = outcome.fitness.is_feasible(),
                weighted_score = outcome.fitness.weighted_score,
                duration_ms = duration.as_millis() as u64,
                "排班优化结束"
            );
        } else {
            warn!(
                iterations = outcome.iterations,
                stop_reason = %outcome.stop_reason,
                conflict_count = conflicts.len(),
                duration_ms = duration.as_millis() as u64,
                "排班优化结束, 存在未消除的冲突"
            );
        }

        Ok(OptimizationResult {
            algorithm: optimizer.algorithm(),
            converged: outcome.stop_reason.is_converged(),
            stop_reason: outcome.stop_reason,
            best: outcome.best,
            fitness: outcome.fitness,
            conflicts,
            iterations: outcome.iterations,
            duration,
            history: outcome.history,
        })
    }
}

/// 便捷入口
pub fn optimize(config: &OptimizationConfig, control: &RunControl) -> EngineResult<OptimizationResult> {
    StrategySelector::optimize(config, control)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::roster::{DateRange, Employee, Shift};
    use crate::engine::error::EngineError;
    use crate::engine::result::StopReason;
    use chrono::{NaiveDate, NaiveTime};
    use std::time::Duration;

    fn config(algorithm: AlgorithmType) -> OptimizationConfig {
        let shift = Shift::new(
            "DAY",
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
        );
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
            NaiveDate::from_ymd_opt(2026, 11, 8).unwrap(),
        );
        let mut config = OptimizationConfig::new(
            (1..=3).map(|i| Employee::new(format!("E{}", i))).collect(),
            vec![shift],
            range,
        );
        config.algorithm = algorithm;
        config.random_seed = Some(11);
        config.genetic.population_size = 10;
        config.genetic.max_iterations = 10;
        config.annealing.max_iterations = 500;
        config
    }

    #[test]
    fn test_dispatch_by_algorithm() {
        let ga = optimize(&config(AlgorithmType::Genetic), &RunControl::new()).unwrap();
        assert_eq!(ga.algorithm, AlgorithmType::Genetic);
        let sa = optimize(&config(AlgorithmType::SimulatedAnnealing), &RunControl::new()).unwrap();
        assert_eq!(sa.algorithm, AlgorithmType::SimulatedAnnealing);
        assert_eq!(sa.best.len(), 21);
    }

    #[test]
    fn test_config_not_mutated() {
        let config = config(AlgorithmType::Genetic);
        let before = config.clone();
        optimize(&config, &RunControl::new()).unwrap();
        assert_eq!(config, before);
    }

    #[test]
    fn test_invalid_config_is_error() {
        let mut config = config(AlgorithmType::Genetic);
        config.genetic.population_size = 0;
        let err = optimize(&config, &RunControl::new()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn test_control_time_limit_overrides_config() {
        let mut config = config(AlgorithmType::SimulatedAnnealing);
        config.annealing.max_iterations = usize::MAX;
        config.annealing.cooling_rate = 0.999_999_9;
        config.annealing.min_temperature = 1e-12;
        config.time_limit_ms = Some(60_000);
        let control = RunControl::new().with_time_limit(Duration::from_millis(10));
        let result = optimize(&config, &control).unwrap();
        assert_eq!(result.stop_reason, StopReason::Timeout);
        assert!(!result.converged);
        assert!(result.best.is_valid());
    }
}

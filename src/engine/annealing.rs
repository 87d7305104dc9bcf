// ==========================================
// 考勤排班优化系统 - 模拟退火优化器
// ==========================================
// 单解局部搜索:
//   起点 = 贪心初始解; 邻域 = 随机改动一个基因
//   Metropolis 准则: 变好必收, 变差以 exp(-Δ/T) 概率接受
//   几何降温 T *= cooling_rate, 低于 min_temperature 或预算用尽即停
// 返回全程最优解（当前解可能因接受劣解而变差）
// ==========================================

use crate::config::AnnealingParams;
use crate::domain::types::AlgorithmType;
use crate::engine::control::RunClock;
use crate::engine::fitness::FitnessEvaluator;
use crate::engine::result::{SearchOutcome, StopReason};
use crate::engine::seed::greedy_seed;
use crate::engine::strategy::Optimizer;
use rand::rngs::StdRng;
use rand::Rng;

pub struct SimulatedAnnealingOptimizer {
    evaluator: FitnessEvaluator,
    params: AnnealingParams,
}

impl SimulatedAnnealingOptimizer {
    pub fn new(evaluator: FitnessEvaluator, params: AnnealingParams) -> Self {
        Self { evaluator, params }
    }

    /// Metropolis 接受判定; delta 为分数下降量
    fn accept(delta: f64, temperature: f64, rng: &mut StdRng) -> bool {
        if delta <= 0.0 {
            return true;
        }
        if temperature <= 0.0 {
            return false;
        }
        rng.gen::<f64>() < (-delta / temperature).exp()
    }
}

impl Optimizer for SimulatedAnnealingOptimizer {
    fn algorithm(&self) -> AlgorithmType {
        AlgorithmType::SimulatedAnnealing
    }

    fn search(&self, rng: &mut StdRng, clock: &RunClock) -> SearchOutcome {
        let p = &self.params;
        let ctx = self.evaluator.context();
        let layout = ctx.layout.clone();
        let day_count = layout.day_count();
        let shift_count = layout.shift_count();

        let mut current = greedy_seed(ctx, 0);
        let mut current_fit = self.evaluator.evaluate(&current);
        let mut best = current.clone();
        let mut best_fit = current_fit.clone();

        let mut temperature = p.initial_temperature;
        let mut iterations = 0usize;
        let mut history = Vec::new();
        let mut stop_reason = StopReason::BudgetExhausted;

        while iterations < p.max_iterations {
            if let Some(reason) = clock.check() {
                stop_reason = reason;
                break;
            }
            if temperature < p.min_temperature {
                stop_reason = StopReason::TemperatureFloor;
                break;
            }

            let idx = rng.gen_range(0..current.len());
            let (e, d) = (idx / day_count, idx % day_count);
            let neighbor = current.with_gene(e, d, current.at(e, d).random_other(shift_count, rng));
            let neighbor_fit = self.evaluator.evaluate(&neighbor);

            let delta = current_fit.weighted_score - neighbor_fit.weighted_score;
            if Self::accept(delta, temperature, rng) {
                current = neighbor;
                current_fit = neighbor_fit;
                if current_fit.weighted_score > best_fit.weighted_score {
                    best = current.clone();
                    best_fit = current_fit.clone();
                }
            }

            temperature *= p.cooling_rate;
            iterations += 1;
            history.push(best_fit.weighted_score);
            clock.notify(iterations, best_fit.weighted_score, current_fit.weighted_score);

            if iterations % 1000 == 0 {
                tracing::debug!(
                    iteration = iterations,
                    temperature,
                    best_score = best_fit.weighted_score,
                    current_score = current_fit.weighted_score,
                    "模拟退火迭代"
                );
            }
        }

        SearchOutcome {
            best,
            fitness: best_fit,
            iterations,
            stop_reason,
            history,
        }
    }
}

// ==========================================
// 考勤排班优化系统 - 遗传算法优化器
// ==========================================
// 每代流程:
//   评估(并行) → 降序排序 → 精英保留 → 锦标赛选择 + 交叉 → 变异 → 下一代
// 红线:
// - 精英不经变异直接进入下一代, 保证种群最优分单调不降
// - 全程记录历史最优个体, 不只是当代最优
// - 取消/超时只在代与代之间检查
// ==========================================

use crate::config::GeneticParams;
use crate::domain::types::AlgorithmType;
use crate::engine::chromosome::Chromosome;
use crate::engine::control::RunClock;
use crate::engine::fitness::{FitnessBreakdown, FitnessEvaluator};
use crate::engine::operators::{day_block_crossover, mutate, tournament_select};
use crate::engine::result::{SearchOutcome, StopReason};
use crate::engine::seed::greedy_seed;
use crate::engine::strategy::Optimizer;
use rand::rngs::StdRng;
use rand::Rng;
use rayon::prelude::*;

/// 已评估个体
#[derive(Debug, Clone)]
struct Scored {
    chromosome: Chromosome,
    fitness: FitnessBreakdown,
}

impl Scored {
    fn score(&self) -> f64 {
        self.fitness.weighted_score
    }
}

// ==========================================
// GeneticOptimizer
// ==========================================
pub struct GeneticOptimizer {
    evaluator: FitnessEvaluator,
    params: GeneticParams,
    parallel: bool,
}

impl GeneticOptimizer {
    pub fn new(evaluator: FitnessEvaluator, params: GeneticParams, parallel: bool) -> Self {
        Self {
            evaluator,
            params,
            parallel,
        }
    }

    /// 精英个数: 比例 > 0 时至少保留1个
    pub fn elite_count(&self) -> usize {
        let pop = self.params.population_size;
        if self.params.elitism_rate <= 0.0 {
            return 0;
        }
        ((self.params.elitism_rate * pop as f64).round() as usize)
            .max(1)
            .min(pop)
    }

    fn evaluate_all(&self, chromosomes: Vec<Chromosome>) -> Vec<Scored> {
        let evaluator = &self.evaluator;
        let score = |chromosome: Chromosome| {
            let fitness = evaluator.evaluate(&chromosome);
            Scored {
                chromosome,
                fitness,
            }
        };
        if self.parallel {
            chromosomes.into_par_iter().map(score).collect()
        } else {
            chromosomes.into_iter().map(score).collect()
        }
    }

    /// 初始种群: 约1/4为贪心解(不同轮转, 轻度扰动), 其余随机
    fn initial_population(&self, rng: &mut StdRng) -> Vec<Chromosome> {
        let ctx = self.evaluator.context();
        let pop = self.params.population_size;
        let seeded = (pop / 4).max(1).min(pop);
        (0..pop)
            .map(|i| {
                if i == 0 {
                    greedy_seed(ctx, 0)
                } else if i < seeded {
                    mutate(&greedy_seed(ctx, i), self.params.mutation_rate, rng)
                } else {
                    Chromosome::random(ctx.layout.clone(), rng)
                }
            })
            .collect()
    }

    /// 由有序种群繁殖下一代（精英之外的部分）
    fn offspring(&self, population: &[Scored], count: usize, rng: &mut StdRng) -> Vec<Chromosome> {
        let p = &self.params;
        let crossover_slots = ((p.selection_rate * count as f64).round() as usize).min(count);
        let mut children = Vec::with_capacity(count);

        while children.len() < crossover_slots {
            let a = &population[tournament_select(population.len(), p.tournament_size, rng)];
            let b = &population[tournament_select(population.len(), p.tournament_size, rng)];
            let (ca, cb) = if rng.gen_bool(p.crossover_rate) {
                day_block_crossover(&a.chromosome, &b.chromosome, rng)
            } else {
                (a.chromosome.clone(), b.chromosome.clone())
            };
            children.push(mutate(&ca, p.mutation_rate, rng));
            if children.len() < crossover_slots {
                children.push(mutate(&cb, p.mutation_rate, rng));
            }
        }

        while children.len() < count {
            let parent = &population[tournament_select(population.len(), p.tournament_size, rng)];
            children.push(mutate(&parent.chromosome, p.mutation_rate, rng));
        }
        children
    }

    fn sort_descending(population: &mut [Scored]) {
        population.sort_by(|a, b| b.score().total_cmp(&a.score()));
    }
}

impl Optimizer for GeneticOptimizer {
    fn algorithm(&self) -> AlgorithmType {
        AlgorithmType::Genetic
    }

    fn search(&self, rng: &mut StdRng, clock: &RunClock) -> SearchOutcome {
        let p = &self.params;
        let elites = self.elite_count();

        let mut population = self.evaluate_all(self.initial_population(rng));
        Self::sort_descending(&mut population);

        let mut best = population[0].clone();
        let mut history = vec![best.score()];
        let mut stagnant = 0usize;
        let mut generation = 0usize;
        let mut stop_reason = StopReason::BudgetExhausted;
        clock.notify(0, best.score(), best.score());

        for g in 1..=p.max_iterations {
            if let Some(reason) = clock.check() {
                stop_reason = reason;
                break;
            }

            let children = self.offspring(&population, p.population_size - elites, rng);
            let mut next: Vec<Scored> = population[..elites].to_vec();
            next.extend(self.evaluate_all(children));
            Self::sort_descending(&mut next);
            population = next;
            generation = g;

            let generation_best = population[0].score();
            if generation_best > best.score() + p.convergence_epsilon {
                stagnant = 0;
            } else {
                stagnant += 1;
            }
            if generation_best > best.score() {
                best = population[0].clone();
            }
            history.push(best.score());
            clock.notify(g, best.score(), generation_best);

            if g % 10 == 0 {
                tracing::debug!(
                    generation = g,
                    best_score = best.score(),
                    generation_best,
                    hard_violations = best.fitness.hard_violations,
                    "遗传算法迭代"
                );
            }

            if p.stagnation_generations > 0 && stagnant >= p.stagnation_generations {
                stop_reason = StopReason::Converged;
                break;
            }
        }

        SearchOutcome {
            best: best.chromosome,
            fitness: best.fitness,
            iterations: generation,
            stop_reason,
            history,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OptimizationConfig;
    use crate::domain::roster::{DateRange, Employee, Shift};
    use crate::engine::context::ScheduleContext;
    use crate::engine::control::{CancellationFlag, RunControl, SearchProgress};
    use chrono::{NaiveDate, NaiveTime};
    use rand::SeedableRng;
    use std::sync::Arc;

    fn config() -> OptimizationConfig {
        let shifts = vec![
            Shift::new(
                "AM",
                NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
            ),
            Shift::new(
                "PM",
                NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(23, 59, 0).unwrap(),
            ),
        ];
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
            NaiveDate::from_ymd_opt(2026, 11, 8).unwrap(),
        );
        let mut config = OptimizationConfig::new(
            (1..=5).map(|i| Employee::new(format!("E{}", i))).collect(),
            shifts,
            range,
        );
        config.constraints.min_daily_staff = 2;
        config.constraints.max_daily_staff = 3;
        config.constraints.max_consecutive_work_days = 5;
        config.genetic.population_size = 20;
        config.genetic.max_iterations = 40;
        config.genetic.stagnation_generations = 0;
        config
    }

    fn optimizer(config: &OptimizationConfig, parallel: bool) -> GeneticOptimizer {
        let ctx = Arc::new(ScheduleContext::new(config).unwrap());
        GeneticOptimizer::new(FitnessEvaluator::new(ctx), config.genetic.clone(), parallel)
    }

    #[test]
    fn test_population_best_is_monotonic_with_elitism() {
        let config = config();
        let ga = optimizer(&config, true);
        let mut rng = StdRng::seed_from_u64(2026);
        let outcome = ga.search(&mut rng, &RunControl::new().start(None));

        assert_eq!(outcome.iterations, 40);
        assert_eq!(outcome.history.len(), 41);
        for w in outcome.history.windows(2) {
            assert!(w[1] >= w[0], "最优分下降: {:?}", w);
        }
        assert!(outcome.best.is_valid());
        assert_eq!(outcome.stop_reason, StopReason::BudgetExhausted);
    }

    #[test]
    fn test_history_tracks_best_ever_without_elites() {
        let mut config = config();
        config.genetic.elitism_rate = 0.0;
        config.genetic.mutation_rate = 0.5;
        let ga = optimizer(&config, false);
        let mut rng = StdRng::seed_from_u64(11);
        let outcome = ga.search(&mut rng, &RunControl::new().start(None));

        assert_eq!(outcome.history.len(), 41);
        for w in outcome.history.windows(2) {
            assert!(w[1] >= w[0], "最优分下降: {:?}", w);
        }
        assert_eq!(outcome.fitness.weighted_score, *outcome.history.last().unwrap());
    }

    #[test]
    fn test_same_seed_same_result() {
        let config = config();
        let run = |parallel| {
            let ga = optimizer(&config, parallel);
            let mut rng = StdRng::seed_from_u64(77);
            ga.search(&mut rng, &RunControl::new().start(None))
        };
        let a = run(true);
        let b = run(false);
        assert_eq!(a.best, b.best);
        assert_eq!(a.history, b.history);
    }

    #[test]
    fn test_elite_count() {
        let mut config = config();
        config.genetic.elitism_rate = 0.01;
        assert_eq!(optimizer(&config, false).elite_count(), 1);
        config.genetic.elitism_rate = 0.0;
        assert_eq!(optimizer(&config, false).elite_count(), 0);
        config.genetic.elitism_rate = 0.25;
        assert_eq!(optimizer(&config, false).elite_count(), 5);
    }

    #[test]
    fn test_stagnation_marks_converged() {
        let mut config = config();
        config.genetic.max_iterations = 500;
        config.genetic.stagnation_generations = 5;
        config.genetic.convergence_epsilon = 1e9;
        let ga = optimizer(&config, false);
        let mut rng = StdRng::seed_from_u64(1);
        let outcome = ga.search(&mut rng, &RunControl::new().start(None));
        assert_eq!(outcome.stop_reason, StopReason::Converged);
        assert_eq!(outcome.iterations, 5);
    }

    #[test]
    fn test_cancel_after_generation_three() {
        let mut config = config();
        config.genetic.max_iterations = 50;
        let ga = optimizer(&config, false);
        let flag = CancellationFlag::new();
        let trigger = flag.clone();
        let control = RunControl::new()
            .with_cancellation(flag)
            .with_observer(Arc::new(move |p: &SearchProgress| {
                if p.iteration == 3 {
                    trigger.cancel();
                }
            }));
        let mut rng = StdRng::seed_from_u64(3);
        let outcome = ga.search(&mut rng, &control.start(None));
        assert_eq!(outcome.stop_reason, StopReason::Cancelled);
        assert_eq!(outcome.iterations, 3);
        assert!(outcome.best.is_valid());
    }
}

// ==========================================
// 考勤排班优化系统 - 遗传算子
// ==========================================
// 选择: 锦标赛（种群已按分数降序排列, 取 k 次抽样的最小下标）
// 交叉: 按日期区块的两点交叉; 天数不足2天时退化为均匀交叉
// 变异: 每个基因以给定概率改为另一个取值（其他班次或休息）
// 所有算子都返回新染色体, 不修改父代
// ==========================================

use crate::engine::chromosome::Chromosome;
use rand::Rng;

/// 锦标赛选择, 返回胜出者在有序种群中的下标
pub fn tournament_select<R: Rng>(population_len: usize, tournament_size: usize, rng: &mut R) -> usize {
    debug_assert!(population_len > 0);
    (0..tournament_size.max(1))
        .map(|_| rng.gen_range(0..population_len))
        .min()
        .unwrap_or(0)
}

/// 日期区块两点交叉: 交换 [cut1, cut2) 天内所有员工的基因
pub fn day_block_crossover<R: Rng>(
    a: &Chromosome,
    b: &Chromosome,
    rng: &mut R,
) -> (Chromosome, Chromosome) {
    let layout = a.layout();
    let days = layout.day_count();
    if days < 2 {
        return uniform_crossover(a, b, rng);
    }

    let cut1 = rng.gen_range(0..days);
    let cut2 = rng.gen_range(cut1 + 1..=days);

    let mut child_a = a.genes().to_vec();
    let mut child_b = b.genes().to_vec();
    for e in 0..layout.employee_count() {
        let start = layout.index(e, cut1);
        let end = layout.index(e, 0) + cut2;
        child_a[start..end].copy_from_slice(&b.genes()[start..end]);
        child_b[start..end].copy_from_slice(&a.genes()[start..end]);
    }

    (
        Chromosome::from_genes_unchecked(layout.clone(), child_a),
        Chromosome::from_genes_unchecked(layout.clone(), child_b),
    )
}

/// 均匀交叉: 每个基因以 0.5 概率交换
pub fn uniform_crossover<R: Rng>(
    a: &Chromosome,
    b: &Chromosome,
    rng: &mut R,
) -> (Chromosome, Chromosome) {
    let mut child_a = a.genes().to_vec();
    let mut child_b = b.genes().to_vec();
    for i in 0..child_a.len() {
        if rng.gen_bool(0.5) {
            std::mem::swap(&mut child_a[i], &mut child_b[i]);
        }
    }
    let layout = a.layout();
    (
        Chromosome::from_genes_unchecked(layout.clone(), child_a),
        Chromosome::from_genes_unchecked(layout.clone(), child_b),
    )
}

/// 逐基因变异
pub fn mutate<R: Rng>(chromosome: &Chromosome, mutation_rate: f64, rng: &mut R) -> Chromosome {
    let shift_count = chromosome.layout().shift_count();
    let genes = chromosome
        .genes()
        .iter()
        .map(|a| {
            if mutation_rate > 0.0 && rng.gen_bool(mutation_rate.min(1.0)) {
                a.random_other(shift_count, rng)
            } else {
                *a
            }
        })
        .collect();
    Chromosome::from_genes_unchecked(chromosome.layout().clone(), genes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::chromosome::{Assignment, ScheduleLayout};
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn layout(employees: usize, days: usize) -> Arc<ScheduleLayout> {
        let start = NaiveDate::from_ymd_opt(2026, 11, 2).unwrap();
        Arc::new(ScheduleLayout::new(
            (0..employees).map(|i| format!("E{}", i)).collect(),
            start.iter_days().take(days).collect(),
            vec!["AM".to_string(), "PM".to_string()],
        ))
    }

    #[test]
    fn test_crossover_swaps_whole_day_blocks() {
        let layout = layout(3, 7);
        let a = Chromosome::filled(layout.clone(), Assignment::Rest);
        let b = Chromosome::filled(layout.clone(), Assignment::Shift(1));
        let mut rng = StdRng::seed_from_u64(5);

        for _ in 0..50 {
            let (ca, cb) = day_block_crossover(&a, &b, &mut rng);
            assert!(ca.is_valid() && cb.is_valid());
            // 同一天所有员工来自同一父代
            for d in 0..7 {
                let first = ca.at(0, d);
                assert!((0..3).all(|e| ca.at(e, d) == first));
                assert_ne!(ca.at(0, d), cb.at(0, d));
            }
            // 至少交换了一天
            assert!(ca.genes().iter().any(|g| g.is_work()));
        }
        // 父代不变
        assert!(a.genes().iter().all(|g| g.is_rest()));
    }

    #[test]
    fn test_single_day_falls_back_to_uniform() {
        let layout = layout(4, 1);
        let a = Chromosome::filled(layout.clone(), Assignment::Rest);
        let b = Chromosome::filled(layout, Assignment::Shift(0));
        let mut rng = StdRng::seed_from_u64(9);
        let (ca, cb) = day_block_crossover(&a, &b, &mut rng);
        for i in 0..4 {
            assert_ne!(ca.genes()[i], cb.genes()[i]);
        }
    }

    #[test]
    fn test_mutation_rate_bounds() {
        let layout = layout(5, 7);
        let c = Chromosome::filled(layout, Assignment::Rest);
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(mutate(&c, 0.0, &mut rng), c);
        let all = mutate(&c, 1.0, &mut rng);
        assert!(all.is_valid());
        assert!(all.genes().iter().all(|g| g.is_work()));
    }

    #[test]
    fn test_tournament_prefers_low_index() {
        let mut rng = StdRng::seed_from_u64(1);
        let picks: Vec<usize> = (0..1000).map(|_| tournament_select(10, 3, &mut rng)).collect();
        let mean = picks.iter().sum::<usize>() as f64 / picks.len() as f64;
        assert!(mean < 4.5);
        assert!(picks.iter().all(|p| *p < 10));
        assert_eq!(tournament_select(1, 3, &mut rng), 0);
    }
}

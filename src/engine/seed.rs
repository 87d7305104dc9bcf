// ==========================================
// 考勤排班优化系统 - 贪心初始解
// ==========================================
// 逐日构造:
//   1) 计算当日目标在岗人数 W（扣除平均休息需求后夹在人数区间内）
//   2) 按优先级选出休息人员:
//      必须休息(连续上班已达上限) > 窗口内休息最少 > 连续上班最长 > 轮转序
//   3) 其余人员按轮转顺序均分到各班次
// 只用于给搜索一个较好的起点, 不保证满足全部约束
// ==========================================

use crate::engine::chromosome::{Assignment, Chromosome};
use crate::engine::context::ScheduleContext;
use std::cmp::Reverse;

/// 当日目标在岗人数
fn target_workers(ctx: &ScheduleContext) -> usize {
    let layout = &ctx.layout;
    let employees = layout.employee_count();
    let shifts = layout.shift_count();
    let window = ctx.rest_window_len().max(1);
    let rest_per_day = (employees * ctx.required_rest_per_window()).div_ceil(window);
    let lower = (ctx.constraints.min_daily_staff * shifts).min(employees);
    let upper = (ctx.constraints.max_daily_staff.saturating_mul(shifts)).min(employees);
    employees.saturating_sub(rest_per_day).max(lower).min(upper)
}

/// 构造贪心初始解; rotation 用于生成不同的等价解
pub fn greedy_seed(ctx: &ScheduleContext, rotation: usize) -> Chromosome {
    let layout = ctx.layout.clone();
    let employees = layout.employee_count();
    let days = layout.day_count();
    let shifts = layout.shift_count();
    let max_run = ctx.constraints.max_consecutive_work_days;
    let window = ctx.rest_window_len().max(1);

    let workers_per_day = target_workers(ctx);
    let mut genes = vec![Assignment::Rest; layout.gene_count()];
    if employees == 0 || shifts == 0 {
        return Chromosome::from_genes_unchecked(layout, genes);
    }

    let mut streak = vec![0usize; employees];
    let mut order: Vec<usize> = (0..employees).collect();

    for d in 0..days {
        let trailing = d.saturating_sub(window - 1)..d;
        let rests_in_window = |e: usize| {
            trailing
                .clone()
                .filter(|day| genes[layout.index(e, *day)].is_rest())
                .count()
        };
        let pivot = (d + rotation) % employees;

        order.sort_by_key(|&e| {
            (
                streak[e] < max_run,
                rests_in_window(e),
                Reverse(streak[e]),
                (e + employees - pivot) % employees,
            )
        });

        let must_rest = order.iter().filter(|&&e| streak[e] >= max_run).count();
        let rest_count = (employees - workers_per_day).max(must_rest);

        let mut workers: Vec<usize> = order[rest_count..].to_vec();
        workers.sort_unstable();
        for (i, &e) in workers.iter().enumerate() {
            let shift = (i + d) % shifts;
            genes[layout.index(e, d)] = Assignment::Shift(shift as u16);
        }
        for e in 0..employees {
            streak[e] = if genes[layout.index(e, d)].is_work() {
                streak[e] + 1
            } else {
                0
            };
        }
    }

    Chromosome::from_genes_unchecked(layout, genes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OptimizationConfig;
    use crate::domain::roster::{DateRange, Employee, Shift};
    use crate::engine::conflict::ConflictDetector;
    use chrono::{NaiveDate, NaiveTime};
    use std::sync::Arc;

    fn config(employees: usize, days: u64) -> OptimizationConfig {
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
        let start = NaiveDate::from_ymd_opt(2026, 11, 2).unwrap();
        let range = DateRange::new(start, start + chrono::Days::new(days - 1));
        let mut config = OptimizationConfig::new(
            (1..=employees).map(|i| Employee::new(format!("E{}", i))).collect(),
            shifts,
            range,
        );
        config.constraints.min_daily_staff = 2;
        config.constraints.max_daily_staff = 3;
        config.constraints.max_consecutive_work_days = 5;
        config.constraints.min_rest_days = 1;
        config
    }

    #[test]
    fn test_seed_is_feasible_for_small_roster() {
        let ctx = Arc::new(ScheduleContext::new(&config(5, 7)).unwrap());
        let seed = greedy_seed(&ctx, 0);
        assert!(seed.is_valid());
        assert_eq!(seed.len(), 35);
        let conflicts = ConflictDetector::new(ctx).detect(&seed);
        assert!(conflicts.is_empty(), "{:?}", conflicts);
    }

    #[test]
    fn test_seed_respects_streak_limit_over_long_range() {
        let ctx = Arc::new(ScheduleContext::new(&config(6, 28)).unwrap());
        let seed = greedy_seed(&ctx, 3);
        let detector = ConflictDetector::new(ctx);
        let overruns = detector
            .detect(&seed)
            .into_iter()
            .filter(|c| c.conflict_type == crate::domain::types::ConflictType::ConsecutiveOverrun)
            .count();
        assert_eq!(overruns, 0);
    }

    #[test]
    fn test_rotation_changes_seed() {
        let ctx = ScheduleContext::new(&config(5, 7)).unwrap();
        assert_ne!(greedy_seed(&ctx, 0), greedy_seed(&ctx, 1));
    }
}

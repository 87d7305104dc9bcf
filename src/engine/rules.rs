// ==========================================
// 考勤排班优化系统 - 硬约束规则扫描
// ==========================================
// 适应度惩罚项与冲突检测共用同一套扫描, 保证两者口径一致
// 规则:
//   (a) 连续上班天数 > max_consecutive_work_days, 每段报告一次
//   (b) 滚动窗口内休息天数 < 要求值, 每个窗口报告一次
//   (c) 每天每班次人数 < min_daily_staff 或 > max_daily_staff
// ==========================================

use crate::engine::chromosome::Chromosome;
use crate::engine::context::ScheduleContext;

/// 单次规则命中（下标形式）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleHit {
    ConsecutiveOverrun {
        employee: usize,
        start_day: usize,
        end_day: usize,
        length: usize,
        limit: usize,
    },
    InsufficientRest {
        employee: usize,
        window_start: usize,
        window_end: usize,
        rest_days: usize,
        required: usize,
    },
    Understaffed {
        day: usize,
        shift: usize,
        assigned: usize,
        required: usize,
    },
    Overstaffed {
        day: usize,
        shift: usize,
        assigned: usize,
        limit: usize,
    },
}

impl RuleHit {
    /// 违反程度（>= 1）, 用于惩罚项
    pub fn magnitude(&self) -> usize {
        match *self {
            RuleHit::ConsecutiveOverrun { length, limit, .. } => length - limit,
            RuleHit::InsufficientRest {
                rest_days, required, ..
            } => required - rest_days,
            RuleHit::Understaffed {
                assigned, required, ..
            } => required - assigned,
            RuleHit::Overstaffed { assigned, limit, .. } => assigned - limit,
        }
    }
}

/// 扫描所有硬约束, 每个命中回调一次
pub fn scan_hard_rules<F>(chromosome: &Chromosome, ctx: &ScheduleContext, mut sink: F)
where
    F: FnMut(RuleHit),
{
    let layout = chromosome.layout();
    let day_count = layout.day_count();
    let max_run = ctx.constraints.max_consecutive_work_days;
    let window = ctx.rest_window_len();
    let required_rest = ctx.required_rest_per_window();

    for e in 0..layout.employee_count() {
        let row = chromosome.employee_row(e);

        // (a) 连续上班
        let mut run_start = 0usize;
        let mut run_len = 0usize;
        for (d, a) in row.iter().enumerate() {
            if a.is_work() {
                if run_len == 0 {
                    run_start = d;
                }
                run_len += 1;
            }
            let run_ends = a.is_rest() || d + 1 == day_count;
            if run_ends && run_len > 0 {
                if run_len > max_run {
                    let end_day = if a.is_rest() { d - 1 } else { d };
                    sink(RuleHit::ConsecutiveOverrun {
                        employee: e,
                        start_day: run_start,
                        end_day,
                        length: run_len,
                        limit: max_run,
                    });
                }
                if a.is_rest() {
                    run_len = 0;
                }
            }
        }

        // (b) 滚动窗口休息
        if required_rest > 0 && window > 0 {
            let mut rests = row[..window].iter().filter(|a| a.is_rest()).count();
            for start in 0..=(day_count - window) {
                if start > 0 {
                    if row[start - 1].is_rest() {
                        rests -= 1;
                    }
                    if row[start + window - 1].is_rest() {
                        rests += 1;
                    }
                }
                if rests < required_rest {
                    sink(RuleHit::InsufficientRest {
                        employee: e,
                        window_start: start,
                        window_end: start + window - 1,
                        rest_days: rests,
                        required: required_rest,
                    });
                }
            }
        }
    }

    // (c) 每天每班次人数
    let shift_count = layout.shift_count();
    let min_staff = ctx.constraints.min_daily_staff;
    let max_staff = ctx.constraints.max_daily_staff;
    let counts = chromosome.staffing_counts();
    for d in 0..day_count {
        for s in 0..shift_count {
            let assigned = counts[d * shift_count + s];
            if assigned < min_staff {
                sink(RuleHit::Understaffed {
                    day: d,
                    shift: s,
                    assigned,
                    required: min_staff,
                });
            } else if assigned > max_staff {
                sink(RuleHit::Overstaffed {
                    day: d,
                    shift: s,
                    assigned,
                    limit: max_staff,
                });
            }
        }
    }
}

/// 硬约束汇总: (命中次数, 违反程度合计)
pub fn hard_violation_totals(chromosome: &Chromosome, ctx: &ScheduleContext) -> (usize, usize) {
    let mut hits = 0usize;
    let mut magnitude = 0usize;
    scan_hard_rules(chromosome, ctx, |hit| {
        hits += 1;
        magnitude += hit.magnitude();
    });
    (hits, magnitude)
}

/// 软约束: 两侧均为休息、长度短于 min_consecutive_work_days 的上班段数
///
/// 触及区间边界的段不计（区间外的排班未知）。
pub fn short_run_count(chromosome: &Chromosome, ctx: &ScheduleContext) -> usize {
    let min_run = ctx.constraints.min_consecutive_work_days;
    if min_run <= 1 {
        return 0;
    }
    let layout = chromosome.layout();
    let mut count = 0usize;
    for e in 0..layout.employee_count() {
        let row = chromosome.employee_row(e);
        let mut run_len = 0usize;
        let mut bounded_left = false;
        for a in row {
            if a.is_work() {
                run_len += 1;
            } else {
                if run_len > 0 && bounded_left && run_len < min_run {
                    count += 1;
                }
                run_len = 0;
                bounded_left = true;
            }
        }
    }
    count
}

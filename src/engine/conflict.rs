// ==========================================
// 考勤排班优化系统 - 冲突检测器
// ==========================================
// 职责: 对最终排班做硬约束审计, 输出可独立处理的冲突列表
// 红线: 纯函数, 不可满足的约束以冲突形式返回, 不报错
// ==========================================

use crate::config::OptimizationConfig;
use crate::domain::types::{ConflictSeverity, ConflictType};
use crate::engine::chromosome::Chromosome;
use crate::engine::context::ScheduleContext;
use crate::engine::error::EngineResult;
use crate::engine::rules::{scan_hard_rules, RuleHit};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 排班冲突
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConflict {
    pub conflict_type: ConflictType,
    pub severity: ConflictSeverity,
    pub employee_id: Option<String>,
    pub date: NaiveDate,
    pub shift_id: Option<String>,
    pub description: String,
}

// ==========================================
// ConflictDetector
// ==========================================
pub struct ConflictDetector {
    context: Arc<ScheduleContext>,
}

impl ConflictDetector {
    pub fn new(context: Arc<ScheduleContext>) -> Self {
        Self { context }
    }

    /// 枚举全部硬约束冲突
    ///
    /// 顺序: 先按员工（连续上班、休息不足）, 再按日期/班次（人数）
    pub fn detect(&self, chromosome: &Chromosome) -> Vec<ScheduleConflict> {
        let layout = chromosome.layout();
        let mut conflicts = Vec::new();

        scan_hard_rules(chromosome, &self.context, |hit| {
            let conflict = match hit {
                RuleHit::ConsecutiveOverrun {
                    employee,
                    start_day,
                    end_day,
                    length,
                    limit,
                } => ScheduleConflict {
                    conflict_type: ConflictType::ConsecutiveOverrun,
                    severity: ConflictSeverity::High,
                    employee_id: Some(layout.employee_id(employee).to_string()),
                    date: layout.day(end_day),
                    shift_id: None,
                    description: format!(
                        "员工{}自{}起连续上班{}天（上限{}天）",
                        layout.employee_id(employee),
                        layout.day(start_day),
                        length,
                        limit
                    ),
                },
                RuleHit::InsufficientRest {
                    employee,
                    window_start,
                    window_end,
                    rest_days,
                    required,
                } => ScheduleConflict {
                    conflict_type: ConflictType::InsufficientRest,
                    severity: ConflictSeverity::Medium,
                    employee_id: Some(layout.employee_id(employee).to_string()),
                    date: layout.day(window_end),
                    shift_id: None,
                    description: format!(
                        "员工{}在{}~{}仅休息{}天（要求至少{}天）",
                        layout.employee_id(employee),
                        layout.day(window_start),
                        layout.day(window_end),
                        rest_days,
                        required
                    ),
                },
                RuleHit::Understaffed {
                    day,
                    shift,
                    assigned,
                    required,
                } => ScheduleConflict {
                    conflict_type: ConflictType::Understaffed,
                    severity: ConflictSeverity::High,
                    employee_id: None,
                    date: layout.day(day),
                    shift_id: Some(layout.shift_id(shift).to_string()),
                    description: format!(
                        "{}班次{}在岗{}人, 低于最少{}人",
                        layout.day(day),
                        layout.shift_id(shift),
                        assigned,
                        required
                    ),
                },
                RuleHit::Overstaffed {
                    day,
                    shift,
                    assigned,
                    limit,
                } => ScheduleConflict {
                    conflict_type: ConflictType::Overstaffed,
                    severity: ConflictSeverity::Low,
                    employee_id: None,
                    date: layout.day(day),
                    shift_id: Some(layout.shift_id(shift).to_string()),
                    description: format!(
                        "{}班次{}在岗{}人, 超过最多{}人",
                        layout.day(day),
                        layout.shift_id(shift),
                        assigned,
                        limit
                    ),
                },
            };
            conflicts.push(conflict);
        });

        conflicts
    }

    /// 只计数, 不构造描述
    pub fn count_violations(&self, chromosome: &Chromosome) -> usize {
        let mut count = 0usize;
        scan_hard_rules(chromosome, &self.context, |_| count += 1);
        count
    }
}

/// 便捷入口: 由配置直接审计一个染色体
pub fn detect_conflicts(
    chromosome: &Chromosome,
    config: &OptimizationConfig,
) -> EngineResult<Vec<ScheduleConflict>> {
    let context = Arc::new(ScheduleContext::new(config)?);
    chromosome.validate()?;
    Ok(ConflictDetector::new(context).detect(chromosome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::roster::{DateRange, Employee, Shift};
    use crate::engine::chromosome::Assignment;
    use chrono::NaiveTime;

    fn config(employees: usize, days: u64) -> OptimizationConfig {
        let shift = Shift::new(
            "DAY",
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
        );
        let start = NaiveDate::from_ymd_opt(2026, 11, 2).unwrap();
        let range = DateRange::new(start, start + chrono::Days::new(days - 1));
        let mut config = OptimizationConfig::new(
            (1..=employees).map(|i| Employee::new(format!("E{}", i))).collect(),
            vec![shift],
            range,
        );
        config.constraints.max_consecutive_work_days = 6;
        config.constraints.min_rest_days = 0;
        config.constraints.min_daily_staff = 0;
        config
    }

    #[test]
    fn test_eight_day_streak_reports_overrun() {
        let config = config(2, 10);
        let ctx = Arc::new(ScheduleContext::new(&config).unwrap());
        // E1 第1~8天上班, 其余休息
        let mut c = Chromosome::filled(ctx.layout.clone(), Assignment::Rest);
        for d in 1..=8 {
            c = c.with_gene(0, d, Assignment::Shift(0));
        }

        let conflicts = ConflictDetector::new(ctx).detect(&c);
        assert_eq!(conflicts.len(), 1);
        let conflict = &conflicts[0];
        assert_eq!(conflict.conflict_type, ConflictType::ConsecutiveOverrun);
        assert_eq!(conflict.severity, ConflictSeverity::High);
        assert_eq!(conflict.employee_id.as_deref(), Some("E1"));
        // 报告在连续段最后一天
        assert_eq!(conflict.date, NaiveDate::from_ymd_opt(2026, 11, 10).unwrap());
        assert!(conflict.description.contains("连续上班8天"));
    }

    #[test]
    fn test_staffing_conflicts_carry_shift() {
        let mut config = config(3, 2);
        config.constraints.min_daily_staff = 1;
        config.constraints.max_daily_staff = 2;
        let ctx = Arc::new(ScheduleContext::new(&config).unwrap());
        let c = Chromosome::filled(ctx.layout.clone(), Assignment::Rest)
            .with_gene(0, 1, Assignment::Shift(0))
            .with_gene(1, 1, Assignment::Shift(0))
            .with_gene(2, 1, Assignment::Shift(0));

        let detector = ConflictDetector::new(ctx);
        let conflicts = detector.detect(&c);
        assert_eq!(conflicts.len(), 2);
        assert_eq!(conflicts[0].conflict_type, ConflictType::Understaffed);
        assert_eq!(conflicts[0].shift_id.as_deref(), Some("DAY"));
        assert_eq!(conflicts[0].employee_id, None);
        assert_eq!(conflicts[1].conflict_type, ConflictType::Overstaffed);
        assert_eq!(conflicts[1].severity, ConflictSeverity::Low);
        assert_eq!(detector.count_violations(&c), 2);
    }

    #[test]
    fn test_insufficient_rest_reported_per_window() {
        let mut config = config(1, 8);
        config.constraints.min_rest_days = 1;
        config.constraints.max_consecutive_work_days = 10;
        let ctx = Arc::new(ScheduleContext::new(&config).unwrap());
        // 只有第0天休息: 窗口[1,7]无休息
        let c = Chromosome::filled(ctx.layout.clone(), Assignment::Shift(0))
            .with_gene(0, 0, Assignment::Rest);

        let conflicts = ConflictDetector::new(ctx).detect(&c);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_type, ConflictType::InsufficientRest);
        assert_eq!(conflicts[0].date, NaiveDate::from_ymd_opt(2026, 11, 9).unwrap());
    }

    #[test]
    fn test_infeasible_staffing_is_data_not_error() {
        let mut config = config(1, 1);
        config.constraints.min_daily_staff = 3;
        let ctx = ScheduleContext::new(&config).unwrap();
        let c = Chromosome::filled(ctx.layout.clone(), Assignment::Shift(0));
        let conflicts = detect_conflicts(&c, &config).unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_type, ConflictType::Understaffed);
    }
}

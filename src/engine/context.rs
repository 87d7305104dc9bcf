// ==========================================
// 考勤排班优化系统 - 评估上下文
// ==========================================
// 职责: 把 OptimizationConfig 预处理为按下标访问的只读表
//       (日期倍率、班次权重、偏好), 供适应度与冲突检测热路径使用
// 红线: 构造后不可变, 一次运行内在线程间共享
// ==========================================

use crate::config::{ConstraintThresholds, ObjectiveWeights, OptimizationConfig};
use crate::domain::roster::{is_weekend, PreferenceKind};
use crate::engine::chromosome::{Assignment, ScheduleLayout};
use crate::engine::error::EngineResult;
use std::collections::HashSet;
use std::sync::Arc;

/// 解析后的员工偏好（下标形式）
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPreference {
    pub employee: usize,
    pub day: Option<usize>, // None = 区间内每天
    pub target: Assignment,
    pub kind: PreferenceKind,
}

#[derive(Debug, Clone)]
pub struct ScheduleContext {
    pub layout: Arc<ScheduleLayout>,
    pub constraints: ConstraintThresholds,
    pub weights: ObjectiveWeights,
    /// 班次难度权重（公平性负荷）
    pub shift_difficulty: Vec<f64>,
    /// 班次成本倍率（加班班次取加班倍率，否则 1.0）
    pub shift_multiplier: Vec<f64>,
    /// 日期成本倍率（周末/节假日取较大者，否则 1.0）
    pub day_multiplier: Vec<f64>,
    pub base_shift_cost: f64,
    pub max_multiplier: f64,
    pub preferences: Vec<ResolvedPreference>,
    /// 偏好表达总次数（不限日期的偏好按天数计）
    pub preference_slots: usize,
}

impl ScheduleContext {
    /// 由配置构造（先做完整校验）
    pub fn new(config: &OptimizationConfig) -> EngineResult<Self> {
        config.validate()?;
        if config.weights.hard_constraint_penalty <= config.weights.objective_sum() {
            tracing::warn!(
                hard_constraint_penalty = config.weights.hard_constraint_penalty,
                objective_sum = config.weights.objective_sum(),
                "硬约束惩罚不大于目标权重之和, 不可行解可能排在可行解之前"
            );
        }

        let layout = Arc::new(ScheduleLayout::from_config(config));
        let holidays: HashSet<_> = config.holidays.iter().copied().collect();
        let costs = &config.costs;

        let day_multiplier = layout
            .days()
            .iter()
            .map(|d| {
                let mut m = 1.0_f64;
                if is_weekend(*d) {
                    m = m.max(costs.weekend_multiplier);
                }
                if holidays.contains(d) {
                    m = m.max(costs.holiday_multiplier);
                }
                m
            })
            .collect();

        let shift_multiplier = config
            .shifts
            .iter()
            .map(|s| {
                if s.overtime {
                    costs.overtime_multiplier.max(1.0)
                } else {
                    1.0
                }
            })
            .collect();

        let mut preferences = Vec::with_capacity(config.preferences.len());
        let mut preference_slots = 0usize;
        for p in &config.preferences {
            let Some(employee) = layout.employee_index_of(&p.employee_id) else {
                continue;
            };
            let day = match p.date {
                Some(date) => match layout.day_index_of(date) {
                    Some(d) => Some(d),
                    None => {
                        tracing::debug!(
                            employee_id = %p.employee_id,
                            date = %date,
                            "偏好日期不在排班区间内，已忽略"
                        );
                        continue;
                    }
                },
                None => None,
            };
            let target = match &p.shift_id {
                Some(shift_id) => match layout.shift_index_of(shift_id) {
                    Some(s) => Assignment::Shift(s as u16),
                    None => continue,
                },
                None => Assignment::Rest,
            };
            preference_slots += if day.is_some() { 1 } else { layout.day_count() };
            preferences.push(ResolvedPreference {
                employee,
                day,
                target,
                kind: p.kind,
            });
        }

        Ok(Self {
            shift_difficulty: config.shifts.iter().map(|s| s.difficulty).collect(),
            shift_multiplier,
            day_multiplier,
            base_shift_cost: costs.base_shift_cost,
            max_multiplier: costs.max_multiplier(),
            constraints: config.constraints.clone(),
            weights: config.weights.clone(),
            preferences,
            preference_slots,
            layout,
        })
    }

    /// 单个排班的成本
    #[inline]
    pub fn assignment_cost(&self, shift: usize, day: usize) -> f64 {
        self.base_shift_cost * self.shift_multiplier[shift].max(self.day_multiplier[day])
    }

    /// 滚动休息窗口长度（区间不足7天时取整个区间）
    pub fn rest_window_len(&self) -> usize {
        self.layout.day_count().min(7)
    }

    /// 每个滚动窗口内要求的最少休息天数（不足7天的区间按比例向下取整）
    pub fn required_rest_per_window(&self) -> usize {
        self.constraints.min_rest_days * self.rest_window_len() / 7
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::roster::{DateRange, Employee, Shift, ShiftPreference};
    use chrono::{NaiveDate, NaiveTime};

    fn config() -> OptimizationConfig {
        let mut night = Shift::new(
            "NIGHT",
            NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
        );
        night.overtime = true;
        let day = Shift::new(
            "DAY",
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
        );
        // 2026-10-16 周五 ~ 2026-10-19 周一
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
            NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
        );
        let mut config =
            OptimizationConfig::new(vec![Employee::new("E1"), Employee::new("E2")], vec![day, night], range);
        config.holidays = vec![NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()];
        config
    }

    #[test]
    fn test_day_multipliers() {
        let ctx = ScheduleContext::new(&config()).unwrap();
        assert_eq!(ctx.day_multiplier, vec![1.0, 1.5, 1.5, 2.0]);
        assert_eq!(ctx.shift_multiplier, vec![1.0, 1.5]);
        // 加班班次在节假日取较大倍率, 不连乘
        assert_eq!(ctx.assignment_cost(1, 3), 2.0);
        assert_eq!(ctx.assignment_cost(1, 0), 1.5);
        assert_eq!(ctx.assignment_cost(0, 0), 1.0);
    }

    #[test]
    fn test_preferences_resolved() {
        let mut config = config();
        config.preferences = vec![
            ShiftPreference {
                employee_id: "E1".to_string(),
                date: Some(NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()),
                shift_id: None,
                kind: PreferenceKind::Prefer,
            },
            ShiftPreference {
                employee_id: "E2".to_string(),
                date: None,
                shift_id: Some("NIGHT".to_string()),
                kind: PreferenceKind::Avoid,
            },
            ShiftPreference {
                employee_id: "E2".to_string(),
                date: Some(NaiveDate::from_ymd_opt(2027, 1, 1).unwrap()),
                shift_id: None,
                kind: PreferenceKind::Prefer,
            },
        ];
        let ctx = ScheduleContext::new(&config).unwrap();
        assert_eq!(ctx.preferences.len(), 2);
        assert_eq!(ctx.preference_slots, 1 + 4);
        assert_eq!(ctx.preferences[0].day, Some(1));
        assert_eq!(ctx.preferences[1].target, Assignment::Shift(1));
    }

    #[test]
    fn test_short_range_rest_requirement() {
        let ctx = ScheduleContext::new(&config()).unwrap();
        assert_eq!(ctx.rest_window_len(), 4);
        assert_eq!(ctx.required_rest_per_window(), 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = config();
        config.employees.clear();
        assert!(ScheduleContext::new(&config).is_err());
    }
}

// ==========================================
// 考勤排班优化系统 - 排班主数据模型
// ==========================================
// 职责: 员工、班次、日期区间、排班偏好
// 红线: 主数据只读,引擎不修改、不持有所有权
// ==========================================

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

// ==========================================
// Employee - 员工
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub employee_id: String,          // 员工ID
    #[serde(default)]
    pub name: Option<String>,         // 姓名（仅用于展示）
}

impl Employee {
    pub fn new(employee_id: impl Into<String>) -> Self {
        Self {
            employee_id: employee_id.into(),
            name: None,
        }
    }
}

// ==========================================
// Shift - 班次
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shift {
    pub shift_id: String,             // 班次ID
    pub start_time: NaiveTime,        // 上班时间
    pub end_time: NaiveTime,          // 下班时间（早于上班时间表示跨天）
    #[serde(default = "default_difficulty")]
    pub difficulty: f64,              // 班次难度权重（公平性负荷计算）
    #[serde(default)]
    pub overtime: bool,               // 是否计加班成本
}

fn default_difficulty() -> f64 {
    1.0
}

impl Shift {
    pub fn new(shift_id: impl Into<String>, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            shift_id: shift_id.into(),
            start_time,
            end_time,
            difficulty: default_difficulty(),
            overtime: false,
        }
    }

    /// 班次时长（小时），跨天班次按次日下班计算
    pub fn duration_hours(&self) -> f64 {
        let secs = (self.end_time - self.start_time).num_seconds();
        let secs = if secs <= 0 { secs + 24 * 3600 } else { secs };
        secs as f64 / 3600.0
    }
}

// ==========================================
// DateRange - 排班日期区间（闭区间）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// 起止日期是否有序
    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    /// 区间天数（无效区间为 0）
    pub fn day_count(&self) -> usize {
        if !self.is_valid() {
            return 0;
        }
        (self.end - self.start).num_days() as usize + 1
    }

    /// 展开为有序日期序列
    pub fn days(&self) -> Vec<NaiveDate> {
        self.start
            .iter_days()
            .take_while(|d| *d <= self.end)
            .collect()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// 是否周末
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

// ==========================================
// ShiftPreference - 员工排班偏好
// ==========================================
// shift_id 为 None 表示"休息":
//   Prefer + None = 申请休息日
//   Avoid  + None = 希望上班
// date 为 None 表示对区间内每一天都生效
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PreferenceKind {
    Prefer,
    Avoid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftPreference {
    pub employee_id: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub shift_id: Option<String>,
    pub kind: PreferenceKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_date_range_days() {
        let range = DateRange::new(d(2026, 3, 30), d(2026, 4, 2));
        let days = range.days();
        assert_eq!(days.len(), 4);
        assert_eq!(range.day_count(), 4);
        assert_eq!(days[0], d(2026, 3, 30));
        assert_eq!(days[3], d(2026, 4, 2));
    }

    #[test]
    fn test_date_range_inverted() {
        let range = DateRange::new(d(2026, 4, 2), d(2026, 4, 1));
        assert!(!range.is_valid());
        assert_eq!(range.day_count(), 0);
        assert!(range.days().is_empty());
    }

    #[test]
    fn test_shift_duration_overnight() {
        let night = Shift::new(
            "NIGHT",
            NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
        );
        assert_eq!(night.duration_hours(), 8.0);

        let day = Shift::new(
            "DAY",
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 30, 0).unwrap(),
        );
        assert_eq!(day.duration_hours(), 9.5);
    }

    #[test]
    fn test_is_weekend() {
        assert!(is_weekend(d(2026, 10, 17))); // 周六
        assert!(!is_weekend(d(2026, 10, 16))); // 周五
    }
}

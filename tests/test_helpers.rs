// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库、标准优化配置构造
// ==========================================

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveTime};
use rusqlite::Connection;
use shift_schedule_aps::config::OptimizationConfig;
use shift_schedule_aps::db::{init_schema, open_sqlite_connection};
use shift_schedule_aps::domain::{DateRange, Employee, Shift};
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    shift_schedule_aps::logging::init_test();
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开共享连接
pub fn open_shared(db_path: &str) -> Arc<Mutex<Connection>> {
    Arc::new(Mutex::new(open_sqlite_connection(db_path).unwrap()))
}

pub fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, month, day).unwrap()
}

pub fn shift(id: &str, start_h: u32, end_h: u32) -> Shift {
    Shift::new(
        id,
        NaiveTime::from_hms_opt(start_h, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(end_h, 0, 0).unwrap(),
    )
}

/// 标准场景: 5 名员工、7 天 (2026-11-02 周一起)、早晚两个班次
///
/// 每班 2~3 人, 最多连续上班 5 天, 每 7 天至少休息 1 天
pub fn standard_config() -> OptimizationConfig {
    let employees = (1..=5).map(|i| Employee::new(format!("E{:02}", i))).collect();
    let shifts = vec![shift("AM", 8, 16), shift("PM", 16, 23)];
    let mut config = OptimizationConfig::new(
        employees,
        shifts,
        DateRange::new(date(11, 2), date(11, 8)),
    );
    config.constraints.min_daily_staff = 2;
    config.constraints.max_daily_staff = 3;
    config.constraints.max_consecutive_work_days = 5;
    config.constraints.min_rest_days = 1;
    config.genetic.population_size = 20;
    config.genetic.max_iterations = 50;
    config.random_seed = Some(20261102);
    config
}

// ==========================================
// 仓储层集成测试
// ==========================================
// 职责: 验证文件数据库上的方案/结果/流转日志/全局配置读写
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

use shift_schedule_aps::config::{config_keys, ConfigManager};
use shift_schedule_aps::domain::{AlgorithmType, PlanActionLog, PlanStatus, SchedulePlan};
use shift_schedule_aps::engine::{optimize, RunControl};
use shift_schedule_aps::repository::{
    PlanActionLogRepository, PlanResultRepository, RepositoryError, SchedulePlanRepository,
};
use test_helpers::{create_test_db, date, open_shared, standard_config};

#[test]
fn test_plan_survives_reopen() {
    let (_temp, db_path) = create_test_db().unwrap();
    let plan = SchedulePlan::new_pending(
        "持久化方案",
        date(11, 2),
        date(11, 8),
        AlgorithmType::SimulatedAnnealing,
        "admin",
    );
    SchedulePlanRepository::new(open_shared(&db_path))
        .create(&plan)
        .unwrap();

    let reopened = SchedulePlanRepository::new(open_shared(&db_path));
    let loaded = reopened.find_by_id(&plan.plan_id).unwrap().unwrap();
    assert_eq!(loaded.algorithm, AlgorithmType::SimulatedAnnealing);
    assert_eq!(loaded.end_date, date(11, 8));

    // 重复主键
    let err = reopened.create(&plan).unwrap_err();
    assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
}

#[test]
fn test_result_rows_from_real_optimization() {
    let (_temp, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);
    let config = standard_config();
    let plan = SchedulePlan::new_pending(
        "结果方案",
        config.date_range.start,
        config.date_range.end,
        config.algorithm,
        "admin",
    );
    SchedulePlanRepository::new(conn.clone()).create(&plan).unwrap();

    let result = optimize(&config, &RunControl::new()).unwrap();
    let summary = result.to_summary(&plan.plan_id).unwrap();
    let rows = result.assignment_rows(&plan.plan_id);

    let repo = PlanResultRepository::new(conn);
    assert_eq!(repo.save(&summary, &rows).unwrap(), 35);

    // 覆盖保存不会累加明细
    assert_eq!(repo.save(&summary, &rows).unwrap(), 35);
    assert_eq!(repo.count_assignments(&plan.plan_id).unwrap(), 35);

    let monday = repo.list_assignments_by_date(&plan.plan_id, date(11, 2)).unwrap();
    assert_eq!(monday.len(), 5);
    let working = monday.iter().filter(|r| !r.is_rest()).count();
    assert!((4..=6).contains(&working));
}

#[test]
fn test_result_requires_existing_plan() {
    let (_temp, db_path) = create_test_db().unwrap();
    let config = standard_config();
    let result = optimize(&config, &RunControl::new()).unwrap();
    let summary = result.to_summary("ghost").unwrap();

    let repo = PlanResultRepository::new(open_shared(&db_path));
    let err = repo
        .save(&summary, &result.assignment_rows("ghost"))
        .unwrap_err();
    assert!(matches!(err, RepositoryError::ForeignKeyViolation(_)));
}

#[test]
fn test_action_log_recent() {
    let (_temp, db_path) = create_test_db().unwrap();
    let repo = PlanActionLogRepository::new(open_shared(&db_path));
    for plan in ["p1", "p2", "p3"] {
        repo.insert(&PlanActionLog::new(plan, None, PlanStatus::Pending, "admin", None))
            .unwrap();
    }
    assert_eq!(repo.list_recent(2).unwrap().len(), 2);
    assert_eq!(repo.list_by_plan("p2").unwrap().len(), 1);
}

#[test]
fn test_global_defaults_feed_config() {
    let (_temp, db_path) = create_test_db().unwrap();
    let manager = ConfigManager::from_connection(open_shared(&db_path)).unwrap();
    manager
        .set_global_config_value(config_keys::GA_POPULATION_SIZE, "24")
        .unwrap();
    manager
        .set_global_config_value(config_keys::DEFAULT_ALGORITHM, "SIMULATED_ANNEALING")
        .unwrap();

    let base = standard_config();
    let config = manager
        .build_config(base.employees, base.shifts, base.date_range)
        .unwrap();
    assert_eq!(config.genetic.population_size, 24);
    assert_eq!(config.algorithm, AlgorithmType::SimulatedAnnealing);
    assert!(config.validate().is_ok());

    let snapshot = manager.get_config_snapshot().unwrap();
    assert!(snapshot.contains("ga.population_size"));
}

#[test]
fn test_config_json_keeps_explicit_algorithm_and_constraints() {
    let (_temp, db_path) = create_test_db().unwrap();
    let manager = ConfigManager::from_connection(open_shared(&db_path)).unwrap();
    manager
        .set_global_config_value(config_keys::DEFAULT_ALGORITHM, "GENETIC")
        .unwrap();
    manager
        .set_global_config_value(config_keys::MIN_DAILY_STAFF, "1")
        .unwrap();

    // 只保留主数据, 再显式给出算法与约束
    let mut value = serde_json::to_value(standard_config()).unwrap();
    let fields = value.as_object_mut().unwrap();
    for key in ["genetic", "weights", "costs", "constraints", "algorithm"] {
        fields.remove(key);
    }
    fields.insert("algorithm".to_string(), serde_json::json!("SIMULATED_ANNEALING"));
    fields.insert(
        "annealing".to_string(),
        serde_json::json!({"max_iterations": 300}),
    );
    fields.insert(
        "constraints".to_string(),
        serde_json::json!({"min_daily_staff": 2, "max_daily_staff": 3}),
    );

    let config = manager.resolve_config_json(&value.to_string()).unwrap();
    assert_eq!(config.algorithm, AlgorithmType::SimulatedAnnealing);
    assert_eq!(config.constraints.min_daily_staff, 2);
    assert_eq!(config.annealing.max_iterations, 300);

    let result = optimize(&config, &RunControl::new()).unwrap();
    assert_eq!(result.algorithm, AlgorithmType::SimulatedAnnealing);
    assert!(result.iterations <= 300);
}

// ==========================================
// 考勤排班优化系统 - 排班方案数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 状态更新采用比较并交换 (compare-and-set), 只有当前状态与预期一致才写入
// ==========================================

use crate::domain::plan::SchedulePlan;
use crate::domain::types::{AlgorithmType, PlanStatus};
use crate::repository::codec::{conversion_error, fmt_date, fmt_ts, get_date, get_ts};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"SELECT plan_id, plan_name, start_date, end_date, algorithm,
              status, config_snapshot_json, error_message,
              created_by, created_at, updated_at
       FROM schedule_plan"#;

// ==========================================
// SchedulePlanRepository - 排班方案仓储
// ==========================================
pub struct SchedulePlanRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SchedulePlanRepository {
    /// 创建新的SchedulePlanRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建方案
    ///
    /// # 返回
    /// - `Ok(plan_id)`: 成功，返回plan_id
    /// - `Err`: 失败（plan_id 重复时为 UniqueConstraintViolation）
    pub fn create(&self, plan: &SchedulePlan) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO schedule_plan (
                plan_id, plan_name, start_date, end_date, algorithm,
                status, config_snapshot_json, error_message,
                created_by, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &plan.plan_id,
                &plan.plan_name,
                fmt_date(plan.start_date),
                fmt_date(plan.end_date),
                plan.algorithm.as_str(),
                plan.status.to_db_str(),
                &plan.config_snapshot_json,
                &plan.error_message,
                &plan.created_by,
                fmt_ts(plan.created_at),
                fmt_ts(plan.updated_at),
            ],
        )?;

        Ok(plan.plan_id.clone())
    }

    /// 按plan_id查询方案
    ///
    /// # 返回
    /// - `Ok(Some(SchedulePlan))`: 找到方案
    /// - `Ok(None)`: 未找到方案
    pub fn find_by_id(&self, plan_id: &str) -> RepositoryResult<Option<SchedulePlan>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!("{} WHERE plan_id = ?", SELECT_COLUMNS),
            params![plan_id],
            |row| self.map_row(row),
        ) {
            Ok(plan) => Ok(Some(plan)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询所有方案（按created_at降序）
    pub fn list_all(&self) -> RepositoryResult<Vec<SchedulePlan>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!("{} ORDER BY created_at DESC, plan_id", SELECT_COLUMNS))?;
        let plans = stmt
            .query_map([], |row| self.map_row(row))?
            .collect::<Result<Vec<SchedulePlan>, _>>()?;

        Ok(plans)
    }

    /// 按状态查询方案
    pub fn list_by_status(&self, status: PlanStatus) -> RepositoryResult<Vec<SchedulePlan>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "{} WHERE status = ? ORDER BY created_at DESC, plan_id",
            SELECT_COLUMNS
        ))?;
        let plans = stmt
            .query_map(params![status.to_db_str()], |row| self.map_row(row))?
            .collect::<Result<Vec<SchedulePlan>, _>>()?;

        Ok(plans)
    }

    /// 比较并交换方案状态
    ///
    /// `error_message` 为 None 时保留原有失败原因
    ///
    /// # 返回
    /// - `Ok(())`: 当前状态为 `from`，已更新为 `to`
    /// - `Err(NotFound)`: 方案不存在
    /// - `Err(StatusConflict)`: 当前状态不是 `from`
    pub fn update_status(
        &self,
        plan_id: &str,
        from: PlanStatus,
        to: PlanStatus,
        error_message: Option<&str>,
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let now = fmt_ts(chrono::Local::now().naive_local());
        let rows = tx.execute(
            r#"UPDATE schedule_plan
               SET status = ?, error_message = COALESCE(?, error_message), updated_at = ?
               WHERE plan_id = ? AND status = ?"#,
            params![to.to_db_str(), error_message, now, plan_id, from.to_db_str()],
        )?;

        if rows == 0 {
            let actual: Option<String> = tx
                .query_row(
                    "SELECT status FROM schedule_plan WHERE plan_id = ?",
                    params![plan_id],
                    |row| row.get(0),
                )
                .optional()?;
            return Err(match actual {
                None => RepositoryError::NotFound {
                    entity: "SchedulePlan".to_string(),
                    id: plan_id.to_string(),
                },
                Some(actual) => RepositoryError::StatusConflict {
                    plan_id: plan_id.to_string(),
                    expected: from.to_db_str().to_string(),
                    actual,
                },
            });
        }

        tx.commit()?;
        Ok(())
    }

    /// 写入优化配置快照
    pub fn set_config_snapshot(&self, plan_id: &str, snapshot_json: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE schedule_plan SET config_snapshot_json = ?, updated_at = ? WHERE plan_id = ?",
            params![
                snapshot_json,
                fmt_ts(chrono::Local::now().naive_local()),
                plan_id
            ],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "SchedulePlan".to_string(),
                id: plan_id.to_string(),
            });
        }
        Ok(())
    }

    /// 删除方案 (级联删除结果汇总与排班明细)
    ///
    /// RUNNING / CONFIRMED 的方案在同一条 DELETE 中排除
    ///
    /// # 返回
    /// - `Err(NotFound)`: 方案不存在
    /// - `Err(StatusConflict)`: 方案处于不可删除状态
    pub fn delete(&self, plan_id: &str) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let rows = tx.execute(
            "DELETE FROM schedule_plan WHERE plan_id = ? AND status NOT IN (?, ?)",
            params![
                plan_id,
                PlanStatus::Running.to_db_str(),
                PlanStatus::Confirmed.to_db_str()
            ],
        )?;

        if rows == 0 {
            let actual: Option<String> = tx
                .query_row(
                    "SELECT status FROM schedule_plan WHERE plan_id = ?",
                    params![plan_id],
                    |row| row.get(0),
                )
                .optional()?;
            return Err(match actual {
                None => RepositoryError::NotFound {
                    entity: "SchedulePlan".to_string(),
                    id: plan_id.to_string(),
                },
                Some(actual) => RepositoryError::StatusConflict {
                    plan_id: plan_id.to_string(),
                    expected: "PENDING|COMPLETED|FAILED|CANCELLED".to_string(),
                    actual,
                },
            });
        }

        tx.commit()?;
        Ok(())
    }

    /// 映射数据库行到SchedulePlan对象
    fn map_row(&self, row: &rusqlite::Row) -> rusqlite::Result<SchedulePlan> {
        let algorithm: String = row.get(4)?;
        let status: String = row.get(5)?;
        Ok(SchedulePlan {
            plan_id: row.get(0)?,
            plan_name: row.get(1)?,
            start_date: get_date(row, 2)?,
            end_date: get_date(row, 3)?,
            algorithm: algorithm
                .parse::<AlgorithmType>()
                .map_err(|e| conversion_error(4, e))?,
            status: PlanStatus::parse(&status)
                .ok_or_else(|| conversion_error(5, format!("未知方案状态: {}", status)))?,
            config_snapshot_json: row.get(6)?,
            error_message: row.get(7)?,
            created_by: row.get(8)?,
            created_at: get_ts(row, 9)?,
            updated_at: get_ts(row, 10)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn setup() -> SchedulePlanRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        SchedulePlanRepository::new(Arc::new(Mutex::new(conn)))
    }

    fn plan() -> SchedulePlan {
        SchedulePlan::new_pending(
            "十一月排班",
            NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
            NaiveDate::from_ymd_opt(2026, 11, 8).unwrap(),
            AlgorithmType::Genetic,
            "admin",
        )
    }

    #[test]
    fn test_create_and_find() {
        let repo = setup();
        let plan = plan();
        let id = repo.create(&plan).unwrap();

        let loaded = repo.find_by_id(&id).unwrap().unwrap();
        assert_eq!(loaded.plan_name, "十一月排班");
        assert_eq!(loaded.status, PlanStatus::Pending);
        assert_eq!(loaded.start_date, plan.start_date);
        assert_eq!(loaded.algorithm, AlgorithmType::Genetic);
        assert!(repo.find_by_id("missing").unwrap().is_none());
        assert_eq!(repo.list_all().unwrap().len(), 1);
    }

    #[test]
    fn test_update_status_compare_and_set() {
        let repo = setup();
        let id = repo.create(&plan()).unwrap();

        repo.update_status(&id, PlanStatus::Pending, PlanStatus::Running, None)
            .unwrap();
        // 第二次 PENDING → RUNNING 必须失败
        let err = repo
            .update_status(&id, PlanStatus::Pending, PlanStatus::Running, None)
            .unwrap_err();
        assert!(matches!(err, RepositoryError::StatusConflict { ref actual, .. } if actual == "RUNNING"));

        repo.update_status(&id, PlanStatus::Running, PlanStatus::Failed, Some("boom"))
            .unwrap();
        let loaded = repo.find_by_id(&id).unwrap().unwrap();
        assert_eq!(loaded.status, PlanStatus::Failed);
        assert_eq!(loaded.error_message.as_deref(), Some("boom"));
        assert_eq!(repo.list_by_status(PlanStatus::Failed).unwrap().len(), 1);

        let err = repo
            .update_status("missing", PlanStatus::Pending, PlanStatus::Running, None)
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[test]
    fn test_snapshot_and_delete() {
        let repo = setup();
        let id = repo.create(&plan()).unwrap();
        repo.set_config_snapshot(&id, r#"{"k":1}"#).unwrap();
        assert_eq!(
            repo.find_by_id(&id).unwrap().unwrap().config_snapshot_json.as_deref(),
            Some(r#"{"k":1}"#)
        );
        repo.delete(&id).unwrap();
        assert!(repo.find_by_id(&id).unwrap().is_none());
        assert!(matches!(
            repo.delete(&id).unwrap_err(),
            RepositoryError::NotFound { .. }
        ));
    }

    #[test]
    fn test_delete_refuses_running_and_confirmed() {
        let repo = setup();
        let id = repo.create(&plan()).unwrap();

        repo.update_status(&id, PlanStatus::Pending, PlanStatus::Running, None)
            .unwrap();
        let err = repo.delete(&id).unwrap_err();
        assert!(matches!(err, RepositoryError::StatusConflict { ref actual, .. } if actual == "RUNNING"));
        assert!(repo.find_by_id(&id).unwrap().is_some());

        repo.update_status(&id, PlanStatus::Running, PlanStatus::Completed, None)
            .unwrap();
        repo.update_status(&id, PlanStatus::Completed, PlanStatus::Confirmed, None)
            .unwrap();
        let err = repo.delete(&id).unwrap_err();
        assert!(matches!(err, RepositoryError::StatusConflict { ref actual, .. } if actual == "CONFIRMED"));
        assert!(repo.find_by_id(&id).unwrap().is_some());
    }
}

// ==========================================
// 考勤排班优化系统 - 方案结果数据仓储
// ==========================================
// 表: schedule_plan_result (一行/方案), schedule_plan_assignment (一行/基因)
// 红线: 汇总与明细在同一事务内写入, 不出现只有一半的结果
// ==========================================

use crate::domain::plan::{PlanAssignmentRow, PlanResultSummary};
use crate::domain::types::AlgorithmType;
use crate::repository::codec::{conversion_error, fmt_date, fmt_ts, get_date, get_ts};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// PlanResultRepository - 方案结果仓储
// ==========================================
pub struct PlanResultRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PlanResultRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 保存结果汇总与排班明细（覆盖同一方案的旧结果）
    ///
    /// # 返回
    /// - `Ok(rows)`: 写入的明细行数
    pub fn save(
        &self,
        summary: &PlanResultSummary,
        rows: &[PlanAssignmentRow],
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM schedule_plan_assignment WHERE plan_id = ?",
            params![&summary.plan_id],
        )?;
        tx.execute(
            r#"INSERT OR REPLACE INTO schedule_plan_result (
                plan_id, algorithm, fairness_score, cost_score, efficiency_score,
                satisfaction_score, penalty, weighted_score, conflict_count, conflicts_json,
                iterations, converged, stop_reason, duration_ms, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &summary.plan_id,
                summary.algorithm.as_str(),
                summary.fairness_score,
                summary.cost_score,
                summary.efficiency_score,
                summary.satisfaction_score,
                summary.penalty,
                summary.weighted_score,
                summary.conflict_count as i64,
                &summary.conflicts_json,
                summary.iterations as i64,
                summary.converged,
                &summary.stop_reason,
                summary.duration_ms,
                fmt_ts(summary.created_at),
            ],
        )?;

        let mut count = 0;
        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO schedule_plan_assignment (plan_id, employee_id, work_date, shift_id)
                   VALUES (?, ?, ?, ?)"#,
            )?;
            for row in rows {
                if row.plan_id != summary.plan_id {
                    return Err(RepositoryError::BusinessRuleViolation(format!(
                        "明细行方案ID {} 与汇总 {} 不一致",
                        row.plan_id, summary.plan_id
                    )));
                }
                stmt.execute(params![
                    &row.plan_id,
                    &row.employee_id,
                    fmt_date(row.work_date),
                    &row.shift_id,
                ])?;
                count += 1;
            }
        }

        tx.commit()?;
        Ok(count)
    }

    /// 查询结果汇总
    pub fn find_summary(&self, plan_id: &str) -> RepositoryResult<Option<PlanResultSummary>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT plan_id, algorithm, fairness_score, cost_score, efficiency_score,
                      satisfaction_score, penalty, weighted_score, conflict_count, conflicts_json,
                      iterations, converged, stop_reason, duration_ms, created_at
               FROM schedule_plan_result
               WHERE plan_id = ?"#,
            params![plan_id],
            |row| self.map_summary(row),
        ) {
            Ok(summary) => Ok(Some(summary)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 分页查询排班明细（按员工、日期排序）
    pub fn list_assignments(
        &self,
        plan_id: &str,
        limit: usize,
        offset: usize,
    ) -> RepositoryResult<Vec<PlanAssignmentRow>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT plan_id, employee_id, work_date, shift_id
               FROM schedule_plan_assignment
               WHERE plan_id = ?
               ORDER BY employee_id, work_date
               LIMIT ? OFFSET ?"#,
        )?;
        let rows = stmt
            .query_map(params![plan_id, limit as i64, offset as i64], |row| {
                Self::map_assignment(row)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// 查询某天的排班明细
    pub fn list_assignments_by_date(
        &self,
        plan_id: &str,
        work_date: NaiveDate,
    ) -> RepositoryResult<Vec<PlanAssignmentRow>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT plan_id, employee_id, work_date, shift_id
               FROM schedule_plan_assignment
               WHERE plan_id = ? AND work_date = ?
               ORDER BY employee_id"#,
        )?;
        let rows = stmt
            .query_map(params![plan_id, fmt_date(work_date)], |row| {
                Self::map_assignment(row)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// 明细行数
    pub fn count_assignments(&self, plan_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM schedule_plan_assignment WHERE plan_id = ?",
            params![plan_id],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }

    /// 删除方案结果
    pub fn delete_by_plan(&self, plan_id: &str) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM schedule_plan_assignment WHERE plan_id = ?",
            params![plan_id],
        )?;
        tx.execute(
            "DELETE FROM schedule_plan_result WHERE plan_id = ?",
            params![plan_id],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn map_summary(&self, row: &rusqlite::Row) -> rusqlite::Result<PlanResultSummary> {
        let algorithm: String = row.get(1)?;
        Ok(PlanResultSummary {
            plan_id: row.get(0)?,
            algorithm: algorithm
                .parse::<AlgorithmType>()
                .map_err(|e| conversion_error(1, e))?,
            fairness_score: row.get(2)?,
            cost_score: row.get(3)?,
            efficiency_score: row.get(4)?,
            satisfaction_score: row.get(5)?,
            penalty: row.get(6)?,
            weighted_score: row.get(7)?,
            conflict_count: row.get::<_, i64>(8)? as usize,
            conflicts_json: row.get(9)?,
            iterations: row.get::<_, i64>(10)? as usize,
            converged: row.get(11)?,
            stop_reason: row.get(12)?,
            duration_ms: row.get(13)?,
            created_at: get_ts(row, 14)?,
        })
    }

    fn map_assignment(row: &rusqlite::Row) -> rusqlite::Result<PlanAssignmentRow> {
        Ok(PlanAssignmentRow {
            plan_id: row.get(0)?,
            employee_id: row.get(1)?,
            work_date: get_date(row, 2)?,
            shift_id: row.get(3)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::plan::SchedulePlan;
    use crate::repository::plan_repo::SchedulePlanRepository;

    fn setup() -> (Arc<Mutex<Connection>>, String) {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        let plan = SchedulePlan::new_pending(
            "测试方案",
            NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
            NaiveDate::from_ymd_opt(2026, 11, 3).unwrap(),
            AlgorithmType::Genetic,
            "tester",
        );
        let id = SchedulePlanRepository::new(conn.clone()).create(&plan).unwrap();
        (conn, id)
    }

    fn summary(plan_id: &str) -> PlanResultSummary {
        PlanResultSummary {
            plan_id: plan_id.to_string(),
            algorithm: AlgorithmType::Genetic,
            fairness_score: 0.9,
            cost_score: 0.4,
            efficiency_score: 1.0,
            satisfaction_score: 0.5,
            penalty: 0.0,
            weighted_score: 0.79,
            conflict_count: 0,
            conflicts_json: None,
            iterations: 12,
            converged: true,
            stop_reason: "CONVERGED".to_string(),
            duration_ms: 35,
            created_at: chrono::Local::now().naive_local(),
        }
    }

    fn rows(plan_id: &str) -> Vec<PlanAssignmentRow> {
        let mut rows = Vec::new();
        for e in ["E1", "E2"] {
            for d in [2, 3] {
                rows.push(PlanAssignmentRow {
                    plan_id: plan_id.to_string(),
                    employee_id: e.to_string(),
                    work_date: NaiveDate::from_ymd_opt(2026, 11, d).unwrap(),
                    shift_id: if d == 2 { Some("AM".to_string()) } else { None },
                });
            }
        }
        rows
    }

    #[test]
    fn test_save_and_page() {
        let (conn, id) = setup();
        let repo = PlanResultRepository::new(conn);
        assert_eq!(repo.save(&summary(&id), &rows(&id)).unwrap(), 4);

        let loaded = repo.find_summary(&id).unwrap().unwrap();
        assert!(loaded.converged);
        assert_eq!(loaded.iterations, 12);
        assert_eq!(repo.count_assignments(&id).unwrap(), 4);

        let page = repo.list_assignments(&id, 3, 0).unwrap();
        assert_eq!(page.len(), 3);
        assert_eq!(page[0].employee_id, "E1");
        let rest = repo.list_assignments(&id, 3, 3).unwrap();
        assert_eq!(rest.len(), 1);
        assert!(rest[0].is_rest());

        let day = repo
            .list_assignments_by_date(&id, NaiveDate::from_ymd_opt(2026, 11, 2).unwrap())
            .unwrap();
        assert_eq!(day.len(), 2);
        assert!(day.iter().all(|r| r.shift_id.as_deref() == Some("AM")));
    }

    #[test]
    fn test_save_is_atomic() {
        let (conn, id) = setup();
        let repo = PlanResultRepository::new(conn);
        let mut bad = rows(&id);
        bad[3].plan_id = "other".to_string();
        assert!(repo.save(&summary(&id), &bad).is_err());
        assert!(repo.find_summary(&id).unwrap().is_none());
        assert_eq!(repo.count_assignments(&id).unwrap(), 0);
    }

    #[test]
    fn test_delete_by_plan() {
        let (conn, id) = setup();
        let repo = PlanResultRepository::new(conn);
        repo.save(&summary(&id), &rows(&id)).unwrap();
        repo.delete_by_plan(&id).unwrap();
        assert!(repo.find_summary(&id).unwrap().is_none());
        assert_eq!(repo.count_assignments(&id).unwrap(), 0);
    }
}

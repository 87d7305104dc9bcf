use super::core::PlanActionLogRepository;
use crate::domain::plan::PlanActionLog;
use crate::domain::types::PlanStatus;
use crate::repository::codec::{conversion_error, get_ts};
use crate::repository::error::RepositoryResult;
use rusqlite::{params, Result as SqliteResult, Row};

impl PlanActionLogRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 action_id 查询单条日志
    pub fn find_by_id(&self, action_id: &str) -> RepositoryResult<Option<PlanActionLog>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT action_id, plan_id, from_status, to_status, actor, detail, action_ts
            FROM plan_action_log
            WHERE action_id = ?
            "#,
        )?;

        match stmt.query_row(params![action_id], |row| self.map_row(row)) {
            Ok(log) => Ok(Some(log)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询指定方案的全部流转日志（按发生顺序）
    pub fn list_by_plan(&self, plan_id: &str) -> RepositoryResult<Vec<PlanActionLog>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT action_id, plan_id, from_status, to_status, actor, detail, action_ts
            FROM plan_action_log
            WHERE plan_id = ?
            ORDER BY action_ts ASC, rowid ASC
            "#,
        )?;

        let logs = stmt
            .query_map(params![plan_id], |row| self.map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(logs)
    }

    /// 查询最近的流转日志
    pub fn list_recent(&self, limit: usize) -> RepositoryResult<Vec<PlanActionLog>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT action_id, plan_id, from_status, to_status, actor, detail, action_ts
            FROM plan_action_log
            ORDER BY action_ts DESC, rowid DESC
            LIMIT ?
            "#,
        )?;

        let logs = stmt
            .query_map(params![limit as i64], |row| self.map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(logs)
    }

    /// 映射数据库行到PlanActionLog
    fn map_row(&self, row: &Row) -> SqliteResult<PlanActionLog> {
        let from_status: Option<String> = row.get(2)?;
        let to_status: String = row.get(3)?;
        Ok(PlanActionLog {
            action_id: row.get(0)?,
            plan_id: row.get(1)?,
            from_status: match from_status {
                Some(s) => Some(
                    PlanStatus::parse(&s)
                        .ok_or_else(|| conversion_error(2, format!("未知方案状态: {}", s)))?,
                ),
                None => None,
            },
            to_status: PlanStatus::parse(&to_status)
                .ok_or_else(|| conversion_error(3, format!("未知方案状态: {}", to_status)))?,
            actor: row.get(4)?,
            detail: row.get(5)?,
            action_ts: get_ts(row, 6)?,
        })
    }
}

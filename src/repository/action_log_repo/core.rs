use crate::domain::plan::PlanActionLog;
use crate::repository::codec::fmt_ts;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// PlanActionLogRepository - 方案流转日志仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
pub struct PlanActionLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PlanActionLogRepository {
    /// 创建新的流转日志仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    pub(super) fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 插入流转日志
    ///
    /// # 返回
    /// - `Ok(action_id)`: 成功插入,返回action_id
    pub fn insert(&self, log: &PlanActionLog) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO plan_action_log (
                action_id, plan_id, from_status, to_status, actor, detail, action_ts
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                log.action_id,
                log.plan_id,
                log.from_status.map(|s| s.to_db_str()),
                log.to_status.to_db_str(),
                log.actor,
                log.detail,
                fmt_ts(log.action_ts),
            ],
        )?;

        Ok(log.action_id.clone())
    }
}

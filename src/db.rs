// ==========================================
// 考勤排班优化系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 提供建表脚本（方案、结果汇总、排班明细、流转日志、配置）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化数据库 schema（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS schedule_plan (
            plan_id TEXT PRIMARY KEY,
            plan_name TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            algorithm TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'PENDING',
            config_snapshot_json TEXT,
            error_message TEXT,
            created_by TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_schedule_plan_status
          ON schedule_plan(status, created_at);

        CREATE TABLE IF NOT EXISTS schedule_plan_result (
            plan_id TEXT PRIMARY KEY REFERENCES schedule_plan(plan_id) ON DELETE CASCADE,
            algorithm TEXT NOT NULL,
            fairness_score REAL NOT NULL,
            cost_score REAL NOT NULL,
            efficiency_score REAL NOT NULL,
            satisfaction_score REAL NOT NULL,
            penalty REAL NOT NULL,
            weighted_score REAL NOT NULL,
            conflict_count INTEGER NOT NULL,
            conflicts_json TEXT,
            iterations INTEGER NOT NULL,
            converged INTEGER NOT NULL,
            stop_reason TEXT NOT NULL,
            duration_ms INTEGER NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS schedule_plan_assignment (
            plan_id TEXT NOT NULL REFERENCES schedule_plan(plan_id) ON DELETE CASCADE,
            employee_id TEXT NOT NULL,
            work_date TEXT NOT NULL,
            shift_id TEXT,
            PRIMARY KEY (plan_id, employee_id, work_date)
        );

        CREATE INDEX IF NOT EXISTS idx_assignment_plan_date
          ON schedule_plan_assignment(plan_id, work_date);

        CREATE TABLE IF NOT EXISTS plan_action_log (
            action_id TEXT PRIMARY KEY,
            plan_id TEXT NOT NULL,
            from_status TEXT,
            to_status TEXT NOT NULL,
            actor TEXT NOT NULL,
            detail TEXT,
            action_ts TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_action_log_plan
          ON plan_action_log(plan_id, action_ts);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);

        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }
}

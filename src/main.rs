// ==========================================
// 考勤排班优化系统 - 命令行入口
// ==========================================
// 用法:
//   shift-schedule-aps <config.json> [db_path] [plan_name]
//
// db_path 缺省时依次使用 SHIFT_APS_DB_PATH、用户数据目录
// Ctrl-C 向运行中的方案发出取消信号
// ==========================================

use anyhow::{bail, Context};
use shift_schedule_aps::config::ConfigManager;
use shift_schedule_aps::db::{init_schema, open_sqlite_connection};
use shift_schedule_aps::engine::RunControl;
use shift_schedule_aps::scheduler::{
    PlanLifecycleOrchestrator, PlanRunExecutor, PlanRunOutcome, SqlitePlanStore,
    DEFAULT_MAX_CONCURRENT_RUNS,
};
use shift_schedule_aps::{logging, APP_NAME, VERSION};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

fn default_db_path() -> String {
    if let Ok(path) = std::env::var("SHIFT_APS_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./shift_schedule_aps.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("shift-schedule-aps");
        std::fs::create_dir_all(&dir).ok();
        path = dir.join("shift_schedule_aps.db");
    }
    path.to_string_lossy().to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let Some(config_path) = args.next() else {
        bail!("用法: shift-schedule-aps <config.json> [db_path] [plan_name]");
    };
    let db_path = args.next().unwrap_or_else(default_db_path);
    let plan_name = args.next().unwrap_or_else(|| "命令行排班方案".to_string());

    tracing::info!("{} v{}", APP_NAME, VERSION);
    tracing::info!(db_path = %db_path, config_path = %config_path, "启动");

    let raw = std::fs::read_to_string(&config_path)
        .with_context(|| format!("读取配置文件失败: {}", config_path))?;

    let conn = open_sqlite_connection(&db_path).context("打开数据库失败")?;
    init_schema(&conn).context("初始化数据库结构失败")?;
    let conn = Arc::new(Mutex::new(conn));

    // 配置文件未给出的顶层字段以全局默认值为准
    let manager = ConfigManager::from_connection(conn.clone())?;
    let config = manager
        .resolve_config_json(&raw)
        .with_context(|| format!("配置文件格式错误: {}", config_path))?;

    let store = Arc::new(SqlitePlanStore::new(conn));
    let orchestrator = Arc::new(PlanLifecycleOrchestrator::new(store));
    let plan = orchestrator.create_plan(&plan_name, &config, "cli")?;
    println!("plan_id={}", plan.plan_id);

    let executor = PlanRunExecutor::new(orchestrator, DEFAULT_MAX_CONCURRENT_RUNS);
    let mut handle = executor.submit(&plan.plan_id, config, RunControl::new())?;
    let joined = tokio::select! {
        joined = &mut handle => joined,
        _ = tokio::signal::ctrl_c() => {
            executor.cancel(&plan.plan_id);
            tracing::warn!(plan_id = %plan.plan_id, "已发出取消信号, 等待当前迭代结束");
            handle.await
        }
    };
    let outcome = joined.context("运行任务异常退出")??;

    match outcome {
        PlanRunOutcome::Completed { summary, conflicts } => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            for c in &conflicts {
                println!("[{}] {} {}", c.severity, c.date, c.description);
            }
        }
        PlanRunOutcome::Failed { message } => bail!("方案运行失败: {}", message),
        PlanRunOutcome::Cancelled { iterations } => {
            println!("方案已取消 (迭代 {})", iterations);
        }
    }
    Ok(())
}

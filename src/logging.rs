// ==========================================
// 考勤排班优化系统 - 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 环境变量:
// - RUST_LOG: 日志级别过滤器（默认: info）
// - SHIFT_APS_LOG_FORMAT: 设为 json 时输出 JSON 行
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_FORMAT_ENV: &str = "SHIFT_APS_LOG_FORMAT";

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// 初始化日志系统（按 SHIFT_APS_LOG_FORMAT 选择文本或 JSON）
///
/// 例如: RUST_LOG=shift_schedule_aps::engine=debug 可观察每代进度
///
/// # 示例
/// ```no_run
/// use shift_schedule_aps::logging;
/// logging::init();
/// ```
pub fn init() {
    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.trim().eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json {
        init_json();
        return;
    }

    let _ = fmt()
        .with_env_filter(env_filter("info"))
        .with_target(true)
        .with_line_number(true)
        .try_init();
}

/// 以 JSON 行格式初始化日志（供日志采集使用）
pub fn init_json() {
    let _ = fmt()
        .json()
        .with_env_filter(env_filter("info"))
        .with_current_span(true)
        .try_init();
}

/// 初始化测试环境的日志系统
///
/// 可重复调用，已初始化时静默忽略
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(env_filter("debug"))
        .with_test_writer()
        .try_init();
}

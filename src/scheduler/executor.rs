// ==========================================
// 考勤排班优化系统 - 方案运行执行器
// ==========================================
// 职责: 有界工作池中执行方案运行, 调用方线程不参与计算
// 并发: tokio Semaphore 限制同时运行数, 运行本体在 spawn_blocking 中执行
// 红线: 同一方案同一时刻只允许一个活动运行
// ==========================================

use crate::config::OptimizationConfig;
use crate::engine::{CancellationFlag, RunControl};
use crate::scheduler::error::{SchedulerError, SchedulerResult};
use crate::scheduler::lifecycle::{PlanLifecycleOrchestrator, PlanRunOutcome};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// 默认最大并发运行数
pub const DEFAULT_MAX_CONCURRENT_RUNS: usize = 2;

type ActiveRuns = Arc<Mutex<HashMap<String, CancellationFlag>>>;

// ==========================================
// PlanRunExecutor
// ==========================================
pub struct PlanRunExecutor {
    orchestrator: Arc<PlanLifecycleOrchestrator>,
    permits: Arc<Semaphore>,
    active: ActiveRuns,
}

impl PlanRunExecutor {
    pub fn new(orchestrator: Arc<PlanLifecycleOrchestrator>, max_concurrent_runs: usize) -> Self {
        Self {
            orchestrator,
            permits: Arc::new(Semaphore::new(max_concurrent_runs.max(1))),
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn orchestrator(&self) -> &Arc<PlanLifecycleOrchestrator> {
        &self.orchestrator
    }

    fn lock_active(&self) -> SchedulerResult<std::sync::MutexGuard<'_, HashMap<String, CancellationFlag>>> {
        self.active
            .lock()
            .map_err(|e| SchedulerError::Internal(format!("活动运行表锁获取失败: {}", e)))
    }

    /// 提交一次方案运行（需在 tokio 运行时内调用）
    ///
    /// 等待许可期间收到取消信号的运行, 取得许可后由引擎在第一次检查时停止, 方案落为 CANCELLED。
    ///
    /// # 返回
    /// - `Ok(handle)`: 已入队, 句柄给出最终结局
    /// - `Err(PlanAlreadyRunning)`: 该方案已有活动运行
    pub fn submit(
        &self,
        plan_id: &str,
        config: OptimizationConfig,
        control: RunControl,
    ) -> SchedulerResult<JoinHandle<SchedulerResult<PlanRunOutcome>>> {
        {
            let mut active = self.lock_active()?;
            if active.contains_key(plan_id) {
                warn!(plan_id, "重复提交被拒绝");
                return Err(SchedulerError::PlanAlreadyRunning(plan_id.to_string()));
            }
            active.insert(plan_id.to_string(), control.cancellation().clone());
        }
        let guard = ActiveGuard {
            active: self.active.clone(),
            plan_id: plan_id.to_string(),
        };

        let orchestrator = self.orchestrator.clone();
        let permits = self.permits.clone();
        let plan_id = plan_id.to_string();
        debug!(plan_id = %plan_id, available = permits.available_permits(), "方案运行已入队");

        Ok(tokio::spawn(async move {
            let _guard = guard;
            let permit = permits
                .acquire_owned()
                .await
                .map_err(|e| SchedulerError::Internal(format!("工作池已关闭: {}", e)))?;

            info!(plan_id = %plan_id, "方案运行取得执行许可");
            tokio::task::spawn_blocking(move || {
                let _permit = permit;
                orchestrator.run_plan(&plan_id, &config, &control)
            })
            .await
            .map_err(|e| SchedulerError::TaskJoin(e.to_string()))?
        }))
    }

    /// 向活动运行发出取消信号
    ///
    /// # 返回
    /// - `true`: 方案有活动运行, 已发出信号
    /// - `false`: 方案没有活动运行
    pub fn cancel(&self, plan_id: &str) -> bool {
        let active = match self.lock_active() {
            Ok(active) => active,
            Err(e) => {
                warn!(plan_id, error = %e, "取消失败");
                return false;
            }
        };
        match active.get(plan_id) {
            Some(flag) => {
                flag.cancel();
                info!(plan_id, "已发出取消信号");
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self, plan_id: &str) -> bool {
        self.lock_active()
            .map(|active| active.contains_key(plan_id))
            .unwrap_or(false)
    }

    pub fn active_count(&self) -> usize {
        self.lock_active().map(|active| active.len()).unwrap_or(0)
    }
}

/// 运行结束（含 panic / 任务被丢弃）时从活动表移除
struct ActiveGuard {
    active: ActiveRuns,
    plan_id: String,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        if let Ok(mut active) = self.active.lock() {
            active.remove(&self.plan_id);
        }
    }
}

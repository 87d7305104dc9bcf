// ==========================================
// 考勤排班优化系统 - 方案生命周期编排器
// ==========================================
// 状态机:
//   PENDING → RUNNING → {COMPLETED | FAILED | CANCELLED}
//   COMPLETED → {CONFIRMED | CANCELLED}
//   PENDING / FAILED → CANCELLED
// 红线:
// - RUNNING/COMPLETED/FAILED 只由编排器写入
// - 配置校验失败时方案保持 PENDING
// - 优化器报错或 panic 一律落为 FAILED, 不留在 RUNNING
// - 取消后即使已算出结果也不落库
// ==========================================

use crate::config::OptimizationConfig;
use crate::domain::plan::{PlanResultSummary, SchedulePlan};
use crate::domain::types::PlanStatus;
use crate::engine::{OptimizationResult, RunControl, ScheduleConflict, StrategySelector};
use crate::repository::RepositoryError;
use crate::scheduler::error::{SchedulerError, SchedulerResult};
use crate::scheduler::store::PlanStore;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// 编排器写入状态时使用的操作人
pub const SCHEDULER_ACTOR: &str = "scheduler";

/// 一次运行的最终结局
#[derive(Debug, Clone)]
pub enum PlanRunOutcome {
    Completed {
        summary: PlanResultSummary,
        conflicts: Vec<ScheduleConflict>,
    },
    Failed {
        message: String,
    },
    Cancelled {
        iterations: usize,
    },
}

impl PlanRunOutcome {
    /// 运行结束后方案所处状态
    pub fn status(&self) -> PlanStatus {
        match self {
            PlanRunOutcome::Completed { .. } => PlanStatus::Completed,
            PlanRunOutcome::Failed { .. } => PlanStatus::Failed,
            PlanRunOutcome::Cancelled { .. } => PlanStatus::Cancelled,
        }
    }
}

// ==========================================
// PlanLifecycleOrchestrator
// ==========================================
pub struct PlanLifecycleOrchestrator {
    store: Arc<dyn PlanStore>,
}

impl PlanLifecycleOrchestrator {
    pub fn new(store: Arc<dyn PlanStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn PlanStore> {
        &self.store
    }

    /// 新建待执行方案（同时保存配置快照）
    pub fn create_plan(
        &self,
        plan_name: &str,
        config: &OptimizationConfig,
        created_by: &str,
    ) -> SchedulerResult<SchedulePlan> {
        let mut plan = SchedulePlan::new_pending(
            plan_name,
            config.date_range.start,
            config.date_range.end,
            config.algorithm,
            created_by,
        );
        plan.config_snapshot_json = Some(serde_json::to_string(config)?);
        self.store.create_plan(&plan, created_by)?;
        info!(plan_id = %plan.plan_id, plan_name, "方案已创建");
        Ok(plan)
    }

    pub fn get_plan(&self, plan_id: &str) -> SchedulerResult<SchedulePlan> {
        self.store
            .find_plan(plan_id)?
            .ok_or_else(|| SchedulerError::PlanNotFound(plan_id.to_string()))
    }

    /// 执行一次优化运行（阻塞, 应在工作线程上调用）
    ///
    /// # 返回
    /// - `Ok(outcome)`: 运行已结束, 方案处于 COMPLETED / FAILED / CANCELLED
    /// - `Err(Validation)`: 配置非法, 方案保持 PENDING
    /// - `Err(PlanAlreadyRunning | InvalidStateTransition)`: 方案当前不可运行
    #[instrument(skip(self, config, control), fields(plan_id = %plan_id))]
    pub fn run_plan(
        &self,
        plan_id: &str,
        config: &OptimizationConfig,
        control: &RunControl,
    ) -> SchedulerResult<PlanRunOutcome> {
        let plan = self.get_plan(plan_id)?;
        match plan.status {
            PlanStatus::Pending => {}
            PlanStatus::Running => return Err(SchedulerError::PlanAlreadyRunning(plan_id.to_string())),
            other => {
                return Err(SchedulerError::InvalidStateTransition {
                    plan_id: plan_id.to_string(),
                    from: other,
                    to: PlanStatus::Running,
                })
            }
        }

        if let Err(e) = config.validate() {
            warn!(violations = ?e.violations, "优化配置校验失败, 方案保持 PENDING");
            return Err(e.into());
        }

        match self
            .store
            .transition(plan_id, PlanStatus::Pending, PlanStatus::Running, SCHEDULER_ACTOR, None)
        {
            Ok(()) => {}
            Err(RepositoryError::StatusConflict { actual, .. }) if actual == PlanStatus::Running.to_db_str() => {
                return Err(SchedulerError::PlanAlreadyRunning(plan_id.to_string()))
            }
            Err(RepositoryError::StatusConflict { actual, .. }) => {
                return Err(SchedulerError::InvalidStateTransition {
                    plan_id: plan_id.to_string(),
                    from: PlanStatus::parse(&actual).unwrap_or(PlanStatus::Pending),
                    to: PlanStatus::Running,
                })
            }
            Err(e) => return Err(e.into()),
        }
        info!(algorithm = %config.algorithm, "方案开始运行");

        let run = catch_unwind(AssertUnwindSafe(|| StrategySelector::optimize(config, control)));
        let result = match run {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => return self.fail(plan_id, e.to_string()),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                return self.fail(plan_id, format!("优化器异常终止: {}", message));
            }
        };

        if result.is_cancelled() || control.cancellation().is_cancelled() {
            self.store.transition(
                plan_id,
                PlanStatus::Running,
                PlanStatus::Cancelled,
                SCHEDULER_ACTOR,
                Some("运行被取消"),
            )?;
            info!(iterations = result.iterations, "方案运行已取消, 结果不落库");
            return Ok(PlanRunOutcome::Cancelled {
                iterations: result.iterations,
            });
        }

        let summary = match self.persist(plan_id, &result) {
            Ok(summary) => summary,
            Err(e) => return self.fail(plan_id, format!("结果保存失败: {}", e)),
        };
        if let Err(e) = self.store.transition(
            plan_id,
            PlanStatus::Running,
            PlanStatus::Completed,
            SCHEDULER_ACTOR,
            Some(result.stop_reason.as_str()),
        ) {
            if let Err(discard) = self.store.discard_result(plan_id) {
                warn!(error = %discard, "结果回滚失败");
            }
            return self.fail(plan_id, format!("完成状态写入失败: {}", e));
        }
        info!(
            iterations = result.iterations,
            converged = result.converged,
            conflict_count = result.conflicts.len(),
            weighted_score = result.fitness.weighted_score,
            "方案运行完成"
        );
        Ok(PlanRunOutcome::Completed {
            summary,
            conflicts: result.conflicts,
        })
    }

    fn persist(&self, plan_id: &str, result: &OptimizationResult) -> SchedulerResult<PlanResultSummary> {
        let summary = result.to_summary(plan_id)?;
        let rows = result.assignment_rows(plan_id);
        self.store.save_result(&summary, &rows)?;
        Ok(summary)
    }

    /// RUNNING → FAILED；状态写入失败时重试一次
    fn fail(&self, plan_id: &str, message: String) -> SchedulerResult<PlanRunOutcome> {
        error!(error = %message, "方案运行失败");
        let mark_failed = || {
            self.store.transition(
                plan_id,
                PlanStatus::Running,
                PlanStatus::Failed,
                SCHEDULER_ACTOR,
                Some(message.as_str()),
            )
        };
        if let Err(e) = mark_failed() {
            warn!(error = %e, "FAILED 状态写入失败, 重试");
            mark_failed()?;
        }
        Ok(PlanRunOutcome::Failed { message })
    }

    /// 人工确认: COMPLETED → CONFIRMED
    #[instrument(skip(self), fields(plan_id = %plan_id))]
    pub fn confirm_plan(&self, plan_id: &str, actor: &str) -> SchedulerResult<()> {
        let plan = self.get_plan(plan_id)?;
        self.manual_transition(&plan, PlanStatus::Confirmed, actor)
    }

    /// 人工取消: PENDING / COMPLETED / FAILED → CANCELLED
    ///
    /// 运行中的方案需通过执行器发出取消信号, 由编排器在代间落为 CANCELLED
    #[instrument(skip(self), fields(plan_id = %plan_id))]
    pub fn cancel_plan(&self, plan_id: &str, actor: &str) -> SchedulerResult<()> {
        let plan = self.get_plan(plan_id)?;
        if plan.is_running() {
            return Err(SchedulerError::PlanAlreadyRunning(plan_id.to_string()));
        }
        self.manual_transition(&plan, PlanStatus::Cancelled, actor)
    }

    fn manual_transition(&self, plan: &SchedulePlan, to: PlanStatus, actor: &str) -> SchedulerResult<()> {
        let invalid = || SchedulerError::InvalidStateTransition {
            plan_id: plan.plan_id.clone(),
            from: plan.status,
            to,
        };
        if plan.status.is_terminal() || !plan.status.can_transition_to(to) {
            return Err(invalid());
        }
        match self.store.transition(&plan.plan_id, plan.status, to, actor, None) {
            Ok(()) => {
                info!(from = %plan.status, to = %to, actor, "方案状态变更");
                Ok(())
            }
            Err(RepositoryError::StatusConflict { .. }) => Err(invalid()),
            Err(e) => Err(e.into()),
        }
    }

    /// 删除方案（CONFIRMED / RUNNING 不可删除）
    ///
    /// 状态判断与删除在存储层同一条语句内完成
    #[instrument(skip(self), fields(plan_id = %plan_id))]
    pub fn delete_plan(&self, plan_id: &str) -> SchedulerResult<()> {
        match self.store.delete_plan(plan_id) {
            Ok(()) => {
                info!("方案已删除");
                Ok(())
            }
            Err(RepositoryError::NotFound { .. }) => Err(SchedulerError::PlanNotFound(plan_id.to_string())),
            Err(RepositoryError::StatusConflict { actual, .. }) => Err(SchedulerError::NotDeletable {
                plan_id: plan_id.to_string(),
                status: PlanStatus::parse(&actual).unwrap_or(PlanStatus::Running),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询方案结果汇总（仅 COMPLETED / CONFIRMED 有结果）
    pub fn get_result(&self, plan_id: &str) -> SchedulerResult<Option<PlanResultSummary>> {
        Ok(self.store.find_result(plan_id)?)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

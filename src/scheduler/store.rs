// ==========================================
// 考勤排班优化系统 - 方案存储接口
// ==========================================
// 职责: 编排器与持久化之间的唯一接缝
//       每次状态变化同时写入流转日志
// ==========================================

use crate::domain::plan::{PlanActionLog, PlanAssignmentRow, PlanResultSummary, SchedulePlan};
use crate::domain::types::PlanStatus;
use crate::repository::{
    PlanActionLogRepository, PlanResultRepository, RepositoryResult, SchedulePlanRepository,
};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// 方案存储
pub trait PlanStore: Send + Sync {
    fn create_plan(&self, plan: &SchedulePlan, actor: &str) -> RepositoryResult<String>;

    fn find_plan(&self, plan_id: &str) -> RepositoryResult<Option<SchedulePlan>>;

    /// 比较并交换状态, 并记录流转日志
    ///
    /// 流转到 FAILED 时 `detail` 同时作为失败原因写入方案
    fn transition(
        &self,
        plan_id: &str,
        from: PlanStatus,
        to: PlanStatus,
        actor: &str,
        detail: Option<&str>,
    ) -> RepositoryResult<()>;

    /// 保存结果汇总与排班明细（同一事务）
    fn save_result(
        &self,
        summary: &PlanResultSummary,
        rows: &[PlanAssignmentRow],
    ) -> RepositoryResult<usize>;

    fn find_result(&self, plan_id: &str) -> RepositoryResult<Option<PlanResultSummary>>;

    /// 删除已保存的结果（方案未能落为 COMPLETED 时调用）
    fn discard_result(&self, plan_id: &str) -> RepositoryResult<()>;

    /// 删除方案；RUNNING / CONFIRMED 返回 StatusConflict
    fn delete_plan(&self, plan_id: &str) -> RepositoryResult<()>;
}

// ==========================================
// SqlitePlanStore - 基于 SQLite 仓储的实现
// ==========================================
pub struct SqlitePlanStore {
    plan_repo: SchedulePlanRepository,
    result_repo: PlanResultRepository,
    action_log_repo: PlanActionLogRepository,
}

impl SqlitePlanStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            plan_repo: SchedulePlanRepository::new(conn.clone()),
            result_repo: PlanResultRepository::new(conn.clone()),
            action_log_repo: PlanActionLogRepository::new(conn),
        }
    }

    pub fn plan_repo(&self) -> &SchedulePlanRepository {
        &self.plan_repo
    }

    pub fn result_repo(&self) -> &PlanResultRepository {
        &self.result_repo
    }

    pub fn action_log_repo(&self) -> &PlanActionLogRepository {
        &self.action_log_repo
    }
}

impl PlanStore for SqlitePlanStore {
    fn create_plan(&self, plan: &SchedulePlan, actor: &str) -> RepositoryResult<String> {
        let plan_id = self.plan_repo.create(plan)?;
        self.action_log_repo
            .insert(&PlanActionLog::new(&plan_id, None, plan.status, actor, None))?;
        Ok(plan_id)
    }

    fn find_plan(&self, plan_id: &str) -> RepositoryResult<Option<SchedulePlan>> {
        self.plan_repo.find_by_id(plan_id)
    }

    fn transition(
        &self,
        plan_id: &str,
        from: PlanStatus,
        to: PlanStatus,
        actor: &str,
        detail: Option<&str>,
    ) -> RepositoryResult<()> {
        let error_message = if to == PlanStatus::Failed { detail } else { None };
        self.plan_repo.update_status(plan_id, from, to, error_message)?;
        self.action_log_repo.insert(&PlanActionLog::new(
            plan_id,
            Some(from),
            to,
            actor,
            detail.map(str::to_string),
        ))?;
        Ok(())
    }

    fn save_result(
        &self,
        summary: &PlanResultSummary,
        rows: &[PlanAssignmentRow],
    ) -> RepositoryResult<usize> {
        self.result_repo.save(summary, rows)
    }

    fn find_result(&self, plan_id: &str) -> RepositoryResult<Option<PlanResultSummary>> {
        self.result_repo.find_summary(plan_id)
    }

    fn discard_result(&self, plan_id: &str) -> RepositoryResult<()> {
        self.result_repo.delete_by_plan(plan_id)
    }

    fn delete_plan(&self, plan_id: &str) -> RepositoryResult<()> {
        self.plan_repo.delete(plan_id)
    }
}

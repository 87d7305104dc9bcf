// ==========================================
// 考勤排班优化系统 - 排班方案领域模型
// ==========================================
// 职责: 排班方案、方案结果汇总、排班明细、状态流转日志
// 红线: 方案明细只是结果快照,不反向修改主数据
// ==========================================

use crate::domain::types::{AlgorithmType, PlanStatus};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// SchedulePlan - 排班方案
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulePlan {
    pub plan_id: String,                      // 方案ID
    pub plan_name: String,                    // 方案名称
    pub start_date: NaiveDate,                // 排班开始日期
    pub end_date: NaiveDate,                  // 排班结束日期
    pub algorithm: AlgorithmType,             // 优化算法
    pub status: PlanStatus,                   // 方案状态
    pub config_snapshot_json: Option<String>, // 优化配置快照 (JSON)
    pub error_message: Option<String>,        // 失败原因
    pub created_by: String,                   // 创建人
    pub created_at: NaiveDateTime,            // 创建时间
    pub updated_at: NaiveDateTime,            // 更新时间
}

impl SchedulePlan {
    /// 新建待执行方案
    pub fn new_pending(
        plan_name: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        algorithm: AlgorithmType,
        created_by: impl Into<String>,
    ) -> Self {
        let now = chrono::Local::now().naive_local();
        Self {
            plan_id: uuid::Uuid::new_v4().to_string(),
            plan_name: plan_name.into(),
            start_date,
            end_date,
            algorithm,
            status: PlanStatus::Pending,
            config_snapshot_json: None,
            error_message: None,
            created_by: created_by.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == PlanStatus::Running
    }
}

// ==========================================
// PlanResultSummary - 方案优化结果汇总（一行/方案）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResultSummary {
    pub plan_id: String,
    pub algorithm: AlgorithmType,
    pub fairness_score: f64,
    pub cost_score: f64,
    pub efficiency_score: f64,
    pub satisfaction_score: f64,
    pub penalty: f64,
    pub weighted_score: f64,
    pub conflict_count: usize,
    pub conflicts_json: Option<String>, // 冲突明细 (JSON)
    pub iterations: usize,
    pub converged: bool,
    pub stop_reason: String,
    pub duration_ms: i64,
    pub created_at: NaiveDateTime,
}

// ==========================================
// PlanAssignmentRow - 排班明细（一行/基因）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanAssignmentRow {
    pub plan_id: String,
    pub employee_id: String,
    pub work_date: NaiveDate,
    pub shift_id: Option<String>, // None = 休息
}

impl PlanAssignmentRow {
    pub fn is_rest(&self) -> bool {
        self.shift_id.is_none()
    }
}

// ==========================================
// PlanActionLog - 方案状态流转日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanActionLog {
    pub action_id: String,
    pub plan_id: String,
    pub from_status: Option<PlanStatus>,
    pub to_status: PlanStatus,
    pub actor: String,
    pub detail: Option<String>,
    pub action_ts: NaiveDateTime,
}

impl PlanActionLog {
    /// 新建一条状态流转记录
    pub fn new(
        plan_id: impl Into<String>,
        from_status: Option<PlanStatus>,
        to_status: PlanStatus,
        actor: impl Into<String>,
        detail: Option<String>,
    ) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            plan_id: plan_id.into(),
            from_status,
            to_status,
            actor: actor.into(),
            detail,
            action_ts: chrono::Local::now().naive_local(),
        }
    }
}

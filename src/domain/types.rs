// ==========================================
// 考勤排班优化系统 - 领域类型定义
// ==========================================
// 职责: 方案状态、算法类型、冲突类型等枚举
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 排班方案状态 (Plan Status)
// ==========================================
// 状态机:
//   PENDING → RUNNING → {COMPLETED | FAILED | CANCELLED}
//   COMPLETED → {CONFIRMED | CANCELLED}
//   PENDING / FAILED → CANCELLED
// RUNNING/COMPLETED/FAILED 只能由编排器写入
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanStatus {
    Pending,   // 待执行
    Running,   // 运行中
    Completed, // 已完成
    Failed,    // 失败
    Confirmed, // 已确认
    Cancelled, // 已取消
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl PlanStatus {
    /// 从字符串解析状态（未知值返回 None，由调用方决定如何处理脏数据）
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Some(PlanStatus::Pending),
            "RUNNING" => Some(PlanStatus::Running),
            "COMPLETED" => Some(PlanStatus::Completed),
            "FAILED" => Some(PlanStatus::Failed),
            "CONFIRMED" => Some(PlanStatus::Confirmed),
            "CANCELLED" => Some(PlanStatus::Cancelled),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            PlanStatus::Pending => "PENDING",
            PlanStatus::Running => "RUNNING",
            PlanStatus::Completed => "COMPLETED",
            PlanStatus::Failed => "FAILED",
            PlanStatus::Confirmed => "CONFIRMED",
            PlanStatus::Cancelled => "CANCELLED",
        }
    }

    /// 终态: 不再允许任何转换
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlanStatus::Confirmed | PlanStatus::Cancelled)
    }

    /// 是否允许删除（CONFIRMED / RUNNING 不可删除）
    pub fn is_deletable(&self) -> bool {
        !matches!(self, PlanStatus::Confirmed | PlanStatus::Running)
    }

    /// 状态转换是否合法
    pub fn can_transition_to(&self, to: PlanStatus) -> bool {
        use PlanStatus::*;
        matches!(
            (self, to),
            (Pending, Running)
                | (Running, Completed)
                | (Running, Failed)
                | (Running, Cancelled)
                | (Completed, Confirmed)
                | (Completed, Cancelled)
                | (Pending, Cancelled)
                | (Failed, Cancelled)
        )
    }
}

// ==========================================
// 优化算法类型 (Algorithm Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlgorithmType {
    #[default]
    Genetic,            // 遗传算法
    SimulatedAnnealing, // 模拟退火
}

impl AlgorithmType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlgorithmType::Genetic => "GENETIC",
            AlgorithmType::SimulatedAnnealing => "SIMULATED_ANNEALING",
        }
    }

    pub fn title_cn(&self) -> &'static str {
        match self {
            AlgorithmType::Genetic => "遗传算法",
            AlgorithmType::SimulatedAnnealing => "模拟退火",
        }
    }
}

impl fmt::Display for AlgorithmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AlgorithmType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "GENETIC" | "GA" => Ok(AlgorithmType::Genetic),
            "SIMULATED_ANNEALING" | "SA" | "ANNEALING" => Ok(AlgorithmType::SimulatedAnnealing),
            other => Err(format!("未知算法类型: {}", other)),
        }
    }
}

// ==========================================
// 排班冲突类型 (Conflict Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictType {
    ConsecutiveOverrun, // 连续上班超限
    InsufficientRest,   // 休息不足
    Understaffed,       // 人手不足
    Overstaffed,        // 人员过剩
}

impl ConflictType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictType::ConsecutiveOverrun => "CONSECUTIVE_OVERRUN",
            ConflictType::InsufficientRest => "INSUFFICIENT_REST",
            ConflictType::Understaffed => "UNDERSTAFFED",
            ConflictType::Overstaffed => "OVERSTAFFED",
        }
    }
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 冲突严重程度 (Conflict Severity)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictSeverity {
    Low,
    Medium,
    High,
}

impl fmt::Display for ConflictSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictSeverity::Low => write!(f, "LOW"),
            ConflictSeverity::Medium => write!(f, "MEDIUM"),
            ConflictSeverity::High => write!(f, "HIGH"),
        }
    }
}

// ==========================================
// 考勤排班优化系统 - 配置管理器
// ==========================================
// 职责: 全局默认超参数加载、覆写、快照
// 存储: config_kv 表 (key-value + scope)
// ==========================================
// 说明: 方案级 OptimizationConfig 由外部方案管理层组装,
//       本管理器只提供"未显式指定时"的全局默认值
// ==========================================

use crate::config::optimization_config::{
    AnnealingParams, ConstraintThresholds, CostCoefficients, GeneticParams, ObjectiveWeights,
    OptimizationConfig,
};
use crate::domain::roster::{DateRange, Employee, Shift};
use crate::domain::types::AlgorithmType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&guard)?;
        }
        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON格式，按 key 排序）
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// 读取并解析配置值；缺失或格式错误时返回默认值
    fn parse_or<T>(&self, key: &str, default: T) -> RepositoryResult<T>
    where
        T: FromStr + Copy,
    {
        let Some(raw) = self.get_global_config_value(key)? else {
            return Ok(default);
        };
        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(config_key = key, raw_value = %raw, "配置值格式错误，使用默认值");
                Ok(default)
            }
        }
    }

    // ===== 搜索超参数 =====

    pub fn load_algorithm(&self) -> RepositoryResult<AlgorithmType> {
        self.parse_or(config_keys::DEFAULT_ALGORITHM, AlgorithmType::default())
    }

    pub fn load_genetic_params(&self) -> RepositoryResult<GeneticParams> {
        let d = GeneticParams::default();
        Ok(GeneticParams {
            population_size: self.parse_or(config_keys::GA_POPULATION_SIZE, d.population_size)?,
            max_iterations: self.parse_or(config_keys::GA_MAX_ITERATIONS, d.max_iterations)?,
            crossover_rate: self.parse_or(config_keys::GA_CROSSOVER_RATE, d.crossover_rate)?,
            mutation_rate: self.parse_or(config_keys::GA_MUTATION_RATE, d.mutation_rate)?,
            selection_rate: self.parse_or(config_keys::GA_SELECTION_RATE, d.selection_rate)?,
            elitism_rate: self.parse_or(config_keys::GA_ELITISM_RATE, d.elitism_rate)?,
            tournament_size: self.parse_or(config_keys::GA_TOURNAMENT_SIZE, d.tournament_size)?,
            convergence_epsilon: self
                .parse_or(config_keys::GA_CONVERGENCE_EPSILON, d.convergence_epsilon)?,
            stagnation_generations: self
                .parse_or(config_keys::GA_STAGNATION_GENERATIONS, d.stagnation_generations)?,
        })
    }

    pub fn load_annealing_params(&self) -> RepositoryResult<AnnealingParams> {
        let d = AnnealingParams::default();
        Ok(AnnealingParams {
            initial_temperature: self
                .parse_or(config_keys::SA_INITIAL_TEMPERATURE, d.initial_temperature)?,
            cooling_rate: self.parse_or(config_keys::SA_COOLING_RATE, d.cooling_rate)?,
            min_temperature: self.parse_or(config_keys::SA_MIN_TEMPERATURE, d.min_temperature)?,
            max_iterations: self.parse_or(config_keys::SA_MAX_ITERATIONS, d.max_iterations)?,
        })
    }

    pub fn load_objective_weights(&self) -> RepositoryResult<ObjectiveWeights> {
        let d = ObjectiveWeights::default();
        Ok(ObjectiveWeights {
            fairness: self.parse_or(config_keys::WEIGHT_FAIRNESS, d.fairness)?,
            cost: self.parse_or(config_keys::WEIGHT_COST, d.cost)?,
            efficiency: self.parse_or(config_keys::WEIGHT_EFFICIENCY, d.efficiency)?,
            satisfaction: self.parse_or(config_keys::WEIGHT_SATISFACTION, d.satisfaction)?,
            hard_constraint_penalty: self
                .parse_or(config_keys::HARD_CONSTRAINT_PENALTY, d.hard_constraint_penalty)?,
            soft_constraint_penalty: self
                .parse_or(config_keys::SOFT_CONSTRAINT_PENALTY, d.soft_constraint_penalty)?,
        })
    }

    pub fn load_constraint_thresholds(&self) -> RepositoryResult<ConstraintThresholds> {
        let d = ConstraintThresholds::default();
        Ok(ConstraintThresholds {
            min_consecutive_work_days: self
                .parse_or(config_keys::MIN_CONSECUTIVE_WORK_DAYS, d.min_consecutive_work_days)?,
            max_consecutive_work_days: self
                .parse_or(config_keys::MAX_CONSECUTIVE_WORK_DAYS, d.max_consecutive_work_days)?,
            min_rest_days: self.parse_or(config_keys::MIN_REST_DAYS, d.min_rest_days)?,
            min_daily_staff: self.parse_or(config_keys::MIN_DAILY_STAFF, d.min_daily_staff)?,
            max_daily_staff: self.parse_or(config_keys::MAX_DAILY_STAFF, d.max_daily_staff)?,
        })
    }

    pub fn load_cost_coefficients(&self) -> RepositoryResult<CostCoefficients> {
        let d = CostCoefficients::default();
        Ok(CostCoefficients {
            base_shift_cost: self.parse_or(config_keys::COST_BASE_SHIFT, d.base_shift_cost)?,
            overtime_multiplier: self
                .parse_or(config_keys::COST_OVERTIME_MULTIPLIER, d.overtime_multiplier)?,
            weekend_multiplier: self
                .parse_or(config_keys::COST_WEEKEND_MULTIPLIER, d.weekend_multiplier)?,
            holiday_multiplier: self
                .parse_or(config_keys::COST_HOLIDAY_MULTIPLIER, d.holiday_multiplier)?,
        })
    }

    /// 以全局默认值组装一份优化配置
    ///
    /// 主数据由调用方提供；其余字段取 config_kv 中的全局值，缺省取内置默认值。
    pub fn build_config(
        &self,
        employees: Vec<Employee>,
        shifts: Vec<Shift>,
        date_range: DateRange,
    ) -> RepositoryResult<OptimizationConfig> {
        let mut config = OptimizationConfig::new(employees, shifts, date_range);
        config.algorithm = self.load_algorithm()?;
        config.genetic = self.load_genetic_params()?;
        config.annealing = self.load_annealing_params()?;
        config.weights = self.load_objective_weights()?;
        config.constraints = self.load_constraint_thresholds()?;
        config.costs = self.load_cost_coefficients()?;

        let time_limit_ms: u64 = self.parse_or(config_keys::TIME_LIMIT_MS, 0)?;
        config.time_limit_ms = (time_limit_ms > 0).then_some(time_limit_ms);
        config.parallel_evaluation = self.parse_or(config_keys::PARALLEL_EVALUATION, true)?;

        Ok(config)
    }

    /// 解析方案配置 JSON
    ///
    /// 只有 JSON 中缺失的顶层字段才取全局默认值；显式给出的字段原样保留。
    pub fn resolve_config_json(&self, raw: &str) -> RepositoryResult<OptimizationConfig> {
        let explicit: OptimizationConfig = serde_json::from_str(raw)?;
        let Value::Object(mut fields) = serde_json::from_str::<Value>(raw)? else {
            return Ok(explicit);
        };

        let defaults = self.build_config(explicit.employees, explicit.shifts, explicit.date_range)?;
        if let Value::Object(default_fields) = serde_json::to_value(&defaults)? {
            for (key, value) in default_fields {
                if !fields.contains_key(&key) {
                    tracing::debug!(config_key = %key, "字段未显式给出, 使用全局默认值");
                    fields.insert(key, value);
                }
            }
        }
        Ok(serde_json::from_value(Value::Object(fields))?)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 算法
    pub const DEFAULT_ALGORITHM: &str = "optimizer.algorithm";
    pub const TIME_LIMIT_MS: &str = "optimizer.time_limit_ms";
    pub const PARALLEL_EVALUATION: &str = "optimizer.parallel_evaluation";

    // 遗传算法
    pub const GA_POPULATION_SIZE: &str = "ga.population_size";
    pub const GA_MAX_ITERATIONS: &str = "ga.max_iterations";
    pub const GA_CROSSOVER_RATE: &str = "ga.crossover_rate";
    pub const GA_MUTATION_RATE: &str = "ga.mutation_rate";
    pub const GA_SELECTION_RATE: &str = "ga.selection_rate";
    pub const GA_ELITISM_RATE: &str = "ga.elitism_rate";
    pub const GA_TOURNAMENT_SIZE: &str = "ga.tournament_size";
    pub const GA_CONVERGENCE_EPSILON: &str = "ga.convergence_epsilon";
    pub const GA_STAGNATION_GENERATIONS: &str = "ga.stagnation_generations";

    // 模拟退火
    pub const SA_INITIAL_TEMPERATURE: &str = "sa.initial_temperature";
    pub const SA_COOLING_RATE: &str = "sa.cooling_rate";
    pub const SA_MIN_TEMPERATURE: &str = "sa.min_temperature";
    pub const SA_MAX_ITERATIONS: &str = "sa.max_iterations";

    // 目标权重
    pub const WEIGHT_FAIRNESS: &str = "weight.fairness";
    pub const WEIGHT_COST: &str = "weight.cost";
    pub const WEIGHT_EFFICIENCY: &str = "weight.efficiency";
    pub const WEIGHT_SATISFACTION: &str = "weight.satisfaction";
    pub const HARD_CONSTRAINT_PENALTY: &str = "weight.hard_constraint_penalty";
    pub const SOFT_CONSTRAINT_PENALTY: &str = "weight.soft_constraint_penalty";

    // 约束阈值
    pub const MIN_CONSECUTIVE_WORK_DAYS: &str = "constraint.min_consecutive_work_days";
    pub const MAX_CONSECUTIVE_WORK_DAYS: &str = "constraint.max_consecutive_work_days";
    pub const MIN_REST_DAYS: &str = "constraint.min_rest_days";
    pub const MIN_DAILY_STAFF: &str = "constraint.min_daily_staff";
    pub const MAX_DAILY_STAFF: &str = "constraint.max_daily_staff";

    // 成本系数
    pub const COST_BASE_SHIFT: &str = "cost.base_shift";
    pub const COST_OVERTIME_MULTIPLIER: &str = "cost.overtime_multiplier";
    pub const COST_WEEKEND_MULTIPLIER: &str = "cost.weekend_multiplier";
    pub const COST_HOLIDAY_MULTIPLIER: &str = "cost.holiday_multiplier";
}

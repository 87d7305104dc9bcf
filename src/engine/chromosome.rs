// ==========================================
// 考勤排班优化系统 - 染色体（候选排班表）
// ==========================================
// 编码: 扁平数组, 下标 = employee_index * day_count + day_index
// 红线: 每个 (员工, 日期) 恰好一个基因; 变换一律返回新值, 不修改共享状态
// ==========================================

use crate::config::OptimizationConfig;
use crate::engine::error::{EngineError, EngineResult};
use chrono::NaiveDate;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;

// ==========================================
// Assignment - 基因取值（班次下标或休息）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Assignment {
    Rest,
    Shift(u16),
}

impl Assignment {
    pub fn is_rest(&self) -> bool {
        matches!(self, Assignment::Rest)
    }

    pub fn is_work(&self) -> bool {
        !self.is_rest()
    }

    pub fn shift_index(&self) -> Option<usize> {
        match self {
            Assignment::Rest => None,
            Assignment::Shift(s) => Some(*s as usize),
        }
    }

    /// 按序号取值: 0..shift_count 为班次, shift_count 为休息
    pub fn from_option_index(option: usize, shift_count: usize) -> Self {
        if option >= shift_count {
            Assignment::Rest
        } else {
            Assignment::Shift(option as u16)
        }
    }

    /// 随机取一个与当前值不同的基因值
    pub fn random_other<R: Rng>(self, shift_count: usize, rng: &mut R) -> Self {
        let options = shift_count + 1;
        if options <= 1 {
            return self;
        }
        let current = match self {
            Assignment::Rest => shift_count,
            Assignment::Shift(s) => s as usize,
        };
        let mut pick = rng.gen_range(0..options - 1);
        if pick >= current {
            pick += 1;
        }
        Assignment::from_option_index(pick, shift_count)
    }
}

// ==========================================
// ScheduleLayout - 员工×日期网格布局（一次运行内共享、只读）
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleLayout {
    employee_ids: Vec<String>,
    days: Vec<NaiveDate>,
    shift_ids: Vec<String>,
    employee_index: HashMap<String, usize>,
    day_index: HashMap<NaiveDate, usize>,
    shift_index: HashMap<String, usize>,
}

impl ScheduleLayout {
    pub fn new(employee_ids: Vec<String>, days: Vec<NaiveDate>, shift_ids: Vec<String>) -> Self {
        let employee_index = employee_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();
        let day_index = days.iter().enumerate().map(|(i, d)| (*d, i)).collect();
        let shift_index = shift_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();
        Self {
            employee_ids,
            days,
            shift_ids,
            employee_index,
            day_index,
            shift_index,
        }
    }

    pub fn from_config(config: &OptimizationConfig) -> Self {
        Self::new(
            config.employees.iter().map(|e| e.employee_id.clone()).collect(),
            config.date_range.days(),
            config.shifts.iter().map(|s| s.shift_id.clone()).collect(),
        )
    }

    pub fn employee_count(&self) -> usize {
        self.employee_ids.len()
    }

    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    pub fn shift_count(&self) -> usize {
        self.shift_ids.len()
    }

    pub fn gene_count(&self) -> usize {
        self.employee_count() * self.day_count()
    }

    #[inline]
    pub fn index(&self, employee: usize, day: usize) -> usize {
        employee * self.days.len() + day
    }

    pub fn employee_id(&self, employee: usize) -> &str {
        &self.employee_ids[employee]
    }

    pub fn day(&self, day: usize) -> NaiveDate {
        self.days[day]
    }

    pub fn days(&self) -> &[NaiveDate] {
        &self.days
    }

    pub fn shift_id(&self, shift: usize) -> &str {
        &self.shift_ids[shift]
    }

    pub fn employee_index_of(&self, employee_id: &str) -> Option<usize> {
        self.employee_index.get(employee_id).copied()
    }

    pub fn day_index_of(&self, date: NaiveDate) -> Option<usize> {
        self.day_index.get(&date).copied()
    }

    pub fn shift_index_of(&self, shift_id: &str) -> Option<usize> {
        self.shift_index.get(shift_id).copied()
    }
}

// ==========================================
// Chromosome - 候选排班表
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct Chromosome {
    layout: Arc<ScheduleLayout>,
    genes: Vec<Assignment>,
}

impl Chromosome {
    /// 由基因数组构造（校验结构完整性）
    pub fn from_genes(layout: Arc<ScheduleLayout>, genes: Vec<Assignment>) -> EngineResult<Self> {
        let chromosome = Self { layout, genes };
        chromosome.validate()?;
        Ok(chromosome)
    }

    /// 遗传算子内部使用: 长度由调用方保证
    pub(crate) fn from_genes_unchecked(layout: Arc<ScheduleLayout>, genes: Vec<Assignment>) -> Self {
        debug_assert_eq!(genes.len(), layout.gene_count());
        Self { layout, genes }
    }

    /// 所有基因取同一值
    pub fn filled(layout: Arc<ScheduleLayout>, assignment: Assignment) -> Self {
        let genes = vec![assignment; layout.gene_count()];
        Self { layout, genes }
    }

    /// 随机染色体（每个基因均匀取班次或休息）
    pub fn random<R: Rng>(layout: Arc<ScheduleLayout>, rng: &mut R) -> Self {
        let options = layout.shift_count() + 1;
        let genes = (0..layout.gene_count())
            .map(|_| Assignment::from_option_index(rng.gen_range(0..options), layout.shift_count()))
            .collect();
        Self { layout, genes }
    }

    pub fn layout(&self) -> &Arc<ScheduleLayout> {
        &self.layout
    }

    pub fn genes(&self) -> &[Assignment] {
        &self.genes
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// 按下标读取基因（热路径）
    #[inline]
    pub fn at(&self, employee: usize, day: usize) -> Assignment {
        self.genes[self.layout.index(employee, day)]
    }

    /// 某员工整个区间的基因切片
    pub fn employee_row(&self, employee: usize) -> &[Assignment] {
        let start = self.layout.index(employee, 0);
        &self.genes[start..start + self.layout.day_count()]
    }

    /// 按员工ID与日期读取基因
    pub fn get(&self, employee_id: &str, date: NaiveDate) -> Option<Assignment> {
        let e = self.layout.employee_index_of(employee_id)?;
        let d = self.layout.day_index_of(date)?;
        Some(self.at(e, d))
    }

    /// 按员工ID与日期读取班次ID（休息返回 None）
    pub fn shift_id_of(&self, employee_id: &str, date: NaiveDate) -> Option<&str> {
        self.get(employee_id, date)
            .and_then(|a| a.shift_index())
            .map(|s| self.layout.shift_id(s))
    }

    /// 写时复制: 返回修改了一个基因的新染色体
    pub fn with_gene(&self, employee: usize, day: usize, assignment: Assignment) -> Self {
        let mut genes = self.genes.clone();
        genes[self.layout.index(employee, day)] = assignment;
        Self {
            layout: Arc::clone(&self.layout),
            genes,
        }
    }

    /// 写时复制（按员工ID与日期）
    pub fn with(
        &self,
        employee_id: &str,
        date: NaiveDate,
        assignment: Assignment,
    ) -> EngineResult<Self> {
        let e = self
            .layout
            .employee_index_of(employee_id)
            .ok_or_else(|| EngineError::UnknownEmployee(employee_id.to_string()))?;
        let d = self
            .layout
            .day_index_of(date)
            .ok_or(EngineError::DateOutOfRange(date))?;
        if let Assignment::Shift(s) = assignment {
            if s as usize >= self.layout.shift_count() {
                return Err(EngineError::MalformedChromosome(format!(
                    "班次下标越界: {}",
                    s
                )));
            }
        }
        Ok(self.with_gene(e, d, assignment))
    }

    /// 遍历所有基因: (员工下标, 日期下标, 取值)
    pub fn for_each_gene<F>(&self, mut visitor: F)
    where
        F: FnMut(usize, usize, Assignment),
    {
        let day_count = self.layout.day_count();
        for (i, a) in self.genes.iter().enumerate() {
            visitor(i / day_count, i % day_count, *a);
        }
    }

    /// 结构校验: 覆盖整个员工×日期网格, 且班次下标有效
    pub fn validate(&self) -> EngineResult<()> {
        let expected = self.layout.gene_count();
        if self.genes.len() != expected {
            return Err(EngineError::MalformedChromosome(format!(
                "基因数量{}与网格大小{}不一致",
                self.genes.len(),
                expected
            )));
        }
        let shift_count = self.layout.shift_count();
        if let Some(pos) = self
            .genes
            .iter()
            .position(|a| matches!(a, Assignment::Shift(s) if *s as usize >= shift_count))
        {
            return Err(EngineError::MalformedChromosome(format!(
                "第{}个基因班次下标越界",
                pos
            )));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// 每天每班次的在岗人数: counts[day * shift_count + shift]
    pub fn staffing_counts(&self) -> Vec<usize> {
        let shift_count = self.layout.shift_count();
        let mut counts = vec![0usize; self.layout.day_count() * shift_count];
        self.for_each_gene(|_, d, a| {
            if let Some(s) = a.shift_index() {
                counts[d * shift_count + s] += 1;
            }
        });
        counts
    }
}

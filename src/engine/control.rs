// ==========================================
// 考勤排班优化系统 - 运行控制（取消/超时/进度）
// ==========================================
// 取消与超时只在代与代（或迭代与迭代）之间检查,
// 不打断单个染色体的评估
// ==========================================

use crate::engine::result::StopReason;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

// ==========================================
// CancellationFlag - 跨线程取消信号
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    inner: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }
}

/// 每代（每次迭代）结束后的进度快照
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchProgress {
    pub iteration: usize,
    pub best_score: f64,
    pub current_score: f64,
    pub elapsed_ms: u64,
}

/// 进度观察者
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, progress: &SearchProgress);
}

impl<F> ProgressObserver for F
where
    F: Fn(&SearchProgress) + Send + Sync,
{
    fn on_progress(&self, progress: &SearchProgress) {
        self(progress)
    }
}

// ==========================================
// RunControl - 调用方传入的控制项
// ==========================================
#[derive(Clone, Default)]
pub struct RunControl {
    cancel: CancellationFlag,
    time_limit: Option<Duration>,
    observer: Option<Arc<dyn ProgressObserver>>,
}

impl fmt::Debug for RunControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunControl")
            .field("cancelled", &self.cancel.is_cancelled())
            .field("time_limit", &self.time_limit)
            .field("has_observer", &self.observer.is_some())
            .finish()
    }
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn cancellation(&self) -> &CancellationFlag {
        &self.cancel
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    /// 与配置中的时间上限合并, 取较小者
    pub fn effective_time_limit(&self, config_limit_ms: Option<u64>) -> Option<Duration> {
        let from_config = config_limit_ms.map(Duration::from_millis);
        match (self.time_limit, from_config) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// 启动计时
    pub fn start(&self, time_limit: Option<Duration>) -> RunClock {
        RunClock {
            started: Instant::now(),
            deadline_after: time_limit,
            cancel: self.cancel.clone(),
            observer: self.observer.clone(),
        }
    }
}

// ==========================================
// RunClock - 一次搜索内的计时与检查点
// ==========================================
pub struct RunClock {
    started: Instant,
    deadline_after: Option<Duration>,
    cancel: CancellationFlag,
    observer: Option<Arc<dyn ProgressObserver>>,
}

impl RunClock {
    /// 检查点: 返回应当停止的原因（取消优先于超时）
    pub fn check(&self) -> Option<StopReason> {
        if self.cancel.is_cancelled() {
            return Some(StopReason::Cancelled);
        }
        match self.deadline_after {
            Some(limit) if self.started.elapsed() >= limit => Some(StopReason::Timeout),
            _ => None,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    pub fn notify(&self, iteration: usize, best_score: f64, current_score: f64) {
        if let Some(observer) = &self.observer {
            observer.on_progress(&SearchProgress {
                iteration,
                best_score,
                current_score,
                elapsed_ms: self.elapsed_ms(),
            });
        }
    }
}

use crate::{
    error::EngineError,
    metrics::{ACTIVE_TRANSFORMATIONS, Metrics},
};
use serde::Serialize;
use std::{
    sync::{Arc, Mutex},
    time::Instant,
};

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Idle => "idle",
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }
}

/// Point-in-time view of the single active (or most recent) run.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct RunSnapshot {
    pub status: RunStatus,
    pub processed_records: u64,
    pub total_records: u64,
    pub duration_ms: u64,
}

#[derive(Debug, Default)]
struct RunInner {
    status: RunStatus,
    started_at: Option<Instant>,
    duration_ms: u64,
    processed_records: u64,
    total_records: u64,
}

/// Owner of the one run slot this process models.
///
/// Starting a run while another is active is rejected with a conflict; run
/// state is never silently overwritten. All state is in-memory and gone on
/// restart.
#[derive(Debug, Clone, Default)]
pub struct RunTracker {
    inner: Arc<Mutex<RunInner>>,
}

impl RunTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the run slot. The returned guard releases it on every exit
    /// path: dropping an unfinished guard marks the run failed and balances
    /// the active-transformations counter.
    pub fn begin(&self, metrics: &Metrics) -> Result<RunGuard, EngineError> {
        let mut inner = self.inner.lock().expect("run lock poisoned");
        if inner.status == RunStatus::Running {
            return Err(EngineError::Conflict);
        }

        *inner = RunInner {
            status: RunStatus::Running,
            started_at: Some(Instant::now()),
            ..Default::default()
        };
        metrics.increment(ACTIVE_TRANSFORMATIONS);

        Ok(RunGuard {
            tracker: self.clone(),
            metrics: metrics.clone(),
            released: false,
        })
    }

    pub fn add_processed(&self, count: u64) {
        self.inner
            .lock()
            .expect("run lock poisoned")
            .processed_records += count;
    }

    pub fn add_total(&self, count: u64) {
        self.inner.lock().expect("run lock poisoned").total_records += count;
    }

    pub fn snapshot(&self) -> RunSnapshot {
        let inner = self.inner.lock().expect("run lock poisoned");
        let duration_ms = match (inner.status, inner.started_at) {
            (RunStatus::Running, Some(started)) => started.elapsed().as_millis() as u64,
            _ => inner.duration_ms,
        };
        RunSnapshot {
            status: inner.status,
            processed_records: inner.processed_records,
            total_records: inner.total_records,
            duration_ms,
        }
    }

    fn finish(&self, status: RunStatus) {
        let mut inner = self.inner.lock().expect("run lock poisoned");
        if let Some(started) = inner.started_at {
            inner.duration_ms = started.elapsed().as_millis() as u64;
        }
        inner.status = status;
    }
}

/// Scoped claim on the run slot.
#[must_use]
pub struct RunGuard {
    tracker: RunTracker,
    metrics: Metrics,
    released: bool,
}

impl RunGuard {
    pub fn complete(mut self) {
        self.release(RunStatus::Completed);
    }

    pub fn fail(mut self) {
        self.release(RunStatus::Failed);
    }

    fn release(&mut self, status: RunStatus) {
        if !self.released {
            self.released = true;
            self.tracker.finish(status);
            self.metrics.decrement(ACTIVE_TRANSFORMATIONS);
        }
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.release(RunStatus::Failed);
    }
}

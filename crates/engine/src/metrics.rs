use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, RwLock},
};

pub const ACTIVE_TRANSFORMATIONS: &str = "active_transformations";

/// Flat name → number metrics registry, exported as-is at the boundary.
///
/// Dynamic names follow the established scheme:
/// `transformation_duration_<sourceType>` and `batch_progress_<table>`.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    inner: Arc<RwLock<HashMap<String, f64>>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self, name: &str) {
        let mut metrics = self.inner.write().expect("metrics lock poisoned");
        *metrics.entry(name.to_string()).or_insert(0.0) += 1.0;
    }

    /// Decrements, never below zero.
    pub fn decrement(&self, name: &str) {
        let mut metrics = self.inner.write().expect("metrics lock poisoned");
        let value = metrics.entry(name.to_string()).or_insert(0.0);
        *value = (*value - 1.0).max(0.0);
    }

    pub fn set(&self, name: &str, value: f64) {
        self.inner
            .write()
            .expect("metrics lock poisoned")
            .insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> f64 {
        self.inner
            .read()
            .expect("metrics lock poisoned")
            .get(name)
            .copied()
            .unwrap_or(0.0)
    }

    pub fn record_transformation_duration(&self, source_kind: &str, millis: f64) {
        self.set(&format!("transformation_duration_{source_kind}"), millis);
    }

    pub fn set_batch_progress(&self, table: &str, offset: u64) {
        self.set(&format!("batch_progress_{table}"), offset as f64);
    }

    /// Sorted snapshot for the metrics export boundary.
    pub fn snapshot(&self) -> BTreeMap<String, f64> {
        self.inner
            .read()
            .expect("metrics lock poisoned")
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_move_up_and_down_with_a_zero_floor() {
        let metrics = Metrics::new();
        metrics.increment(ACTIVE_TRANSFORMATIONS);
        metrics.increment(ACTIVE_TRANSFORMATIONS);
        metrics.decrement(ACTIVE_TRANSFORMATIONS);
        assert_eq!(metrics.get(ACTIVE_TRANSFORMATIONS), 1.0);

        metrics.decrement(ACTIVE_TRANSFORMATIONS);
        metrics.decrement(ACTIVE_TRANSFORMATIONS);
        assert_eq!(metrics.get(ACTIVE_TRANSFORMATIONS), 0.0);
    }

    #[test]
    fn snapshot_uses_the_documented_names() {
        let metrics = Metrics::new();
        metrics.record_transformation_duration("mysql", 1250.0);
        metrics.set_batch_progress("users", 2000);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.get("transformation_duration_mysql"), Some(&1250.0));
        assert_eq!(snapshot.get("batch_progress_users"), Some(&2000.0));
    }
}

use crate::core::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    CountMismatch,
    MissingRecord,
    DataAnomaly,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => f.write_str("low"),
            Severity::Medium => f.write_str("medium"),
            Severity::High => f.write_str("high"),
        }
    }
}

/// A detected inconsistency between source and migrated data. Findings are
/// reported, never thrown; they do not abort a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    pub description: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableVerification {
    pub table_name: String,
    pub is_valid: bool,
    pub total_records: u64,
    pub verified_records: u64,
    pub anomalies: Vec<Anomaly>,
}

impl TableVerification {
    pub fn new(table_name: &str) -> Self {
        TableVerification {
            table_name: table_name.to_string(),
            is_valid: true,
            total_records: 0,
            verified_records: 0,
            anomalies: Vec::new(),
        }
    }

    pub fn push_anomaly(&mut self, anomaly: Anomaly) {
        self.is_valid = false;
        self.anomalies.push(anomaly);
    }
}

/// Produced once per run, immutable after return.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct VerificationResult {
    pub is_valid: bool,
    pub tables: Vec<TableVerification>,
    pub anomalies: Vec<Anomaly>,
    pub total_records: u64,
    pub verified_records: u64,
}

impl VerificationResult {
    pub fn new() -> Self {
        VerificationResult {
            is_valid: true,
            ..Default::default()
        }
    }

    /// Folds a per-table result into the run-level aggregate.
    pub fn absorb(&mut self, table: TableVerification) {
        self.total_records += table.total_records;
        self.verified_records += table.verified_records;
        if !table.is_valid {
            self.is_valid = false;
        }
        self.anomalies.extend(table.anomalies.iter().cloned());
        self.tables.push(table);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absorb_aggregates_counts_and_validity() {
        let mut result = VerificationResult::new();

        let mut bad = TableVerification::new("orders");
        bad.total_records = 10;
        bad.verified_records = 4;
        bad.push_anomaly(Anomaly {
            kind: AnomalyKind::CountMismatch,
            description: "off by one".into(),
            severity: Severity::High,
            record_id: None,
            confidence: None,
        });

        let mut good = TableVerification::new("users");
        good.total_records = 5;
        good.verified_records = 5;

        result.absorb(bad);
        result.absorb(good);

        assert!(!result.is_valid);
        assert_eq!(result.total_records, 15);
        assert_eq!(result.verified_records, 9);
        assert_eq!(result.anomalies.len(), 1);
        assert_eq!(result.tables.len(), 2);
    }
}

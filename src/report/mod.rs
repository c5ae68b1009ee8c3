use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::collector::{MetricsSnapshot, SourceFailure, SourceKind};
use crate::recommendations::generate_recommendations_with_policy;
use crate::types::*;

/// One poll cycle as handed to presentation: the raw records, the sources
/// that failed, and the recommendations derived from them.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticReport {
    pub generated_at: DateTime<Utc>,
    pub database: String,
    #[serde(flatten)]
    pub snapshot: MetricsSnapshot,
    pub failures: Vec<SourceFailure>,
    pub recommendations: Vec<Recommendation>,
}

impl DiagnosticReport {
    /// Runs the recommendation engine over the snapshot. Each source was
    /// fetched once; the engine only borrows the collections.
    pub fn from_snapshot(config: &Config, mut snapshot: MetricsSnapshot) -> Self {
        let recommendations = generate_recommendations_with_policy(
            &snapshot.slow_queries,
            &snapshot.locks,
            &snapshot.table_stats,
            config.scan_ratio_policy,
        );
        let failures = std::mem::take(&mut snapshot.failures);

        Self {
            generated_at: Utc::now(),
            database: config.target(),
            snapshot,
            failures,
            recommendations,
        }
    }

    pub fn is_source_failed(&self, source: SourceKind) -> bool {
        self.failures.iter().any(|f| f.source == source)
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            table_count: self.snapshot.table_stats.len(),
            sized_table_count: self.snapshot.table_sizes.len(),
            index_count: self.snapshot.index_usage.len(),
            slow_query_count: self.snapshot.slow_queries.len(),
            waiting_lock_count: self.snapshot.locks.len(),
            failed_source_count: self.failures.len(),
            timed_out_source_count: self.failures.iter().filter(|f| f.timed_out).count(),
            recommendation_count: self.recommendations.len(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub table_count: usize,
    pub sized_table_count: usize,
    pub index_count: usize,
    pub slow_query_count: usize,
    pub waiting_lock_count: usize,
    pub failed_source_count: usize,
    pub timed_out_source_count: usize,
    pub recommendation_count: usize,
}

impl ReportSummary {
    pub fn has_failures(&self) -> bool {
        self.failed_source_count > 0
    }

    pub fn collected_record_count(&self) -> usize {
        self.table_count
            + self.sized_table_count
            + self.index_count
            + self.slow_query_count
            + self.waiting_lock_count
    }
}

use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::CollectError;
use crate::metrics::StatsSource;
use crate::types::*;

/// Result of one statistics source for one poll cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Rows(Vec<T>),
    /// The source answered with zero rows.
    Empty,
    Failed(CollectError),
}

impl<T> FetchOutcome<T> {
    pub fn from_result(result: Result<Vec<T>, CollectError>) -> Self {
        match result {
            Ok(rows) if rows.is_empty() => FetchOutcome::Empty,
            Ok(rows) => FetchOutcome::Rows(rows),
            Err(e) => FetchOutcome::Failed(e),
        }
    }

    pub fn error(&self) -> Option<&CollectError> {
        match self {
            FetchOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Degrades to the records shown to consumers: a failure shows as nothing.
    pub fn into_records(self) -> Vec<T> {
        match self {
            FetchOutcome::Rows(rows) => rows,
            FetchOutcome::Empty | FetchOutcome::Failed(_) => Vec::new(),
        }
    }
}

/// Names the five sources in logs and in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    TableStats,
    TableSizes,
    IndexUsage,
    SlowQueries,
    Locks,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::TableStats => "table_stats",
            SourceKind::TableSizes => "table_sizes",
            SourceKind::IndexUsage => "index_usage",
            SourceKind::SlowQueries => "slow_queries",
            SourceKind::Locks => "locks",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceFailure {
    pub source: SourceKind,
    pub reason: String,
    pub timed_out: bool,
}

/// Everything one poll cycle collected. Failed sources hold empty collections
/// and are listed in `failures`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    pub table_stats: Vec<TableStat>,
    pub table_sizes: Vec<TableSize>,
    pub index_usage: Vec<IndexUsage>,
    pub slow_queries: Vec<SlowQuery>,
    pub locks: Vec<LockWait>,
    #[serde(skip)]
    pub failures: Vec<SourceFailure>,
}

/// Collector structure that runs the statistics sources for one poll cycle
pub struct MetricsCollector<'a, S: StatsSource> {
    source: &'a S,
    config: &'a Config,
}

impl<'a, S: StatsSource> MetricsCollector<'a, S> {
    pub fn new(source: &'a S, config: &'a Config) -> Self {
        Self { source, config }
    }

    pub async fn fetch_table_stats(&self) -> FetchOutcome<TableStat> {
        self.bounded(SourceKind::TableStats, self.source.table_stats()).await
    }

    pub async fn fetch_table_sizes(&self) -> FetchOutcome<TableSize> {
        self.bounded(SourceKind::TableSizes, self.source.table_sizes()).await
    }

    pub async fn fetch_index_usage(&self) -> FetchOutcome<IndexUsage> {
        self.bounded(SourceKind::IndexUsage, self.source.index_usage()).await
    }

    pub async fn fetch_slow_queries(&self) -> FetchOutcome<SlowQuery> {
        self.bounded(SourceKind::SlowQueries, self.source.slow_queries()).await
    }

    pub async fn fetch_locks(&self) -> FetchOutcome<LockWait> {
        self.bounded(SourceKind::Locks, self.source.locks()).await
    }

    /// Runs all five sources concurrently and waits for every one of them.
    pub async fn collect_snapshot(&self) -> MetricsSnapshot {
        let (table_stats, table_sizes, index_usage, slow_queries, locks) = tokio::join!(
            self.fetch_table_stats(),
            self.fetch_table_sizes(),
            self.fetch_index_usage(),
            self.fetch_slow_queries(),
            self.fetch_locks(),
        );

        let mut failures = Vec::new();
        record_failure(&mut failures, SourceKind::TableStats, &table_stats);
        record_failure(&mut failures, SourceKind::TableSizes, &table_sizes);
        record_failure(&mut failures, SourceKind::IndexUsage, &index_usage);
        record_failure(&mut failures, SourceKind::SlowQueries, &slow_queries);
        record_failure(&mut failures, SourceKind::Locks, &locks);

        MetricsSnapshot {
            table_stats: table_stats.into_records(),
            table_sizes: table_sizes.into_records(),
            index_usage: index_usage.into_records(),
            slow_queries: slow_queries.into_records(),
            locks: locks.into_records(),
            failures,
        }
    }

    async fn bounded<T, F>(&self, kind: SourceKind, fetch: F) -> FetchOutcome<T>
    where
        F: Future<Output = Result<Vec<T>, CollectError>>,
    {
        let result = with_timeout(self.config.fetch_timeout, fetch).await;
        match &result {
            Ok(rows) => debug!("{}: {} rows", kind.as_str(), rows.len()),
            Err(e) => warn!("Error fetching {}: {}", kind.as_str(), e),
        }
        FetchOutcome::from_result(result)
    }
}

async fn with_timeout<T, F>(limit: Duration, fetch: F) -> Result<T, CollectError>
where
    F: Future<Output = Result<T, CollectError>>,
{
    match tokio::time::timeout(limit, fetch).await {
        Ok(result) => result,
        Err(_) => Err(CollectError::Timeout(limit)),
    }
}

fn record_failure<T>(
    failures: &mut Vec<SourceFailure>,
    source: SourceKind,
    outcome: &FetchOutcome<T>,
) {
    if let Some(e) = outcome.error() {
        failures.push(SourceFailure {
            source,
            reason: e.to_string(),
            timed_out: e.is_timeout(),
        });
    }
}

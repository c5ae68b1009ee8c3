// Statistics sources
pub mod base;
pub mod queries;
pub mod tables;
pub mod indexes;
pub mod statements;
pub mod locks;

use async_trait::async_trait;
use sqlx::postgres::PgPool;

use crate::error::CollectError;
use crate::types::{IndexUsage, LockWait, SlowQuery, TableSize, TableStat};

// Re-export commonly used items
pub use tables::{fetch_table_sizes, fetch_table_stats};
pub use indexes::fetch_index_usage;
pub use statements::fetch_slow_queries;
pub use locks::fetch_locks;

/// The five read-only statistics sources a poll cycle draws from.
///
/// Every call is independent: one failing source says nothing about the others.
#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn table_stats(&self) -> Result<Vec<TableStat>, CollectError>;
    async fn table_sizes(&self) -> Result<Vec<TableSize>, CollectError>;
    async fn index_usage(&self) -> Result<Vec<IndexUsage>, CollectError>;
    async fn slow_queries(&self) -> Result<Vec<SlowQuery>, CollectError>;
    async fn locks(&self) -> Result<Vec<LockWait>, CollectError>;
}

/// Reads the statistics views through a shared connection pool.
#[derive(Clone)]
pub struct PgStatsSource {
    pool: PgPool,
}

impl PgStatsSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl StatsSource for PgStatsSource {
    async fn table_stats(&self) -> Result<Vec<TableStat>, CollectError> {
        fetch_table_stats(&self.pool).await
    }

    async fn table_sizes(&self) -> Result<Vec<TableSize>, CollectError> {
        fetch_table_sizes(&self.pool).await
    }

    async fn index_usage(&self) -> Result<Vec<IndexUsage>, CollectError> {
        fetch_index_usage(&self.pool).await
    }

    async fn slow_queries(&self) -> Result<Vec<SlowQuery>, CollectError> {
        fetch_slow_queries(&self.pool).await
    }

    async fn locks(&self) -> Result<Vec<LockWait>, CollectError> {
        fetch_locks(&self.pool).await
    }
}

use sqlx::postgres::{PgPool, PgRow};

use crate::error::CollectError;
use crate::types::IndexUsage;
use super::base::{fetch_rows, get_counter, get_text};
use super::queries::INDEX_USAGE_QUERY;

/// Scan counts and on-disk size for every user index.
pub async fn fetch_index_usage(pool: &PgPool) -> Result<Vec<IndexUsage>, CollectError> {
    let rows = fetch_rows(pool, INDEX_USAGE_QUERY).await?;
    rows.iter().map(parse_index_usage_row).collect()
}

fn parse_index_usage_row(row: &PgRow) -> Result<IndexUsage, CollectError> {
    Ok(IndexUsage {
        index_name: get_text(row, "index_name")?,
        table_name: get_text(row, "table_name")?,
        idx_scan: get_counter(row, "idx_scan")?,
        index_size_bytes: get_counter(row, "index_size")?,
    })
}

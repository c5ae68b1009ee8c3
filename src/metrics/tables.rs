use sqlx::postgres::{PgPool, PgRow};

use crate::error::CollectError;
use crate::types::{TableSize, TableStat};
use super::base::{fetch_rows, get_counter, get_text};
use super::queries::{TABLE_SIZES_QUERY, TABLE_STATS_QUERY};

/// Per-table scan counters from pg_stat_user_tables, in the order the view returns them.
pub async fn fetch_table_stats(pool: &PgPool) -> Result<Vec<TableStat>, CollectError> {
    let rows = fetch_rows(pool, TABLE_STATS_QUERY).await?;
    rows.iter().map(parse_table_stat_row).collect()
}

/// Heap and index sizes from pg_statio_user_tables.
pub async fn fetch_table_sizes(pool: &PgPool) -> Result<Vec<TableSize>, CollectError> {
    let rows = fetch_rows(pool, TABLE_SIZES_QUERY).await?;
    rows.iter().map(parse_table_size_row).collect()
}

fn parse_table_stat_row(row: &PgRow) -> Result<TableStat, CollectError> {
    Ok(TableStat {
        table_name: get_text(row, "table_name")?,
        seq_scan: get_counter(row, "seq_scan")?,
        // NULL for tables without any index
        idx_scan: get_counter(row, "idx_scan")?,
        live_row_estimate: get_counter(row, "n_live_tup")?,
    })
}

fn parse_table_size_row(row: &PgRow) -> Result<TableSize, CollectError> {
    let total = get_counter(row, "total_size")?;
    let table = get_counter(row, "table_size")?;
    Ok(table_size_from_parts(get_text(row, "table_name")?, total, table))
}

/// The index share is whatever the total holds beyond the heap.
pub fn table_size_from_parts(
    table_name: String,
    total_size_bytes: u64,
    table_size_bytes: u64,
) -> TableSize {
    TableSize {
        table_name,
        total_size_bytes,
        table_size_bytes,
        index_size_bytes: total_size_bytes.saturating_sub(table_size_bytes),
    }
}

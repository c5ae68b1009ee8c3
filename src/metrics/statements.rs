use sqlx::postgres::{PgPool, PgRow};
use tracing::debug;

use crate::error::CollectError;
use crate::types::SlowQuery;
use super::base::{acquire, get_counter, get_millis, get_text, is_undefined_column, query_error};
use super::queries::{SLOW_QUERIES_EXEC_TIME_QUERY, SLOW_QUERIES_QUERY};

/// Top ten statements by total execution time from pg_stat_statements.
///
/// Tries the pre-13 column names first and falls back to the `*_exec_time`
/// columns on the same connection when the server rejects them.
pub async fn fetch_slow_queries(pool: &PgPool) -> Result<Vec<SlowQuery>, CollectError> {
    let mut conn = acquire(pool).await?;

    let rows = match sqlx::query(SLOW_QUERIES_QUERY).fetch_all(&mut *conn).await {
        Ok(rows) => rows,
        Err(e) if is_undefined_column(&e) => {
            debug!("pg_stat_statements has no total_time column, using total_exec_time");
            sqlx::query(SLOW_QUERIES_EXEC_TIME_QUERY)
                .fetch_all(&mut *conn)
                .await
                .map_err(query_error)?
        }
        Err(e) => return Err(query_error(e)),
    };

    rows.iter().map(parse_slow_query_row).collect()
}

fn parse_slow_query_row(row: &PgRow) -> Result<SlowQuery, CollectError> {
    Ok(SlowQuery {
        query_text: get_text(row, "query")?,
        calls: get_counter(row, "calls")?,
        total_time_ms: get_millis(row, "total_time")?,
        mean_time_ms: get_millis(row, "mean_time")?,
        rows: get_counter(row, "rows")?,
    })
}

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::error::CollectError;
use crate::types::LockWait;
use super::base::{decode_error, fetch_rows, get_opt_text, get_text};
use super::queries::LOCK_WAITS_QUERY;

/// Lock requests that have not been granted, joined with the waiting session.
pub async fn fetch_locks(pool: &PgPool) -> Result<Vec<LockWait>, CollectError> {
    let rows = fetch_rows(pool, LOCK_WAITS_QUERY).await?;
    rows.iter().map(parse_lock_row).collect()
}

fn parse_lock_row(row: &PgRow) -> Result<LockWait, CollectError> {
    // Session columns are NULL when the backend is gone from pg_stat_activity.
    let pid: Option<i32> = row.try_get("pid").map_err(|e| decode_error("pid", e))?;
    let query_start: Option<DateTime<Utc>> = row
        .try_get("query_start")
        .map_err(|e| decode_error("query_start", e))?;
    let granted: bool = row.try_get("granted").map_err(|e| decode_error("granted", e))?;

    Ok(LockWait {
        lock_type: get_text(row, "locktype")?,
        mode: get_text(row, "mode")?,
        granted,
        query_text: get_opt_text(row, "query")?,
        state: get_opt_text(row, "state")?,
        pid,
        username: get_opt_text(row, "usename")?,
        query_start,
    })
}

use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Postgres, Row};

use crate::error::CollectError;
use crate::parsing::non_negative;

/// SQLSTATE for `undefined_column`.
pub const UNDEFINED_COLUMN: &str = "42703";

/// Takes one connection from the pool. It goes back to the pool when dropped,
/// whichever way the caller returns.
pub async fn acquire(pool: &PgPool) -> Result<PoolConnection<Postgres>, CollectError> {
    pool.acquire()
        .await
        .map_err(|e| CollectError::Connection(format_db_error(&e)))
}

/// Runs a parameter-free statement on a freshly acquired connection.
pub async fn fetch_rows(pool: &PgPool, sql: &str) -> Result<Vec<PgRow>, CollectError> {
    let mut conn = acquire(pool).await?;
    sqlx::query(sql)
        .fetch_all(&mut *conn)
        .await
        .map_err(query_error)
}

pub fn query_error(e: sqlx::Error) -> CollectError {
    CollectError::Query(format_db_error(&e))
}

pub fn decode_error(column: &str, e: sqlx::Error) -> CollectError {
    CollectError::Query(format!("decode column {}: {}", column, e))
}

pub fn format_db_error(e: &sqlx::Error) -> String {
    match e {
        sqlx::Error::Database(db) => match db.code() {
            Some(code) => format!("{} ({})", db.message(), code),
            None => db.message().to_string(),
        },
        sqlx::Error::PoolTimedOut => "timed out waiting for a pooled connection".to_string(),
        other => other.to_string(),
    }
}

pub fn is_undefined_column(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(UNDEFINED_COLUMN),
        _ => false,
    }
}

pub fn get_text(row: &PgRow, column: &str) -> Result<String, CollectError> {
    row.try_get::<String, _>(column)
        .map_err(|e| decode_error(column, e))
}

pub fn get_opt_text(row: &PgRow, column: &str) -> Result<Option<String>, CollectError> {
    row.try_get::<Option<String>, _>(column)
        .map_err(|e| decode_error(column, e))
}

/// Reads a bigint counter. NULL and negative values become 0.
pub fn get_counter(row: &PgRow, column: &str) -> Result<u64, CollectError> {
    row.try_get::<Option<i64>, _>(column)
        .map(counter_value)
        .map_err(|e| decode_error(column, e))
}

pub fn counter_value(value: Option<i64>) -> u64 {
    non_negative(value.unwrap_or(0))
}

/// Reads a double precision value. NULL, NaN and negatives become 0.
pub fn get_millis(row: &PgRow, column: &str) -> Result<f64, CollectError> {
    row.try_get::<Option<f64>, _>(column)
        .map(|v| clamp_millis(v.unwrap_or(0.0)))
        .map_err(|e| decode_error(column, e))
}

pub fn clamp_millis(value: f64) -> f64 {
    if value.is_nan() || value < 0.0 {
        0.0
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_millis() {
        assert_eq!(clamp_millis(12.5), 12.5);
        assert_eq!(clamp_millis(0.0), 0.0);
        assert_eq!(clamp_millis(-3.0), 0.0);
        assert_eq!(clamp_millis(f64::NAN), 0.0);
    }

    #[test]
    fn test_counter_value() {
        assert_eq!(counter_value(Some(5)), 5);
        assert_eq!(counter_value(Some(i64::MAX)), i64::MAX as u64);
        // idx_scan is NULL for tables without indexes
        assert_eq!(counter_value(None), 0);
        assert_eq!(counter_value(Some(-3)), 0);
        assert_eq!(counter_value(Some(i64::MIN)), 0);
    }

    #[test]
    fn test_format_non_database_errors() {
        assert_eq!(
            format_db_error(&sqlx::Error::PoolTimedOut),
            "timed out waiting for a pooled connection"
        );
        assert!(!is_undefined_column(&sqlx::Error::PoolTimedOut));
        assert!(!is_undefined_column(&sqlx::Error::RowNotFound));
    }

    #[test]
    fn test_error_classes() {
        assert!(matches!(query_error(sqlx::Error::RowNotFound), CollectError::Query(_)));
        let err = decode_error("seq_scan", sqlx::Error::ColumnNotFound("seq_scan".to_string()));
        assert!(err.to_string().contains("decode column seq_scan"));
    }
}

//! SQL for the PostgreSQL statistics views. Column aliases are the field
//! names the report exposes.

pub const TABLE_STATS_QUERY: &str = r#"
    SELECT
        relname AS table_name,
        seq_scan,
        idx_scan,
        n_live_tup
    FROM pg_stat_user_tables
"#;

pub const TABLE_SIZES_QUERY: &str = r#"
    SELECT
        relname AS table_name,
        pg_total_relation_size(relid) AS total_size,
        pg_relation_size(relid) AS table_size,
        (pg_total_relation_size(relid) - pg_relation_size(relid)) AS index_size
    FROM pg_catalog.pg_statio_user_tables
"#;

pub const INDEX_USAGE_QUERY: &str = r#"
    SELECT
        s.indexrelname AS index_name,
        t.relname AS table_name,
        s.idx_scan,
        pg_relation_size(s.indexrelid) AS index_size
    FROM pg_stat_user_indexes s
    JOIN pg_stat_user_tables t ON s.relid = t.relid
"#;

/// pg_stat_statements before PostgreSQL 13.
pub const SLOW_QUERIES_QUERY: &str = r#"
    SELECT query, calls, total_time, mean_time, rows
    FROM pg_stat_statements
    ORDER BY total_time DESC
    LIMIT 10
"#;

/// pg_stat_statements from PostgreSQL 13, which renamed the timing columns.
pub const SLOW_QUERIES_EXEC_TIME_QUERY: &str = r#"
    SELECT query, calls, total_exec_time AS total_time, mean_exec_time AS mean_time, rows
    FROM pg_stat_statements
    ORDER BY total_exec_time DESC
    LIMIT 10
"#;

pub const LOCK_WAITS_QUERY: &str = r#"
    SELECT l.locktype, l.mode, l.granted, a.query, a.state, a.pid, a.usename, a.query_start
    FROM pg_locks l
    LEFT JOIN pg_stat_activity a ON l.pid = a.pid
    WHERE NOT l.granted
"#;

pub const PING_QUERY: &str = "SELECT 1";

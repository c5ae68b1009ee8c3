use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::parsing::bytes_to_mib;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: SecretString,
    pub fetch_timeout: Duration,
    pub max_connections: u32,
    pub poll_interval: Option<Duration>,
    pub scan_ratio_policy: ScanRatioPolicy,
    pub fail_if_unreachable: bool,
}

impl Config {
    /// `host:port/database`, safe to log.
    pub fn target(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }
}

/// How the scan-ratio rule reports tables that qualify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanRatioPolicy {
    /// Name only the first qualifying table in query order.
    #[default]
    FirstOffender,
    /// Name every qualifying table, still within a single message.
    AllOffenders,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableStat {
    pub table_name: String,
    pub seq_scan: u64,
    pub idx_scan: u64,
    #[serde(rename = "n_live_tup")]
    pub live_row_estimate: u64,
}

/// Serialized with the byte counts plus `table_size_mb` and `index_size_mb` for charting.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSize {
    pub table_name: String,
    pub total_size_bytes: u64,
    pub table_size_bytes: u64,
    pub index_size_bytes: u64,
}

impl Serialize for TableSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TableSize", 6)?;
        state.serialize_field("table_name", &self.table_name)?;
        state.serialize_field("total_size", &self.total_size_bytes)?;
        state.serialize_field("table_size", &self.table_size_bytes)?;
        state.serialize_field("index_size", &self.index_size_bytes)?;
        state.serialize_field("table_size_mb", &bytes_to_mib(self.table_size_bytes))?;
        state.serialize_field("index_size_mb", &bytes_to_mib(self.index_size_bytes))?;
        state.end()
    }
}

/// Serialized with the byte count plus `index_size_mb`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexUsage {
    pub index_name: String,
    pub table_name: String,
    pub idx_scan: u64,
    pub index_size_bytes: u64,
}

impl Serialize for IndexUsage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("IndexUsage", 5)?;
        state.serialize_field("index_name", &self.index_name)?;
        state.serialize_field("table_name", &self.table_name)?;
        state.serialize_field("idx_scan", &self.idx_scan)?;
        state.serialize_field("index_size", &self.index_size_bytes)?;
        state.serialize_field("index_size_mb", &bytes_to_mib(self.index_size_bytes))?;
        state.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlowQuery {
    #[serde(rename = "query")]
    pub query_text: String,
    pub calls: u64,
    #[serde(rename = "total_time")]
    pub total_time_ms: f64,
    #[serde(rename = "mean_time")]
    pub mean_time_ms: f64,
    pub rows: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LockWait {
    #[serde(rename = "locktype")]
    pub lock_type: String,
    pub mode: String,
    pub granted: bool,
    #[serde(rename = "query")]
    pub query_text: Option<String>,
    pub state: Option<String>,
    pub pid: Option<i32>,
    #[serde(rename = "usename")]
    pub username: Option<String>,
    pub query_start: Option<DateTime<Utc>>,
}

/// A single diagnostic line produced by the recommendation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Recommendation(String);

impl Recommendation {
    pub(crate) fn new(message: String) -> Self {
        debug_assert!(!message.is_empty());
        Self(message)
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Recommendation {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Public modules
pub mod types;
pub mod error;
pub mod config;
pub mod parsing;
pub mod database;
pub mod metrics;
pub mod collector;
pub mod recommendations;
pub mod report;

// Re-export commonly used items
pub use types::*;
pub use error::CollectError;
pub use config::{
    load_config, load_config_with_env, EnvironmentProvider, SystemEnvironment, MockEnvironment,
};
pub use parsing::{truncate_chars, non_negative, bytes_to_mib};
pub use database::{connect_pool, ensure_database_reachable};
pub use metrics::{StatsSource, PgStatsSource};
pub use collector::{MetricsCollector, MetricsSnapshot, FetchOutcome, SourceFailure, SourceKind};
pub use recommendations::{generate_recommendations, generate_recommendations_with_policy};
pub use report::{DiagnosticReport, ReportSummary};

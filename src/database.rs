use anyhow::{Context, Result};
use secrecy::ExposeSecret;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};

use crate::metrics::base::fetch_rows;
use crate::metrics::queries::PING_QUERY;
use crate::types::Config;

/// Builds the connection pool without connecting. Connections are opened on
/// first use, so an unreachable server only affects the sources that need it.
pub fn connect_pool(cfg: &Config) -> PgPool {
    PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .acquire_timeout(cfg.fetch_timeout)
        .connect_lazy_with(connect_options(cfg))
}

pub fn connect_options(cfg: &Config) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&cfg.host)
        .port(cfg.port)
        .database(&cfg.database)
        .username(&cfg.user)
        .password(cfg.password.expose_secret())
        .application_name(env!("CARGO_PKG_NAME"))
}

pub async fn ensure_database_reachable(pool: &PgPool, cfg: &Config) -> Result<()> {
    fetch_rows(pool, PING_QUERY)
        .await
        .with_context(|| format!("database {} is not reachable", cfg.target()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_config_with_env, MockEnvironment};
    use crate::error::CollectError;
    use crate::metrics::{PgStatsSource, StatsSource};

    #[test]
    fn test_connect_options_from_config() {
        let env = MockEnvironment::new()
            .with_var("PG_HOST", "db.internal")
            .with_var("PG_PORT", "6543")
            .with_var("PG_DATABASE", "orders")
            .with_var("PG_USER", "monitor")
            .with_var("PG_PASSWORD", "s3cret");
        let cfg = load_config_with_env(&env).unwrap();

        let opts = connect_options(&cfg);
        assert_eq!(opts.get_host(), "db.internal");
        assert_eq!(opts.get_port(), 6543);
        assert_eq!(opts.get_database(), Some("orders"));
        assert_eq!(opts.get_username(), "monitor");
    }

    /// Nothing listens on port 1, so every acquire is refused.
    fn closed_port_config() -> Config {
        let env = MockEnvironment::new()
            .with_var("PG_HOST", "127.0.0.1")
            .with_var("PG_PORT", "1")
            .with_var("PG_DATABASE", "orders")
            .with_var("PG_USER", "monitor")
            .with_var("PG_PASSWORD", "s3cret")
            .with_var("FETCH_TIMEOUT_SECS", "1")
            .with_var("MAX_CONNECTIONS", "1");
        load_config_with_env(&env).unwrap()
    }

    #[tokio::test]
    async fn test_unreachable_server_is_connection_error() {
        let cfg = closed_port_config();
        let source = PgStatsSource::new(connect_pool(&cfg));

        let result = source.table_stats().await;
        assert!(
            matches!(result, Err(CollectError::Connection(_))),
            "unexpected result: {:?}",
            result
        );

        let result = source.slow_queries().await;
        assert!(matches!(result, Err(CollectError::Connection(_))));
    }

    #[tokio::test]
    async fn test_ensure_database_reachable_fails_on_closed_port() {
        let cfg = closed_port_config();
        let pool = connect_pool(&cfg);

        let err = ensure_database_reachable(&pool, &cfg).await.unwrap_err();
        assert!(err.to_string().contains("127.0.0.1:1/orders"));
    }
}

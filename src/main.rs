use anyhow::Result;
use tracing::{info, warn};

use pg_health_advisor::{
    connect_pool, ensure_database_reachable, load_config, Config, DiagnosticReport,
    MetricsCollector, PgStatsSource, SourceKind,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cfg = load_config()?;
    info!("target = {}, user = {}", cfg.target(), cfg.user);

    let pool = connect_pool(&cfg);

    // Optional fail-fast; otherwise unreachable sources just come back empty
    if cfg.fail_if_unreachable {
        ensure_database_reachable(&pool, &cfg).await?;
    }

    let source = PgStatsSource::new(pool);
    let result = tokio::select! {
        res = poll_loop(&source, &cfg) => res,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown requested, cancelling poll");
            Ok(())
        }
    };

    source.pool().close().await;
    result
}

async fn poll_loop(source: &PgStatsSource, cfg: &Config) -> Result<()> {
    let collector = MetricsCollector::new(source, cfg);

    loop {
        info!("Collecting statistics from {}", cfg.target());
        let snapshot = collector.collect_snapshot().await;
        let report = DiagnosticReport::from_snapshot(cfg, snapshot);

        let summary = report.summary();
        if summary.has_failures() {
            warn!(
                "{} of 5 sources failed this cycle ({} timed out)",
                summary.failed_source_count, summary.timed_out_source_count
            );
        }
        if report.is_source_failed(SourceKind::SlowQueries) {
            warn!("Slow query data unavailable; is pg_stat_statements installed?");
        }
        info!(
            "Report summary: {} records collected, {} recommendations",
            summary.collected_record_count(),
            summary.recommendation_count
        );
        for rec in &report.recommendations {
            info!("{}", rec);
        }

        println!("{}", report.to_json()?);

        match cfg.poll_interval {
            Some(interval) => tokio::time::sleep(interval).await,
            None => return Ok(()),
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

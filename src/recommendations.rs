use crate::parsing::truncate_chars;
use crate::types::{LockWait, Recommendation, ScanRatioPolicy, SlowQuery, TableStat};

/// Mean execution time (ms) above which the top query is flagged. Strict `>`.
pub const SLOW_QUERY_MEAN_MS_THRESHOLD: f64 = 500.0;
/// Characters of query text quoted in the slow-query message.
pub const QUERY_EXCERPT_CHARS: usize = 100;
/// A table is flagged when `seq_scan > SEQ_SCAN_RATIO * (idx_scan + 1)`.
pub const SEQ_SCAN_RATIO: u64 = 10;

pub const NO_ISSUES_MESSAGE: &str =
    "No significant issues detected. Keep monitoring for anomalies.";

/// Runs the rules with the default first-offender scan-ratio policy.
pub fn generate_recommendations(
    slow_queries: &[SlowQuery],
    locks: &[LockWait],
    table_stats: &[TableStat],
) -> Vec<Recommendation> {
    generate_recommendations_with_policy(
        slow_queries,
        locks,
        table_stats,
        ScanRatioPolicy::FirstOffender,
    )
}

/// Applies the slow-query, lock and scan-ratio rules in that order.
///
/// Each rule adds at most one message. When none fires, the result holds the
/// single [`NO_ISSUES_MESSAGE`], so the output always has 1 to 3 entries.
pub fn generate_recommendations_with_policy(
    slow_queries: &[SlowQuery],
    locks: &[LockWait],
    table_stats: &[TableStat],
    policy: ScanRatioPolicy,
) -> Vec<Recommendation> {
    let mut recommendations: Vec<Recommendation> = [
        check_slow_query(slow_queries),
        check_lock_waits(locks),
        check_scan_ratio(table_stats, policy),
    ]
    .into_iter()
    .flatten()
    .collect();

    if recommendations.is_empty() {
        recommendations.push(Recommendation::new(NO_ISSUES_MESSAGE.to_string()));
    }
    recommendations
}

fn check_slow_query(slow_queries: &[SlowQuery]) -> Option<Recommendation> {
    // Only the top entry (highest total time) is considered.
    let top = slow_queries.first()?;
    if top.mean_time_ms > SLOW_QUERY_MEAN_MS_THRESHOLD {
        Some(Recommendation::new(format!(
            "Slow Query Detected: Consider optimizing or adding indexes for the query: '{}'...",
            truncate_chars(&top.query_text, QUERY_EXCERPT_CHARS)
        )))
    } else {
        None
    }
}

fn check_lock_waits(locks: &[LockWait]) -> Option<Recommendation> {
    if locks.is_empty() {
        return None;
    }
    Some(Recommendation::new(format!(
        "There are {} waiting locks. Investigate long-running transactions.",
        locks.len()
    )))
}

fn check_scan_ratio(table_stats: &[TableStat], policy: ScanRatioPolicy) -> Option<Recommendation> {
    let mut offenders = table_stats.iter().filter(|t| has_high_seq_scan_ratio(t));

    match policy {
        ScanRatioPolicy::FirstOffender => {
            let table = offenders.next()?;
            Some(Recommendation::new(format!(
                "Table '{}' shows high sequential scans. Consider reviewing indexing strategy.",
                table.table_name
            )))
        }
        ScanRatioPolicy::AllOffenders => {
            let names: Vec<String> = offenders.map(|t| format!("'{}'", t.table_name)).collect();
            match names.len() {
                0 => None,
                1 => Some(Recommendation::new(format!(
                    "Table {} shows high sequential scans. Consider reviewing indexing strategy.",
                    names[0]
                ))),
                _ => Some(Recommendation::new(format!(
                    "Tables {} show high sequential scans. Consider reviewing indexing strategy.",
                    names.join(", ")
                ))),
            }
        }
    }
}

/// `seq_scan > 10 * (idx_scan + 1)`; the `+ 1` keeps tables with no index scans comparable.
pub fn has_high_seq_scan_ratio(stat: &TableStat) -> bool {
    let limit = stat.idx_scan.saturating_add(1).saturating_mul(SEQ_SCAN_RATIO);
    stat.seq_scan > limit
}

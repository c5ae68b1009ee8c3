use std::time::Duration;
use thiserror::Error;

/// Why a single statistics source produced no data.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CollectError {
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("query failed: {0}")]
    Query(String),
    #[error("timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),
}

impl CollectError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, CollectError::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CollectError::Query("relation \"pg_stat_statements\" does not exist".to_string());
        assert_eq!(
            err.to_string(),
            "query failed: relation \"pg_stat_statements\" does not exist"
        );

        let err = CollectError::Timeout(Duration::from_millis(1500));
        assert_eq!(err.to_string(), "timed out after 1.5s");
        assert!(err.is_timeout());
        assert!(!CollectError::Connection("refused".to_string()).is_timeout());
    }
}

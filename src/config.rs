use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;
use std::collections::HashMap;
use std::time::Duration;

use crate::parsing::{parse_bool_flag, parse_seconds};
use crate::types::{Config, ScanRatioPolicy};

const DEFAULT_PORT: u16 = 5432;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Trait for abstracting environment variable access
pub trait EnvironmentProvider {
    fn get_var(&self, key: &str) -> Option<String>;
}

/// Production implementation using std::env
pub struct SystemEnvironment;

impl EnvironmentProvider for SystemEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Mock implementation for testing
#[derive(Debug, Default)]
pub struct MockEnvironment {
    vars: HashMap<String, String>,
}

impl MockEnvironment {
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }

    pub fn set_var<K, V>(&mut self, key: K, value: V) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn with_var<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.set_var(key, value);
        self
    }
}

impl EnvironmentProvider for MockEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn load_config() -> Result<Config> {
    load_config_with_env(&SystemEnvironment)
}

pub fn load_config_with_env<E: EnvironmentProvider>(env: &E) -> Result<Config> {
    let host = required(env, "PG_HOST")?;
    let database = required(env, "PG_DATABASE")?;
    let user = required(env, "PG_USER")?;

    // Empty passwords are allowed (trust auth), but the variable must be set.
    let password = env
        .get_var("PG_PASSWORD")
        .ok_or_else(|| anyhow!("PG_PASSWORD must be provided via Secret env"))?;
    let password = SecretString::new(password.into_boxed_str());

    let port: u16 = match env.get_var("PG_PORT") {
        Some(v) => v.trim().parse().context("Invalid PG_PORT")?,
        None => DEFAULT_PORT,
    };
    if port == 0 {
        return Err(anyhow!("PG_PORT must be greater than zero"));
    }

    let fetch_timeout_secs = match env.get_var("FETCH_TIMEOUT_SECS") {
        Some(v) => parse_seconds(&v).ok_or_else(|| anyhow!("Invalid FETCH_TIMEOUT_SECS: {:?}", v))?,
        None => DEFAULT_FETCH_TIMEOUT_SECS,
    };
    if fetch_timeout_secs == 0 {
        return Err(anyhow!("FETCH_TIMEOUT_SECS must be greater than zero"));
    }

    let max_connections: u32 = env
        .get_var("MAX_CONNECTIONS")
        .and_then(|v| v.trim().parse().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_MAX_CONNECTIONS);

    let poll_interval = match env.get_var("POLL_INTERVAL_SECS") {
        Some(v) => {
            let secs = parse_seconds(&v)
                .ok_or_else(|| anyhow!("Invalid POLL_INTERVAL_SECS: {:?}", v))?;
            (secs > 0).then(|| Duration::from_secs(secs))
        }
        None => None,
    };

    let scan_ratio_policy = if env
        .get_var("SCAN_RATIO_REPORT_ALL")
        .map(|v| parse_bool_flag(&v))
        .unwrap_or(false)
    {
        ScanRatioPolicy::AllOffenders
    } else {
        ScanRatioPolicy::FirstOffender
    };

    let fail_if_unreachable = env
        .get_var("FAIL_IF_UNREACHABLE")
        .map(|v| parse_bool_flag(&v))
        .unwrap_or(false);

    Ok(Config {
        host,
        port,
        database,
        user,
        password,
        fetch_timeout: Duration::from_secs(fetch_timeout_secs),
        max_connections,
        poll_interval,
        scan_ratio_policy,
        fail_if_unreachable,
    })
}

fn required<E: EnvironmentProvider>(env: &E, key: &str) -> Result<String> {
    env.get_var(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow!("{} env var must be set", key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn base_env() -> MockEnvironment {
        MockEnvironment::new()
            .with_var("PG_HOST", "db.internal")
            .with_var("PG_DATABASE", "orders")
            .with_var("PG_USER", "monitor")
            .with_var("PG_PASSWORD", "s3cret")
    }

    #[test]
    fn test_config_loading_with_env() {
        let env = base_env()
            .with_var("PG_PORT", "6432")
            .with_var("FETCH_TIMEOUT_SECS", "3")
            .with_var("MAX_CONNECTIONS", "8")
            .with_var("POLL_INTERVAL_SECS", "60")
            .with_var("SCAN_RATIO_REPORT_ALL", "true")
            .with_var("FAIL_IF_UNREACHABLE", "1");

        let config = load_config_with_env(&env).unwrap();

        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 6432);
        assert_eq!(config.database, "orders");
        assert_eq!(config.user, "monitor");
        assert_eq!(config.password.expose_secret(), "s3cret");
        assert_eq!(config.fetch_timeout, Duration::from_secs(3));
        assert_eq!(config.max_connections, 8);
        assert_eq!(config.poll_interval, Some(Duration::from_secs(60)));
        assert_eq!(config.scan_ratio_policy, ScanRatioPolicy::AllOffenders);
        assert!(config.fail_if_unreachable);
    }

    #[test]
    fn test_config_loading_defaults() {
        let config = load_config_with_env(&base_env()).unwrap();

        assert_eq!(config.port, 5432);
        assert_eq!(config.fetch_timeout, Duration::from_secs(10));
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.poll_interval, None);
        assert_eq!(config.scan_ratio_policy, ScanRatioPolicy::FirstOffender);
        assert!(!config.fail_if_unreachable);
        assert_eq!(config.target(), "db.internal:5432/orders");
    }

    #[test]
    fn test_config_loading_missing_required() {
        for key in ["PG_HOST", "PG_DATABASE", "PG_USER", "PG_PASSWORD"] {
            let mut env = MockEnvironment::new();
            for other in ["PG_HOST", "PG_DATABASE", "PG_USER", "PG_PASSWORD"] {
                if other != key {
                    env.set_var(other, "x");
                }
            }
            let result = load_config_with_env(&env);
            assert!(result.is_err(), "expected error without {}", key);
            assert!(result.unwrap_err().to_string().contains(key));
        }
    }

    #[test]
    fn test_blank_required_value_rejected() {
        let env = base_env().with_var("PG_HOST", "   ");
        let result = load_config_with_env(&env);
        assert!(result.unwrap_err().to_string().contains("PG_HOST"));
    }

    #[test]
    fn test_empty_password_allowed() {
        let env = base_env().with_var("PG_PASSWORD", "");
        let config = load_config_with_env(&env).unwrap();
        assert_eq!(config.password.expose_secret(), "");
    }

    #[test]
    fn test_config_loading_invalid_port() {
        for val in ["not-a-port", "70000", "-1", "0", " 0 "] {
            let env = base_env().with_var("PG_PORT", val);
            let result = load_config_with_env(&env);
            assert!(result.is_err(), "Failed for value: {}", val);
            assert!(result.unwrap_err().to_string().contains("PG_PORT"));
        }
    }

    #[test]
    fn test_config_loading_invalid_timeout() {
        let env = base_env().with_var("FETCH_TIMEOUT_SECS", "soon");
        assert!(load_config_with_env(&env)
            .unwrap_err()
            .to_string()
            .contains("FETCH_TIMEOUT_SECS"));

        let env = base_env().with_var("FETCH_TIMEOUT_SECS", "0");
        assert!(load_config_with_env(&env)
            .unwrap_err()
            .to_string()
            .contains("FETCH_TIMEOUT_SECS"));
    }

    #[test]
    fn test_zero_poll_interval_means_single_poll() {
        let env = base_env().with_var("POLL_INTERVAL_SECS", "0");
        let config = load_config_with_env(&env).unwrap();
        assert_eq!(config.poll_interval, None);

        let env = base_env().with_var("POLL_INTERVAL_SECS", "often");
        assert!(load_config_with_env(&env).is_err());
    }

    #[test]
    fn test_numeric_parsing_with_invalid_values() {
        // Invalid pool size falls back to the default
        for val in ["invalid", "0", "-3"] {
            let env = base_env().with_var("MAX_CONNECTIONS", val);
            let config = load_config_with_env(&env).unwrap();
            assert_eq!(config.max_connections, 5, "Failed for value: {}", val);
        }
    }

    #[test]
    fn test_boolean_parsing() {
        for val in ["1", "true", "TRUE", "True"] {
            let env = base_env().with_var("SCAN_RATIO_REPORT_ALL", val);
            let config = load_config_with_env(&env).unwrap();
            assert_eq!(
                config.scan_ratio_policy,
                ScanRatioPolicy::AllOffenders,
                "Failed for value: {}",
                val
            );
        }

        for val in ["0", "false", "FALSE", "False", "no", "off", ""] {
            let env = base_env().with_var("SCAN_RATIO_REPORT_ALL", val);
            let config = load_config_with_env(&env).unwrap();
            assert_eq!(
                config.scan_ratio_policy,
                ScanRatioPolicy::FirstOffender,
                "Failed for value: {}",
                val
            );
        }
    }

    #[test]
    fn test_password_not_in_debug_output() {
        let config = load_config_with_env(&base_env()).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("s3cret"));
    }
}

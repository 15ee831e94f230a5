use std::env;
use std::time::Duration;

use crate::error::{PoolError, Result};

/// Default probe endpoints, tried in order
pub const DEFAULT_TEST_ENDPOINTS: &[&str] = &[
    "http://httpbin.org/ip",
    "https://api.ipify.org?format=json",
    "http://ip-api.com/json",
];

/// Pool configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum probes in flight during a pool-wide sweep
    pub max_concurrent_tests: usize,
    /// Timeout per endpoint attempt, in seconds
    pub test_timeout_seconds: u64,
    /// Minimum fail_count before quarantine is considered
    pub failure_threshold: i64,
    /// Minimum total samples before the failure rate is trusted
    pub min_sample_size: i64,
    /// Ordered probe endpoints; at least two independent ones
    pub test_endpoints: Vec<String>,
    /// Upper bound on records fetched for listing and sweeps
    pub list_limit: i64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tests: 10,
            test_timeout_seconds: 10,
            failure_threshold: 5,
            min_sample_size: 10,
            test_endpoints: DEFAULT_TEST_ENDPOINTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            list_limit: 1000,
        }
    }
}

impl PoolConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let test_endpoints = match env::var("POOL_TEST_ENDPOINTS") {
            Ok(raw) => {
                let endpoints: Vec<String> = raw
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                if endpoints.is_empty() {
                    return Err(PoolError::InvalidConfig(
                        "POOL_TEST_ENDPOINTS must list at least one endpoint".into(),
                    ));
                }
                endpoints
            }
            Err(_) => defaults.test_endpoints,
        };

        Ok(PoolConfig {
            max_concurrent_tests: parse_env("POOL_MAX_CONCURRENT_TESTS", 10)?,
            test_timeout_seconds: parse_env("POOL_TEST_TIMEOUT_SECONDS", 10)?,
            failure_threshold: parse_env("POOL_FAILURE_THRESHOLD", 5)?,
            min_sample_size: parse_env("POOL_MIN_SAMPLE_SIZE", 10)?,
            test_endpoints,
            list_limit: parse_env("POOL_LIST_LIMIT", 1000)?,
        })
    }

    /// Timeout for one endpoint attempt
    pub fn test_timeout(&self) -> Duration {
        Duration::from_secs(self.test_timeout_seconds)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| PoolError::InvalidConfig(format!("{} must be a valid number", key))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const CONFIG_ENV_KEYS: &[&str] = &[
        "POOL_MAX_CONCURRENT_TESTS",
        "POOL_TEST_TIMEOUT_SECONDS",
        "POOL_FAILURE_THRESHOLD",
        "POOL_MIN_SAMPLE_SIZE",
        "POOL_TEST_ENDPOINTS",
        "POOL_LIST_LIMIT",
    ];

    struct EnvGuard {
        saved: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new(keys: &[&str]) -> Self {
            let saved = keys
                .iter()
                .map(|&key| {
                    let old = env::var(key).ok();
                    env::remove_var(key);
                    (key.to_string(), old)
                })
                .collect();

            Self { saved }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in self.saved.drain(..) {
                match value {
                    Some(v) => env::set_var(key, v),
                    None => env::remove_var(key),
                }
            }
        }
    }

    #[test]
    fn test_config_defaults() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _guard = EnvGuard::new(CONFIG_ENV_KEYS);

        let config = PoolConfig::from_env().unwrap();

        assert_eq!(config.max_concurrent_tests, 10);
        assert_eq!(config.test_timeout_seconds, 10);
        assert_eq!(config.failure_threshold, 5);
        assert_eq!(config.min_sample_size, 10);
        assert_eq!(config.test_endpoints.len(), 3);
        assert_eq!(config.list_limit, 1000);
        assert_eq!(config.test_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_config_overrides() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _guard = EnvGuard::new(CONFIG_ENV_KEYS);

        env::set_var("POOL_MAX_CONCURRENT_TESTS", "25");
        env::set_var("POOL_TEST_TIMEOUT_SECONDS", "5");
        env::set_var(
            "POOL_TEST_ENDPOINTS",
            "http://a.example/ip, http://b.example/ip",
        );

        let config = PoolConfig::from_env().unwrap();

        assert_eq!(config.max_concurrent_tests, 25);
        assert_eq!(config.test_timeout_seconds, 5);
        assert_eq!(
            config.test_endpoints,
            vec![
                "http://a.example/ip".to_string(),
                "http://b.example/ip".to_string()
            ]
        );
    }

    #[test]
    fn test_config_invalid_number() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _guard = EnvGuard::new(CONFIG_ENV_KEYS);

        env::set_var("POOL_MAX_CONCURRENT_TESTS", "many");
        let err = PoolConfig::from_env().unwrap_err();
        assert!(matches!(err, PoolError::InvalidConfig(_)));
    }

    #[test]
    fn test_config_empty_endpoint_list() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _guard = EnvGuard::new(CONFIG_ENV_KEYS);

        env::set_var("POOL_TEST_ENDPOINTS", " , ");
        let err = PoolConfig::from_env().unwrap_err();
        assert!(matches!(err, PoolError::InvalidConfig(_)));
    }
}

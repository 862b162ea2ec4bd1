//! Application configuration

use std::env;
use std::time::Duration;

/// Which backend the stores run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    /// Instance-scoped in-memory maps. For development and tests only;
    /// nothing survives a restart.
    Memory,
}

/// Minimum composition policy for generated device secrets.
#[derive(Debug, Clone, Copy)]
pub struct SecretPolicy {
    pub length: usize,
    pub min_digits: usize,
    pub min_special: usize,
}

impl Default for SecretPolicy {
    fn default() -> Self {
        Self {
            length: 32,
            min_digits: 6,
            min_special: 6,
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub bind_address: String,
    pub max_request_body_bytes: usize,

    // Store
    pub store_backend: StoreBackend,
    pub redis_url: String,
    pub redis_ping_timeout: Duration,

    // Protocol
    pub share_code_ttl: Duration,
    pub module_ttl: Option<Duration>,
    pub secret_policy: SecretPolicy,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Server
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            max_request_body_bytes: env::var("MAX_REQUEST_BODY_BYTES")
                .unwrap_or_else(|_| "5242880".to_string()) // 5MB default
                .parse()
                .unwrap_or(5 * 1024 * 1024),

            // Store
            store_backend: match env::var("STORE_BACKEND").as_deref() {
                Ok("memory") => StoreBackend::Memory,
                Ok("redis") | Err(_) => StoreBackend::Redis,
                Ok(other) => return Err(ConfigError::UnknownBackend(other.to_string())),
            },
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            redis_ping_timeout: Duration::from_secs(
                env::var("REDIS_PING_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
            ),

            // Protocol
            share_code_ttl: Duration::from_secs(
                env::var("SHARE_CODE_TTL_SECS")
                    .unwrap_or_else(|_| "3600".to_string()) // one hour default
                    .parse()
                    .unwrap_or(3600),
            ),
            module_ttl: env::var("MODULE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs),
            secret_policy: {
                let policy = SecretPolicy {
                    length: env::var("SECRET_LENGTH")
                        .unwrap_or_else(|_| "32".to_string())
                        .parse()
                        .unwrap_or(32),
                    min_digits: env::var("SECRET_MIN_DIGITS")
                        .unwrap_or_else(|_| "6".to_string())
                        .parse()
                        .unwrap_or(6),
                    min_special: env::var("SECRET_MIN_SPECIAL")
                        .unwrap_or_else(|_| "6".to_string())
                        .parse()
                        .unwrap_or(6),
                };

                // A policy whose minimums exceed the length can never be satisfied
                if policy.min_digits + policy.min_special > policy.length {
                    return Err(ConfigError::InvalidSecretPolicy(
                        "SECRET_MIN_DIGITS + SECRET_MIN_SPECIAL must not exceed SECRET_LENGTH",
                    ));
                }
                if policy.length < 16 {
                    return Err(ConfigError::WeakSecretPolicy(
                        "SECRET_LENGTH must be at least 16 characters",
                    ));
                }

                policy
            },
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown store backend: {0}")]
    UnknownBackend(String),
    #[error("Invalid secret policy: {0}")]
    InvalidSecretPolicy(&'static str),
    #[error("Weak secret policy: {0}")]
    WeakSecretPolicy(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure config tests run serially (they modify shared env vars)
    static CONFIG_TEST_MUTEX: Mutex<()> = Mutex::new(());

    fn cleanup_config() {
        env::remove_var("STORE_BACKEND");
        env::remove_var("SECRET_LENGTH");
        env::remove_var("SECRET_MIN_DIGITS");
        env::remove_var("SECRET_MIN_SPECIAL");
        env::remove_var("SHARE_CODE_TTL_SECS");
    }

    #[test]
    fn test_defaults() {
        let _lock = CONFIG_TEST_MUTEX.lock().unwrap();
        cleanup_config();

        let config = Config::from_env().unwrap();
        assert_eq!(config.store_backend, StoreBackend::Redis);
        assert_eq!(config.share_code_ttl, Duration::from_secs(3600));
        assert_eq!(config.secret_policy.length, 32);
        assert_eq!(config.secret_policy.min_digits, 6);
        assert_eq!(config.secret_policy.min_special, 6);

        cleanup_config();
    }

    #[test]
    fn test_backend_selection() {
        let _lock = CONFIG_TEST_MUTEX.lock().unwrap();
        cleanup_config();

        env::set_var("STORE_BACKEND", "memory");
        let config = Config::from_env().unwrap();
        assert_eq!(config.store_backend, StoreBackend::Memory);

        env::set_var("STORE_BACKEND", "cassandra");
        let result = Config::from_env();
        assert!(matches!(result, Err(ConfigError::UnknownBackend(_))));

        cleanup_config();
    }

    #[test]
    fn test_secret_policy_validation() {
        let _lock = CONFIG_TEST_MUTEX.lock().unwrap();
        cleanup_config();

        // Minimums exceeding length are unsatisfiable
        env::set_var("SECRET_LENGTH", "16");
        env::set_var("SECRET_MIN_DIGITS", "10");
        env::set_var("SECRET_MIN_SPECIAL", "10");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::InvalidSecretPolicy(_))
        ));

        // Short lengths rejected outright
        env::set_var("SECRET_LENGTH", "8");
        env::set_var("SECRET_MIN_DIGITS", "2");
        env::set_var("SECRET_MIN_SPECIAL", "2");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::WeakSecretPolicy(_))
        ));

        cleanup_config();
    }
}

//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use std::time::Duration;

/// Controller-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
/// Environment variables are populated from a ConfigMap using `envFrom` in the deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Port for `/metrics`, `/healthz` and `/readyz`
    pub metrics_port: u16,
    /// How long to wait for the HTTP server to bind before giving up
    pub server_startup_timeout_secs: u64,
    /// Poll interval while waiting for the HTTP server
    pub server_poll_interval_ms: u64,
    /// Deadline for one reconciliation, covering store and listing calls
    pub reconcile_timeout_secs: u64,
    /// Per-request timeout of the listing HTTP client
    pub listing_http_timeout_secs: u64,
    /// Blob service endpoint; `{account}` is replaced with the storage account
    /// Point this at Azurite or a mock server for local testing
    pub blob_endpoint_template: String,
    /// Name of the secret holding the SAS token
    pub sas_secret_name: String,
    /// Key inside the SAS secret
    pub sas_secret_key: String,
    /// Fibonacci backoff lower bound (minutes)
    pub backoff_min_minutes: u64,
    /// Fibonacci backoff upper bound (minutes)
    pub backoff_max_minutes: u64,
    /// Maximum concurrent reconciliations
    pub max_concurrent_reconciliations: u16,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            metrics_port: DEFAULT_METRICS_PORT,
            server_startup_timeout_secs: DEFAULT_SERVER_STARTUP_TIMEOUT_SECS,
            server_poll_interval_ms: DEFAULT_SERVER_POLL_INTERVAL_MS,
            reconcile_timeout_secs: DEFAULT_RECONCILE_TIMEOUT_SECS,
            listing_http_timeout_secs: DEFAULT_LISTING_HTTP_TIMEOUT_SECS,
            blob_endpoint_template: DEFAULT_BLOB_ENDPOINT_TEMPLATE.to_string(),
            sas_secret_name: DEFAULT_SAS_SECRET_NAME.to_string(),
            sas_secret_key: DEFAULT_SAS_SECRET_KEY.to_string(),
            backoff_min_minutes: DEFAULT_BACKOFF_MIN_MINUTES,
            backoff_max_minutes: DEFAULT_BACKOFF_MAX_MINUTES,
            max_concurrent_reconciliations: DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Unparseable values fall back to the default for that key.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            metrics_port: parsed_or(&lookup, "METRICS_PORT", defaults.metrics_port),
            server_startup_timeout_secs: parsed_or(
                &lookup,
                "SERVER_STARTUP_TIMEOUT_SECS",
                defaults.server_startup_timeout_secs,
            ),
            server_poll_interval_ms: parsed_or(
                &lookup,
                "SERVER_POLL_INTERVAL_MS",
                defaults.server_poll_interval_ms,
            ),
            reconcile_timeout_secs: parsed_or(
                &lookup,
                "RECONCILE_TIMEOUT_SECS",
                defaults.reconcile_timeout_secs,
            ),
            listing_http_timeout_secs: parsed_or(
                &lookup,
                "LISTING_HTTP_TIMEOUT_SECS",
                defaults.listing_http_timeout_secs,
            ),
            blob_endpoint_template: lookup("BLOB_ENDPOINT_TEMPLATE")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.blob_endpoint_template),
            sas_secret_name: lookup("SAS_SECRET_NAME")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.sas_secret_name),
            sas_secret_key: lookup("SAS_SECRET_KEY")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.sas_secret_key),
            backoff_min_minutes: parsed_or(
                &lookup,
                "BACKOFF_MIN_MINUTES",
                defaults.backoff_min_minutes,
            ),
            backoff_max_minutes: parsed_or(
                &lookup,
                "BACKOFF_MAX_MINUTES",
                defaults.backoff_max_minutes,
            ),
            max_concurrent_reconciliations: parsed_or(
                &lookup,
                "MAX_CONCURRENT_RECONCILIATIONS",
                defaults.max_concurrent_reconciliations,
            ),
        }
    }

    /// Get reconciliation deadline
    #[must_use]
    pub fn reconcile_timeout(&self) -> Duration {
        Duration::from_secs(self.reconcile_timeout_secs)
    }

    /// Get listing HTTP timeout
    #[must_use]
    pub fn listing_http_timeout(&self) -> Duration {
        Duration::from_secs(self.listing_http_timeout_secs)
    }

    /// Get server startup timeout
    #[must_use]
    pub fn server_startup_timeout(&self) -> Duration {
        Duration::from_secs(self.server_startup_timeout_secs)
    }

    /// Get server readiness poll interval
    #[must_use]
    pub fn server_poll_interval(&self) -> Duration {
        Duration::from_millis(self.server_poll_interval_ms)
    }
}

/// Read a key and parse it, or return the default value
fn parsed_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Field manager used for every patch issued by the controller
pub const FIELD_MANAGER: &str = "file-picker-controller";

/// Name of the secret holding the SAS token, looked up in the resource namespace
pub const DEFAULT_SAS_SECRET_NAME: &str = "sas-token";

/// Key inside the SAS secret whose value is the token
pub const DEFAULT_SAS_SECRET_KEY: &str = "token";

/// Endpoint template for the Azure Blob service; `{account}` is substituted per request
pub const DEFAULT_BLOB_ENDPOINT_TEMPLATE: &str = "https://{account}.blob.core.windows.net";

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default HTTP server startup timeout (how long to wait for server to be ready)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Default HTTP server readiness poll interval
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Deadline for a single reconciliation (store reads, listing, store writes)
pub const DEFAULT_RECONCILE_TIMEOUT_SECS: u64 = 30;

/// Timeout applied by the shared HTTP client to each listing request
pub const DEFAULT_LISTING_HTTP_TIMEOUT_SECS: u64 = 20;

/// Fibonacci backoff lower bound for retryable errors (minutes)
pub const DEFAULT_BACKOFF_MIN_MINUTES: u64 = 1;

/// Fibonacci backoff upper bound for retryable errors (minutes)
pub const DEFAULT_BACKOFF_MAX_MINUTES: u64 = 10;

/// Maximum number of resources reconciled at the same time
pub const DEFAULT_MAX_CONCURRENT_RECONCILIATIONS: u16 = 10;

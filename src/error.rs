//! Crate-wide error type.
//!
//! Only two classes of failure ever reach a caller of the public surface:
//! - construction-time misconfiguration (reported by `load`, never by `get`)
//! - a collector that broke the fail-isolating contract
//!
//! A missing or expired identity record is NOT an error: it is the normal
//! trigger for recomputation and is represented as `None` by the store.

/// Result type alias using `FingerprintError`
pub type Result<T> = std::result::Result<T, FingerprintError>;

#[derive(thiserror::Error, Debug)]
pub enum FingerprintError {
    // ------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------
    #[error("configuration error: apiKey is required")]
    MissingApiKey,

    #[error("configuration error: {0}")]
    InvalidConfig(String),

    // ------------------------------------------------------------
    // Verification
    // ------------------------------------------------------------
    #[error("api key was rejected by the verification backend")]
    ApiKeyRejected,

    #[error("api key verification failed: {0}")]
    Verification(#[source] anyhow::Error),

    // ------------------------------------------------------------
    // Collection
    // ------------------------------------------------------------
    #[error("collector '{key}' failed: {source}")]
    CollectorFailed {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("collector '{key}' did not finish within {ms}ms")]
    Timeout { key: String, ms: u64 },

    // ------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------
    #[error("identity store error: {0}")]
    Store(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

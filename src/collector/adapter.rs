use serde_json::Value;

use crate::schema::SignalResult;

/// SignalCollector is the abstraction layer between:
/// - The generic collection runner
/// - One host capability (user agent, canvas, fonts, sensors, ...)
///
/// Each implementation must:
/// - Report a stable key
/// - Observe exactly one capability
/// - Turn "capability unavailable" into a `null` or error-describing value
///
/// Synchronous collectors implement `collect` without awaiting anything;
/// the runner treats both kinds the same way.
///
/// THREAD SAFETY:
/// - Must be Send + Sync
/// - Collector instances are shared across sessions via `Arc`
///
#[async_trait::async_trait]
pub trait SignalCollector: Send + Sync {
    /// Returns the signal key.
    ///
    /// CONTRACT:
    /// - Should be unique within a registry
    /// - Used for stable-subset selection and logging
    ///
    fn key(&self) -> &str;

    /// Observes the capability.
    ///
    /// IMPORTANT:
    /// - An unavailable capability is NOT an error: return `Value::Null`
    ///   or a short description instead
    /// - Returning `Err` breaks the fail-isolating contract; with the
    ///   default run options it fails the whole collection phase
    ///
    async fn collect(&self) -> anyhow::Result<Value>;

    /// Runs `collect` and tags the value with this collector's key.
    async fn produce(&self) -> anyhow::Result<SignalResult> {
        let value = self.collect().await?;
        Ok(SignalResult::new(self.key(), value))
    }
}

/// Converts a collector outcome into a result that never fails.
///
/// Errors become `"error: <message>"` string values.
pub fn fail_isolating(key: &str, outcome: anyhow::Result<Value>) -> SignalResult {
    match outcome {
        Ok(value) => SignalResult::new(key, value),
        Err(e) => SignalResult::new(key, error_sentinel(&e.to_string())),
    }
}

pub(crate) fn error_sentinel(message: &str) -> Value {
    Value::String(format!("error: {message}"))
}

/// Collector backed by a synchronous closure.
pub struct FnCollector<F> {
    key: String,
    f: F,
}

impl<F> FnCollector<F>
where
    F: Fn() -> anyhow::Result<Value> + Send + Sync,
{
    pub fn new(key: impl Into<String>, f: F) -> Self {
        Self { key: key.into(), f }
    }
}

#[async_trait::async_trait]
impl<F> SignalCollector for FnCollector<F>
where
    F: Fn() -> anyhow::Result<Value> + Send + Sync,
{
    fn key(&self) -> &str {
        &self.key
    }

    async fn collect(&self) -> anyhow::Result<Value> {
        (self.f)()
    }
}

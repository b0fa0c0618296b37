use futures_util::future::try_join_all;
use log::{debug, warn};
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use crate::{
    collector::adapter::{SignalCollector, error_sentinel, fail_isolating},
    collector::registry::CollectorRegistry,
    error::{FingerprintError, Result},
    metrics::METRICS,
    schema::SignalResult,
    util::{DeadlineElapsed, with_deadline},
};

/// Per-run knobs for the collection phase.
///
/// The default is the plain pipeline: no deadline, and a collector error
/// fails the whole run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Deadline applied to each collector individually
    pub timeout: Option<Duration>,

    /// Wrap each collector so an error or timeout becomes a sentinel value
    pub isolate_failures: bool,
}

/// Runs every registered collector concurrently.
///
/// GUARANTEES:
/// - All collectors are started before any of them is awaited
/// - The result list has the registry's length and key order,
///   whatever the completion order
///
/// FAILURE:
/// - Without `isolate_failures`, the first collector error (or timeout)
///   fails the run and the remaining collectors are dropped
/// - With `isolate_failures`, this function never fails
///
pub async fn collect_all(
    registry: &CollectorRegistry,
    opts: RunOptions,
) -> Result<Vec<SignalResult>> {
    METRICS.collections_run.fetch_add(1, Ordering::Relaxed);
    let started = Instant::now();

    let results = try_join_all(registry.iter().map(|c| run_one(c.as_ref(), opts))).await?;

    debug!(
        "collected {} signals in {:?}",
        results.len(),
        started.elapsed()
    );

    Ok(results)
}

/// Runs one collector, applying the deadline and failure policy.
async fn run_one(collector: &dyn SignalCollector, opts: RunOptions) -> Result<SignalResult> {
    let key = collector.key();

    let outcome = match opts.timeout {
        Some(limit) => match with_deadline(limit, collector.produce()).await {
            Ok(outcome) => outcome,
            Err(DeadlineElapsed { ms }) => {
                METRICS.collector_timeouts.fetch_add(1, Ordering::Relaxed);
                warn!("collector '{}' timed out after {}ms", key, ms);

                if opts.isolate_failures {
                    return Ok(SignalResult::new(
                        key,
                        error_sentinel(&format!("timeout after {ms}ms")),
                    ));
                }
                return Err(FingerprintError::Timeout {
                    key: key.to_string(),
                    ms,
                });
            }
        },
        None => collector.produce().await,
    };

    match outcome {
        Ok(result) => {
            debug!("collector '{}' done", key);
            Ok(result)
        }
        Err(e) => {
            METRICS.collector_failures.fetch_add(1, Ordering::Relaxed);
            warn!("collector '{}' raised instead of returning a sentinel: {}", key, e);

            if opts.isolate_failures {
                Ok(fail_isolating(key, Err(e)))
            } else {
                Err(FingerprintError::CollectorFailed {
                    key: key.to_string(),
                    source: e,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::FnCollector;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    /// Suspends for `delay_ms` before answering.
    struct Delayed {
        key: &'static str,
        delay_ms: u64,
        finished: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl SignalCollector for Delayed {
        fn key(&self) -> &str {
            self.key
        }

        async fn collect(&self) -> anyhow::Result<Value> {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            let order = self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(json!({ "finishedAs": order }))
        }
    }

    fn delayed(key: &'static str, delay_ms: u64, finished: &Arc<AtomicUsize>) -> Arc<dyn SignalCollector> {
        Arc::new(Delayed {
            key,
            delay_ms,
            finished: finished.clone(),
        })
    }

    #[tokio::test]
    async fn results_follow_registration_order_not_completion_order() {
        let finished = Arc::new(AtomicUsize::new(0));
        let reg = CollectorRegistry::new()
            .with(delayed("slow", 60, &finished))
            .with(delayed("medium", 30, &finished))
            .with(delayed("fast", 1, &finished));

        let out = collect_all(&reg, RunOptions::default()).await.unwrap();

        let keys: Vec<_> = out.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["slow", "medium", "fast"]);
        // fast finished first even though it is reported last
        assert_eq!(out[2].value, json!({ "finishedAs": 0 }));
        assert_eq!(out[0].value, json!({ "finishedAs": 2 }));
    }

    #[tokio::test]
    async fn collectors_run_concurrently() {
        let finished = Arc::new(AtomicUsize::new(0));
        let reg = CollectorRegistry::new()
            .with(delayed("a", 100, &finished))
            .with(delayed("b", 100, &finished))
            .with(delayed("c", 100, &finished));

        let started = Instant::now();
        collect_all(&reg, RunOptions::default()).await.unwrap();
        assert!(started.elapsed() < Duration::from_millis(280));
    }

    #[tokio::test]
    async fn raising_collector_fails_the_run_by_default() {
        let reg = CollectorRegistry::new()
            .with(Arc::new(FnCollector::new("ok", || Ok(json!(1)))))
            .with(Arc::new(FnCollector::new("broken", || Err(anyhow::anyhow!("boom")))));

        let err = collect_all(&reg, RunOptions::default()).await.unwrap_err();
        match err {
            FingerprintError::CollectorFailed { key, .. } => assert_eq!(key, "broken"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn isolated_run_keeps_length_and_order() {
        let reg = CollectorRegistry::new()
            .with(Arc::new(FnCollector::new("ok", || Ok(json!("v")))))
            .with(Arc::new(FnCollector::new("broken", || Err(anyhow::anyhow!("boom")))))
            .with(Arc::new(FnCollector::new("absent", || Ok(Value::Null))));

        let opts = RunOptions {
            isolate_failures: true,
            ..RunOptions::default()
        };
        let out = collect_all(&reg, opts).await.unwrap();

        assert_eq!(out.len(), 3);
        assert_eq!(out[0], SignalResult::new("ok", "v"));
        assert_eq!(out[1], SignalResult::new("broken", "error: boom"));
        assert_eq!(out[2], SignalResult::new("absent", Value::Null));
    }

    #[tokio::test]
    async fn timeout_fails_or_isolates() {
        let finished = Arc::new(AtomicUsize::new(0));
        let reg = CollectorRegistry::new()
            .with(delayed("hangs", 5_000, &finished))
            .with(delayed("quick", 1, &finished));

        let strict = RunOptions {
            timeout: Some(Duration::from_millis(20)),
            isolate_failures: false,
        };
        assert!(matches!(
            collect_all(&reg, strict).await,
            Err(FingerprintError::Timeout { ms: 20, .. })
        ));

        let lenient = RunOptions {
            timeout: Some(Duration::from_millis(20)),
            isolate_failures: true,
        };
        let out = collect_all(&reg, lenient).await.unwrap();
        assert_eq!(out[0], SignalResult::new("hangs", "error: timeout after 20ms"));
        assert_eq!(out[1].key, "quick");
    }

    #[tokio::test]
    async fn empty_registry_yields_empty_list() {
        let out = collect_all(&CollectorRegistry::new(), RunOptions::default())
            .await
            .unwrap();
        assert!(out.is_empty());
    }
}

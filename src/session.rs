use log::{debug, info, warn};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::sync::{Mutex, OnceCell};

use crate::{
    collector::{CollectorRegistry, RunOptions, SystemHost, collect_all, host_registry},
    config::{Config, SessionSettings},
    error::{FingerprintError, Result},
    hasher::hash_values,
    metrics::METRICS,
    schema::{SignalResult, VisitorPayload},
    selector::stable_values,
    store::{IdentityStore, MemoryJar, RecordJar},
    util::{Clock, SystemClock},
    verify::{HttpVerifier, KeyVerifier, StubVerifier},
};

/// ============================================================
/// FingerprintSession
/// ============================================================
///
/// Top-level facade wiring registry, runner, selector, hasher and
/// identity store behind `get()`.
///
/// STATES:
/// - A session only exists once its configuration validated; there is
///   no half-built session
///
/// get():
/// - cache hit:  the stored identifier, `fromCookie: true`, nothing runs
/// - cache miss: collect -> select -> hash -> write, with all components
///
/// CONCURRENCY:
/// - The read-check-then-write sequence runs under an in-flight latch, so
///   concurrent callers on one session compute at most once; the others
///   wait and then observe the freshly written record
pub struct FingerprintSession {
    settings: SessionSettings,
    registry: CollectorRegistry,
    store: IdentityStore,
    verifier: Arc<dyn KeyVerifier>,
    verified: OnceCell<()>,
    in_flight: Mutex<()>,
}

impl FingerprintSession {
    /// Builds a session over the local host with an in-memory record jar.
    ///
    /// Fails synchronously on invalid configuration, before any
    /// collector could run.
    pub fn load(config: &Config) -> Result<Self> {
        Ok(Self::builder(config)?.build())
    }

    /// Validates `config` and returns a builder for injecting
    /// collaborators.
    pub fn builder(config: &Config) -> Result<SessionBuilder> {
        Ok(SessionBuilder {
            settings: config.validate()?,
            registry: None,
            jar: None,
            verifier: None,
            clock: None,
        })
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn registry(&self) -> &CollectorRegistry {
        &self.registry
    }

    pub fn store(&self) -> &IdentityStore {
        &self.store
    }

    /// Returns the visitor identity, from the record when one is live.
    pub async fn get(&self) -> Result<VisitorPayload> {
        self.ensure_verified().await?;

        let _latch = self.in_flight.lock().await;

        if let Some(visitor_id) = self.read_record() {
            METRICS.cache_hits.fetch_add(1, Ordering::Relaxed);
            info!("identity record '{}' hit", self.store.name());
            return Ok(VisitorPayload::cached(visitor_id));
        }

        METRICS.cache_misses.fetch_add(1, Ordering::Relaxed);
        info!("identity record '{}' missing, collecting", self.store.name());

        let components = self.collect().await?;
        let visitor_id = hash_values(&stable_values(&components));

        if let Err(e) = self.store.write(&visitor_id, self.settings.record_days) {
            warn!("identity record could not be written: {}", e);
        }

        let payload = VisitorPayload::computed(visitor_id, components);
        if self.settings.debug_log {
            debug!("payload: {}", serde_json::to_string(&payload).unwrap_or_default());
        }
        Ok(payload)
    }

    /// Runs the collection phase alone.
    pub async fn collect(&self) -> Result<Vec<SignalResult>> {
        collect_all(&self.registry, self.run_options()).await
    }

    /// Expires the stored identity so the next `get()` recomputes.
    pub async fn reset(&self) -> Result<()> {
        let _latch = self.in_flight.lock().await;
        self.store.clear()
    }

    fn run_options(&self) -> RunOptions {
        RunOptions {
            timeout: self.settings.collector_timeout,
            isolate_failures: self.settings.isolate_failures,
        }
    }

    /// An unreadable jar counts as a miss.
    fn read_record(&self) -> Option<String> {
        match self.store.read() {
            Ok(v) => v,
            Err(e) => {
                warn!("identity record could not be read: {}", e);
                None
            }
        }
    }

    /// Verifies the API key once per session.
    async fn ensure_verified(&self) -> Result<()> {
        self.verified
            .get_or_try_init(|| async {
                match self.verifier.verify(&self.settings.api_key).await {
                    Ok(true) => Ok(()),
                    Ok(false) => Err(FingerprintError::ApiKeyRejected),
                    Err(e) => Err(FingerprintError::Verification(e)),
                }
            })
            .await?;
        Ok(())
    }
}

/// Injects collaborators into a session. Anything not set falls back to
/// the `load` defaults.
pub struct SessionBuilder {
    settings: SessionSettings,
    registry: Option<CollectorRegistry>,
    jar: Option<Arc<dyn RecordJar>>,
    verifier: Option<Arc<dyn KeyVerifier>>,
    clock: Option<Arc<dyn Clock>>,
}

impl SessionBuilder {
    pub fn registry(mut self, registry: CollectorRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn jar(mut self, jar: Arc<dyn RecordJar>) -> Self {
        self.jar = Some(jar);
        self
    }

    pub fn verifier(mut self, verifier: Arc<dyn KeyVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> FingerprintSession {
        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock),
        };
        let jar: Arc<dyn RecordJar> = match self.jar {
            Some(jar) => jar,
            None => Arc::new(MemoryJar::new(clock.clone())),
        };
        let registry = self
            .registry
            .unwrap_or_else(|| host_registry(Arc::new(SystemHost)));
        let verifier: Arc<dyn KeyVerifier> = match (self.verifier, &self.settings.verify_url) {
            (Some(verifier), _) => verifier,
            (None, Some(url)) => Arc::new(HttpVerifier::new(url.clone())),
            (None, None) => Arc::new(StubVerifier),
        };

        if !self.settings.domains.is_empty() {
            debug!(
                "{} replication domains configured (not used by the pipeline)",
                self.settings.domains.len()
            );
        }

        METRICS.sessions_loaded.fetch_add(1, Ordering::Relaxed);
        debug!(
            "session ready: record '{}', {} collectors",
            self.settings.record_name,
            registry.len()
        );

        FingerprintSession {
            store: IdentityStore::new(self.settings.record_name.clone(), jar, clock),
            settings: self.settings,
            registry,
            verifier,
            verified: OnceCell::new(),
            in_flight: Mutex::new(()),
        }
    }
}

//! Reference collectors over an explicit host capability provider.
//!
//! Collectors never read ambient globals directly: every capability goes
//! through a `HostProvider`, so tests (and embedders) can substitute it.

use serde_json::{Value, json};
use std::sync::Arc;

use super::adapter::SignalCollector;
use super::registry::CollectorRegistry;

/// Read-only view of the host environment.
///
/// Every method returns `None` when the capability cannot be observed.
pub trait HostProvider: Send + Sync {
    fn user_agent(&self) -> Option<String>;
    fn hardware_concurrency(&self) -> Option<usize>;
    fn device_memory_gb(&self) -> Option<f64>;
    fn language(&self) -> Option<String>;
    fn platform(&self) -> Option<String>;
    fn timezone(&self) -> Option<String>;
    fn color_depth(&self) -> Option<u32>;
    fn pixel_ratio(&self) -> Option<f64>;
}

/// Host provider backed by the local process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHost;

impl SystemHost {
    fn env(name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.trim().is_empty())
    }
}

impl HostProvider for SystemHost {
    fn user_agent(&self) -> Option<String> {
        Some(format!(
            "{}/{} ({}; {})",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            std::env::consts::OS,
            std::env::consts::ARCH
        ))
    }

    fn hardware_concurrency(&self) -> Option<usize> {
        std::thread::available_parallelism().ok().map(|n| n.get())
    }

    // No portable source without extra system crates.
    fn device_memory_gb(&self) -> Option<f64> {
        None
    }

    fn language(&self) -> Option<String> {
        // "en_US.UTF-8" -> "en-US"
        Self::env("LC_ALL")
            .or_else(|| Self::env("LANG"))
            .map(|raw| {
                raw.split('.')
                    .next()
                    .unwrap_or_default()
                    .replace('_', "-")
            })
            .filter(|l| !l.is_empty() && l != "C" && l != "POSIX")
    }

    fn platform(&self) -> Option<String> {
        Some(format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH))
    }

    fn timezone(&self) -> Option<String> {
        Self::env("TZ")
    }

    fn color_depth(&self) -> Option<u32> {
        Self::env("COLORTERM")
            .filter(|v| v == "truecolor" || v == "24bit")
            .map(|_| 24)
    }

    fn pixel_ratio(&self) -> Option<f64> {
        None
    }
}

/// Capabilities exposed by `HostProvider`, one collector each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostSignal {
    UserAgent,
    HardwareConcurrency,
    DeviceMemory,
    Language,
    ColorDepth,
    PixelRatio,
    Platform,
    Timezone,
}

impl HostSignal {
    pub const ALL: [HostSignal; 8] = [
        HostSignal::UserAgent,
        HostSignal::HardwareConcurrency,
        HostSignal::DeviceMemory,
        HostSignal::Language,
        HostSignal::ColorDepth,
        HostSignal::PixelRatio,
        HostSignal::Platform,
        HostSignal::Timezone,
    ];

    pub fn key(self) -> &'static str {
        match self {
            HostSignal::UserAgent => "userAgent",
            HostSignal::HardwareConcurrency => "hardwareConcurrency",
            HostSignal::DeviceMemory => "deviceMemory",
            HostSignal::Language => "language",
            HostSignal::ColorDepth => "colorDepth",
            HostSignal::PixelRatio => "pixelRatio",
            HostSignal::Platform => "platform",
            HostSignal::Timezone => "timezone",
        }
    }

    fn read(self, host: &dyn HostProvider) -> Value {
        let v = match self {
            HostSignal::UserAgent => host.user_agent().map(Value::from),
            HostSignal::HardwareConcurrency => host.hardware_concurrency().map(Value::from),
            HostSignal::DeviceMemory => host.device_memory_gb().map(|gb| json!(gb)),
            HostSignal::Language => host.language().map(Value::from),
            HostSignal::ColorDepth => host.color_depth().map(Value::from),
            HostSignal::PixelRatio => host.pixel_ratio().map(|r| json!(r)),
            HostSignal::Platform => host.platform().map(Value::from),
            HostSignal::Timezone => host.timezone().map(Value::from),
        };
        v.unwrap_or(Value::Null)
    }
}

/// Collector reading one `HostSignal` from a shared provider.
///
/// Never fails: an unobservable capability is reported as `null`.
pub struct HostCollector {
    signal: HostSignal,
    host: Arc<dyn HostProvider>,
}

impl HostCollector {
    pub fn new(signal: HostSignal, host: Arc<dyn HostProvider>) -> Self {
        Self { signal, host }
    }
}

#[async_trait::async_trait]
impl SignalCollector for HostCollector {
    fn key(&self) -> &str {
        self.signal.key()
    }

    async fn collect(&self) -> anyhow::Result<Value> {
        Ok(self.signal.read(self.host.as_ref()))
    }
}

/// Registers one collector per host capability, in `HostSignal::ALL` order.
pub fn host_registry(host: Arc<dyn HostProvider>) -> CollectorRegistry {
    let mut registry = CollectorRegistry::new();
    for signal in HostSignal::ALL {
        registry.register(Arc::new(HostCollector::new(signal, host.clone())));
    }
    registry
}

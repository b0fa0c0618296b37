/// Collector module
///
/// This module groups everything that produces signals:
/// - The `SignalCollector` capability (adapter)
/// - The ordered collector registry
/// - The concurrent collection runner
/// - Reference collectors over a host capability provider
///
/// Design notes:
/// - Capability-specific logic MUST NOT live in the runner
/// - The runner only knows about keys, values and failure policy
pub mod adapter;
pub mod host;
pub mod registry;
pub mod runner;

pub use adapter::{FnCollector, SignalCollector, fail_isolating};
pub use host::{HostCollector, HostProvider, HostSignal, SystemHost, host_registry};
pub use registry::CollectorRegistry;
pub use runner::{RunOptions, collect_all};

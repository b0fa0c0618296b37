// ------------------------------------------------------------
// Module declarations
// ------------------------------------------------------------
//
// Each module represents a well-defined responsibility:
//
// - config:    Session configuration and validation
// - error:     Crate error type
// - schema:    Signal results and the get() payload
// - util:      Clock, HTTP-date and deadline helpers
// - collector: Collector capability, registry and concurrent runner
// - selector:  Stable subset selection
// - hasher:    Visitor identifier hash
// - store:     Identity record persistence
// - verify:    API key verification
// - session:   The public facade
// - metrics:   Process-wide counters
//
pub mod collector;
pub mod config;
pub mod error;
pub mod hasher;
pub mod metrics;
pub mod schema;
pub mod selector;
pub mod session;
pub mod store;
pub mod util;
pub mod verify;

pub use collector::{CollectorRegistry, FnCollector, HostProvider, SignalCollector};
pub use config::Config;
pub use error::{FingerprintError, Result};
pub use schema::{SignalResult, VisitorPayload};
pub use session::{FingerprintSession, SessionBuilder};

/// Validates `config` and builds a session over the local host.
pub fn load(config: &Config) -> Result<FingerprintSession> {
    FingerprintSession::load(config)
}

//! Identity persistence.
//!
//! `IdentityStore` owns one record name and reads/writes it through a
//! `RecordJar`. Records are never updated in place: every write fully
//! replaces the previous record.

pub mod jar;
pub mod record;

use chrono::{DateTime, Duration, Utc};
use log::info;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use crate::error::{FingerprintError, Result};
use crate::metrics::METRICS;
use crate::util::Clock;

pub use jar::{FileJar, MemoryJar, RecordJar};
pub use record::{encode_record, find_value, parse_record};

pub struct IdentityStore {
    name: String,
    jar: Arc<dyn RecordJar>,
    clock: Arc<dyn Clock>,
}

impl IdentityStore {
    pub fn new(name: impl Into<String>, jar: Arc<dyn RecordJar>, clock: Arc<dyn Clock>) -> Self {
        Self {
            name: name.into(),
            jar,
            clock,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the live value for this record name, if any.
    ///
    /// Absence (never written, expired, cleared, empty value) is `Ok(None)`.
    pub fn read(&self) -> Result<Option<String>> {
        let collection = self.jar.records()?;
        Ok(find_value(&collection, &self.name).filter(|v| !v.is_empty()))
    }

    /// Persists `value` for `lifetime_days` from now.
    ///
    /// Fails without touching the jar when the expiry is not representable.
    pub fn write(&self, value: &str, lifetime_days: u32) -> Result<()> {
        let expires = Duration::try_days(i64::from(lifetime_days))
            .and_then(|lifetime| self.clock.now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                FingerprintError::Store(format!(
                    "record lifetime of {lifetime_days} days overflows the expiry date"
                ))
            })?;
        self.jar.store(&encode_record(&self.name, value, expires))?;

        METRICS.records_written.fetch_add(1, Ordering::Relaxed);
        info!("identity record '{}' written, expires {}", self.name, expires);
        Ok(())
    }

    /// Expires the record immediately.
    pub fn clear(&self) -> Result<()> {
        self.jar
            .store(&encode_record(&self.name, "", DateTime::<Utc>::UNIX_EPOCH))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::ManualClock;
    use chrono::TimeZone;

    fn setup() -> (IdentityStore, Arc<ManualClock>, Arc<MemoryJar>) {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 10, 16, 0, 0, 0).unwrap()));
        let jar = Arc::new(MemoryJar::new(clock.clone()));
        let store = IdentityStore::new("smbfjs_id", jar.clone(), clock.clone());
        (store, clock, jar)
    }

    #[test]
    fn write_then_read_returns_the_value() {
        let (store, _, _) = setup();
        assert_eq!(store.read().unwrap(), None);

        store.write("-10626487", 365).unwrap();
        assert_eq!(store.read().unwrap().as_deref(), Some("-10626487"));
    }

    #[test]
    fn values_needing_encoding_round_trip() {
        let (store, _, jar) = setup();
        store.write("a b;c=d", 1).unwrap();
        assert_eq!(jar.records().unwrap(), "smbfjs_id=a%20b%3Bc%3Dd");
        assert_eq!(store.read().unwrap().as_deref(), Some("a b;c=d"));
    }

    #[test]
    fn write_replaces_previous_record() {
        let (store, _, jar) = setup();
        store.write("first", 365).unwrap();
        store.write("second", 365).unwrap();
        assert_eq!(jar.records().unwrap(), "smbfjs_id=second");
    }

    #[test]
    fn record_expires_after_lifetime() {
        let (store, clock, _) = setup();
        store.write("abc", 2).unwrap();

        clock.advance(Duration::days(1));
        assert!(store.read().unwrap().is_some());

        clock.advance(Duration::days(1));
        assert_eq!(store.read().unwrap(), None);
    }

    #[test]
    fn clear_removes_the_record() {
        let (store, _, _) = setup();
        store.write("abc", 365).unwrap();
        store.clear().unwrap();
        assert_eq!(store.read().unwrap(), None);
    }

    #[test]
    fn unrepresentable_expiry_is_an_error() {
        let (store, _, jar) = setup();
        assert!(matches!(store.write("abc", u32::MAX), Err(FingerprintError::Store(_))));
        assert_eq!(jar.records().unwrap(), "");
    }

    #[test]
    fn empty_value_counts_as_absent() {
        let (store, _, jar) = setup();
        jar.store("smbfjs_id=").unwrap();
        assert_eq!(store.read().unwrap(), None);
    }

    #[test]
    fn other_records_are_left_alone() {
        let (store, _, jar) = setup();
        jar.store("theme=dark").unwrap();
        store.write("abc", 365).unwrap();
        assert_eq!(jar.records().unwrap(), "theme=dark; smbfjs_id=abc");
    }
}

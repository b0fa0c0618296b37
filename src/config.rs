use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{FingerprintError, Result};

pub const DEFAULT_RECORD_NAME: &str = "smbfjs_id";
pub const DEFAULT_RECORD_DAYS: u32 = 365;
pub const DEFAULT_STORE_PATH: &str = "smbfjs.cookies";

/// Upper bound for `cookieDays` (400 years)
pub const MAX_RECORD_DAYS: u32 = 146_000;

// ------------------------------------------------------------
// Root configuration
// ------------------------------------------------------------
//
// This is the shape accepted by `FingerprintSession::load`, and the
// top-level structure of `config.json` for the demo binary.
//
// Only `apiKey` is required. Everything else has a default.
//
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Credential passed to the verification backend.
    ///
    /// Never logged.
    pub api_key: Option<String>,

    /// Name of the persisted identity record
    #[serde(default = "default_record_name")]
    pub cookie_name: String,

    /// Lifetime of the persisted identity record, in days
    #[serde(default = "default_record_days")]
    pub cookie_days: u32,

    /// Reserved for cross-domain replication.
    ///
    /// Accepted and kept, but not consumed by the pipeline.
    #[serde(default)]
    pub domains: Vec<String>,

    /// Optional per-collector deadline in milliseconds
    pub collector_timeout_ms: Option<u64>,

    /// Convert collector errors into sentinel values instead of
    /// failing the whole collection phase
    #[serde(default)]
    pub isolate_collector_failures: bool,

    /// Optional HTTP endpoint used to verify `apiKey`
    pub verify_url: Option<String>,

    /// Record file used by the demo binary
    pub store_path: Option<String>,

    /// Optional debug configuration
    pub debug: Option<DebugConfig>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DebugConfig {
    /// Dumps every computed payload at debug level
    pub log: Option<bool>,
}

fn default_record_name() -> String {
    DEFAULT_RECORD_NAME.to_string()
}

fn default_record_days() -> u32 {
    DEFAULT_RECORD_DAYS
}

// ------------------------------------------------------------
// Validated settings
// ------------------------------------------------------------
//
// What a session actually runs with. Produced only by
// `Config::validate`, so holding one means construction succeeded.
//
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub api_key: String,
    pub record_name: String,
    pub record_days: u32,
    pub domains: Vec<String>,
    pub collector_timeout: Option<Duration>,
    pub isolate_failures: bool,
    pub verify_url: Option<String>,
    pub debug_log: bool,
}

impl Config {
    /// Builds a configuration holding only the required credential.
    pub fn with_api_key(key: impl Into<String>) -> Self {
        Self {
            api_key: Some(key.into()),
            cookie_name: default_record_name(),
            cookie_days: DEFAULT_RECORD_DAYS,
            ..Self::default()
        }
    }

    pub fn from_json(data: &str) -> Result<Self> {
        serde_json::from_str(data).map_err(|e| FingerprintError::InvalidConfig(e.to_string()))
    }

    /// Reads a JSON configuration file from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// Checks the configuration and freezes it into `SessionSettings`.
    ///
    /// FAILS WHEN:
    /// - `apiKey` is absent or blank
    /// - `cookieName` cannot be used as a record name
    /// - `cookieDays` is zero or above `MAX_RECORD_DAYS`
    ///
    pub fn validate(&self) -> Result<SessionSettings> {
        let api_key = match self.api_key.as_deref().map(str::trim) {
            Some(k) if !k.is_empty() => k.to_string(),
            _ => return Err(FingerprintError::MissingApiKey),
        };

        if !is_valid_record_name(&self.cookie_name) {
            return Err(FingerprintError::InvalidConfig(format!(
                "cookieName '{}' is not a valid record name",
                self.cookie_name
            )));
        }

        if self.cookie_days == 0 {
            return Err(FingerprintError::InvalidConfig(
                "cookieDays must be greater than zero".into(),
            ));
        }

        if self.cookie_days > MAX_RECORD_DAYS {
            return Err(FingerprintError::InvalidConfig(format!(
                "cookieDays must not exceed {MAX_RECORD_DAYS}"
            )));
        }

        Ok(SessionSettings {
            api_key,
            record_name: self.cookie_name.clone(),
            record_days: self.cookie_days,
            domains: self.domains.clone(),
            collector_timeout: self.collector_timeout_ms.map(Duration::from_millis),
            isolate_failures: self.isolate_collector_failures,
            verify_url: self.verify_url.clone(),
            debug_log: self.debug.as_ref().is_some_and(|d| d.log.unwrap_or(false)),
        })
    }
}

/// Record names end up on the left of `name=value` inside a `; `
/// separated collection.
fn is_valid_record_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_graphic() && !matches!(c, '=' | ';' | ','))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_fields_are_missing() {
        let cfg = Config::from_json(r#"{ "apiKey": "k-123" }"#).unwrap();
        let s = cfg.validate().unwrap();
        assert_eq!(s.api_key, "k-123");
        assert_eq!(s.record_name, "smbfjs_id");
        assert_eq!(s.record_days, 365);
        assert!(s.domains.is_empty());
        assert!(s.collector_timeout.is_none());
        assert!(!s.isolate_failures);
    }

    #[test]
    fn missing_api_key_is_fatal() {
        let cfg = Config::from_json("{}").unwrap();
        assert!(matches!(cfg.validate(), Err(FingerprintError::MissingApiKey)));
    }

    #[test]
    fn blank_api_key_is_fatal() {
        let cfg = Config::with_api_key("   ");
        assert!(matches!(cfg.validate(), Err(FingerprintError::MissingApiKey)));
    }

    #[test]
    fn rejects_bad_record_name_and_zero_days() {
        let mut cfg = Config::with_api_key("k");
        cfg.cookie_name = "a;b".into();
        assert!(matches!(cfg.validate(), Err(FingerprintError::InvalidConfig(_))));

        let mut cfg = Config::with_api_key("k");
        cfg.cookie_days = 0;
        assert!(matches!(cfg.validate(), Err(FingerprintError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_record_lifetime_past_the_bound() {
        let mut cfg = Config::with_api_key("k");
        cfg.cookie_days = u32::MAX;
        assert!(matches!(cfg.validate(), Err(FingerprintError::InvalidConfig(_))));

        cfg.cookie_days = MAX_RECORD_DAYS;
        assert_eq!(cfg.validate().unwrap().record_days, MAX_RECORD_DAYS);
    }

    #[test]
    fn reads_optional_fields() {
        let cfg = Config::from_json(
            r#"{
                "apiKey": "k",
                "cookieName": "vid",
                "cookieDays": 7,
                "domains": ["a.example", "b.example"],
                "collectorTimeoutMs": 250,
                "isolateCollectorFailures": true,
                "debug": { "log": true }
            }"#,
        )
        .unwrap();
        let s = cfg.validate().unwrap();
        assert_eq!(s.record_name, "vid");
        assert_eq!(s.record_days, 7);
        assert_eq!(s.domains.len(), 2);
        assert_eq!(s.collector_timeout, Some(Duration::from_millis(250)));
        assert!(s.isolate_failures);
        assert!(s.debug_log);
    }

    #[test]
    fn from_file_reads_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "apiKey": "file-key" }"#).unwrap();
        let cfg = Config::from_file(&path).unwrap();
        assert_eq!(cfg.api_key.as_deref(), Some("file-key"));
    }
}

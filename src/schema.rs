use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single observed signal.
///
/// Produced once per collector invocation and never mutated afterwards.
///
/// CONTRACT:
/// - `key` identifies the collector that produced it
/// - `value` is `null` or an error description when the collector could
///   not observe its capability
///
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SignalResult {
    pub key: String,
    pub value: Value,
}

impl SignalResult {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

// ------------------------------------------------------------
// get() payload
// ------------------------------------------------------------
//
// Wire shape returned by `FingerprintSession::get`:
//
//   cache hit:  { "visitorId": "...", "fromCookie": true }
//   cache miss: { "visitorId": "...", "components": [ ... ] }
//
// Absent fields are omitted rather than serialized as null.
//
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VisitorPayload {
    pub visitor_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_cookie: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<SignalResult>>,
}

impl VisitorPayload {
    pub fn cached(visitor_id: String) -> Self {
        Self {
            visitor_id,
            from_cookie: Some(true),
            components: None,
        }
    }

    pub fn computed(visitor_id: String, components: Vec<SignalResult>) -> Self {
        Self {
            visitor_id,
            from_cookie: None,
            components: Some(components),
        }
    }

    pub fn is_from_cookie(&self) -> bool {
        self.from_cookie.unwrap_or(false)
    }
}

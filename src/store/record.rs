//! Textual record encoding.
//!
//! One record:      `name=value; expires=<HTTP-date>; path=/; SameSite=Lax`
//! The collection:  `a=1; b=2` (live records only, no attributes)
//!
//! Values are percent-encoded on write and decoded on read.

use chrono::{DateTime, Utc};

use crate::util::{http_date, parse_http_date};

/// A record as stored by a jar: name, still-encoded value, expiry.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub name: String,
    pub raw_value: String,
    pub expires: Option<DateTime<Utc>>,
    pub line: String,
}

impl StoredRecord {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_none_or(|at| at > now)
    }
}

/// Builds the record line written for the identity.
pub fn encode_record(name: &str, value: &str, expires: DateTime<Utc>) -> String {
    format!(
        "{}={}; expires={}; path=/; SameSite=Lax",
        name,
        urlencoding::encode(value),
        http_date(expires)
    )
}

/// Parses one record line. Attributes other than `expires` are kept
/// verbatim in `line` but otherwise ignored.
pub fn parse_record(line: &str) -> Option<StoredRecord> {
    let mut parts = line.split(';');
    let (name, raw_value) = parts.next()?.trim().split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let expires = parts
        .filter_map(|attr| attr.trim().split_once('='))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("expires"))
        .and_then(|(_, v)| parse_http_date(v));

    Some(StoredRecord {
        name: name.to_string(),
        raw_value: raw_value.trim().to_string(),
        expires,
        line: line.trim().to_string(),
    })
}

/// Looks `name` up in a `; ` separated collection and decodes its value.
///
/// Whitespace around separators is trimmed. A value that fails to
/// decode is returned as stored.
pub fn find_value(collection: &str, name: &str) -> Option<String> {
    collection
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| k.trim() == name)
        .map(|(_, v)| {
            let v = v.trim();
            urlencoding::decode(v)
                .map(|d| d.into_owned())
                .unwrap_or_else(|_| v.to_string())
        })
}

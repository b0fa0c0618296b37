/// Utility helpers shared by the store, the runner and the session.
///
/// This module contains:
/// - The clock abstraction used for record expiry
/// - HTTP-date formatting and parsing for record `expires` attributes
/// - A generic deadline wrapper for suspending operations
///
/// IMPORTANT:
/// - No pipeline logic should live here.
/// - Everything in this module must remain lightweight and deterministic
///   (given a deterministic clock).
///
use chrono::{DateTime, Duration as ChronoDuration, NaiveDateTime, Utc};
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

/// Format used by the `expires` attribute: `Thu, 01 Jan 1970 00:00:00 GMT`
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Source of "now" for expiry computations.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
///
/// Used to exercise record expiry without sleeping.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: ChronoDuration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Formats a timestamp as an HTTP-date.
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format(HTTP_DATE_FORMAT).to_string()
}

/// Parses an HTTP-date produced by `http_date`.
///
/// Returns `None` for anything else; callers treat that as "no expiry".
pub fn parse_http_date(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw.trim(), HTTP_DATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Error returned by `with_deadline` when the deadline elapses first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineElapsed {
    pub ms: u64,
}

/// Runs `fut` with a deadline.
///
/// Not part of the default pipeline: the runner only applies it when a
/// collector timeout is configured.
pub async fn with_deadline<F, T>(limit: Duration, fut: F) -> Result<T, DeadlineElapsed>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(limit, fut).await.map_err(|_| DeadlineElapsed {
        ms: limit.as_millis() as u64,
    })
}

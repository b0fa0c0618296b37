use log::debug;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use super::record::{StoredRecord, parse_record};
use crate::error::{FingerprintError, Result};
use crate::util::Clock;

/// The host's ambient per-origin record collection.
///
/// Mirrors the semantics of a browser cookie jar:
/// - `records` returns every live record as `name=value` joined by `; `
/// - `store` takes one full record line and replaces any record with the
///   same name; a line whose `expires` is already past deletes it
pub trait RecordJar: Send + Sync {
    fn records(&self) -> Result<String>;
    fn store(&self, line: &str) -> Result<()>;
}

// ------------------------------------------------------------
// Shared jar semantics
// ------------------------------------------------------------

fn apply(records: &mut Vec<StoredRecord>, line: &str, now: DateTime<Utc>) -> Result<()> {
    let incoming = parse_record(line)
        .ok_or_else(|| FingerprintError::Store(format!("malformed record line: {line}")))?;

    records.retain(|r| r.name != incoming.name && r.is_live(now));
    if incoming.is_live(now) {
        records.push(incoming);
    }
    Ok(())
}

fn render(records: &[StoredRecord], now: DateTime<Utc>) -> String {
    records
        .iter()
        .filter(|r| r.is_live(now))
        .map(|r| format!("{}={}", r.name, r.raw_value))
        .collect::<Vec<_>>()
        .join("; ")
}

// ------------------------------------------------------------
// In-memory jar
// ------------------------------------------------------------

/// In-process jar. Records live as long as the jar.
pub struct MemoryJar {
    records: Mutex<Vec<StoredRecord>>,
    clock: Arc<dyn Clock>,
}

impl MemoryJar {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            clock,
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<StoredRecord>>> {
        self.records
            .lock()
            .map_err(|_| FingerprintError::Store("record jar lock poisoned".into()))
    }
}

impl RecordJar for MemoryJar {
    fn records(&self) -> Result<String> {
        let records = self.lock()?;
        Ok(render(&records, self.clock.now()))
    }

    fn store(&self, line: &str) -> Result<()> {
        let mut records = self.lock()?;
        apply(&mut records, line, self.clock.now())
    }
}

// ------------------------------------------------------------
// File-backed jar
// ------------------------------------------------------------

/// Jar persisted as one record line per text line.
///
/// Lets an identifier outlive the process. A missing file is an empty
/// jar; unparseable lines are dropped on the next write.
pub struct FileJar {
    path: PathBuf,
    clock: Arc<dyn Clock>,
    write_lock: Mutex<()>,
}

impl FileJar {
    pub fn new(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            clock,
            write_lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<Vec<StoredRecord>> {
        match fs::read_to_string(&self.path) {
            Ok(data) => Ok(data.lines().filter_map(parse_record).collect()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl RecordJar for FileJar {
    fn records(&self) -> Result<String> {
        Ok(render(&self.load()?, self.clock.now()))
    }

    fn store(&self, line: &str) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| FingerprintError::Store("record file lock poisoned".into()))?;

        let mut records = self.load()?;
        apply(&mut records, line, self.clock.now())?;

        let mut out = records
            .iter()
            .map(|r| r.line.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        out.push('\n');
        fs::write(&self.path, out)?;

        debug!("record file {} now holds {} records", self.path.display(), records.len());
        Ok(())
    }
}

//! Monotonic id allocation
//!
//! Each numeric kind hands out ids from one counter that only moves
//! forward. The last id handed out is also kept in a `.sequence` file in
//! the kind directory, so deleting the highest record and restarting does
//! not bring its id back.

use crate::fsio;
use crate::report::LoadReport;
use geocat_common::Result;
use std::io::ErrorKind;
use std::path::Path;

/// High-water mark file inside a kind directory
pub(crate) const SEQUENCE_FILE: &str = ".sequence";

/// Per-kind id counter.
///
/// Not synchronized on its own: stores keep it inside their mutation lock.
/// Once `u64::MAX` has been handed out or observed the counter is
/// exhausted and hands out nothing more.
#[derive(Debug)]
pub struct IdAllocator {
    next: Option<u64>,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator {
    /// Allocator of an empty kind, starting at 1
    #[must_use]
    pub const fn new() -> Self {
        Self { next: Some(1) }
    }

    /// Move past `max_observed`. Never moves backwards.
    pub fn seed(&mut self, max_observed: u64) {
        self.next = match (self.next, max_observed.checked_add(1)) {
            (Some(next), Some(past)) => Some(next.max(past)),
            _ => None,
        };
    }

    /// Hand out the next id, `None` once the id space is used up
    pub fn next_id(&mut self) -> Option<u64> {
        let id = self.next?;
        self.next = id.checked_add(1);
        Some(id)
    }

    /// The id the next call to [`next_id`](Self::next_id) returns
    #[must_use]
    pub const fn peek(&self) -> Option<u64> {
        self.next
    }

    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.next.is_none()
    }
}

/// Read the persisted high-water mark of a kind directory
pub(crate) fn read_high_water(dir: &Path, report: &mut LoadReport) -> Option<u64> {
    let path = dir.join(SEQUENCE_FILE);
    match fsio::read(&path) {
        Ok(bytes) => {
            let parsed = std::str::from_utf8(&bytes)
                .ok()
                .and_then(|s| s.trim().parse::<u64>().ok());
            if parsed.is_none() {
                report.skip(&path, "unreadable sequence high-water mark");
            }
            parsed
        }
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => {
            report.skip(&path, format!("cannot read sequence file: {e}"));
            None
        }
    }
}

/// Persist the last id handed out
pub(crate) fn write_high_water(dir: &Path, value: u64, sync: bool) -> Result<()> {
    fsio::write_atomic(&dir.join(SEQUENCE_FILE), value.to_string().as_bytes(), sync)
}

use std::sync::{Mutex, PoisonError};

use log::Record;

use super::level_name;

#[derive(Debug, Clone, PartialEq, Eq)]
struct SeenRecord {
    module: Option<String>,
    // `CRITICAL` and `ERROR` share a `log` level, but they're different records.
    level: &'static str,
    message: String,
}

/// Drops a record if it's the same as the one right before it.
///
/// Network errors in particular love to come in bursts of the exact same thing,
/// and nobody needs twenty identical emails.
#[derive(Debug, Default)]
pub struct DuplicateFilter {
    last: Mutex<Option<SeenRecord>>,
}

impl DuplicateFilter {
    /// Returns `true` if this record should go through, and remembers it.
    pub fn admit(&self, record: &Record) -> bool {
        let seen = SeenRecord {
            module: record.module_path().map(str::to_owned),
            level: level_name(record),
            message: record.args().to_string(),
        };

        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if last.as_ref() == Some(&seen) {
            return false;
        }
        *last = Some(seen);
        true
    }
}

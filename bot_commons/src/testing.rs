//! Log capture for tests.
#![allow(clippy::unwrap_used)]

use std::{cell::RefCell, sync::Once};

use log::{Level, LevelFilter, Log, Metadata, Record};

thread_local! {
    static RECORDS: RefCell<Vec<(String, Level, String)>> = const { RefCell::new(Vec::new()) };
}

/// Keeps records per thread, so that tests running in parallel don't see each other's.
struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        RECORDS.with(|records| {
            records.borrow_mut().push((
                record.target().to_string(),
                record.level(),
                record.args().to_string(),
            ))
        });
    }

    fn flush(&self) {}
}

static CAPTURE: CaptureLogger = CaptureLogger;

/// Start capturing logs on this thread, forgetting anything captured so far.
pub fn capture_logs() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        log::set_logger(&CAPTURE).unwrap();
        log::set_max_level(LevelFilter::Trace);
    });
    RECORDS.with(|records| records.borrow_mut().clear());
}

/// Everything logged on this thread since [`capture_logs`], as `(target, level, message)`.
pub fn logged() -> Vec<(String, Level, String)> {
    RECORDS.with(|records| records.borrow().clone())
}

//! The logger factory.
//!
//! There is exactly one global [`log`] logger, a [`BotLogger`]. It fans records out to
//! the console, and in production also to a size-rotating log file and to email alerts.
//! Every record passes a [`DuplicateFilter`] first.

mod duplicate;
mod email;
mod rotating;

pub use duplicate::DuplicateFilter;
pub use email::*;
pub use rotating::*;

use std::{
    path::PathBuf,
    sync::{Mutex, PoisonError},
};

use log::{Level, LevelFilter, Log, Metadata, Record};

/// Target of records made by [`critical!`](crate::critical). Only these get emailed.
pub const CRITICAL_TARGET: &str = "critical";

/// Console filter in development unless `RUST_LOG` says otherwise.
/// HTTP clients are way too chatty on `info`.
pub const DEVELOPMENT_FILTER: &str = "info,hyper=warn,hyper_util=warn,reqwest=warn";

/// Console filter in production unless `RUST_LOG` says otherwise.
pub const PRODUCTION_FILTER: &str = "error";

/// Lowest level that makes it into the log file.
const FILE_LEVEL: Level = Level::Error;

/// Which set of log sinks to build.
#[derive(Debug, Clone)]
pub enum LoggerConfig {
    /// Console only.
    Development,
    /// Console, rotating log file and email alerts on critical records.
    Production {
        log_file: PathBuf,
        alerts: SmtpAlertConfig,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("failed to open log file {}: {source}", .path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to set up email alerts: {0}")]
    Alerts(#[from] AlertError),
    #[error("failed to start the email alert thread: {0}")]
    AlertThread(#[source] std::io::Error),
    #[error("failed to build the async runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Human name of the level of this record, the way it shows up in files and emails.
pub fn level_name(record: &Record) -> &'static str {
    match record.level() {
        Level::Error if record.target() == CRITICAL_TARGET => "CRITICAL",
        Level::Error => "ERROR",
        Level::Warn => "WARNING",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}

pub struct BotLogger {
    console: Box<dyn Log>,
    console_filter: LevelFilter,
    duplicates: DuplicateFilter,
    file: Option<Mutex<RotatingFile>>,
    alerts: Option<EmailAlerts>,
}

impl BotLogger {
    /// Build the sinks described by `config`.
    ///
    /// # Errors
    ///
    /// Errors if the log file can't be opened or the SMTP transport can't be set up.
    pub fn new(config: LoggerConfig) -> Result<Self, InitError> {
        match config {
            LoggerConfig::Development => {
                let (console, console_filter) = console_logger(DEVELOPMENT_FILTER);
                Ok(Self::from_parts(console, console_filter, None, None))
            }
            LoggerConfig::Production { log_file, alerts } => {
                let (console, console_filter) = console_logger(PRODUCTION_FILTER);

                let file = RotatingFile::open(&log_file, MAX_BYTES, BACKUP_COUNT).map_err(
                    |source| InitError::LogFile {
                        path: log_file.clone(),
                        source,
                    },
                )?;
                let alerts = EmailAlerts::new(SmtpAlertTransport::new(&alerts)?)
                    .map_err(InitError::AlertThread)?;

                Ok(Self::from_parts(
                    console,
                    console_filter,
                    Some(file),
                    Some(alerts),
                ))
            }
        }
    }

    pub fn from_parts(
        console: Box<dyn Log>,
        console_filter: LevelFilter,
        file: Option<RotatingFile>,
        alerts: Option<EmailAlerts>,
    ) -> Self {
        Self {
            console,
            console_filter,
            duplicates: DuplicateFilter::default(),
            file: file.map(Mutex::new),
            alerts,
        }
    }

    /// The most verbose level any of the sinks is interested in.
    pub fn max_level(&self) -> LevelFilter {
        if self.file.is_some() || self.alerts.is_some() {
            self.console_filter.max(FILE_LEVEL.to_level_filter())
        } else {
            self.console_filter
        }
    }

    fn wants_file(&self, metadata: &Metadata) -> bool {
        self.file.is_some() && metadata.level() <= FILE_LEVEL
    }

    fn wants_alert(&self, metadata: &Metadata) -> bool {
        self.alerts.is_some()
            && metadata.level() == Level::Error
            && metadata.target() == CRITICAL_TARGET
    }
}

impl Log for BotLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.console.enabled(metadata) || self.wants_file(metadata) || self.wants_alert(metadata)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) || !self.duplicates.admit(record) {
            return;
        }

        self.console.log(record);

        if let Some(file) = &self.file {
            if self.wants_file(record.metadata()) {
                // Formatting may panic, and the panic hook logs. Never hold the lock over it.
                let line = format_plain(record);
                let mut file = file.lock().unwrap_or_else(PoisonError::into_inner);
                if let Err(e) = file.write_line(&line) {
                    // Can't exactly log that we failed to log lol
                    eprintln!("Failed to write to the log file: {e}");
                }
            }
        }

        if let Some(alerts) = &self.alerts {
            if self.wants_alert(record.metadata()) {
                alerts.alert(record);
            }
        }
    }

    fn flush(&self) {
        self.console.flush();
        if let Some(file) = &self.file {
            let _ = file
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .flush();
        }
        if let Some(alerts) = &self.alerts {
            alerts.flush();
        }
    }
}

/// Colored console logger, with timestamps unless we run as a systemd service
/// (journald timestamps everything already).
fn console_logger(default_filter: &str) -> (Box<dyn Log>, LevelFilter) {
    let filters = std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.to_string());

    let running_as_systemd_service = std::env::var_os("JOURNAL_STREAM").is_some();

    let mut builder = match running_as_systemd_service {
        true => pretty_env_logger::formatted_builder(),
        false => pretty_env_logger::formatted_timed_builder(),
    };

    builder.parse_filters(&filters);

    let logger = builder.build();
    let filter = logger.filter();
    (Box::new(logger), filter)
}

/// Build the logger described by `config` and install it as the global one.
///
/// # Errors
///
/// Errors if building the logger fails. Installing it twice is only
/// complained about, since the first one is still there and working.
pub fn init(config: LoggerConfig) -> Result<(), InitError> {
    let logger = BotLogger::new(config)?;
    let max_level = logger.max_level();

    if log::set_boxed_logger(Box::new(logger)).is_err() {
        log::error!("Tried to init logger twice!");
        return Ok(());
    }
    log::set_max_level(max_level);

    Ok(())
}

/// Make panics go through the logger as critical records, backtrace included,
/// before the previously installed hook runs.
pub fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        crate::critical!("Encountered an uncaught panic: {info}\n\n{backtrace}");
        log::logger().flush();
        previous(info);
    }));
}

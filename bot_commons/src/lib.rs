//! This create houses common for me functions, because some things
//! are just boilerplate and aaAAAAAAAAA

use std::future::Future;

pub mod logging;
pub mod retry;
pub mod useful_methods;

pub use logging::{InitError, LoggerConfig};
pub use retry::{Retry, RetryError};

// Re-exported so that [`critical!`] works in crates that don't depend on `log` themselves.
#[doc(hidden)]
pub use log;

/// Log a record that is bad enough to wake somebody up.
///
/// `log` has no level above `error`, so these are `error` records with the
/// [`logging::CRITICAL_TARGET`] target. In production those get emailed.
#[macro_export]
macro_rules! critical {
    ($($arg:tt)+) => {
        $crate::log::error!(target: $crate::logging::CRITICAL_TARGET, $($arg)+)
    };
}

/// Initialize logging and run the `closure` to completion in an async runtime.
///
/// Logging is set up according to `logging`, see [`logging::init`]. Console
/// output goes through the crate [pretty_env_logger][] and can be overridden
/// by environment variable `RUST_LOG`. Panics are logged as critical too.
///
/// # Errors
///
/// Errors if the logger can't be set up or the runtime can't be built, or
/// whatever the `closure` itself errors with.
///
/// [pretty_env_logger]: https://docs.rs/pretty_env_logger
pub fn start_everything<T, E>(
    logging: LoggerConfig,
    closure: impl Future<Output = Result<T, E>>,
) -> Result<T, E>
where
    E: From<InitError>,
{
    logging::init(logging)?;
    logging::install_panic_hook();

    log::info!("hi");

    let result = block_on(closure);

    log::logger().flush();

    result
}

fn block_on<T, E>(closure: impl Future<Output = Result<T, E>>) -> Result<T, E>
where
    E: From<InitError>,
{
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(InitError::Runtime)?
        .block_on(closure)
}

#[cfg(test)]
mod testing;

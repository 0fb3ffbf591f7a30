//! Source code for the media only topic bot. It sits in a forum group chat and deletes
//! every message in one specific topic that doesn't have a photo, video or the like in it.

/// Various types used throughout.
pub mod types;

/// Settings from the environment.
pub mod settings;
pub use settings::{Settings, SettingsError};

/// Miscellaneous functions.
mod misc;

/// Functions that perform stuff via the bot.
pub mod actions;

/// Functions that handle events from Telegram.
pub mod handlers;

/// Entry function that starts the bot.
mod entry;
pub use entry::*;

#[cfg(test)]
mod testing;

use bot_commons::{InitError, RetryError};
use teloxide::RequestError;

/// Anything that can stop the bot before it gets going.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Init(#[from] InitError),
    #[error("could not log in: {0}")]
    Login(#[source] RetryError<RequestError>),
}

use std::future::Future;

use bot_commons::{
    critical,
    useful_methods::{is_transient, CriticalErrorHandler},
    Retry,
};
use teloxide::{
    dptree::deps,
    error_handlers::LoggingErrorHandler,
    prelude::*,
    requests::Request,
    types::{AllowedUpdate, Me},
    update_listeners::Polling,
    RequestError,
};

use crate::{settings::Settings, StartupError};

/// Ask telegram who we are, which also checks that the token is any good.
async fn log_in<F, Fut>(get_me: F) -> Result<Me, StartupError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Me, RequestError>>,
{
    Retry::telegram()
        .run_if(is_transient, get_me)
        .await
        .map_err(|e| {
            critical!("Could not log in: {e}");
            StartupError::Login(e)
        })
}

/// Run the bot until it's told to stop.
///
/// # Errors
///
/// Errors if we can't log in.
pub async fn entry(settings: Settings) -> Result<(), StartupError> {
    let bot = Bot::new(settings.bot_token().expose());

    let me = log_in(|| bot.get_me().send()).await?;

    let target = settings.target();
    log::info!(
        "Logged in as @{}, watching topic {} in chat {}",
        me.username(),
        target.thread_id.0 .0,
        target.chat_id
    );

    let handler = Update::filter_message().endpoint(crate::handlers::handle_message);

    let listener = Polling::builder(bot.clone())
        .allowed_updates(vec![AllowedUpdate::Message])
        .delete_webhook()
        .await
        .build();

    log::info!("Starting bot...");

    Dispatcher::builder(bot, handler)
        .default_handler(|_| async {})
        .dependencies(deps![target])
        .error_handler(CriticalErrorHandler::with_custom_text(
            "Error while handling a message",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("Error from the update listener"),
        )
        .await;

    log::info!("it appears we have been bonked.");

    Ok(())
}

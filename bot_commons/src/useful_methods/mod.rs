use std::{fmt::Display, future::Future, sync::Arc};

use futures::future::BoxFuture;
use teloxide::{
    error_handlers::ErrorHandler,
    requests::Requester,
    types::{ChatId, MessageId},
    ApiError, Bot, RequestError,
};

pub trait BotStuff {
    /// Delete a message, not caring if someone else already did.
    ///
    /// Returns `Ok(false)` if the message was already gone.
    fn delete_message_if_exists(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> impl Future<Output = Result<bool, RequestError>> + Send;
}

impl BotStuff for Bot {
    async fn delete_message_if_exists(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<bool, RequestError> {
        match self.delete_message(chat_id, message_id).await {
            Ok(_) => Ok(true),
            Err(RequestError::Api(
                ApiError::MessageIdInvalid | ApiError::MessageToDeleteNotFound,
            )) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// `true` for errors that tend to go away if you just try again a bit later.
pub fn is_transient(error: &RequestError) -> bool {
    matches!(
        error,
        RequestError::Network(_) | RequestError::RetryAfter(_)
    )
}

/// Like teloxide's `LoggingErrorHandler`, but logs through [`critical!`](crate::critical),
/// so that in production someone actually hears about it.
pub struct CriticalErrorHandler {
    text: String,
}

impl CriticalErrorHandler {
    pub fn with_custom_text(text: impl Into<String>) -> Arc<Self> {
        Arc::new(Self { text: text.into() })
    }
}

impl<E: Display> ErrorHandler<E> for CriticalErrorHandler {
    fn handle_error(self: Arc<Self>, error: E) -> BoxFuture<'static, ()> {
        crate::critical!("{}: {}", self.text, error);
        Box::pin(async {})
    }
}

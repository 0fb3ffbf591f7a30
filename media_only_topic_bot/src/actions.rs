use std::future::Future;

use bot_commons::{
    useful_methods::{is_transient, BotStuff},
    Retry, RetryError,
};
use teloxide::{
    types::{ChatId, Message, MessageId},
    Bot, RequestError,
};

use crate::misc::sender_name_prettyprint;

/// Something that can delete messages. [`Bot`] in the real world.
pub trait MessageRemover {
    /// Delete the message. `Ok(false)` if it was already gone.
    fn remove_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> impl Future<Output = Result<bool, RequestError>> + Send;
}

impl MessageRemover for Bot {
    async fn remove_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<bool, RequestError> {
        self.delete_message_if_exists(chat_id, message_id).await
    }
}

/// Delete a message that has no business being in the topic, and log that we did.
///
/// Network hiccups and rate limits are retried, everything else is returned.
pub async fn delete_off_topic_message<R: MessageRemover>(
    remover: &R,
    message: &Message,
) -> Result<(), RequestError> {
    let removed = Retry::telegram()
        .run_if(is_transient, || {
            remover.remove_message(message.chat.id, message.id)
        })
        .await
        .map_err(RetryError::into_inner)?;

    if removed {
        log::info!(
            "Deleted message {} from user {}",
            message.id.0,
            sender_name_prettyprint(message)
        );
    } else {
        // Someone else probably has already deleted it. That's fine.
        log::warn!("Message {} was already deleted", message.id.0);
    }

    Ok(())
}

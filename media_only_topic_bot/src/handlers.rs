use teloxide::{types::Message, Bot, RequestError};

use crate::{
    actions::{delete_off_topic_message, MessageRemover},
    types::{MessageTraits, TopicTarget, Verdict},
};

pub async fn handle_message(
    bot: Bot,
    message: Message,
    target: TopicTarget,
) -> Result<(), RequestError> {
    moderate(&bot, &target, &message).await?;
    Ok(())
}

/// Decide what to do with `message`, and do it.
pub async fn moderate<R: MessageRemover>(
    remover: &R,
    target: &TopicTarget,
    message: &Message,
) -> Result<Verdict, RequestError> {
    let verdict = Verdict::of(target, &MessageTraits::of(message));

    match verdict {
        Verdict::Ignore => {}
        Verdict::Keep(media) => log::debug!("Keeping message {} with a {media}", message.id.0),
        Verdict::Delete => delete_off_topic_message(remover, message).await?,
    }

    Ok(verdict)
}

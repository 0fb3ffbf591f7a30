use teloxide::types::{Chat, Message, User};

/// Tries to print the user in the prettiest way possible, with either `@username` or full name.
#[must_use]
pub fn user_name_prettyprint(user: &User) -> String {
    if let Some(username) = &user.username {
        format!("@{username}")
    } else {
        user.full_name()
    }
}

/// Tries to print the chat name in the prettiest way possible, with either `@username` or chat
/// title.
#[must_use]
pub fn chat_name_prettyprint(chat: &Chat) -> String {
    if let Some(username) = chat.username() {
        format!("@{username}")
    } else if let Some(title) = chat.title() {
        title.to_string()
    } else {
        chat.id.to_string()
    }
}

/// Name of whoever sent this message, for the logs. Empty if there's nobody to name.
///
/// Anonymous admins and channels come with `from` set to a placeholder bot,
/// so the sender chat takes priority.
#[must_use]
pub fn sender_name_prettyprint(message: &Message) -> String {
    if let Some(chat) = &message.sender_chat {
        chat_name_prettyprint(chat)
    } else if let Some(user) = &message.from {
        user_name_prettyprint(user)
    } else {
        String::new()
    }
}

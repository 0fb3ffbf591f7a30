use std::fmt::Display;

use teloxide::types::{ChatId, Message, MessageEntityKind, ThreadId};

/// Kinds of media that are allowed to stay in the topic. Anything else gets deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllowedMedia {
    Photo,
    Video,
    Animation,
    Document,
    VideoNote,
    Story,
    Sticker,
}

impl AllowedMedia {
    pub const ALL: [AllowedMedia; 7] = [
        AllowedMedia::Photo,
        AllowedMedia::Video,
        AllowedMedia::Animation,
        AllowedMedia::Document,
        AllowedMedia::VideoNote,
        AllowedMedia::Story,
        AllowedMedia::Sticker,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AllowedMedia::Photo => "photo",
            AllowedMedia::Video => "video",
            AllowedMedia::Animation => "animation",
            AllowedMedia::Document => "document",
            AllowedMedia::VideoNote => "video note",
            AllowedMedia::Story => "story",
            AllowedMedia::Sticker => "sticker",
        }
    }

    /// True if `message` carries this kind of media.
    pub fn is_in(self, message: &Message) -> bool {
        match self {
            // An empty list of sizes is no photo at all.
            AllowedMedia::Photo => message.photo().is_some_and(|sizes| !sizes.is_empty()),
            AllowedMedia::Video => message.video().is_some(),
            AllowedMedia::Animation => message.animation().is_some(),
            AllowedMedia::Document => message.document().is_some(),
            AllowedMedia::VideoNote => message.video_note().is_some(),
            AllowedMedia::Story => message.story().is_some(),
            AllowedMedia::Sticker => message.sticker().is_some(),
        }
    }

    /// The first allowed kind of media found in `message`, if any.
    pub fn find_in(message: &Message) -> Option<Self> {
        Self::ALL.into_iter().find(|media| media.is_in(message))
    }
}

impl Display for AllowedMedia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A topic inside of a forum group chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicTarget {
    pub chat_id: ChatId,
    pub thread_id: ThreadId,
}

/// The parts of a message that decide what happens to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageTraits {
    pub chat_id: ChatId,
    pub thread_id: Option<ThreadId>,
    pub is_topic_message: bool,
    /// Starts with a bot command, like `/start`.
    pub is_command: bool,
    pub media: Option<AllowedMedia>,
}

impl MessageTraits {
    pub fn of(message: &Message) -> Self {
        Self {
            chat_id: message.chat.id,
            thread_id: message.thread_id,
            is_topic_message: message.is_topic_message,
            is_command: message.entities().is_some_and(|entities| {
                entities
                    .iter()
                    .any(|e| e.offset == 0 && e.kind == MessageEntityKind::BotCommand)
            }),
            media: AllowedMedia::find_in(message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Not in our topic or a command, none of our business.
    Ignore,
    /// In our topic, and has media in it.
    Keep(AllowedMedia),
    /// In our topic, without any media. Goes away.
    Delete,
}

impl Verdict {
    pub fn of(target: &TopicTarget, message: &MessageTraits) -> Self {
        // Replies to messages outside of a topic still carry a thread ID,
        // so `is_topic_message` has to be checked too.
        let in_topic = message.chat_id == target.chat_id
            && message.is_topic_message
            && message.thread_id == Some(target.thread_id);

        match (in_topic && !message.is_command, message.media) {
            (false, _) => Verdict::Ignore,
            (true, Some(media)) => Verdict::Keep(media),
            (true, None) => Verdict::Delete,
        }
    }
}

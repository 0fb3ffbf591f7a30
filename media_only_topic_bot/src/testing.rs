//! Bits for tests: fake messages, a fake remover and a way to look at logs.
#![allow(clippy::unwrap_used)]

use std::{
    cell::RefCell,
    sync::{Mutex, Once},
};

use log::{LevelFilter, Log, Metadata, Record};
use serde_json::{json, Value};
use teloxide::{
    types::{ChatId, Message, MessageId},
    RequestError,
};

use crate::actions::MessageRemover;

pub const CHAT_ID: i64 = -1001234567890;
pub const THREAD_ID: i32 = 789;
pub const MESSAGE_ID: i32 = 12345;

fn base_message(chat_id: i64, thread_id: Option<i32>, is_topic_message: bool) -> Value {
    let mut message = json!({
        "message_id": MESSAGE_ID,
        "date": 1700000000,
        "chat": {
            "id": chat_id,
            "type": "supergroup",
            "title": "Art dump",
            "is_forum": true
        },
        "from": {
            "id": 1111,
            "is_bot": false,
            "first_name": "Test",
            "username": "test_user"
        }
    });
    if let Some(thread_id) = thread_id {
        message["message_thread_id"] = json!(thread_id);
    }
    if is_topic_message {
        message["is_topic_message"] = json!(true);
    }
    message
}

fn parse(message: Value) -> Message {
    serde_json::from_value(message).unwrap()
}

pub fn text_message(chat_id: i64, thread_id: Option<i32>, is_topic_message: bool) -> Message {
    let mut message = base_message(chat_id, thread_id, is_topic_message);
    message["text"] = json!("hello");
    parse(message)
}

/// A message in our topic that starts with `command`.
pub fn command_message(command: &str) -> Message {
    let mut message = base_message(CHAT_ID, Some(THREAD_ID), true);
    message["text"] = json!(format!("{command} please"));
    message["entities"] = json!([{
        "type": "bot_command",
        "offset": 0,
        "length": command.encode_utf16().count()
    }]);
    parse(message)
}

/// A message in our topic, with `media` under the `field` key.
pub fn media_message(field: &str, media: Value) -> Message {
    let mut message = base_message(CHAT_ID, Some(THREAD_ID), true);
    message[field] = media;
    parse(message)
}

/// Same as [`text_message`] in our topic, with `from` swapped out.
pub fn message_from(from: Option<Value>) -> Message {
    let mut message = base_message(CHAT_ID, Some(THREAD_ID), true);
    message["text"] = json!("hello");
    match from {
        Some(from) => message["from"] = from,
        None => {
            message.as_object_mut().unwrap().remove("from");
        }
    }
    parse(message)
}

/// Remembers what it was asked to delete. Always succeeds.
#[derive(Debug, Default)]
pub struct RecordingRemover {
    pub calls: Mutex<Vec<(ChatId, MessageId)>>,
}

impl RecordingRemover {
    pub fn calls(&self) -> Vec<(ChatId, MessageId)> {
        self.calls.lock().unwrap().clone()
    }
}

impl MessageRemover for RecordingRemover {
    async fn remove_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<bool, RequestError> {
        self.calls.lock().unwrap().push((chat_id, message_id));
        Ok(true)
    }
}

thread_local! {
    static LINES: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Keeps log lines per thread, so that tests running in parallel don't see each other's.
struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        LINES.with(|lines| {
            lines
                .borrow_mut()
                .push(format!("{} {}", record.level(), record.args()))
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
    LINES.with(|lines| lines.borrow_mut().clear());
}

/// Everything logged on this thread since [`capture_logs`], as `"LEVEL message"`.
pub fn logged() -> Vec<String> {
    LINES.with(|lines| lines.borrow().clone())
}

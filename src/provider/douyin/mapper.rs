use chrono::Utc;
use log::warn;
use prost::Message;

use super::messages::{ChatMessage, CommonMessage};
use crate::{ChatEvent, MessageKind};

/// Message methods this client decodes. Everything else flows through the
/// `Other` arm with the raw message preserved; new platform message types
/// get a variant here instead of another string branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageMethod {
    Chat,
    Other,
}

impl From<&str> for MessageMethod {
    fn from(method: &str) -> Self {
        match method {
            "WebcastChatMessage" => MessageMethod::Chat,
            _ => MessageMethod::Other,
        }
    }
}

/// Converts one raw message into a normalized chat event.
///
/// A chat payload that fails nested decode, or carries no user, degrades to
/// the `Other` branch with the raw message kept, so one broken message
/// never interrupts the stream.
pub fn map_message(msg: CommonMessage) -> ChatEvent {
    let now = Utc::now().timestamp_millis();

    match MessageMethod::from(msg.method.as_str()) {
        MessageMethod::Chat => match ChatMessage::decode(msg.payload.as_slice()) {
            Ok(ChatMessage {
                user: Some(user),
                content,
                ..
            }) => ChatEvent {
                timestamp: now,
                user_name: user.nick_name,
                content,
                kind: MessageKind::Danmaku,
                color: "ffffff".to_string(),
                raw: None,
            },
            Ok(_) => {
                warn!("Chat message without user, keeping raw");
                other_event(now, msg)
            }
            Err(e) => {
                warn!("Failed to decode chat payload, keeping raw: {e}");
                other_event(now, msg)
            }
        },
        MessageMethod::Other => other_event(now, msg),
    }
}

fn other_event(timestamp: i64, msg: CommonMessage) -> ChatEvent {
    ChatEvent {
        timestamp,
        user_name: String::new(),
        content: String::new(),
        kind: MessageKind::Other,
        color: String::new(),
        raw: Some(msg),
    }
}

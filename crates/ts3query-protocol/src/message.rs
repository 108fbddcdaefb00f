//! Chat messages pushed by `notifytextmessage`.

use regex::Captures;
use serde::Serialize;
use ts3query_core::TargetMode;

use crate::codec::unescape;
use crate::patterns::MESSAGE_PUSH;

/// One chat line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Raw `targetmode` value.
    pub target_mode: i64,
    /// Message text as sent on the wire, still escaped.
    pub msg: String,
    /// Receiving client for private messages.
    pub target: Option<i64>,
    pub invoker_id: i64,
    pub invoker_name: String,
    pub invoker_uid: String,
    /// Unescaped message text.
    pub content: String,
}

impl Message {
    pub(crate) fn from_captures(caps: &Captures<'_>) -> Self {
        let text = |name: &str| caps.name(name).map_or("", |m| m.as_str());
        let number = |name: &str| text(name).parse::<i64>().unwrap_or_default();
        let msg = text("msg").to_string();

        Self {
            target_mode: number("targetmode"),
            content: unescape(&msg),
            msg,
            target: caps.name("target").and_then(|m| m.as_str().parse().ok()),
            invoker_id: number("invokerid"),
            invoker_name: unescape(text("invokername")),
            invoker_uid: unescape(text("invokeruid")),
        }
    }

    /// Parses one `notifytextmessage` line.
    pub fn parse(line: &str) -> Option<Self> {
        MESSAGE_PUSH.captures(line).map(|caps| Self::from_captures(&caps))
    }

    /// Where the message was sent, when the mode is known.
    pub fn source(&self) -> Option<TargetMode> {
        TargetMode::from_id(self.target_mode)
    }

    /// Returns true for private (client to client) messages.
    pub fn is_private(&self) -> bool {
        self.source() == Some(TargetMode::Client)
    }
}

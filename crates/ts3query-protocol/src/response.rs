//! Splitting the stream into frames and decomposing a frame into records,
//! events and messages.

use std::ops::Range;

use regex::Regex;
use serde::Serialize;
use tracing::trace;

use crate::codec::{Record, decode_token_line, unescape};
use crate::event::{Event, classify};
use crate::message::Message;
use crate::patterns::{EVENT_PUSH, LINE_END, MESSAGE_PUSH, TERMINATOR, TERMINATOR_BYTES};

/// Everything read since the previous terminator, up to and including the
/// next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    bytes: Vec<u8>,
    /// The terminator line, without the line end that closes the last body
    /// line.
    terminator: Range<usize>,
    error_id: u32,
    error_message: String,
    extra_message: Option<String>,
    failed_permission: Option<u32>,
}

impl RawFrame {
    /// Raw bytes of the frame.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Bytes before the terminator.
    pub fn body(&self) -> &[u8] {
        &self.bytes[..self.terminator.start]
    }

    pub fn error_id(&self) -> u32 {
        self.error_id
    }

    /// Terminator message, still escaped.
    pub fn raw_error_message(&self) -> &str {
        &self.error_message
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Removes the first complete frame from the front of `buffer`.
///
/// Bytes after the terminator stay in the buffer for the next frame.
pub fn split_frame(buffer: &mut Vec<u8>) -> Option<RawFrame> {
    let (terminator, error_id, error_message, extra_message, failed_permission) = {
        let caps = TERMINATOR_BYTES.captures(buffer.as_slice())?;
        let whole = caps.get(0)?;
        let text = |name: &str| {
            caps.name(name)
                .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())
        };
        (
            line_start(buffer.as_slice(), whole.start())..whole.end(),
            text("id")
                .and_then(|id| id.parse::<u32>().ok())
                .unwrap_or(u32::MAX),
            text("msg").unwrap_or_default(),
            text("extramsg"),
            text("failed_permid").and_then(|id| id.parse().ok()),
        )
    };

    let bytes: Vec<u8> = buffer.drain(..terminator.end).collect();
    trace!(size = bytes.len(), remaining = buffer.len(), error_id, "split frame");

    Some(RawFrame {
        bytes,
        terminator,
        error_id,
        error_message,
        extra_message,
        failed_permission,
    })
}

/// Skips the optional `\n\r` a terminator match starts with, which belongs
/// to the preceding line.
fn line_start(haystack: &[u8], start: usize) -> usize {
    if haystack[start..].starts_with(LINE_END.as_bytes()) {
        start + LINE_END.len()
    } else {
        start
    }
}

/// The parsed outcome of one command round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Response {
    /// `0` on success.
    pub error_id: u32,
    pub error_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_permission: Option<u32>,
    pub data: Vec<Record>,
    pub events: Vec<Event>,
    pub messages: Vec<Message>,
}

impl Response {
    /// Decomposes a frame split off the stream.
    pub fn from_raw(frame: &RawFrame) -> Self {
        let body = String::from_utf8_lossy(frame.body());
        let parts = decompose(&body);

        Self {
            error_id: frame.error_id,
            error_message: unescape(&frame.error_message),
            extra_message: frame.extra_message.as_deref().map(unescape),
            failed_permission: frame.failed_permission,
            data: parts.data,
            events: parts.events,
            messages: parts.messages,
        }
    }

    /// Parses a complete frame given as text.
    ///
    /// Returns `None` if the text holds no terminator. Anything after the
    /// first terminator is ignored.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = TERMINATOR.captures(text)?;
        let whole = caps.get(0)?;
        let group = |name: &str| caps.name(name).map(|m| m.as_str());
        let parts = decompose(&text[..line_start(text.as_bytes(), whole.start())]);

        Some(Self {
            error_id: group("id")
                .and_then(|id| id.parse().ok())
                .unwrap_or(u32::MAX),
            error_message: group("msg").map(unescape).unwrap_or_default(),
            extra_message: group("extramsg").map(unescape),
            failed_permission: group("failed_permid").and_then(|id| id.parse().ok()),
            data: parts.data,
            events: parts.events,
            messages: parts.messages,
        })
    }

    pub fn is_ok(&self) -> bool {
        self.error_id == 0
    }

    /// The error id and message of a rejected command.
    pub fn error(&self) -> Option<(u32, &str)> {
        (!self.is_ok()).then_some((self.error_id, self.error_message.as_str()))
    }

    /// First data record, if any.
    pub fn first(&self) -> Option<&Record> {
        self.data.first()
    }
}

/// Data, events and messages pulled out of a frame body.
#[derive(Debug, Default)]
pub struct Decomposed {
    pub data: Vec<Record>,
    pub events: Vec<Event>,
    pub messages: Vec<Message>,
}

/// Splits a frame body without its terminator.
///
/// Message pushes are removed first, then event pushes, each in order of
/// appearance. The remainder is read as `|` separated records.
pub fn decompose(body: &str) -> Decomposed {
    let (messages, rest) = extract(body, &MESSAGE_PUSH, |caps| Message::from_captures(caps));
    let (events, rest) = extract(&rest, &EVENT_PUSH, |caps| classify(caps.get(0).map_or("", |m| m.as_str())));

    let payload = rest.trim();
    let data = if payload.is_empty() {
        Vec::new()
    } else {
        payload
            .split('|')
            .filter(|segment| !segment.trim().is_empty())
            .map(decode_token_line)
            .collect()
    };

    Decomposed {
        data,
        events,
        messages,
    }
}

fn extract<T>(text: &str, pattern: &Regex, build: impl Fn(&regex::Captures<'_>) -> T) -> (Vec<T>, String) {
    let mut items = Vec::new();
    let mut rest = String::with_capacity(text.len());
    let mut last = 0;

    for caps in pattern.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        rest.push_str(&text[last..whole.start()]);
        last = whole.end();
        items.push(build(&caps));
    }
    rest.push_str(&text[last..]);

    (items, rest)
}

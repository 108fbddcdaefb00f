//! ServerQuery wire protocol.
//!
//! The ServerQuery interface is a line based text protocol. A command is a
//! single line:
//!
//! ```text
//! <verb>[ -flag]*[ key=value]*\n
//! ```
//!
//! and every command is answered by zero or more data rows, records
//! separated by `|`, followed by a terminator line:
//!
//! ```text
//! clid=1 client_nickname=serveradmin|clid=5 client_nickname=Bob\n\r
//! error id=0 msg=ok\n\r
//! ```
//!
//! Unsolicited `notify*` pushes can arrive at any time and end up in front of
//! the terminator of whatever command is in flight. [`Response`] separates
//! them into [`Event`]s and [`Message`]s.
//!
//! # Example
//!
//! ```rust
//! use ts3query_protocol::{Command, Response};
//!
//! let command = Command::builder("clientmove").arg("clid", 5).arg("cid", 3).build();
//! assert_eq!(command.encoded(), b"clientmove clid=5 cid=3\n");
//!
//! let response = Response::parse("clid=5\n\rerror id=0 msg=ok\n\r").unwrap();
//! assert_eq!(response.data[0].get_int("clid"), Some(5));
//! ```

mod codec;
mod command;
mod error;
mod event;
mod framing;
mod message;
pub mod patterns;
mod response;

pub use codec::{FromValue, Record, Value, decode_token_line, escape, unescape};
pub use command::{Command, CommandBuilder, encode_command};
pub use error::{ProtocolError, ProtocolResult};
pub use event::{
    ChannelCreated, ChannelDeleted, ChannelDescriptionChanged, ChannelEdited, ChannelMoved,
    ChannelPasswordChanged, ClientEnterView, ClientLeftView, ClientMoved, Event, ServerEdited,
    TokenUsed, classify,
};
pub use framing::{FrameReader, FrameWriter};
pub use message::Message;
pub use patterns::GREETING;
pub use response::{Decomposed, RawFrame, Response, decompose, split_frame};

/// Default ServerQuery TCP port.
pub const DEFAULT_QUERY_PORT: u16 = 10011;

/// Maximum bytes buffered while waiting for a terminator (16 MB).
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

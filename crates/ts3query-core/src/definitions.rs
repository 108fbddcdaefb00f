//! Enumerations from the TeamSpeak 3 ServerQuery documentation.
//!
//! Numeric enums convert from the integers the server sends with
//! `from_id`; string enums expose the exact wire keyword with `as_str`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Target of a text message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetMode {
    /// Private message to a single client.
    Client = 1,
    /// Message to the channel the query client is in.
    Channel = 2,
    /// Message to the whole virtual server.
    Server = 3,
}

impl TargetMode {
    /// Maps a wire `targetmode` value to a target mode.
    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(Self::Client),
            2 => Some(Self::Channel),
            3 => Some(Self::Server),
            _ => None,
        }
    }

    /// Returns the wire value.
    pub fn id(self) -> i64 {
        self as i64
    }
}

/// Why a client entered, left or moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonId {
    /// Joined the server or switched channels on its own.
    JoinOrSwitch = 0,
    /// Moved by another client, or a channel was moved.
    Moved = 1,
    /// Connection timed out.
    Timeout = 3,
    /// Kicked from a channel.
    ChannelKick = 4,
    /// Kicked from the server.
    ServerKick = 5,
    /// Banned.
    Ban = 6,
    /// Left the server.
    LeftServer = 8,
    /// A channel or the server was edited.
    Edited = 10,
    /// The server shut down.
    ServerShutdown = 11,
}

impl ReasonId {
    /// Maps a wire `reasonid` value.
    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            0 => Some(Self::JoinOrSwitch),
            1 => Some(Self::Moved),
            3 => Some(Self::Timeout),
            4 => Some(Self::ChannelKick),
            5 => Some(Self::ServerKick),
            6 => Some(Self::Ban),
            8 => Some(Self::LeftServer),
            10 => Some(Self::Edited),
            11 => Some(Self::ServerShutdown),
            _ => None,
        }
    }

    /// Returns the wire value.
    pub fn id(self) -> i64 {
        self as i64
    }
}

/// Kind of connected client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientType {
    /// Regular voice client.
    Voice = 0,
    /// ServerQuery client.
    Query = 1,
}

impl ClientType {
    /// Maps a wire `client_type` value.
    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            0 => Some(Self::Voice),
            1 => Some(Self::Query),
            _ => None,
        }
    }
}

/// Notification groups accepted by `servernotifyregister`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyRegisterType {
    Server,
    Channel,
    TextServer,
    TextChannel,
    TextPrivate,
}

impl NotifyRegisterType {
    /// All registration types, in the order the bot registers them.
    pub const ALL: [Self; 5] = [
        Self::Server,
        Self::Channel,
        Self::TextServer,
        Self::TextChannel,
        Self::TextPrivate,
    ];

    /// Returns the wire keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Channel => "channel",
            Self::TextServer => "textserver",
            Self::TextChannel => "textchannel",
            Self::TextPrivate => "textprivate",
        }
    }
}

impl fmt::Display for NotifyRegisterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server subsystems for `bindinglist`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subsystem {
    #[default]
    Voice,
    Query,
    FileTransfer,
}

impl Subsystem {
    /// Returns the wire keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Voice => "voice",
            Self::Query => "query",
            Self::FileTransfer => "filetransfer",
        }
    }
}

/// The event tags a server pushes as `notify<tag>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    ChannelCreated,
    ChannelDeleted,
    ChannelDescriptionChanged,
    ChannelEdited,
    ChannelMoved,
    ChannelPasswordChanged,
    ClientEnterView,
    ClientLeftView,
    ClientMoved,
    ServerEdited,
    TokenUsed,
}

impl EventType {
    /// Every known tag.
    pub const ALL: [Self; 11] = [
        Self::ChannelCreated,
        Self::ChannelDeleted,
        Self::ChannelDescriptionChanged,
        Self::ChannelEdited,
        Self::ChannelMoved,
        Self::ChannelPasswordChanged,
        Self::ClientEnterView,
        Self::ClientLeftView,
        Self::ClientMoved,
        Self::ServerEdited,
        Self::TokenUsed,
    ];

    /// Returns the tag as it appears after `notify`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ChannelCreated => "channelcreated",
            Self::ChannelDeleted => "channeldeleted",
            Self::ChannelDescriptionChanged => "channeldescriptionchanged",
            Self::ChannelEdited => "channeledited",
            Self::ChannelMoved => "channelmoved",
            Self::ChannelPasswordChanged => "channelpasswordchanged",
            Self::ClientEnterView => "cliententerview",
            Self::ClientLeftView => "clientleftview",
            Self::ClientMoved => "clientmoved",
            Self::ServerEdited => "serveredited",
            Self::TokenUsed => "tokenused",
        }
    }

    /// Looks up a tag. Unknown tags return `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_mode_from_id() {
        assert_eq!(TargetMode::from_id(1), Some(TargetMode::Client));
        assert_eq!(TargetMode::from_id(2), Some(TargetMode::Channel));
        assert_eq!(TargetMode::from_id(3), Some(TargetMode::Server));
        assert_eq!(TargetMode::from_id(0), None);
        assert_eq!(TargetMode::Server.id(), 3);
    }

    #[test]
    fn reason_id_skips_unassigned_values() {
        assert_eq!(ReasonId::from_id(8), Some(ReasonId::LeftServer));
        assert_eq!(ReasonId::from_id(2), None);
        assert_eq!(ReasonId::from_id(7), None);
    }

    #[test]
    fn event_type_tags_roundtrip() {
        for kind in EventType::ALL {
            assert_eq!(EventType::from_tag(kind.as_str()), Some(kind));
        }
        assert_eq!(EventType::from_tag("textmessage"), None);
        assert_eq!(EventType::from_tag("ClientMoved"), None);
    }

    #[test]
    fn notify_register_keywords() {
        let keywords: Vec<_> = NotifyRegisterType::ALL
            .iter()
            .map(|kind| kind.to_string())
            .collect();
        assert_eq!(
            keywords,
            ["server", "channel", "textserver", "textchannel", "textprivate"]
        );
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&EventType::ClientEnterView).unwrap();
        assert_eq!(json, "\"client_enter_view\"");
        let mode: TargetMode = serde_json::from_str("\"channel\"").unwrap();
        assert_eq!(mode, TargetMode::Channel);
    }
}

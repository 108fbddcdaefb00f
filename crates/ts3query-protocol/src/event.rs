//! Typed server notifications.
//!
//! Every payload field is optional: the server leaves out whatever did not
//! change or does not apply, and extra fields are ignored.

use serde::Serialize;
use ts3query_core::{ClientType, EventType};

use crate::codec::{Record, decode_token_line};
use crate::patterns::EVENT_PUSH;

macro_rules! event_payload {
    ($(#[$meta:meta])* $name:ident { $($field:ident: $ty:ty),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize)]
        pub struct $name {
            $(pub $field: Option<$ty>,)*
        }

        impl $name {
            /// Reads the declared fields out of a decoded push.
            pub fn from_record(record: &Record) -> Self {
                Self {
                    $($field: record.get_as(stringify!($field)),)*
                }
            }
        }
    };
}

event_payload!(
    /// `notifychannelcreated`
    ChannelCreated {
        cid: i64,
        cpid: i64,
        channel_name: String,
        channel_topic: String,
        channel_order: i64,
        invokerid: i64,
        invokername: String,
        invokeruid: String,
        reasonid: i64,
    }
);

event_payload!(
    /// `notifychanneldeleted`
    ChannelDeleted {
        cid: i64,
        invokerid: i64,
        invokername: String,
        invokeruid: String,
        reasonid: i64,
    }
);

event_payload!(
    /// `notifychanneldescriptionchanged`
    ChannelDescriptionChanged { cid: i64 }
);

event_payload!(
    /// `notifychanneledited`
    ChannelEdited {
        cid: i64,
        invokerid: i64,
        invokername: String,
        invokeruid: String,
        reasonid: i64,
        channel_codec_is_unencrypted: bool,
        channel_codec_latency_factor: i64,
        channel_codec_quality: i64,
        channel_codec: i64,
        channel_delete_delay: i64,
        channel_flag_default: bool,
        channel_flag_maxclients_unlimited: bool,
        channel_flag_maxfamilyclients_inherited: bool,
        channel_flag_maxfamilyclients_unlimited: bool,
        channel_flag_password: bool,
        channel_flag_permanent: bool,
        channel_flag_semi_permanent: bool,
        channel_icon_id: i64,
        channel_maxclients: i64,
        channel_maxfamilyclients: i64,
        channel_name_phonetic: String,
        channel_name: String,
        channel_needed_talk_power: i64,
        channel_order: i64,
        channel_topic: String,
    }
);

event_payload!(
    /// `notifychannelmoved`
    ChannelMoved {
        cid: i64,
        cpid: i64,
        order: i64,
        invokerid: i64,
        invokername: String,
        invokeruid: String,
        reasonid: i64,
    }
);

event_payload!(
    /// `notifychannelpasswordchanged`
    ChannelPasswordChanged { cid: i64 }
);

event_payload!(
    /// `notifycliententerview`, sent when a client connects or becomes
    /// visible.
    ClientEnterView {
        cfid: i64,
        ctid: i64,
        reasonid: i64,
        clid: i64,
        client_unique_identifier: String,
        client_nickname: String,
        client_nickname_phonetic: String,
        client_input_muted: bool,
        client_output_muted: bool,
        client_outputonly_muted: bool,
        client_input_hardware: bool,
        client_output_hardware: bool,
        client_meta_data: String,
        client_is_recording: bool,
        client_database_id: i64,
        client_channel_group_id: i64,
        client_servergroups: String,
        client_away: bool,
        client_away_message: String,
        client_type: i64,
        client_flag_avatar: String,
        client_talk_power: i64,
        client_talk_request: bool,
        client_talk_request_msg: String,
        client_description: String,
        client_is_talker: bool,
        client_is_priority_speaker: bool,
        client_unread_messages: i64,
        client_needed_serverquery_view_power: i64,
        client_icon_id: i64,
        client_is_channel_commander: bool,
        client_country: String,
        client_channel_group_inherited_channel_id: i64,
        client_badges: String,
    }
);

impl ClientEnterView {
    /// Voice or query client, when the server sent a known type.
    pub fn kind(&self) -> Option<ClientType> {
        self.client_type.and_then(ClientType::from_id)
    }
}

event_payload!(
    /// `notifyclientleftview`
    ClientLeftView {
        cfid: i64,
        ctid: i64,
        reasonid: i64,
        reasonmsg: String,
        bantime: i64,
        clid: i64,
        invokerid: i64,
        invokername: String,
        invokeruid: String,
    }
);

event_payload!(
    /// `notifyclientmoved`
    ClientMoved {
        ctid: i64,
        reasonid: i64,
        clid: i64,
        invokerid: i64,
        invokername: String,
        invokeruid: String,
    }
);

event_payload!(
    /// `notifyserveredited`
    ServerEdited {
        reasonid: i64,
        invokerid: i64,
        invokername: String,
        invokeruid: String,
        virtualserver_name: String,
        virtualserver_name_phonetic: String,
        virtualserver_codec_encryption_mode: i64,
        virtualserver_default_server_group: i64,
        virtualserver_default_channel_group: i64,
        virtualserver_hostbanner_url: String,
        virtualserver_hostbanner_gfx_url: String,
        virtualserver_hostbanner_gfx_interval: i64,
        virtualserver_priority_speaker_dimm_modificator: String,
        virtualserver_hostbutton_tooltip: String,
        virtualserver_hostbutton_url: String,
        virtualserver_hostbutton_gfx_url: String,
        virtualserver_icon_id: i64,
        virtualserver_hostbanner_mode: i64,
        virtualserver_channel_temp_delete_delay_default: i64,
    }
);

event_payload!(
    /// `notifytokenused`
    TokenUsed {
        clid: i64,
        cldbid: i64,
        cluid: String,
        token: String,
        tokencustomset: String,
        token1: String,
        token2: String,
    }
);

/// A classified server push.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    ChannelCreated(ChannelCreated),
    ChannelDeleted(ChannelDeleted),
    ChannelDescriptionChanged(ChannelDescriptionChanged),
    ChannelEdited(ChannelEdited),
    ChannelMoved(ChannelMoved),
    ChannelPasswordChanged(ChannelPasswordChanged),
    ClientEnterView(ClientEnterView),
    ClientLeftView(ClientLeftView),
    ClientMoved(ClientMoved),
    ServerEdited(ServerEdited),
    TokenUsed(TokenUsed),
    /// A push whose tag is not in the table. The decoded fields are kept.
    Unknown { tag: String, fields: Record },
}

impl Event {
    /// Builds an event from its tag and decoded fields.
    ///
    /// Never fails: an unlisted tag yields [`Event::Unknown`].
    pub fn from_parts(tag: &str, fields: Record) -> Self {
        let Some(kind) = EventType::from_tag(tag) else {
            return Self::Unknown {
                tag: tag.to_string(),
                fields,
            };
        };

        match kind {
            EventType::ChannelCreated => Self::ChannelCreated(ChannelCreated::from_record(&fields)),
            EventType::ChannelDeleted => Self::ChannelDeleted(ChannelDeleted::from_record(&fields)),
            EventType::ChannelDescriptionChanged => {
                Self::ChannelDescriptionChanged(ChannelDescriptionChanged::from_record(&fields))
            }
            EventType::ChannelEdited => Self::ChannelEdited(ChannelEdited::from_record(&fields)),
            EventType::ChannelMoved => Self::ChannelMoved(ChannelMoved::from_record(&fields)),
            EventType::ChannelPasswordChanged => {
                Self::ChannelPasswordChanged(ChannelPasswordChanged::from_record(&fields))
            }
            EventType::ClientEnterView => {
                Self::ClientEnterView(ClientEnterView::from_record(&fields))
            }
            EventType::ClientLeftView => Self::ClientLeftView(ClientLeftView::from_record(&fields)),
            EventType::ClientMoved => Self::ClientMoved(ClientMoved::from_record(&fields)),
            EventType::ServerEdited => Self::ServerEdited(ServerEdited::from_record(&fields)),
            EventType::TokenUsed => Self::TokenUsed(TokenUsed::from_record(&fields)),
        }
    }

    /// The known event type, `None` for [`Event::Unknown`].
    pub fn kind(&self) -> Option<EventType> {
        Some(match self {
            Self::ChannelCreated(_) => EventType::ChannelCreated,
            Self::ChannelDeleted(_) => EventType::ChannelDeleted,
            Self::ChannelDescriptionChanged(_) => EventType::ChannelDescriptionChanged,
            Self::ChannelEdited(_) => EventType::ChannelEdited,
            Self::ChannelMoved(_) => EventType::ChannelMoved,
            Self::ChannelPasswordChanged(_) => EventType::ChannelPasswordChanged,
            Self::ClientEnterView(_) => EventType::ClientEnterView,
            Self::ClientLeftView(_) => EventType::ClientLeftView,
            Self::ClientMoved(_) => EventType::ClientMoved,
            Self::ServerEdited(_) => EventType::ServerEdited,
            Self::TokenUsed(_) => EventType::TokenUsed,
            Self::Unknown { .. } => return None,
        })
    }

    /// The wire tag following `notify`.
    pub fn tag(&self) -> &str {
        match self {
            Self::Unknown { tag, .. } => tag,
            known => known.kind().map_or("", EventType::as_str),
        }
    }
}

/// Classifies one `notify<tag> ...` span.
///
/// Input that does not look like an event push at all still produces an
/// [`Event::Unknown`] with an empty tag.
pub fn classify(span: &str) -> Event {
    match EVENT_PUSH.captures(span) {
        Some(caps) => {
            let tag = caps.name("event").map_or("", |m| m.as_str());
            let body = caps.name("body").map_or("", |m| m.as_str());
            Event::from_parts(tag, decode_token_line(body))
        }
        None => Event::Unknown {
            tag: String::new(),
            fields: decode_token_line(span),
        },
    }
}

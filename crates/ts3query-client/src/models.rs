//! Typed views over response rows.
//!
//! Each model reads only the fields it declares. Everything is optional
//! because the server omits fields depending on permissions and command
//! modifiers.

use serde::Serialize;
use ts3query_core::ClientType;
use ts3query_protocol::Record;

macro_rules! row_model {
    ($(#[$meta:meta])* $name:ident { $($field:ident: $ty:ty),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize)]
        pub struct $name {
            $(pub $field: Option<$ty>,)*
        }

        impl From<&Record> for $name {
            fn from(record: &Record) -> Self {
                Self {
                    $($field: record.get_as(stringify!($field)),)*
                }
            }
        }
    };
}

row_model!(
    /// A `clientlist` row.
    ClientEntry {
        clid: i64,
        cid: i64,
        client_database_id: i64,
        client_nickname: String,
        client_type: i64,
        client_unique_identifier: String,
        client_away: bool,
        client_away_message: String,
        client_idle_time: i64,
        client_country: String,
    }
);

impl ClientEntry {
    pub fn kind(&self) -> Option<ClientType> {
        self.client_type.and_then(ClientType::from_id)
    }

    /// Returns true for ServerQuery clients, including this one.
    pub fn is_query(&self) -> bool {
        self.kind() == Some(ClientType::Query)
    }
}

row_model!(
    /// A `clientinfo` row.
    ClientInfo {
        cid: i64,
        client_idle_time: i64,
        client_unique_identifier: String,
        client_nickname: String,
        client_version: String,
        client_platform: String,
        client_input_muted: bool,
        client_output_muted: bool,
        client_outputonly_muted: bool,
        client_input_hardware: bool,
        client_output_hardware: bool,
        client_default_channel: String,
        client_is_recording: bool,
        client_login_name: String,
        client_database_id: i64,
        client_channel_group_id: i64,
        client_servergroups: String,
        client_created: i64,
        client_lastconnected: i64,
        client_totalconnections: i64,
        client_away: bool,
        client_away_message: String,
        client_type: i64,
        client_talk_power: i64,
        client_description: String,
        client_is_talker: bool,
        client_is_priority_speaker: bool,
        client_unread_messages: i64,
        client_nickname_phonetic: String,
        client_icon_id: i64,
        client_is_channel_commander: bool,
        client_country: String,
        client_badges: String,
        connection_client_ip: String,
    }
);

impl ClientInfo {
    pub fn kind(&self) -> Option<ClientType> {
        self.client_type.and_then(ClientType::from_id)
    }
}

row_model!(
    /// A `channellist` row.
    ChannelEntry {
        cid: i64,
        pid: i64,
        channel_order: i64,
        channel_name: String,
        channel_topic: String,
        total_clients: i64,
        channel_needed_subscribe_power: i64,
        seconds_empty: i64,
    }
);

row_model!(
    /// The `serverinfo` row.
    ServerInfo {
        virtualserver_id: i64,
        virtualserver_unique_identifier: String,
        virtualserver_name: String,
        virtualserver_welcomemessage: String,
        virtualserver_platform: String,
        virtualserver_version: String,
        virtualserver_port: i64,
        virtualserver_maxclients: i64,
        virtualserver_clientsonline: i64,
        virtualserver_channelsonline: i64,
        virtualserver_uptime: i64,
        virtualserver_status: String,
        virtualserver_hostbanner_url: String,
        virtualserver_hostbanner_gfx_url: String,
    }
);

#[cfg(test)]
mod tests {
    use super::*;
    use ts3query_protocol::Response;

    #[test]
    fn client_entries_from_listing() {
        let response = Response::parse(
            "clid=1 cid=1 client_database_id=1 client_nickname=serveradmin client_type=1|clid=5 cid=2 client_database_id=9 client_nickname=Big\\sBob client_type=0\n\rerror id=0 msg=ok\n\r",
        )
        .unwrap();
        let clients: Vec<ClientEntry> = response.data.iter().map(ClientEntry::from).collect();

        assert_eq!(clients.len(), 2);
        assert!(clients[0].is_query());
        assert_eq!(clients[1].client_nickname.as_deref(), Some("Big Bob"));
        assert_eq!(clients[1].kind(), Some(ClientType::Voice));
        assert_eq!(clients[1].client_unique_identifier, None);
    }

    #[test]
    fn client_info_reads_idle_time() {
        let response = Response::parse(
            "cid=3 client_idle_time=600123 client_nickname=Al client_type=0 client_away=1 unrelated=x\n\rerror id=0 msg=ok\n\r",
        )
        .unwrap();
        let info = ClientInfo::from(response.first().unwrap());
        assert_eq!(info.client_idle_time, Some(600_123));
        assert_eq!(info.cid, Some(3));
        assert_eq!(info.client_away, Some(true));
        assert_eq!(info.connection_client_ip, None);
    }

    #[test]
    fn server_info_row() {
        let response = Response::parse(
            "virtualserver_id=1 virtualserver_name=My\\sServer virtualserver_port=9987\n\rerror id=0 msg=ok\n\r",
        )
        .unwrap();
        let info = ServerInfo::from(response.first().unwrap());
        assert_eq!(info.virtualserver_name.as_deref(), Some("My Server"));
        assert_eq!(info.virtualserver_port, Some(9987));
    }

    #[test]
    fn channel_entry_serializes_absent_fields_as_null() {
        let response = Response::parse(
            "cid=4 pid=0 channel_name=AFK total_clients=2\n\rerror id=0 msg=ok\n\r",
        )
        .unwrap();
        let channel = ChannelEntry::from(response.first().unwrap());

        let json = serde_json::to_value(&channel).unwrap();
        assert_eq!(json["cid"], 4);
        assert_eq!(json["channel_name"], "AFK");
        assert_eq!(json["total_clients"], 2);
        assert!(json["channel_topic"].is_null());
    }
}

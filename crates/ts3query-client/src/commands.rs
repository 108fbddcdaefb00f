//! One method per ServerQuery verb.
//!
//! Each method only builds a [`Command`] and hands it to
//! [`QueryConnection::send`]; responses come back unchanged, including
//! rejected ones.

use tokio::io::{AsyncRead, AsyncWrite};

use ts3query_core::{NotifyRegisterType, ReasonId, Subsystem, TargetMode};
use ts3query_protocol::{Command, Response, Value};

use crate::connection::QueryConnection;
use crate::error::ClientResult;

/// Output modifiers for `clientlist`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientListOptions {
    pub uid: bool,
    pub away: bool,
    pub voice: bool,
    pub times: bool,
    pub groups: bool,
    pub info: bool,
    pub country: bool,
    pub ip: bool,
    pub badges: bool,
}

impl ClientListOptions {
    /// Every modifier set.
    pub fn all() -> Self {
        Self {
            uid: true,
            away: true,
            voice: true,
            times: true,
            groups: true,
            info: true,
            country: true,
            ip: true,
            badges: true,
        }
    }
}

/// Output modifiers for `channellist`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelListOptions {
    pub topic: bool,
    pub flags: bool,
    pub voice: bool,
    pub limits: bool,
    pub icon: bool,
    pub secondsempty: bool,
}

/// Output modifiers for `serverlist`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerListOptions {
    pub uid: bool,
    pub short: bool,
    pub all: bool,
    pub onlyoffline: bool,
}

/// Borrowing command facade over a connection.
pub struct Commands<'a, S> {
    connection: &'a QueryConnection<S>,
}

impl<'a, S> Commands<'a, S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    pub(crate) fn new(connection: &'a QueryConnection<S>) -> Self {
        Self { connection }
    }

    async fn send(&self, command: Command) -> ClientResult<Response> {
        self.connection.send(&command).await
    }

    pub async fn help(&self) -> ClientResult<Response> {
        self.send(Command::new("help")).await
    }

    /// Closes the session; the server drops the stream afterwards.
    pub async fn quit(&self) -> ClientResult<Response> {
        self.send(Command::new("quit")).await
    }

    pub async fn login(&self, login: &str, password: &str) -> ClientResult<Response> {
        self.send(
            Command::builder("login")
                .arg("client_login_name", login)
                .arg("client_login_password", password)
                .build(),
        )
        .await
    }

    pub async fn logout(&self) -> ClientResult<Response> {
        self.send(Command::new("logout")).await
    }

    /// Server version, build and platform.
    pub async fn version(&self) -> ClientResult<Response> {
        self.send(Command::new("version")).await
    }

    pub async fn hostinfo(&self) -> ClientResult<Response> {
        self.send(Command::new("hostinfo")).await
    }

    pub async fn instanceinfo(&self) -> ClientResult<Response> {
        self.send(Command::new("instanceinfo")).await
    }

    /// Addresses the instance listens on for the given subsystem.
    pub async fn bindinglist(&self, subsystem: Option<Subsystem>) -> ClientResult<Response> {
        self.send(
            Command::builder("bindinglist")
                .arg_opt("subsystem", subsystem.map(Subsystem::as_str))
                .build(),
        )
        .await
    }

    /// Selects a virtual server by id or by voice port.
    ///
    /// With `virtual_mode` a stopped server is started in virtual mode.
    pub async fn use_server(
        &self,
        sid: Option<i64>,
        port: Option<u16>,
        virtual_mode: bool,
    ) -> ClientResult<Response> {
        self.send(
            Command::builder("use")
                .flag("virtual", virtual_mode)
                .arg_opt("sid", sid)
                .arg_opt("port", port)
                .build(),
        )
        .await
    }

    pub async fn serverlist(&self, options: ServerListOptions) -> ClientResult<Response> {
        self.send(
            Command::builder("serverlist")
                .flag("uid", options.uid)
                .flag("short", options.short)
                .flag("all", options.all)
                .flag("onlyoffline", options.onlyoffline)
                .build(),
        )
        .await
    }

    pub async fn serveridgetbyport(&self, port: u16) -> ClientResult<Response> {
        self.send(
            Command::builder("serveridgetbyport")
                .arg("virtualserver_port", port)
                .build(),
        )
        .await
    }

    pub async fn serverinfo(&self) -> ClientResult<Response> {
        self.send(Command::new("serverinfo")).await
    }

    /// Changes virtual server properties. Properties are passed through
    /// without validation.
    pub async fn serveredit<K, V, I>(&self, properties: I) -> ClientResult<Response>
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.send(Command::builder("serveredit").args(properties).build())
            .await
    }

    pub async fn whoami(&self) -> ClientResult<Response> {
        self.send(Command::new("whoami")).await
    }

    pub async fn clientlist(&self, options: ClientListOptions) -> ClientResult<Response> {
        self.send(
            Command::builder("clientlist")
                .flag("uid", options.uid)
                .flag("away", options.away)
                .flag("voice", options.voice)
                .flag("times", options.times)
                .flag("groups", options.groups)
                .flag("info", options.info)
                .flag("country", options.country)
                .flag("ip", options.ip)
                .flag("badges", options.badges)
                .build(),
        )
        .await
    }

    pub async fn clientinfo(&self, clid: i64) -> ClientResult<Response> {
        self.send(Command::builder("clientinfo").arg("clid", clid).build())
            .await
    }

    /// Clients whose nickname matches `pattern`.
    pub async fn clientfind(&self, pattern: &str) -> ClientResult<Response> {
        self.send(Command::builder("clientfind").arg("pattern", pattern).build())
            .await
    }

    /// Changes properties of the query client itself, e.g.
    /// `client_nickname`.
    pub async fn clientupdate<K, V, I>(&self, properties: I) -> ClientResult<Response>
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.send(Command::builder("clientupdate").args(properties).build())
            .await
    }

    pub async fn clientmove(
        &self,
        clid: i64,
        cid: i64,
        cpw: Option<&str>,
    ) -> ClientResult<Response> {
        self.send(
            Command::builder("clientmove")
                .arg("clid", clid)
                .arg("cid", cid)
                .arg_opt("cpw", cpw)
                .build(),
        )
        .await
    }

    /// Kicks a client from its channel or from the server.
    pub async fn clientkick(
        &self,
        clid: i64,
        reason: ReasonId,
        message: Option<&str>,
    ) -> ClientResult<Response> {
        self.send(
            Command::builder("clientkick")
                .arg("clid", clid)
                .arg("reasonid", reason.id())
                .arg_opt("reasonmsg", message)
                .build(),
        )
        .await
    }

    pub async fn clientpoke(&self, clid: i64, msg: &str) -> ClientResult<Response> {
        self.send(
            Command::builder("clientpoke")
                .arg("clid", clid)
                .arg("msg", msg)
                .build(),
        )
        .await
    }

    /// Sends a chat message.
    ///
    /// `target` is only read by the server for [`TargetMode::Client`].
    pub async fn sendtextmessage(
        &self,
        mode: TargetMode,
        target: Option<i64>,
        msg: &str,
    ) -> ClientResult<Response> {
        self.send(
            Command::builder("sendtextmessage")
                .arg("targetmode", mode.id())
                .arg_opt("target", target)
                .arg("msg", msg)
                .build(),
        )
        .await
    }

    /// Broadcasts to every virtual server of the instance.
    pub async fn gm(&self, msg: &str) -> ClientResult<Response> {
        self.send(Command::builder("gm").arg("msg", msg).build())
            .await
    }

    pub async fn servernotifyregister(
        &self,
        event: NotifyRegisterType,
        id: Option<i64>,
    ) -> ClientResult<Response> {
        self.send(
            Command::builder("servernotifyregister")
                .arg("event", event.as_str())
                .arg_opt("id", id)
                .build(),
        )
        .await
    }

    pub async fn servernotifyunregister(&self) -> ClientResult<Response> {
        self.send(Command::new("servernotifyunregister")).await
    }

    pub async fn channellist(&self, options: ChannelListOptions) -> ClientResult<Response> {
        self.send(
            Command::builder("channellist")
                .flag("topic", options.topic)
                .flag("flags", options.flags)
                .flag("voice", options.voice)
                .flag("limits", options.limits)
                .flag("icon", options.icon)
                .flag("secondsempty", options.secondsempty)
                .build(),
        )
        .await
    }

    pub async fn channelinfo(&self, cid: i64) -> ClientResult<Response> {
        self.send(Command::builder("channelinfo").arg("cid", cid).build())
            .await
    }

    pub async fn channelfind(&self, pattern: &str) -> ClientResult<Response> {
        self.send(Command::builder("channelfind").arg("pattern", pattern).build())
            .await
    }

    /// Creates a channel with the given extra properties.
    pub async fn channelcreate<K, V, I>(&self, name: &str, properties: I) -> ClientResult<Response>
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.send(
            Command::builder("channelcreate")
                .arg("channel_name", name)
                .args(properties)
                .build(),
        )
        .await
    }

    /// Deletes a channel. With `force` the clients inside are kicked to the
    /// default channel.
    pub async fn channeldelete(&self, cid: i64, force: bool) -> ClientResult<Response> {
        self.send(
            Command::builder("channeldelete")
                .arg("cid", cid)
                .arg("force", force)
                .build(),
        )
        .await
    }
}

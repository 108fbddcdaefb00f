//! High-level client used by plugins.
//!
//! Unlike [`QueryConnection`], every call here treats a non-zero error id
//! as a failure and returns [`ClientError::Server`].

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use ts3query_core::{NotifyRegisterType, ReasonId, TargetMode};
use ts3query_protocol::{Command, Event, Message, Response};

use crate::buffer::Received;
use crate::commands::ClientListOptions;
use crate::config::ConnectionConfig;
use crate::connection::{Credentials, QueryConnection};
use crate::error::{ClientError, ClientResult};
use crate::models::{ClientEntry, ClientInfo, ServerInfo};

fn check(response: Response) -> ClientResult<Response> {
    if response.is_ok() {
        Ok(response)
    } else {
        Err(ClientError::from_response(&response))
    }
}

/// Cheap-to-clone client over a shared connection.
pub struct Ts3Client<S = TcpStream> {
    connection: QueryConnection<S>,
}

impl<S> Clone for Ts3Client<S> {
    fn clone(&self) -> Self {
        Self {
            connection: self.connection.clone(),
        }
    }
}

impl<S> std::fmt::Debug for Ts3Client<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ts3Client")
            .field("connection", &self.connection)
            .finish()
    }
}

impl Ts3Client<TcpStream> {
    /// Connects, logs in, selects the virtual server and sets the nickname,
    /// as configured.
    ///
    /// On any failure the connection is closed again.
    pub async fn connect(config: &ConnectionConfig) -> ClientResult<Self> {
        config.validate()?;
        let credentials = config.credentials()?;

        let connection = QueryConnection::new(config.options());
        connection.connect(&config.host, config.port).await?;
        let client = Self::from_connection(connection);

        if let Err(err) = client.setup(config, credentials.as_ref()).await {
            warn!(error = %err, "session setup failed, disconnecting");
            if let Err(close_err) = client.disconnect().await {
                debug!(error = %close_err, "disconnect after failed setup");
            }
            return Err(err);
        }
        Ok(client)
    }
}

impl<S> Ts3Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Wraps a connected [`QueryConnection`].
    pub fn from_connection(connection: QueryConnection<S>) -> Self {
        Self { connection }
    }

    /// The underlying connection, for unchecked commands.
    pub fn connection(&self) -> &QueryConnection<S> {
        &self.connection
    }

    async fn setup(
        &self,
        config: &ConnectionConfig,
        credentials: Option<&Credentials>,
    ) -> ClientResult<()> {
        match credentials {
            Some(credentials) => self.login(&credentials.login, &credentials.password).await?,
            None => info!("no credentials configured, staying anonymous"),
        }

        match config.server_id {
            Some(sid) => self.select_server(sid).await?,
            None => self.select_server_by_port(config.server_port).await?,
        }

        if let Some(nickname) = &config.nickname {
            self.set_name(nickname).await?;
        }
        Ok(())
    }

    /// Sends a command and fails on a non-zero error id.
    pub async fn send(&self, command: &Command) -> ClientResult<Response> {
        check(self.connection.send(command).await?)
    }

    pub async fn disconnect(&self) -> ClientResult<()> {
        self.connection.disconnect().await
    }

    pub async fn login(&self, login: &str, password: &str) -> ClientResult<()> {
        check(self.connection.login(login, password).await?)?;
        Ok(())
    }

    pub async fn logout(&self) -> ClientResult<()> {
        check(self.connection.logout().await?)?;
        Ok(())
    }

    /// Selects a virtual server by id.
    pub async fn select_server(&self, sid: i64) -> ClientResult<()> {
        info!(sid, "selecting virtual server");
        check(self.connection.commands().use_server(Some(sid), None, false).await?)?;
        Ok(())
    }

    /// Selects a virtual server by voice port.
    pub async fn select_server_by_port(&self, port: u16) -> ClientResult<()> {
        info!(port, "selecting virtual server by port");
        check(self.connection.commands().use_server(None, Some(port), false).await?)?;
        Ok(())
    }

    /// Every client in view, query clients included.
    pub async fn get_clients(&self) -> ClientResult<Vec<ClientEntry>> {
        let options = ClientListOptions {
            uid: true,
            away: true,
            times: true,
            ..Default::default()
        };
        let response = check(self.connection.commands().clientlist(options).await?)?;
        Ok(response.data.iter().map(ClientEntry::from).collect())
    }

    pub async fn get_client_info(&self, clid: i64) -> ClientResult<ClientInfo> {
        let response = check(self.connection.commands().clientinfo(clid).await?)?;
        Ok(response.first().map(ClientInfo::from).unwrap_or_default())
    }

    /// Clients whose nickname matches `pattern`.
    pub async fn find_clients(&self, pattern: &str) -> ClientResult<Vec<ClientEntry>> {
        let response = check(self.connection.commands().clientfind(pattern).await?)?;
        Ok(response.data.iter().map(ClientEntry::from).collect())
    }

    /// Sets the query client's nickname.
    pub async fn set_name(&self, name: &str) -> ClientResult<()> {
        info!(name, "setting nickname");
        check(
            self.connection
                .commands()
                .clientupdate([("client_nickname", name)])
                .await?,
        )?;
        Ok(())
    }

    pub async fn move_client(&self, clid: i64, cid: i64) -> ClientResult<()> {
        check(self.connection.commands().clientmove(clid, cid, None).await?)?;
        Ok(())
    }

    pub async fn kick_client(
        &self,
        clid: i64,
        reason: ReasonId,
        message: Option<&str>,
    ) -> ClientResult<()> {
        check(self.connection.commands().clientkick(clid, reason, message).await?)?;
        Ok(())
    }

    pub async fn poke_client(&self, clid: i64, message: &str) -> ClientResult<()> {
        check(self.connection.commands().clientpoke(clid, message).await?)?;
        Ok(())
    }

    pub async fn send_private_message(&self, clid: i64, message: &str) -> ClientResult<()> {
        self.send_text(TargetMode::Client, Some(clid), message).await
    }

    /// Writes to the channel the query client is in.
    pub async fn send_channel_message(&self, message: &str) -> ClientResult<()> {
        self.send_text(TargetMode::Channel, None, message).await
    }

    pub async fn send_server_message(&self, message: &str) -> ClientResult<()> {
        self.send_text(TargetMode::Server, None, message).await
    }

    async fn send_text(&self, mode: TargetMode, target: Option<i64>, message: &str) -> ClientResult<()> {
        check(
            self.connection
                .commands()
                .sendtextmessage(mode, target, message)
                .await?,
        )?;
        Ok(())
    }

    pub async fn server_info(&self) -> ClientResult<ServerInfo> {
        let response = check(self.connection.commands().serverinfo().await?)?;
        Ok(response.first().map(ServerInfo::from).unwrap_or_default())
    }

    /// Changes virtual server properties.
    pub async fn edit_server(&self, properties: &[(&str, &str)]) -> ClientResult<()> {
        check(
            self.connection
                .commands()
                .serveredit(properties.iter().copied())
                .await?,
        )?;
        Ok(())
    }

    /// Registers for every notification group.
    pub async fn enable_events_and_messages(&self) -> ClientResult<()> {
        for event in NotifyRegisterType::ALL {
            // Channel notifications need a channel id; 0 means all channels.
            let id = (event == NotifyRegisterType::Channel).then_some(0);
            check(
                self.connection
                    .commands()
                    .servernotifyregister(event, id)
                    .await?,
            )?;
            debug!(%event, "registered for notifications");
        }
        info!("notifications enabled");
        Ok(())
    }

    pub fn unread_messages(&self) -> Vec<Arc<Received<Message>>> {
        self.connection.unread_messages()
    }

    pub fn unread_events(&self) -> Vec<Arc<Received<Event>>> {
        self.connection.unread_events()
    }

    /// Unread `cliententerview` events.
    pub fn client_entered_events(&self) -> Vec<Arc<Received<Event>>> {
        self.unread_events()
            .into_iter()
            .filter(|event| matches!(event.item(), Event::ClientEnterView(_)))
            .collect()
    }

    pub fn start_polling(&self, rate: Duration) -> ClientResult<()> {
        self.connection.start_polling(rate)
    }

    pub async fn stop_polling(&self) -> ClientResult<()> {
        self.connection.stop_polling().await
    }
}

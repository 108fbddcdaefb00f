//! ServerQuery connection manager, command surface and high-level client.
//!
//! [`QueryConnection`] owns one ServerQuery session: it serializes commands,
//! correlates each with its response frame, applies flood protection and
//! buffers the event and chat pushes that arrive in between. A background
//! poller keeps the session alive and drains pushes while nothing else is
//! sent. [`Ts3Client`] wraps it for bot code and turns server-side errors
//! into [`ClientError::Server`].
//!
//! ```no_run
//! use ts3query_client::{ConnectionConfig, Ts3Client};
//!
//! # async fn demo() -> ts3query_client::ClientResult<()> {
//! let config = ConnectionConfig::new("ts.example.org")
//!     .with_credentials("serveradmin", "env::TS3_QUERY_PASSWORD");
//! let client = Ts3Client::connect(&config).await?;
//! for entry in client.get_clients().await? {
//!     println!("{:?}", entry.client_nickname);
//! }
//! client.disconnect().await
//! # }
//! ```

pub mod buffer;
pub mod client;
pub mod commands;
pub mod config;
pub mod connection;
pub mod error;
pub mod models;
pub mod options;
mod poller;
pub mod secret;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use buffer::{PushBuffer, Received};
pub use client::Ts3Client;
pub use commands::{ChannelListOptions, ClientListOptions, Commands, ServerListOptions};
pub use config::ConnectionConfig;
pub use connection::{ConnectionState, Credentials, QueryConnection};
pub use error::{ClientError, ClientResult};
pub use models::{ChannelEntry, ClientEntry, ClientInfo, ServerInfo};
pub use options::ConnectionOptions;

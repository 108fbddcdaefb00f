//! Shared helpers for the bot's unit tests.

use std::time::Duration;

use tokio::io::DuplexStream;
use ts3query_client::test_support::{FakeServer, RunningServer};
use ts3query_client::{ConnectionOptions, QueryConnection, Ts3Client};

/// A client connected to `server`, flood protection off.
pub(crate) async fn client(server: FakeServer) -> (Ts3Client<DuplexStream>, RunningServer) {
    let (stream, server) = server.start();
    let connection = QueryConnection::new(
        ConnectionOptions::default()
            .with_flood_protection(false)
            .with_timeout(Duration::from_secs(2)),
    );
    connection
        .open(stream)
        .await
        .expect("fake server greeting");
    (Ts3Client::from_connection(connection), server)
}

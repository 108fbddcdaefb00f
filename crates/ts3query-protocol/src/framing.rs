//! Async frame reading and command writing over a byte stream.
//!
//! The reader keeps whatever it has read past a terminator, so pushes that
//! arrive in the same socket read as a response are handed out with the
//! next frame.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::MAX_FRAME_SIZE;
use crate::command::Command;
use crate::error::{ProtocolError, ProtocolResult};
use crate::response::{RawFrame, split_frame};

const READ_CHUNK: usize = 4096;

/// Reads terminated frames from a byte stream.
pub struct FrameReader<R> {
    reader: R,
    buffer: Vec<u8>,
    max_size: usize,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Creates a new FrameReader wrapping the given reader.
    pub fn new(reader: R) -> Self {
        Self::with_max_size(reader, MAX_FRAME_SIZE)
    }

    /// Creates a reader that gives up after `max_size` unterminated bytes.
    pub fn with_max_size(reader: R, max_size: usize) -> Self {
        Self {
            reader,
            buffer: Vec::with_capacity(READ_CHUNK),
            max_size,
        }
    }

    /// Reads up to and including `needle`, returning those bytes.
    pub async fn read_until(&mut self, needle: &[u8]) -> ProtocolResult<Vec<u8>> {
        loop {
            if let Some(pos) = find(&self.buffer, needle) {
                let end = pos + needle.len();
                return Ok(self.buffer.drain(..end).collect());
            }
            self.fill().await?;
        }
    }

    /// [`read_until`](Self::read_until) bounded by `timeout`.
    pub async fn read_until_timeout(
        &mut self,
        needle: &[u8],
        timeout: Duration,
    ) -> ProtocolResult<Vec<u8>> {
        tokio::time::timeout(timeout, self.read_until(needle))
            .await
            .map_err(|_| ProtocolError::timeout("read until pattern"))?
    }

    /// Reads the next complete frame.
    pub async fn read_frame(&mut self) -> ProtocolResult<RawFrame> {
        loop {
            if let Some(frame) = split_frame(&mut self.buffer) {
                return Ok(frame);
            }
            self.fill().await?;
        }
    }

    /// [`read_frame`](Self::read_frame) bounded by `timeout`.
    ///
    /// Bytes read before the deadline stay buffered.
    pub async fn read_frame_timeout(&mut self, timeout: Duration) -> ProtocolResult<RawFrame> {
        tokio::time::timeout(timeout, self.read_frame())
            .await
            .map_err(|_| ProtocolError::timeout("read response"))?
    }

    /// Number of bytes read but not yet handed out.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    async fn fill(&mut self) -> ProtocolResult<()> {
        if self.buffer.len() >= self.max_size {
            return Err(ProtocolError::FrameTooLarge {
                size: self.buffer.len(),
                max: self.max_size,
            });
        }

        let mut chunk = [0u8; READ_CHUNK];
        let n = self.reader.read(&mut chunk).await?;
        if n == 0 {
            return Err(ProtocolError::ConnectionClosed {
                buffered: self.buffer.len(),
            });
        }
        self.buffer.extend_from_slice(&chunk[..n]);
        trace!(read = n, buffered = self.buffer.len(), "filled read buffer");
        Ok(())
    }

    /// Returns a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Returns a mutable reference to the underlying reader.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    /// Unwraps this FrameReader, returning the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Writes encoded commands to a byte stream.
pub struct FrameWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    /// Creates a new FrameWriter wrapping the given writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes one command and flushes it.
    pub async fn write_command(&mut self, command: &Command) -> ProtocolResult<()> {
        self.writer.write_all(command.encoded()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Shuts down the write half.
    pub async fn shutdown(&mut self) -> ProtocolResult<()> {
        self.writer.shutdown().await?;
        Ok(())
    }

    /// Returns a mutable reference to the underlying writer.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Unwraps this FrameWriter, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::GREETING;
    use tokio::io::{AsyncWriteExt, duplex};

    #[tokio::test]
    async fn frame_split_across_reads() {
        let (client, mut server) = duplex(64);
        let mut reader = FrameReader::new(client);

        let task = tokio::spawn(async move {
            server.write_all(b"clid=1 cid=2\n\rerr").await.unwrap();
            tokio::task::yield_now().await;
            server.write_all(b"or id=0 msg=ok\n\r").await.unwrap();
            server
        });

        let frame = reader.read_frame().await.unwrap();
        assert_eq!(frame.body(), b"clid=1 cid=2\n\r");
        assert_eq!(frame.error_id(), 0);
        drop(task.await.unwrap());
    }

    #[tokio::test]
    async fn two_frames_in_one_read() {
        let (client, mut server) = duplex(1024);
        let mut reader = FrameReader::new(client);
        server
            .write_all(b"error id=0 msg=ok\n\rnotifyclientmoved clid=1\n\rerror id=1 msg=x\n\r")
            .await
            .unwrap();

        assert_eq!(reader.read_frame().await.unwrap().error_id(), 0);
        let second = reader.read_frame().await.unwrap();
        assert_eq!(second.error_id(), 1);
        assert_eq!(second.body(), b"notifyclientmoved clid=1\n\r");
        assert_eq!(reader.buffered(), 0);
    }

    #[tokio::test]
    async fn greeting_then_frame() {
        let (client, mut server) = duplex(1024);
        let mut reader = FrameReader::new(client);
        server.write_all(GREETING).await.unwrap();
        server.write_all(b"error id=0 msg=ok\n\r").await.unwrap();

        let greeting = reader
            .read_until_timeout(GREETING, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(greeting, GREETING);
        assert_eq!(reader.read_frame().await.unwrap().error_id(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_keeps_partial_bytes() {
        let (client, mut server) = duplex(1024);
        let mut reader = FrameReader::new(client);
        server.write_all(b"clid=1\n\r").await.unwrap();

        let err = reader
            .read_frame_timeout(Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(reader.buffered(), 8);

        server.write_all(b"error id=0 msg=ok\n\r").await.unwrap();
        assert_eq!(reader.read_frame().await.unwrap().body(), b"clid=1\n\r");
    }

    #[tokio::test]
    async fn eof_reports_buffered_bytes() {
        let (client, mut server) = duplex(1024);
        let mut reader = FrameReader::new(client);
        server.write_all(b"partial").await.unwrap();
        drop(server);

        let err = reader.read_frame().await.unwrap_err();
        assert!(matches!(err, ProtocolError::ConnectionClosed { buffered: 7 }));
    }

    #[tokio::test]
    async fn oversized_frame_is_rejected() {
        let (client, mut server) = duplex(1024);
        let mut reader = FrameReader::with_max_size(client, 16);
        server.write_all(&[b'a'; 32]).await.unwrap();

        let err = reader.read_frame().await.unwrap_err();
        assert!(matches!(err, ProtocolError::FrameTooLarge { max: 16, .. }));
    }

    #[tokio::test]
    async fn writer_sends_encoded_command() {
        let (client, mut server) = duplex(1024);
        let mut writer = FrameWriter::new(client);
        writer
            .write_command(&Command::builder("clientmove").arg("clid", 5).arg("cid", 3).build())
            .await
            .unwrap();

        let mut buf = [0u8; 64];
        let n = tokio::io::AsyncReadExt::read(&mut server, &mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"clientmove clid=5 cid=3\n");
    }
}

//! Relay client connection
//!
//! Speaks the framing protocol over one TCP stream. Intended for programs
//! and tests that drive the relay; it does not read from a terminal.

use std::time::Duration;

use tokio::io::BufReader;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::error::{Error, Result};
use crate::protocol::codec::{read_frame, write_frame};
use crate::protocol::constants::CLIENT_MAX_FRAME_SIZE;

/// A connected relay client
pub struct RelayClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    max_frame_size: usize,
}

impl RelayClient {
    /// Connect to a relay server
    ///
    /// The server's welcome line is left unread.
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        let (reader, writer) = stream.into_split();

        Ok(Self {
            reader: BufReader::new(reader),
            writer,
            max_frame_size: CLIENT_MAX_FRAME_SIZE,
        })
    }

    /// Send a raw request line
    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        write_frame(&mut self.writer, line.as_bytes()).await
    }

    /// `JOIN <room> <name>`
    pub async fn join(&mut self, room: &str, name: &str) -> Result<()> {
        self.send_line(&format!("JOIN {} {}", room, name)).await
    }

    /// `MSG <text>`
    pub async fn say(&mut self, text: &str) -> Result<()> {
        self.send_line(&format!("MSG {}", text)).await
    }

    /// `CMD <subcommand>`, e.g. `/users`
    pub async fn command(&mut self, subcommand: &str) -> Result<()> {
        self.send_line(&format!("CMD {}", subcommand)).await
    }

    /// Receive the next server line
    pub async fn recv_line(&mut self) -> Result<String> {
        let payload = read_frame(&mut self.reader, self.max_frame_size).await?;
        Ok(String::from_utf8_lossy(&payload).into_owned())
    }

    /// Receive lines until one satisfies `pred`, giving up after `timeout`
    ///
    /// Lines that do not match are discarded. A timeout can leave the stream
    /// mid-frame, so the client should not be reused after one.
    pub async fn recv_until<P>(&mut self, timeout: Duration, mut pred: P) -> Result<String>
    where
        P: FnMut(&str) -> bool,
    {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let line = match tokio::time::timeout_at(deadline, self.recv_line()).await {
                Ok(line) => line?,
                Err(_) => {
                    return Err(Error::Io(std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        "no matching line received",
                    )))
                }
            };
            if pred(&line) {
                return Ok(line);
            }
            tracing::trace!(line = %line, "Skipping line");
        }
    }
}

//! Per-connection handling
//!
//! Each accepted socket runs as one task that reads frames and dispatches
//! requests, plus a writer task that drains the client's outbound queue.
//! Replies and room deliveries share that queue, so the client sees them in
//! the order they were produced and a slow socket never stalls a room
//! worker.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, watch};

use crate::error::{CommandError, Error, ProtocolError, Result};
use crate::protocol::codec::{self, encode_frame};
use crate::protocol::{notice, Request};
use crate::registry::RoomRegistry;
use crate::server::commands::handle_command;
use crate::server::config::ServerConfig;
use crate::server::table::SlotGuard;
use crate::session::ClientState;

/// One client connection
pub struct Connection {
    handler: RequestHandler,
    outbound_rx: mpsc::Receiver<Bytes>,
    shutdown: watch::Receiver<bool>,
    max_frame_size: usize,
    linger: Duration,
    _slot: Option<SlotGuard>,
}

impl Connection {
    pub fn new(
        session_id: u64,
        peer_addr: SocketAddr,
        config: &ServerConfig,
        registry: Arc<RoomRegistry>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(config.outbound_queue_capacity);

        Self {
            handler: RequestHandler {
                client: ClientState::new(session_id, peer_addr, tx),
                registry,
            },
            outbound_rx: rx,
            shutdown,
            max_frame_size: config.max_frame_size,
            linger: config.shutdown_timeout,
            _slot: None,
        }
    }

    /// Hold a connection-table slot for the lifetime of this connection
    pub fn with_slot(mut self, slot: SlotGuard) -> Self {
        self._slot = Some(slot);
        self
    }

    /// Serve the connection until the client leaves, fails, or the server
    /// shuts down
    pub async fn run<S>(self, stream: S) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let Connection {
            mut handler,
            outbound_rx,
            mut shutdown,
            max_frame_size,
            linger,
            _slot,
        } = self;

        let (reader, writer) = tokio::io::split(stream);
        let mut reader = BufReader::new(reader);
        let mut writer_task = tokio::spawn(write_loop(writer, outbound_rx));

        let session_id = handler.client.id;
        let mut result = handler.reply(notice::WELCOME).await;
        let shutting_down = *shutdown.borrow();

        if result.is_ok() && !shutting_down {
            result = loop {
                tokio::select! {
                    _ = shutdown.changed() => {
                        tracing::debug!(session_id = session_id, "Closing connection for shutdown");
                        break Ok(());
                    }
                    frame = codec::read_frame(&mut reader, max_frame_size) => {
                        let payload = match frame {
                            Ok(payload) => payload,
                            Err(e) => break end_of_stream(e),
                        };
                        handler.client.frames_received += 1;
                        if let Err(e) = handler.dispatch(&payload).await {
                            break Err(e);
                        }
                    }
                }
            };
        }

        // Leave the room before the socket goes away
        handler.teardown().await;
        tracing::debug!(
            session_id = session_id,
            peer = %handler.client.peer_addr,
            frames = handler.client.frames_received,
            duration_ms = handler.client.connected_at.elapsed().as_millis() as u64,
            "Connection closed"
        );
        drop(handler);

        match tokio::time::timeout(linger, &mut writer_task).await {
            Ok(Ok(Err(e))) => tracing::trace!(session_id = session_id, error = %e, "Writer failed"),
            Ok(_) => {}
            Err(_) => writer_task.abort(),
        }

        result
    }
}

/// Clean EOF between frames is an ordinary disconnect
fn end_of_stream(error: Error) -> Result<()> {
    match &error {
        Error::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
        Error::Protocol(ProtocolError::FrameTooLarge { len, max }) => {
            tracing::warn!(len = *len, max = *max, "Oversized frame, dropping connection");
        }
        _ => {}
    }
    Err(error)
}

async fn write_loop<W>(mut writer: W, mut rx: mpsc::Receiver<Bytes>) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = rx.recv().await {
        codec::write_encoded(&mut writer, &frame).await?;
    }
    writer.shutdown().await?;
    Ok(())
}

/// Dispatches decoded requests for one client
struct RequestHandler {
    client: ClientState,
    registry: Arc<RoomRegistry>,
}

impl RequestHandler {
    async fn dispatch(&mut self, payload: &[u8]) -> Result<()> {
        match Request::parse(payload) {
            Ok(Request::Join { room, name }) => self.join(room, name).await,
            Ok(Request::Msg(text)) => self.message(&text).await,
            Ok(Request::Cmd(command)) => {
                let line = match handle_command(&self.registry, &mut self.client, &command).await
                {
                    Ok(line) => line,
                    Err(e) => notice::err(e.to_string()),
                };
                self.reply(line).await
            }
            Ok(Request::Unknown(line)) => {
                tracing::trace!(session_id = self.client.id, line = %line, "Unknown request");
                self.reply(notice::err("UNKNOWN_COMMAND")).await
            }
            Err(ProtocolError::InvalidRoomName(room)) => {
                tracing::debug!(session_id = self.client.id, room = %room, "Invalid room name");
                self.reply(notice::err("INVALID_ROOM")).await
            }
            Err(_) => self.reply(notice::JOIN_USAGE).await,
        }
    }

    async fn join(&mut self, room_name: String, name: String) -> Result<()> {
        let room = match self.registry.get_or_create(&room_name).await {
            Ok(room) => room,
            Err(e) => {
                tracing::warn!(session_id = self.client.id, error = %e, "JOIN failed");
                return self.reply(notice::err("ROOM_UNAVAILABLE")).await;
            }
        };

        self.client.name = name;

        if let Some(previous) = self.client.leave_room() {
            if let Some(prev_room) = self.registry.get(&previous).await {
                prev_room.remove_member(self.client.id);
                if previous != room_name {
                    prev_room.enqueue(notice::switched(&self.client.name, &room_name));
                }
            }
        }

        // Ack before membership so no room line can overtake it
        self.reply(notice::JOIN_ACK).await?;

        room.add_member(self.client.member());
        self.client.room = Some(room_name);
        room.enqueue(notice::joined(&self.client.name));

        tracing::debug!(
            session_id = self.client.id,
            room = %room.name(),
            name = %self.client.name,
            "Client joined room"
        );
        Ok(())
    }

    async fn message(&mut self, text: &str) -> Result<()> {
        let Some(room_name) = self.client.current_room() else {
            return self.reply_error(CommandError::NotInRoom).await;
        };
        let Some(room) = self.registry.get(room_name).await else {
            let err = CommandError::RoomNotFound(room_name.to_string());
            return self.reply_error(err).await;
        };

        room.enqueue(notice::chat(&self.client.name, room_name, text));
        Ok(())
    }

    async fn reply_error(&self, error: CommandError) -> Result<()> {
        self.reply(notice::err(error.to_string())).await
    }

    /// Queue a line for this client, waiting if its queue is full
    async fn reply(&self, line: impl AsRef<str>) -> Result<()> {
        let frame = encode_frame(line.as_ref().as_bytes());
        self.client.outbound().send(frame).await.map_err(|_| {
            Error::Io(io::Error::new(io::ErrorKind::BrokenPipe, "connection writer closed"))
        })
    }

    async fn teardown(&mut self) {
        if let Some(room_name) = self.client.leave_room() {
            if let Some(room) = self.registry.get(&room_name).await {
                room.remove_member(self.client.id);
                room.enqueue(notice::disconnected(&self.client.name));
            }
        }
    }
}

//! Error types
//!
//! Every failure the relay can report, either to the offending client (as a
//! `[ERR]` line) or to the caller of the library.

use std::io;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Socket or file I/O failure, including EOF mid-frame
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Wire protocol violation
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Administrative command failure
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// A room could not be created (its log could not be opened)
    #[error("room {room} unavailable: {source}")]
    RoomUnavailable {
        room: String,
        #[source]
        source: io::Error,
    },
}

/// Wire protocol violations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// Declared frame length meets or exceeds the receive capacity
    #[error("frame too large: {len} bytes (limit {max})")]
    FrameTooLarge { len: u32, max: usize },

    /// `JOIN` without exactly a room and a name within bounds
    #[error("malformed JOIN arguments")]
    MalformedJoin,

    /// Room name that cannot be used as a log file name
    #[error("invalid room name: {0}")]
    InvalidRoomName(String),
}

/// Recoverable command failures; the connection stays open
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("NOT_IN_ROOM")]
    NotInRoom,

    #[error("ROOM_NOT_FOUND")]
    RoomNotFound(String),

    #[error("UNKNOWN_CMD")]
    UnknownCommand(String),
}

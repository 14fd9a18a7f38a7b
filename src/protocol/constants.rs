//! Protocol constants

/// Length of the big-endian frame length prefix
pub const FRAME_HEADER_SIZE: usize = 4;

/// Longest client line the server accepts
pub const MAX_LINE: usize = 1024;

/// Default server receive capacity; declared lengths at or above it are rejected
pub const DEFAULT_MAX_FRAME_SIZE: usize = MAX_LINE + 1;

/// Receive capacity used by clients, large enough for any server line
pub const CLIENT_MAX_FRAME_SIZE: usize = 4 * 1024;

/// Longest line the server sends, so every reply fits a client's receive capacity
pub const MAX_REPLY_LEN: usize = CLIENT_MAX_FRAME_SIZE - 1;

/// Longest room name accepted by `JOIN`
pub const MAX_ROOM_NAME: usize = 63;

/// Longest display name accepted by `JOIN`
pub const MAX_DISPLAY_NAME: usize = 31;

/// Request prefixes
pub const JOIN_PREFIX: &str = "JOIN ";
pub const MSG_PREFIX: &str = "MSG ";
pub const CMD_PREFIX: &str = "CMD ";

/// Server line prefixes
pub const SYS_PREFIX: &str = "[SYS] ";
pub const OK_PREFIX: &str = "[OK] ";
pub const ERR_PREFIX: &str = "[ERR] ";

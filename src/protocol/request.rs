//! Client request grammar
//!
//! A decoded frame is classified by its fixed, case-sensitive prefix:
//!
//! ```text
//! JOIN <room> <name>
//! MSG <text>
//! CMD </list | /users | /leave>
//! ```

use crate::error::ProtocolError;
use crate::protocol::constants::*;

/// Administrative subcommand carried by `CMD`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/list`: every room with its member count
    List,
    /// `/users`: members of the issuing client's room
    Users,
    /// `/leave`: leave the current room
    Leave,
    /// Anything else
    Unknown(String),
}

impl Command {
    /// Parse a subcommand; only the first whitespace token is significant
    pub fn parse(input: &str) -> Self {
        let token = input.split_whitespace().next().unwrap_or("");
        match token {
            "/list" => Command::List,
            "/users" => Command::Users,
            "/leave" => Command::Leave,
            _ => Command::Unknown(input.trim().to_string()),
        }
    }
}

/// One parsed client line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Join { room: String, name: String },
    Msg(String),
    Cmd(Command),
    Unknown(String),
}

impl Request {
    /// Classify a decoded payload
    ///
    /// Only `JOIN` can fail: its arguments are validated here so the caller
    /// can report the problem and keep the connection open. Invalid UTF-8 is
    /// replaced rather than rejected.
    pub fn parse(payload: &[u8]) -> Result<Self, ProtocolError> {
        let line = String::from_utf8_lossy(payload);

        if let Some(args) = line.strip_prefix(JOIN_PREFIX) {
            let (room, name) = parse_join_args(args)?;
            return Ok(Request::Join { room, name });
        }
        if let Some(text) = line.strip_prefix(MSG_PREFIX) {
            return Ok(Request::Msg(text.to_string()));
        }
        if let Some(sub) = line.strip_prefix(CMD_PREFIX) {
            return Ok(Request::Cmd(Command::parse(sub)));
        }

        Ok(Request::Unknown(line.into_owned()))
    }
}

fn parse_join_args(args: &str) -> Result<(String, String), ProtocolError> {
    let mut tokens = args.split_whitespace();
    let (room, name) = match (tokens.next(), tokens.next()) {
        (Some(room), Some(name)) => (room, name),
        _ => return Err(ProtocolError::MalformedJoin),
    };

    if room.len() > MAX_ROOM_NAME || name.len() > MAX_DISPLAY_NAME {
        return Err(ProtocolError::MalformedJoin);
    }
    validate_room_name(room)?;

    Ok((room.to_string(), name.to_string()))
}

/// Room names end up in log file names
pub fn validate_room_name(room: &str) -> Result<(), ProtocolError> {
    let bad = room.is_empty()
        || room.contains(['/', '\\'])
        || room.contains("..")
        || room.chars().any(char::is_control);
    if bad {
        return Err(ProtocolError::InvalidRoomName(room.to_string()));
    }
    Ok(())
}

//! Server-to-client line builders

use bytes::Bytes;

use crate::protocol::constants::{ERR_PREFIX, OK_PREFIX, SYS_PREFIX};

pub const WELCOME: &str =
    "[SYS] Welcome. Commands: JOIN <room> <name> | MSG <text> | CMD </list|/users|/leave>";

pub const JOIN_ACK: &str = "[OK] JOIN";

pub const JOIN_USAGE: &str = "[ERR] usage: JOIN <room> <name>";

pub fn system(text: impl AsRef<str>) -> String {
    format!("{}{}", SYS_PREFIX, text.as_ref())
}

pub fn ok(text: impl AsRef<str>) -> String {
    format!("{}{}", OK_PREFIX, text.as_ref())
}

pub fn err(code: impl AsRef<str>) -> String {
    format!("{}{}", ERR_PREFIX, code.as_ref())
}

/// `[<name>@<room>] <text>`
pub fn chat(name: &str, room: &str, text: &str) -> Bytes {
    Bytes::from(format!("[{}@{}] {}", name, room, text))
}

pub fn joined(name: &str) -> Bytes {
    Bytes::from(system(format!("{} joined", name)))
}

pub fn left(name: &str) -> Bytes {
    Bytes::from(system(format!("{} left", name)))
}

pub fn switched(name: &str, new_room: &str) -> Bytes {
    Bytes::from(system(format!("{} switched to {}", name, new_room)))
}

pub fn disconnected(name: &str) -> Bytes {
    let name = if name.is_empty() { "<anon>" } else { name };
    Bytes::from(system(format!("{} disconnected", name)))
}

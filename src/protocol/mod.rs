//! Wire protocol
//!
//! Framing, the client request grammar, and the lines the server sends back.

pub mod codec;
pub mod constants;
pub mod notice;
pub mod request;

pub use codec::{encode_frame, read_frame, write_frame};
pub use request::{Command, Request};

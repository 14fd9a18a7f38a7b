//! Relay server
//!
//! Accepts TCP clients, tracks them in a bounded connection table, and
//! routes their requests to the room registry or the command handler.

pub mod commands;
pub mod config;
pub mod connection;
pub mod listener;
pub mod table;

pub use config::ServerConfig;
pub use listener::{BoundServer, RelayServer};
pub use table::ConnectionTable;

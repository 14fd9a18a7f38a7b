//! # chat-relay
//!
//! A room-based TCP chat relay.
//!
//! Clients connect over TCP and exchange length-prefixed text frames. After
//! `JOIN <room> <name>` every `MSG <text>` is fanned out, in order, to all
//! members of the room. Each room has its own delivery task and an
//! append-only log that rotates once it grows past a size threshold.
//!
//! ```no_run
//! use chat_relay::{RelayServer, ServerConfig};
//!
//! # async fn example() -> chat_relay::Result<()> {
//! let server = RelayServer::new(ServerConfig::with_port(5555));
//! server.run_until(async { let _ = tokio::signal::ctrl_c().await; }).await
//! # }
//! ```

pub mod client;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod session;

pub use client::RelayClient;
pub use error::{Error, Result};
pub use registry::{RegistryConfig, RoomRegistry};
pub use server::{RelayServer, ServerConfig};

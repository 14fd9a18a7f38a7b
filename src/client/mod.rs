//! Relay client implementation
//!
//! A programmatic client for the relay's wire protocol.

pub mod connector;

pub use connector::RelayClient;

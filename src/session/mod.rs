//! Client session management

pub mod state;

pub use state::ClientState;

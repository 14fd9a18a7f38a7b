//! Server configuration

use std::net::SocketAddr;
use std::time::Duration;

use crate::protocol::constants::DEFAULT_MAX_FRAME_SIZE;

/// Default listening port
pub const DEFAULT_PORT: u16 = 5555;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Maximum concurrent connections (0 = unlimited)
    pub max_connections: usize,

    /// Receive capacity per frame; declared lengths at or above it drop the connection
    pub max_frame_size: usize,

    /// Pending outbound frames per connection before room lines are skipped
    pub outbound_queue_capacity: usize,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,

    /// How long shutdown waits for connections to close
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            max_connections: 512,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            outbound_queue_capacity: 1024,
            tcp_nodelay: true,
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Listen on all interfaces at `port`
    pub fn with_port(port: u16) -> Self {
        Self::with_addr(SocketAddr::from(([0, 0, 0, 0], port)))
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the frame receive capacity
    pub fn max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size.max(1);
        self
    }

    /// Set the per-connection outbound queue capacity
    pub fn outbound_queue_capacity(mut self, capacity: usize) -> Self {
        self.outbound_queue_capacity = capacity.max(1);
        self
    }

    /// Set shutdown timeout
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

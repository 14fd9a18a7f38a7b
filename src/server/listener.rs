//! Relay server listener
//!
//! Handles the TCP accept loop and spawns connection handlers.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::error::Result;
use crate::registry::{RegistryConfig, RoomRegistry};
use crate::server::config::ServerConfig;
use crate::server::connection::Connection;
use crate::server::table::ConnectionTable;

/// Chat relay server
pub struct RelayServer {
    config: ServerConfig,
    registry: Arc<RoomRegistry>,
    connections: Arc<ConnectionTable>,
    next_session_id: AtomicU64,
    shutdown_tx: watch::Sender<bool>,
}

impl RelayServer {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        Self::with_registry_config(config, RegistryConfig::default())
    }

    /// Create a new server with custom registry configuration
    pub fn with_registry_config(config: ServerConfig, registry_config: RegistryConfig) -> Self {
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            connections: ConnectionTable::new(config.max_connections),
            config,
            registry: Arc::new(RoomRegistry::with_config(registry_config)),
            next_session_id: AtomicU64::new(1),
            shutdown_tx,
        }
    }

    /// Get a reference to the room registry
    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    /// Get a reference to the connection table
    pub fn connections(&self) -> &Arc<ConnectionTable> {
        &self.connections
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Bind the listening socket
    ///
    /// Failing to bind is the only fatal error of the server.
    pub async fn bind(self) -> Result<BoundServer> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, "Chat relay listening");

        Ok(BoundServer {
            server: self,
            listener,
            local_addr,
        })
    }

    /// Bind and run until the process exits
    pub async fn run(self) -> Result<()> {
        self.bind().await?.run_until(std::future::pending()).await
    }

    /// Bind and run until `shutdown` completes
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        self.bind().await?.run_until(shutdown).await
    }
}

/// A server whose listener is bound but not yet accepting
pub struct BoundServer {
    server: RelayServer,
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl BoundServer {
    /// The address actually bound (useful with port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.server.registry
    }

    pub fn connections(&self) -> &Arc<ConnectionTable> {
        &self.server.connections
    }

    /// Accept clients until `shutdown` completes, then close everything
    ///
    /// On shutdown the listener is closed, every connection is told to
    /// close, and once they are gone (or `shutdown_timeout` passes) the room
    /// workers drain their queues and stop.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let BoundServer {
            server, listener, ..
        } = self;
        let mut tasks = JoinSet::new();

        tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
            }
            _ = server.accept_loop(&listener, &mut tasks) => {}
        }

        drop(listener);
        let _ = server.shutdown_tx.send(true);

        let timeout = server.config.shutdown_timeout;
        let drained = tokio::time::timeout(timeout, async {
            while tasks.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            tracing::warn!(
                remaining = tasks.len(),
                "Connections still open after shutdown timeout, aborting"
            );
            tasks.shutdown().await;
        }

        server.registry.shutdown().await;
        tracing::info!("Chat relay stopped");

        Ok(())
    }
}

impl RelayServer {
    async fn accept_loop(&self, listener: &TcpListener, tasks: &mut JoinSet<()>) {
        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((socket, peer_addr)) => {
                        self.handle_connection(socket, peer_addr, tasks);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to accept connection");
                    }
                },
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }
    }

    fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr, tasks: &mut JoinSet<()>) {
        // Generate session ID
        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);

        // Check connection limit; the socket is closed when dropped
        let Some(slot) = self.connections.try_register(session_id) else {
            tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
            return;
        };

        tracing::debug!(
            session_id = session_id,
            peer = %peer_addr,
            connections = self.connections.len(),
            "New connection"
        );

        // Configure socket
        if let Err(e) = self.configure_socket(&socket) {
            tracing::error!(error = %e, "Failed to configure socket");
            return;
        }

        let connection = Connection::new(
            session_id,
            peer_addr,
            &self.config,
            Arc::clone(&self.registry),
            self.shutdown_tx.subscribe(),
        )
        .with_slot(slot);

        tasks.spawn(async move {
            if let Err(e) = connection.run(socket).await {
                tracing::debug!(
                    session_id = session_id,
                    error = %e,
                    "Connection error"
                );
            }
        });
    }

    fn configure_socket(&self, socket: &TcpStream) -> std::io::Result<()> {
        if self.config.tcp_nodelay {
            socket.set_nodelay(true)?;
        }
        Ok(())
    }
}

//! Chat relay server
//!
//! Run with:
//! ```not_rust
//! chat-relay 5555
//! RUST_LOG=chat_relay=debug chat-relay 5555
//! ```

use chat_relay::{RegistryConfig, RelayServer, ServerConfig};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "chat-relay")]
#[command(about = "Room-based TCP chat relay", long_about = None)]
struct Args {
    /// Port to listen on
    port: u16,
}

fn setup_logger(default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "{}={},{}={}",
                    env!("CARGO_PKG_NAME").replace('-', "_"),
                    default_log_level,
                    env!("CARGO_BIN_NAME").replace('-', "_"),
                    default_log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() {
    setup_logger("info");

    let args = Args::parse();

    let server = RelayServer::with_registry_config(
        ServerConfig::with_port(args.port),
        RegistryConfig::default(),
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    if let Err(e) = server.run_until(shutdown).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

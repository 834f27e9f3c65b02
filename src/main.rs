//! TCP Chat Server - Entry Point
//!
//! Parses the port, loads the banner, and serves until Ctrl-C.

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tcp_chat::{Banner, ChatServer, Cli};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // An invalid port prints usage and exits here, before anything binds
    let cli = Cli::parse();

    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=tcp_chat=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tcp_chat=info")),
        )
        .init();

    let banner = match &cli.banner {
        Some(path) => Banner::load(path).await.unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Failed to read banner, sending none");
            Banner::empty()
        }),
        None => Banner::default(),
    };

    let config = cli.server_config();
    let server = ChatServer::bind(config, banner).await?;
    info!("Listening on the port :{}", server.local_addr()?.port());

    server.run_until_ctrl_c().await?;

    Ok(())
}

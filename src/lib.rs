//! Multi-client TCP Chat Server Library
//!
//! A line-based chat over plain TCP: clients pick a username, every line
//! they send is broadcast to everyone else, and newcomers get the whole
//! conversation so far.
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `Coordinator` is the single owner of the registry and history and
//!   applies Join/Leave/Chat events one at a time, in arrival order
//! - Each connection runs a session task (handshake, then read loop) plus
//!   a write task draining its outbound queue
//! - `ChatServer` accepts connections while there is a free slot
//!
//! # Example
//! ```ignore
//! use tcp_chat::{Banner, ChatServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = ChatServer::bind(ServerConfig::default(), Banner::default())
//!         .await
//!         .unwrap();
//!     server.run_until_ctrl_c().await.unwrap();
//! }
//! ```

pub mod banner;
pub mod broadcast;
pub mod client;
pub mod codec;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod handler;
pub mod history;
pub mod listener;
pub mod message;
pub mod registry;
pub mod types;

// Re-export main types for convenience
pub use banner::Banner;
pub use client::Client;
pub use codec::{ChatLineCodec, Inbound};
pub use config::{Cli, ServerConfig};
pub use coordinator::{Coordinator, Event};
pub use error::{AdmissionError, AppError, SendError};
pub use handler::{handle_connection, PROMPT};
pub use history::History;
pub use listener::ChatServer;
pub use message::{Author, Message};
pub use registry::Registry;
pub use types::{ClientId, Line};

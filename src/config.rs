//! Command line and runtime configuration

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Default listening port
pub const DEFAULT_PORT: u16 = 8989;

/// Default maximum number of Active sessions
pub const DEFAULT_MAX_CLIENTS: usize = 10;

/// Channel buffer size for coordinator events
pub const EVENT_BUFFER_SIZE: usize = 256;

/// Per-client outbound queue size
pub const OUTBOUND_BUFFER_SIZE: usize = 256;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Port to listen on (1-65535)
    #[arg(
        default_value_t = DEFAULT_PORT,
        value_parser = clap::value_parser!(u16).range(1..=65535)
    )]
    pub port: u16,

    /// Address to bind
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Maximum number of clients in the chat at once
    #[arg(long, default_value_t = DEFAULT_MAX_CLIENTS, value_parser = parse_max_clients)]
    pub max_clients: usize,

    /// File whose contents are shown as the welcome logo
    #[arg(long, value_name = "PATH")]
    pub banner: Option<PathBuf>,

    /// Keep only the newest N history lines (default: keep everything)
    #[arg(long, value_name = "N")]
    pub history_limit: Option<usize>,

    /// Disconnect clients that send nothing for this many seconds
    #[arg(long, value_name = "SECS")]
    pub idle_timeout: Option<u64>,
}

fn parse_max_clients(value: &str) -> Result<usize, String> {
    let n: usize = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if n == 0 {
        return Err("must be at least 1".to_string());
    }
    Ok(n)
}

impl Cli {
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            addr: SocketAddr::new(self.host, self.port),
            max_clients: self.max_clients,
            history_limit: self.history_limit,
            idle_timeout: self.idle_timeout.map(Duration::from_secs),
            ..ServerConfig::default()
        }
    }
}

/// Runtime settings for a `ChatServer`
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub max_clients: usize,
    pub history_limit: Option<usize>,
    pub idle_timeout: Option<Duration>,
    pub event_buffer: usize,
    pub outbound_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            max_clients: DEFAULT_MAX_CLIENTS,
            history_limit: None,
            idle_timeout: None,
            event_buffer: EVENT_BUFFER_SIZE,
            outbound_buffer: OUTBOUND_BUFFER_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("tcp_chat").chain(args.iter().copied()))
    }

    #[test]
    fn test_default_port() {
        let cli = parse(&[]).unwrap();
        assert_eq!(cli.port, 8989);
        assert_eq!(cli.server_config().addr.port(), 8989);
        assert_eq!(cli.max_clients, 10);
    }

    #[test]
    fn test_valid_port() {
        let cli = parse(&["2525"]).unwrap();
        assert_eq!(cli.server_config().addr.port(), 2525);
    }

    #[test]
    fn test_out_of_range_port_rejected() {
        assert!(parse(&["99999"]).is_err());
        assert!(parse(&["0"]).is_err());
        assert!(parse(&["65536"]).is_err());
    }

    #[test]
    fn test_non_numeric_port_rejected() {
        assert!(parse(&["abc"]).is_err());
    }

    #[test]
    fn test_extra_positional_rejected() {
        assert!(parse(&["8989", "9090"]).is_err());
    }

    #[test]
    fn test_zero_max_clients_rejected() {
        assert!(parse(&["--max-clients", "0"]).is_err());
    }

    #[test]
    fn test_optional_settings() {
        let cli = parse(&["--history-limit", "50", "--idle-timeout", "30"]).unwrap();
        let config = cli.server_config();
        assert_eq!(config.history_limit, Some(50));
        assert_eq!(config.idle_timeout, Some(Duration::from_secs(30)));
    }
}

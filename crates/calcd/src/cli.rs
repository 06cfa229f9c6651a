//! Command-line interface handling for the calculator server.
//!
//! One positional argument names the listening address; the optional flags
//! override values from the configuration file.

use clap::Parser;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Command line arguments parsed from user input.
#[derive(Parser, Debug, Clone)]
#[command(name = "calcd", author, version, about = "Shared-state calculator server", long_about = None)]
pub struct Args {
    /// Address to listen on: a bare port (e.g. `8080`) or `IP:PORT`
    #[arg(value_name = "ADDRESS", value_parser = parse_listen_address)]
    pub address: SocketAddr,

    /// Optional TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Maximum number of concurrently active sessions
    #[arg(long, value_name = "N")]
    pub max_sessions: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Output logs in JSON format
    #[arg(long)]
    pub json_logs: bool,
}

/// Parses a bare port as `0.0.0.0:<port>`, otherwise expects `IP:PORT`.
pub fn parse_listen_address(value: &str) -> Result<SocketAddr, String> {
    if let Ok(port) = value.parse::<u16>() {
        return Ok(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)));
    }

    value
        .parse::<SocketAddr>()
        .map_err(|_| format!("invalid listen address {value:?}: expected PORT or IP:PORT"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_port() {
        let addr = parse_listen_address("8080").unwrap();
        assert_eq!(addr, "0.0.0.0:8080".parse().unwrap());
    }

    #[test]
    fn test_full_address() {
        let addr = parse_listen_address("127.0.0.1:9000").unwrap();
        assert_eq!(addr.port(), 9000);
        assert!(addr.ip().is_loopback());

        let v6 = parse_listen_address("[::1]:9001").unwrap();
        assert!(v6.is_ipv6());
    }

    #[test]
    fn test_invalid_addresses() {
        assert!(parse_listen_address("").is_err());
        assert!(parse_listen_address("70000").is_err());
        assert!(parse_listen_address("localhost").is_err());
    }

    #[test]
    fn test_address_is_required() {
        assert!(Args::try_parse_from(["calcd"]).is_err());
        assert!(Args::try_parse_from(["calcd", "not-a-port"]).is_err());
    }

    #[test]
    fn test_flags() {
        let args = Args::try_parse_from([
            "calcd",
            "4000",
            "--max-sessions",
            "8",
            "--log-level",
            "debug",
            "--json-logs",
        ])
        .unwrap();

        assert_eq!(args.address.port(), 4000);
        assert_eq!(args.max_sessions, Some(8));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.json_logs);
        assert!(args.config.is_none());
    }
}

//! Listening socket construction.

use crate::config::ServerConfig;
use crate::error::ServerError;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::TcpListener as StdTcpListener;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Binds and listens on `config.bind_address`.
///
/// Must be called from within a Tokio runtime.
pub fn bind_listener(config: &ServerConfig) -> Result<TcpListener, ServerError> {
    let address = config.bind_address;

    let socket = Socket::new(Domain::for_address(address), Type::STREAM, Some(Protocol::TCP))
        .map_err(|e| ServerError::Network(format!("Socket creation failed: {e}")))?;

    if let Err(e) = socket.set_reuse_address(true) {
        warn!("Failed to set SO_REUSEADDR: {}", e);
    }

    socket
        .bind(&address.into())
        .map_err(|e| ServerError::Network(format!("Bind to {address} failed: {e}")))?;

    socket
        .listen(config.backlog)
        .map_err(|e| ServerError::Network(format!("Listen failed: {e}")))?;

    socket
        .set_nonblocking(true)
        .map_err(|e| ServerError::Network(format!("Failed to make socket non-blocking: {e}")))?;

    let std_listener: StdTcpListener = socket.into();
    let listener = TcpListener::from_std(std_listener)
        .map_err(|e| ServerError::Network(format!("Tokio listener creation failed: {e}")))?;

    info!("✅ Listener bound on {}", listener.local_addr()?);
    Ok(listener)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let config = ServerConfig::new("127.0.0.1:0".parse().unwrap());
        let listener = bind_listener(&config).expect("bind should succeed");
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn test_bind_conflict_is_network_error() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let config = ServerConfig::new(taken.local_addr().unwrap());

        match bind_listener(&config) {
            Err(ServerError::Network(message)) => assert!(message.contains("Bind")),
            other => panic!("expected a bind failure, got {other:?}"),
        }
    }
}

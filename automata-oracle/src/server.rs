use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::oracle::DfaOracle;
use crate::protocol::handle_connection;

/// Configuration of the oracle's TCP front end.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on. Port 0 binds an ephemeral port, which
    /// [`OracleServer::local_addr`] reports after binding.
    pub port: u16,
    /// Size of the per-connection read buffer. A request must arrive in a
    /// single socket read and fit this buffer; the protocol carries no length
    /// prefix, so longer or split messages misparse.
    pub read_buffer_size: usize,
    /// Close a connection when no request arrives within this limit. `None`
    /// waits indefinitely, leaving silent clients parked on their handler
    /// task.
    pub read_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            read_buffer_size: 8192,
            read_timeout: None,
        }
    }
}

/// Fatal startup failures. Everything after a successful bind is handled per
/// connection and never tears the server down.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be set up.
    #[error("could not bind port {port}")]
    Bind {
        /// The configured port.
        port: u16,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

/// The oracle's TCP listener. Every accepted connection is served by its own
/// task; the only state shared between tasks is the read-only target
/// automaton, so queries on different connections never contend.
#[derive(Debug)]
pub struct OracleServer {
    oracle: Arc<DfaOracle>,
    config: ServerConfig,
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl OracleServer {
    /// Binds the configured port and returns the server, ready to
    /// [`run`](OracleServer::run).
    pub async fn bind(oracle: DfaOracle, config: ServerConfig) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(("0.0.0.0", config.port))
            .await
            .map_err(|source| ServerError::Bind {
                port: config.port,
                source,
            })?;
        let local_addr = listener.local_addr().map_err(|source| ServerError::Bind {
            port: config.port,
            source,
        })?;
        info!(
            %local_addr,
            states = oracle.target().state_count(),
            "oracle listening"
        );
        Ok(Self {
            oracle: Arc::new(oracle),
            config,
            listener,
            local_addr,
        })
    }

    /// The address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accepts connections forever, spawning one handler task per connection.
    /// The accept loop never waits on a handler; failed accepts and failed
    /// connections are logged and the loop keeps serving.
    pub async fn run(self) {
        loop {
            let (mut stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(error) => {
                    warn!(%error, "failed to accept a connection");
                    continue;
                }
            };
            debug!(%peer, "accepted connection");

            let oracle = Arc::clone(&self.oracle);
            let config = self.config.clone();
            tokio::spawn(async move {
                match handle_connection(&oracle, &mut stream, &config).await {
                    Ok(()) => debug!(%peer, "connection closed"),
                    Err(error) => warn!(%peer, %error, "connection closed with error"),
                }
            });
        }
    }
}

//! Connection lifecycle: connect with timeout, retry forever with a fixed
//! delay, and track whether the pump currently holds a live stream.

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncRead;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use adsb_framing::ClientConfig;

use crate::error::{ClientError, Result};

/// Where the pump is in its connect/read cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Opens byte streams. Production code uses [`TcpConnector`].
#[async_trait]
pub trait Connector: Send + Sync {
    type Stream: AsyncRead + Unpin + Send + 'static;

    async fn connect(&self, host: &str, port: u16) -> io::Result<Self::Stream>;
}

/// Plain TCP connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&self, host: &str, port: u16) -> io::Result<TcpStream> {
        let stream = TcpStream::connect((host, port)).await?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }
}

/// Retries connects to one source until one succeeds or the token fires.
pub struct ConnectionManager<C> {
    connector: C,
    host: String,
    port: u16,
    connect_timeout: Duration,
    reconnect_delay: Duration,
    state: ConnectionState,
    attempts: u64,
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(connector: C, config: &ClientConfig) -> Self {
        ConnectionManager {
            connector,
            host: config.host.clone(),
            port: config.port,
            connect_timeout: config.connect_timeout(),
            reconnect_delay: config.reconnect_delay(),
            state: ConnectionState::Disconnected,
            attempts: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Connect attempts made so far, successful or not.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Called by the pump when the current stream failed.
    pub fn mark_disconnected(&mut self) {
        self.state = ConnectionState::Disconnected;
    }

    /// Connect, retrying without bound.
    ///
    /// The only error returned is [`ClientError::Cancelled`].
    #[tracing::instrument(skip(self, cancel), fields(host = %self.host, port = self.port))]
    pub async fn connect(&mut self, cancel: &CancellationToken) -> Result<C::Stream> {
        loop {
            if cancel.is_cancelled() {
                self.state = ConnectionState::Disconnected;
                return Err(ClientError::Cancelled);
            }

            self.state = ConnectionState::Connecting;
            self.attempts += 1;

            let attempt = tokio::select! {
                _ = cancel.cancelled() => None,
                result = self.attempt() => Some(result),
            };

            match attempt {
                None => {
                    self.state = ConnectionState::Disconnected;
                    return Err(ClientError::Cancelled);
                }
                Some(Ok(stream)) => {
                    info!(attempt = self.attempts, "server connected");
                    self.state = ConnectionState::Connected;
                    return Ok(stream);
                }
                Some(Err(e)) => {
                    warn!(
                        attempt = self.attempts,
                        error = %e,
                        "connection failed, retrying in {:?}",
                        self.reconnect_delay
                    );
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    self.state = ConnectionState::Disconnected;
                    return Err(ClientError::Cancelled);
                }
                _ = sleep(self.reconnect_delay) => {}
            }
        }
    }

    async fn attempt(&self) -> Result<C::Stream> {
        match timeout(
            self.connect_timeout,
            self.connector.connect(&self.host, self.port),
        )
        .await
        {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(source)) => Err(ClientError::Connect {
                host: self.host.clone(),
                port: self.port,
                source,
            }),
            Err(_) => Err(ClientError::ConnectTimeout {
                host: self.host.clone(),
                port: self.port,
                timeout: self.connect_timeout,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! The read loop: socket bytes → raw buffer → decoder → handler.
//!
//! One pump owns one connection, one buffer and one handler. It never gives
//! up on its own: read failures lead to a reconnect, and only the
//! cancellation token ends `run`.

use std::time::Duration;

use serde::Serialize;
use tokio::io::AsyncReadExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use adsb_framing::{ClientConfig, DecodedMessage, FrameFormat, RawBuffer};

use crate::connection::{ConnectionManager, ConnectionState, Connector, TcpConnector};
use crate::error::ClientError;
use crate::handler::MessageHandler;

/// Running totals for one pump.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PumpStats {
    pub bytes_read: u64,
    pub messages: u64,
    pub reconnects: u64,
}

pub struct StreamPump<C, H> {
    format: FrameFormat,
    buffer: RawBuffer,
    connection: ConnectionManager<C>,
    handler: H,
    read_chunk_size: usize,
    pause: Duration,
    stats: PumpStats,
}

impl<H: MessageHandler> StreamPump<TcpConnector, H> {
    /// Pump reading from a TCP source.
    pub fn new(config: &ClientConfig, handler: H) -> Self {
        StreamPump::with_connector(config, TcpConnector, handler)
    }
}

impl<C: Connector, H: MessageHandler> StreamPump<C, H> {
    pub fn with_connector(config: &ClientConfig, connector: C, handler: H) -> Self {
        StreamPump {
            format: config.format,
            buffer: RawBuffer::new(),
            connection: ConnectionManager::new(connector, config),
            handler,
            read_chunk_size: config.read_chunk_size.max(1),
            pause: config.pause(),
            stats: PumpStats::default(),
        }
    }

    pub fn format(&self) -> FrameFormat {
        self.format
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn stats(&self) -> PumpStats {
        self.stats
    }

    /// Bytes waiting for the rest of their frame.
    pub fn buffer(&self) -> &RawBuffer {
        &self.buffer
    }

    /// Append freshly read bytes and decode whatever is now complete.
    pub fn ingest(&mut self, data: &[u8]) -> Vec<DecodedMessage> {
        self.buffer.extend(data);
        self.stats.bytes_read += data.len() as u64;
        self.format.decode(&mut self.buffer)
    }

    /// Run until `cancel` fires. Returns the final counters.
    pub async fn run(&mut self, cancel: CancellationToken) -> PumpStats {
        info!(
            host = self.connection.host(),
            port = self.connection.port(),
            format = %self.format,
            "starting stream pump"
        );

        let mut stream = match self.connection.connect(&cancel).await {
            Ok(stream) => stream,
            Err(_) => return self.stats,
        };
        let mut chunk = vec![0u8; self.read_chunk_size];

        loop {
            let read = tokio::select! {
                _ = cancel.cancelled() => break,
                read = stream.read(&mut chunk) => read,
            };

            let read = match read {
                Ok(0) => Err(ClientError::Closed),
                Ok(n) => Ok(n),
                Err(e) => Err(ClientError::Stream(e)),
            };

            match read {
                Ok(n) => {
                    let messages = self.ingest(&chunk[..n]);
                    if messages.is_empty() {
                        continue;
                    }

                    trace!(count = messages.len(), "forwarding messages");
                    self.stats.messages += messages.len() as u64;
                    self.handler.handle(messages);

                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = sleep(self.pause) => {}
                    }
                }
                Err(e) => {
                    warn!(error = %e, "stream failed, reconnecting");
                    self.connection.mark_disconnected();
                    if !self.buffer.is_empty() {
                        debug!(bytes = self.buffer.len(), "discarding partial frame");
                        self.buffer.clear();
                    }

                    match self.connection.connect(&cancel).await {
                        Ok(new_stream) => {
                            stream = new_stream;
                            self.stats.reconnects += 1;
                        }
                        Err(ClientError::Cancelled) => break,
                        Err(e) => error!(error = %e, "reconnect failed"),
                    }
                }
            }
        }

        self.connection.mark_disconnected();
        info!(
            bytes = self.stats.bytes_read,
            messages = self.stats.messages,
            reconnects = self.stats.reconnects,
            "stream pump stopped"
        );
        self.stats
    }
}

impl<C, H> StreamPump<C, H>
where
    C: Connector + 'static,
    H: MessageHandler + 'static,
{
    /// Run the pump on its own task.
    pub fn spawn(mut self, cancel: CancellationToken) -> JoinHandle<PumpStats> {
        tokio::spawn(async move { self.run(cancel).await })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Errors raised on the connection and read path.
//!
//! None of these stop the pump; they are logged and drive a reconnect.

use std::io;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connect to {host}:{port} timed out after {timeout:?}")]
    ConnectTimeout {
        host: String,
        port: u16,
        timeout: Duration,
    },
    #[error("connect to {host}:{port} failed: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },
    #[error("read failed: {0}")]
    Stream(#[from] io::Error),
    #[error("connection closed by peer")]
    Closed,
    #[error("cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, ClientError>;

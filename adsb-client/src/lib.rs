//! adsb-client: Reconnecting stream client for raw Mode S sources.
//!
//! Connects to an AVR, Beast or dump1090 TCP feed, frames the byte stream
//! with `adsb-framing`, and hands timestamped messages to a handler.

pub mod connection;
pub mod error;
pub mod handler;
pub mod pump;

pub use connection::{ConnectionManager, ConnectionState, Connector, TcpConnector};
pub use error::ClientError;
pub use handler::{ChannelHandler, MessageHandler, PrintHandler};
pub use pump::{PumpStats, StreamPump};

pub use adsb_framing::{ClientConfig, DecodedMessage, FrameFormat, LengthClass};

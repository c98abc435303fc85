//! adsb-framing: Stateful framing decoders for raw Mode S streams.
//!
//! No async, no sockets. Byte buffers in, timestamped hex messages
//! out. The network side lives in `adsb-client`.

pub mod avr;
pub mod beast;
pub mod config;
pub mod dump1090;
pub mod frame;
pub mod types;

// Re-export commonly used types at crate root
pub use config::ClientConfig;
pub use frame::{FrameFormat, RawBuffer};
pub use types::*;

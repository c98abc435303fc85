//! Consumers of decoded messages.

use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use adsb_framing::DecodedMessage;

/// Receives every batch the pump decodes, in stream order.
pub trait MessageHandler: Send {
    fn handle(&mut self, messages: Vec<DecodedMessage>);
}

impl<F> MessageHandler for F
where
    F: FnMut(Vec<DecodedMessage>) + Send,
{
    fn handle(&mut self, messages: Vec<DecodedMessage>) {
        self(messages)
    }
}

/// Prints `<timestamp> <payload>` per message to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrintHandler;

impl MessageHandler for PrintHandler {
    fn handle(&mut self, messages: Vec<DecodedMessage>) {
        for msg in messages {
            println!("{}", format_line(&msg));
        }
    }
}

fn format_line(msg: &DecodedMessage) -> String {
    format!("{:.6} {}", msg.timestamp, msg.payload)
}

/// Forwards messages into a channel, so several pumps can feed one consumer.
#[derive(Debug, Clone)]
pub struct ChannelHandler {
    tx: UnboundedSender<DecodedMessage>,
}

impl ChannelHandler {
    pub fn new(tx: UnboundedSender<DecodedMessage>) -> Self {
        ChannelHandler { tx }
    }
}

impl MessageHandler for ChannelHandler {
    fn handle(&mut self, messages: Vec<DecodedMessage>) {
        for msg in messages {
            if self.tx.send(msg).is_err() {
                debug!("message channel closed, dropping batch");
                return;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! adsb-client: Print timestamped Mode S messages from a raw TCP feed.
//!
//! Usage: `adsb-client <host> <port> <avr|beast|dump1090>`

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use adsb_client::{PrintHandler, StreamPump};
use adsb_framing::config::{self, ClientConfig};
use adsb_framing::FrameFormat;

#[derive(Parser)]
#[command(
    name = "adsb-client",
    version,
    about = "Stream raw Mode S messages from an AVR, Beast or dump1090 feed"
)]
struct Cli {
    /// Source host name or address
    host: String,

    /// Source TCP port
    port: u16,

    /// Wire format: avr, beast or dump1090
    format: FrameFormat,

    /// Config file with connection defaults (default: ~/.adsb-client/config.toml)
    #[arg(long, env = "ADSB_CLIENT_CONFIG")]
    config: Option<PathBuf>,

    /// Seconds before a connect attempt is abandoned
    #[arg(long)]
    connect_timeout: Option<u64>,

    /// Seconds to wait between connect attempts
    #[arg(long)]
    reconnect_delay: Option<u64>,

    /// Maximum bytes per socket read
    #[arg(long)]
    chunk_size: Option<usize>,
}

impl Cli {
    /// File settings first, then anything given on the command line.
    fn client_config(&self) -> anyhow::Result<ClientConfig> {
        let path = self.config.clone().unwrap_or_else(config::config_file);
        let mut cfg = config::load_config(&path)
            .with_context(|| format!("loading {}", path.display()))?;

        cfg.host = self.host.clone();
        cfg.port = self.port;
        cfg.format = self.format;
        if let Some(secs) = self.connect_timeout {
            cfg.connect_timeout_secs = secs;
        }
        if let Some(secs) = self.reconnect_delay {
            cfg.reconnect_delay_secs = secs;
        }
        if let Some(size) = self.chunk_size {
            cfg.read_chunk_size = size;
        }

        cfg.validate()?;
        Ok(cfg)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cfg = cli.client_config()?;
    info!(host = %cfg.host, port = cfg.port, format = %cfg.format, "collecting Mode S messages");

    let cancel = CancellationToken::new();
    let pump = StreamPump::new(&cfg, PrintHandler).spawn(cancel.clone());

    tokio::signal::ctrl_c()
        .await
        .context("listening for ctrl-c")?;
    info!("shutting down");
    cancel.cancel();

    let stats = pump.await.context("stream pump task panicked")?;
    info!(
        bytes = stats.bytes_read,
        messages = stats.messages,
        reconnects = stats.reconnects,
        "done"
    );
    Ok(())
}

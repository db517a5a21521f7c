//! Rowdeck - HTTP server for uploading and browsing a CSV dataset
//!
//! Starts with an empty dataset; every successful upload replaces it.

use anyhow::{Context, Result};
use argh::FromArgs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rowdeck::config::ServerConfig;
use rowdeck::data::DatasetStore;
use rowdeck::server::start_server;

/// Rowdeck - upload a CSV dataset, then search and page through it
#[derive(FromArgs)]
struct Args {
    /// interface to bind (default: 127.0.0.1)
    #[argh(option)]
    host: Option<String>,

    /// port to listen on (default: 5000)
    #[argh(option, short = 'p')]
    port: Option<u16>,

    /// origin allowed to call the API (default: http://localhost:5173)
    #[argh(option)]
    cors_origin: Option<String>,

    /// directory for in-flight upload spools (default: system temp dir)
    #[argh(option)]
    upload_dir: Option<PathBuf>,

    /// largest accepted upload in MiB (default: 64)
    #[argh(option)]
    max_upload_mb: Option<usize>,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        let mut config = ServerConfig::default();
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(origin) = self.cors_origin {
            config.cors_origin = origin;
        }
        if let Some(dir) = self.upload_dir {
            config.upload_dir = dir;
        }
        if let Some(mb) = self.max_upload_mb {
            config.max_upload_bytes = mb.saturating_mul(1024 * 1024);
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("rowdeck=info,tower_http=info")),
        )
        .init();

    let args: Args = argh::from_env();
    let config = args.into_config();

    std::fs::create_dir_all(&config.upload_dir).with_context(|| {
        format!("Failed to create upload dir: {}", config.upload_dir.display())
    })?;
    info!(
        "Spooling uploads to {} (limit {} bytes), CORS origin {}",
        config.upload_dir.display(),
        config.max_upload_bytes,
        config.cors_origin
    );

    start_server(DatasetStore::new(), config).await
}

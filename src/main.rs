//! `incoming` binary: serves the upload form and writes uploads to a directory.

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use incoming::{config, server, FileNamePolicy, UploadConfig, Uploader};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Minimal HTTP server accepting multipart file uploads.
#[derive(Debug, Parser)]
#[command(name = "incoming", version, about)]
struct Cli {
    /// Directory to save files to [default: ./incoming]
    #[arg(long, value_name = "PATH")]
    dir: Option<PathBuf>,

    /// Address to bind to
    #[arg(long, value_name = "ADDR", default_value = "0.0.0.0:8080")]
    addr: SocketAddr,

    /// How client file names become paths: verbatim, base-name or sanitize
    #[arg(long, value_name = "POLICY", default_value = "verbatim")]
    file_names: FileNamePolicy,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<UploadConfig> {
        Uploader::builder()
            .dir(self.dir.unwrap_or_else(config::default_dir))
            .addr(self.addr)
            .file_names(self.file_names)
            .build()
            .context("invalid configuration")
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Cli::parse().into_config()?;
    let addr = config.addr;
    let uploader = Arc::new(Uploader::new(config).context("invalid configuration")?);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let local_addr = listener.local_addr().context("failed to read listener address")?;

    let upload_config = uploader.config();
    tracing::info!(
        "Serving at http://{local_addr}/ uploading to {}",
        upload_config.dir.display()
    );
    if upload_config.file_names == FileNamePolicy::Verbatim {
        tracing::warn!(
            "client file names are joined to the upload directory verbatim; \
             use --file-names base-name or sanitize for untrusted clients"
        );
    }

    tokio::select! {
        result = server::serve(listener, Arc::clone(&uploader)) => {
            result.context("server accept loop failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
        }
    }

    Ok(())
}

use anyhow::{Context, Result};
use clap::Parser;
use server::{build_app, ServerConfig};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

/// Serve ordinance search over HTTP from a prebuilt index directory.
#[derive(Parser, Debug)]
#[command(name = "server")]
struct Args {
    /// Directory written by `indexer build`
    #[arg(long, default_value = "./index")]
    index: String,
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Largest number of results a single search may return
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(i64).range(1..))]
    max_k: i64,
}

impl Args {
    fn config(&self) -> ServerConfig {
        ServerConfig { max_k: self.max_k, ..ServerConfig::from_env() }
    }

    fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let addr = args.addr()?;
    let app = build_app(args.index.clone(), args.config())
        .with_context(|| format!("loading ordinance index from {}", args.index))?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, index = %args.index, max_k = args.max_k, "serving ordinance search");
    axum::serve(listener, app).await?;
    Ok(())
}

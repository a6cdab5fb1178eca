use anyhow::Context;
use hush_core::config::CONNECT_TIMEOUT;
use hush_core::{init_core, perform_client_handshake, ClientConfig};
use hush_net::TransportBuilder;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let path = std::env::args().nth(1).context("usage: hush <config.json>")?;
    let mut config = ClientConfig::load(&path)?;
    config.apply_env()?;

    let ctx = init_core(&config)?;

    let addr = config.remote_addr()?;
    let mut stream = TransportBuilder::connect(addr, CONNECT_TIMEOUT)
        .await
        .with_context(|| format!("connecting to {addr}"))?;

    let flight = perform_client_handshake(&mut stream, &ctx, &config.handshake_options()).await?;
    tracing::info!("Server flight from {} carried {} records", addr, flight.len());

    Ok(())
}

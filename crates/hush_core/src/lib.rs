//! Entry points for the connection orchestrator: forge a ClientHello record,
//! compose the post-hello reply, and read or unwrap single records.

pub mod config;
pub mod crypto;
pub mod forger;
pub mod handshake;
pub mod reply;

pub use config::ClientConfig;
pub use forger::forge_client_hello_record;
pub use handshake::{perform_client_handshake, HandshakeOptions};
pub use hush_net::record::{peel_record_layer as strip_record_header, read_till_drain as read_one_record};
pub use reply::compose_handshake_reply;

use hush_traits::{SharedContext, SystemClock};
use std::sync::Arc;

/// Validates `config` and returns the context shared by every connection.
pub fn init_core(config: &ClientConfig) -> anyhow::Result<SharedContext> {
    tracing::info!("Initializing handshake core...");

    let ctx = config.to_context(Arc::new(SystemClock))?;
    // Compose once so a context that cannot produce a hello is caught now.
    forge_client_hello_record(&ctx)?;

    tracing::info!(
        "Disguising as {} for {} (ticket window {}s)",
        ctx.fingerprint(),
        ctx.server_name(),
        ctx.ticket_time_hint()
    );
    Ok(ctx)
}

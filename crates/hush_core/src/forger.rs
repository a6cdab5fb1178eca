use hush_net::record::{add_record_layer, ContentType, TLS10};
use hush_traits::{Result, SharedContext};
use mod_fingerprint::fingerprint_for;
use tracing::debug;

/// The ClientHello for the context's browser, wrapped in a handshake record
/// carrying the TLS 1.0 legacy version real clients put on their first record.
pub fn forge_client_hello_record(ctx: &SharedContext) -> Result<Vec<u8>> {
    let fingerprint = fingerprint_for(ctx.fingerprint());
    let hello = fingerprint.compose_client_hello(ctx)?;
    let record = add_record_layer(&hello, ContentType::Handshake, TLS10)?;
    debug!(
        "Forged {} ClientHello record of {} bytes for {}",
        ctx.fingerprint(),
        record.len(),
        ctx.server_name()
    );
    Ok(record)
}

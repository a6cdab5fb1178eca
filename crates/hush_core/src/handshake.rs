//! Client side of the disguised handshake.
//!
//! ```text
//! client                          server
//!   ClientHello        ---->
//!                      <----      ServerHello
//!                      <----      ChangeCipherSpec
//!                      <----      Finished
//!   ChangeCipherSpec
//!   Finished           ---->
//! ```

use crate::forger::forge_client_hello_record;
use crate::reply::compose_handshake_reply_at;
use hush_net::record::{read_till_drain_within, PAYLOAD_DEADLINE};
use hush_net::TransportBuilder;
use hush_traits::{Result, SharedContext};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

/// ServerHello, ChangeCipherSpec and Finished.
pub const SERVER_FLIGHT_RECORDS: usize = 3;

#[derive(Debug, Clone, Copy)]
pub struct HandshakeOptions {
    /// Split the ClientHello into writes of at most this many bytes.
    pub fragment_size: Option<usize>,
    /// Pause between fragments.
    pub fragment_interval: Duration,
    /// Deadline for each server record's payload once its header arrived.
    pub payload_deadline: Duration,
}

impl Default for HandshakeOptions {
    fn default() -> Self {
        Self {
            fragment_size: None,
            fragment_interval: Duration::from_millis(5),
            payload_deadline: PAYLOAD_DEADLINE,
        }
    }
}

/// Runs the client choreography over `stream` and returns the server's
/// flight, one record per element. The server records are not inspected.
pub async fn perform_client_handshake<S>(
    stream: &mut S,
    ctx: &SharedContext,
    options: &HandshakeOptions,
) -> Result<Vec<Vec<u8>>>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    let hello = forge_client_hello_record(ctx)?;
    match options.fragment_size {
        Some(chunk) => {
            let mut fragmented = TransportBuilder::wrap_fragmented(&mut *stream, chunk, options.fragment_interval);
            fragmented.write_all(&hello).await?;
        }
        None => stream.write_all(&hello).await?,
    }
    stream.flush().await?;
    debug!("Sent ClientHello ({} bytes)", hello.len());

    let mut flight = Vec::with_capacity(SERVER_FLIGHT_RECORDS);
    for _ in 0..SERVER_FLIGHT_RECORDS {
        flight.push(read_till_drain_within(stream, options.payload_deadline).await?);
    }

    let reply = compose_handshake_reply_at(ctx.now())?;
    stream.write_all(&reply).await?;
    stream.flush().await?;

    info!("Handshake disguised as {} to {} complete", ctx.fingerprint(), ctx.server_name());
    Ok(flight)
}

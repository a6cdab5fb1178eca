//! Wire plumbing for the disguised handshake: record framing, extension
//! builders, seeded byte generation and stream helpers.

pub mod auth;
pub mod extensions;
pub mod prng;
pub mod record;
pub mod transport;

pub use record::{add_record_layer, peel_record_layer, read_till_drain, read_till_drain_within, ContentType};
pub use transport::TransportBuilder;

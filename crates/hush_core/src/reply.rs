use chrono::{DateTime, Utc};
use hush_net::prng::pseudo_random_bytes;
use hush_net::record::{add_record_layer, ContentType, TLS12};
use hush_traits::{unix_nanos, Result};

/// Size of the forged Finished payload (a real one is an encrypted 12-byte
/// verify_data plus explicit nonce and tag).
pub const FINISHED_LEN: usize = 40;

const CHANGE_CIPHER_SPEC: [u8; 1] = [0x01];

/// ChangeCipherSpec record followed by a Finished-shaped record, both at TLS 1.2.
pub fn compose_handshake_reply() -> Result<Vec<u8>> {
    compose_handshake_reply_at(Utc::now())
}

pub fn compose_handshake_reply_at(now: DateTime<Utc>) -> Result<Vec<u8>> {
    let ccs = add_record_layer(&CHANGE_CIPHER_SPEC, ContentType::ChangeCipherSpec, TLS12)?;
    let finished = pseudo_random_bytes(FINISHED_LEN, unix_nanos(now));
    let finished = add_record_layer(&finished, ContentType::Handshake, TLS12)?;
    Ok([ccs, finished].concat())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hush_net::record::peel_record_layer;

    #[test]
    fn reply_is_ccs_then_finished() {
        let reply = compose_handshake_reply().unwrap();
        assert_eq!(reply.len(), 6 + 5 + FINISHED_LEN);
        assert_eq!(&reply[..6], &[0x14u8, 0x03, 0x03, 0x00, 0x01, 0x01]);

        let finished = &reply[6..];
        assert_eq!(&finished[..5], &[0x16u8, 0x03, 0x03, 0x00, FINISHED_LEN as u8]);
        assert_eq!(peel_record_layer(finished).unwrap().len(), FINISHED_LEN);
    }

    #[test]
    fn finished_payload_follows_the_clock() {
        let t = DateTime::<Utc>::from_timestamp(1_700_000_000, 5).unwrap();
        let u = DateTime::<Utc>::from_timestamp(1_700_000_000, 6).unwrap();
        assert_eq!(compose_handshake_reply_at(t).unwrap(), compose_handshake_reply_at(t).unwrap());
        assert_ne!(compose_handshake_reply_at(t).unwrap(), compose_handshake_reply_at(u).unwrap());
    }
}

//! Shared-secret material folded into forged handshake fields.
//!
//! Both the session ticket seed and the authenticated `random` field are pure
//! functions of the shared context and its clock, so a peer holding the same
//! key and opaque value can recompute them for the current time bucket.

use crate::prng::pseudo_random_bytes;
use hush_traits::{unix_nanos, SharedContext};
use sha2::{Digest, Sha256};

pub const RANDOM_FIELD_LEN: usize = 32;
const RANDOM_NONCE_LEN: usize = 16;

/// Big-endian integer view of `bytes`, keeping only the low 64 bits.
pub fn key_as_int(bytes: &[u8]) -> i64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)) as i64
}

/// `opaque + int(shared_key) + time_bucket`, wrapping on overflow.
///
/// Peers depend on this exact derivation; do not change it.
pub fn ticket_seed(ctx: &SharedContext) -> i64 {
    ctx.opaque()
        .wrapping_add(key_as_int(ctx.shared_key()))
        .wrapping_add(ctx.time_bucket())
}

fn random_tag(ctx: &SharedContext, bucket: i64, nonce: &[u8]) -> [u8; RANDOM_NONCE_LEN] {
    let digest = Sha256::new()
        .chain_update(ctx.shared_key())
        .chain_update(bucket.to_be_bytes())
        .chain_update(nonce)
        .finalize();
    let mut tag = [0u8; RANDOM_NONCE_LEN];
    tag.copy_from_slice(&digest[..RANDOM_NONCE_LEN]);
    tag
}

/// ClientHello `random`: a clock-seeded nonce followed by a truncated
/// SHA-256 over key, time bucket and nonce.
pub fn make_random_field(ctx: &SharedContext) -> [u8; RANDOM_FIELD_LEN] {
    let nonce = pseudo_random_bytes(RANDOM_NONCE_LEN, unix_nanos(ctx.now()));
    let tag = random_tag(ctx, ctx.time_bucket(), &nonce);

    let mut field = [0u8; RANDOM_FIELD_LEN];
    field[..RANDOM_NONCE_LEN].copy_from_slice(&nonce);
    field[RANDOM_NONCE_LEN..].copy_from_slice(&tag);
    field
}

/// Checks a `random` field against the current and the previous time bucket,
/// so a hello composed just before a bucket boundary still verifies.
pub fn verify_random_field(random: &[u8], ctx: &SharedContext) -> bool {
    if random.len() != RANDOM_FIELD_LEN {
        return false;
    }
    let (nonce, tag) = random.split_at(RANDOM_NONCE_LEN);
    let bucket = ctx.time_bucket();
    [bucket, bucket.wrapping_sub(1)]
        .into_iter()
        .any(|b| constant_time_eq(&random_tag(ctx, b, nonce), tag))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use hush_traits::{FingerprintVariant, FixedClock};
    use std::sync::Arc;

    fn ctx_at(secs: i64) -> SharedContext {
        SharedContext::new(
            "example.com",
            1234,
            (0u8..32).collect(),
            3600,
            FingerprintVariant::Firefox,
            Arc::new(FixedClock::from_unix(secs)),
        )
        .unwrap()
    }

    #[test]
    fn key_int_keeps_low_eight_bytes() {
        assert_eq!(key_as_int(&[0x01, 0x02]), 0x0102);
        let key: Vec<u8> = (0u8..32).collect();
        assert_eq!(key_as_int(&key), i64::from_be_bytes([24, 25, 26, 27, 28, 29, 30, 31]));
    }

    #[test]
    fn seed_moves_only_across_buckets() {
        assert_eq!(ticket_seed(&ctx_at(7_200)), ticket_seed(&ctx_at(10_799)));
        assert_eq!(ticket_seed(&ctx_at(10_800)), ticket_seed(&ctx_at(7_200)) + 1);
    }

    #[test]
    fn random_field_verifies_with_same_secret() {
        let ctx = ctx_at(1_700_000_000);
        let random = make_random_field(&ctx);
        assert!(verify_random_field(&random, &ctx));
        // One bucket later is still accepted, two is not.
        assert!(verify_random_field(&random, &ctx_at(1_700_000_000 + 3600)));
        assert!(!verify_random_field(&random, &ctx_at(1_700_000_000 + 7200)));
    }

    #[test]
    fn random_field_rejects_tampering_and_other_keys() {
        let ctx = ctx_at(1_700_000_000);
        let mut random = make_random_field(&ctx);
        random[3] ^= 0x80;
        assert!(!verify_random_field(&random, &ctx));

        let other = SharedContext::new(
            "example.com",
            1234,
            vec![0xFF; 32],
            3600,
            FingerprintVariant::Firefox,
            Arc::new(FixedClock::from_unix(1_700_000_000)),
        )
        .unwrap();
        assert!(!verify_random_field(&make_random_field(&ctx), &other));
        assert!(!verify_random_field(&random[..31], &ctx));
    }
}

//! Deterministic byte generator keyed by a 64-bit seed.
//!
//! Backed by ChaCha20, so equal seeds give equal streams on every platform and
//! every build, and outputs for distinct seeds are unrelated without the seed.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// A reproducible generator for `seed`.
pub fn seeded(seed: i64) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(seed as u64)
}

/// The generator for `seed` moved to ChaCha stream `stream`, so several fields
/// can be derived from one seed without sharing keystream.
pub fn stream_rng(seed: i64, stream: u64) -> ChaCha20Rng {
    let mut rng = seeded(seed);
    rng.set_stream(stream);
    rng
}

/// `len` bytes drawn from the stream seeded by `seed`.
pub fn pseudo_random_bytes(len: usize, seed: i64) -> Vec<u8> {
    let mut out = vec![0u8; len];
    seeded(seed).fill_bytes(&mut out);
    out
}

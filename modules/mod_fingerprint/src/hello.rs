//! ClientHello layout shared by every browser template.

use bytes::BufMut;
use hush_net::auth::make_random_field;
use hush_net::extensions::{padding_extension, EXTENSION_HEADER_LEN};
use hush_net::prng::stream_rng;
use hush_net::record::TLS12;
use hush_traits::{unix_nanos, FixedClock, HandshakeError, Result, SharedContext};
use rand::RngCore;
use std::sync::Arc;

pub const CLIENT_HELLO: u8 = 0x01;
pub const SESSION_ID_LEN: usize = 32;

/// Browsers pad hellos that would land in 256..=511 bytes up to 512
/// (RFC 7685, working around middleboxes that choke on those sizes).
pub const PADDED_HELLO_LEN: usize = 512;

/// Keystream indices for the fields seeded from the clock's nanoseconds.
/// Stream 0 is consumed by the random field nonce.
pub(crate) const SESSION_ID_STREAM: u64 = 1;
pub(crate) const GREASE_STREAM: u64 = 2;

const HANDSHAKE_HEADER_LEN: usize = 4;
const RANDOM_LEN: usize = 32;

/// The context with its clock frozen at the current reading, so every field of
/// one hello derives from the same instant.
pub fn pinned(ctx: &SharedContext) -> SharedContext {
    ctx.with_clock(Arc::new(FixedClock(ctx.now())))
}

pub fn session_id(ctx: &SharedContext) -> [u8; SESSION_ID_LEN] {
    let mut id = [0u8; SESSION_ID_LEN];
    stream_rng(unix_nanos(ctx.now()), SESSION_ID_STREAM).fill_bytes(&mut id);
    id
}

/// Length of the hello message excluding its extension blocks.
fn fixed_len(cipher_suites_len: usize) -> usize {
    HANDSHAKE_HEADER_LEN + 2 + RANDOM_LEN + 1 + SESSION_ID_LEN + 2 + cipher_suites_len + 2 + 2
}

/// Padding extension that brings the hello to [`PADDED_HELLO_LEN`], or an
/// empty one when the unpadded hello is already at least that long.
pub fn pad_to_target(cipher_suites_len: usize, unpadded_extensions_len: usize) -> Result<Vec<u8>> {
    let used = fixed_len(cipher_suites_len) + unpadded_extensions_len + EXTENSION_HEADER_LEN;
    padding_extension(PADDED_HELLO_LEN.saturating_sub(used))
}

/// Lays out a complete ClientHello handshake message:
/// `0x01 ++ u24(len) ++ version ++ random ++ session_id ++ suites ++ null compression ++ extensions`.
pub fn assemble(ctx: &SharedContext, cipher_suites: &[u8], extensions: &[u8]) -> Result<Vec<u8>> {
    let suites_len = u16::try_from(cipher_suites.len())
        .map_err(|_| HandshakeError::InvalidConfig("cipher suite list exceeds 16-bit length".into()))?;
    let extensions_len =
        u16::try_from(extensions.len()).map_err(|_| HandshakeError::RecordOverflow { len: extensions.len() })?;

    let body_len = fixed_len(cipher_suites.len()) - HANDSHAKE_HEADER_LEN + extensions.len();
    let mut hello = Vec::with_capacity(HANDSHAKE_HEADER_LEN + body_len);
    hello.put_u8(CLIENT_HELLO);
    hello.put_uint(body_len as u64, 3);
    hello.put_slice(&TLS12);
    hello.put_slice(&make_random_field(ctx));
    hello.put_u8(SESSION_ID_LEN as u8);
    hello.put_slice(&session_id(ctx));
    hello.put_u16(suites_len);
    hello.put_slice(cipher_suites);
    hello.put_u8(1); // compression methods length
    hello.put_u8(0); // null compression
    hello.put_u16(extensions_len);
    hello.put_slice(extensions);
    Ok(hello)
}

/// Borrowed view of the variable fields of a ClientHello message.
#[derive(Debug, Clone, Copy)]
pub struct ParsedHello<'a> {
    pub version: [u8; 2],
    pub random: &'a [u8],
    pub session_id: &'a [u8],
    pub cipher_suites: &'a [u8],
    pub extensions: &'a [u8],
}

/// Splits a ClientHello handshake message into its fields, checking every
/// declared length against the bytes present.
pub fn parse_client_hello(msg: &[u8]) -> Option<ParsedHello<'_>> {
    let (&kind, rest) = msg.split_first()?;
    if kind != CLIENT_HELLO || rest.len() < 3 {
        return None;
    }
    let declared = u32::from_be_bytes([0, rest[0], rest[1], rest[2]]) as usize;
    let body = &rest[3..];
    if body.len() != declared {
        return None;
    }

    let mut cursor = Cursor(body);
    let version = cursor.take(2)?;
    let random = cursor.take(RANDOM_LEN)?;
    let sid_len = cursor.take(1)?[0] as usize;
    let session_id = cursor.take(sid_len)?;
    let suites_len = cursor.u16()? as usize;
    let cipher_suites = cursor.take(suites_len)?;
    let compression_len = cursor.take(1)?[0] as usize;
    cursor.take(compression_len)?;
    let extensions_len = cursor.u16()? as usize;
    let extensions = cursor.take(extensions_len)?;
    if !cursor.0.is_empty() {
        return None;
    }

    Some(ParsedHello {
        version: [version[0], version[1]],
        random,
        session_id,
        cipher_suites,
        extensions,
    })
}

struct Cursor<'a>(&'a [u8]);

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.0.len() < n {
            return None;
        }
        let (head, tail) = self.0.split_at(n);
        self.0 = tail;
        Some(head)
    }

    fn u16(&mut self) -> Option<u16> {
        self.take(2).map(|b| u16::from_be_bytes([b[0], b[1]]))
    }
}

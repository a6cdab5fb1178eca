//! Builders for individual ClientHello extension blocks.

use crate::auth::ticket_seed;
use crate::prng::pseudo_random_bytes;
use bytes::BufMut;
use hush_traits::{HandshakeError, Result, SharedContext};

pub const SERVER_NAME: u16 = 0x0000;
pub const STATUS_REQUEST: u16 = 0x0005;
pub const SUPPORTED_GROUPS: u16 = 0x000a;
pub const EC_POINT_FORMATS: u16 = 0x000b;
pub const SIGNATURE_ALGORITHMS: u16 = 0x000d;
pub const ALPN: u16 = 0x0010;
pub const SIGNED_CERT_TIMESTAMP: u16 = 0x0012;
pub const PADDING: u16 = 0x0015;
pub const EXTENDED_MASTER_SECRET: u16 = 0x0017;
pub const SESSION_TICKET: u16 = 0x0023;
pub const CHANNEL_ID: u16 = 0x7550;
pub const RENEGOTIATION_INFO: u16 = 0xff01;

/// SNI `NameType` for a DNS hostname.
pub const HOST_NAME_TYPE: u8 = 0x00;

/// Size of the forged session ticket, in line with tickets issued by common
/// web servers.
pub const SESSION_TICKET_LEN: usize = 192;

/// Extension block header: type (2) + length (2).
pub const EXTENSION_HEADER_LEN: usize = 4;

fn u16_len(len: usize, ext_type: u16) -> Result<u16> {
    u16::try_from(len).map_err(|_| HandshakeError::ExtensionOverflow { ext_type, len })
}

/// `type ++ be_u16(len(data)) ++ data`
pub fn add_extension_record(ext_type: u16, data: &[u8]) -> Result<Vec<u8>> {
    let len = u16_len(data.len(), ext_type)?;
    let mut block = Vec::with_capacity(EXTENSION_HEADER_LEN + data.len());
    block.put_u16(ext_type);
    block.put_u16(len);
    block.put_slice(data);
    Ok(block)
}

/// SNI extension data: a server name list holding a single host_name entry.
pub fn make_server_name(server_name: &str) -> Result<Vec<u8>> {
    let name = server_name.as_bytes();
    let name_len = u16_len(name.len(), SERVER_NAME)?;
    let list_len = u16_len(1 + 2 + name.len(), SERVER_NAME)?;

    let mut data = Vec::with_capacity(2 + list_len as usize);
    data.put_u16(list_len);
    data.put_u8(HOST_NAME_TYPE);
    data.put_u16(name_len);
    data.put_slice(name);
    Ok(data)
}

/// Session ticket bytes, identical for every composition inside one time bucket.
pub fn make_session_ticket(ctx: &SharedContext) -> Vec<u8> {
    pseudo_random_bytes(SESSION_TICKET_LEN, ticket_seed(ctx))
}

pub fn make_null_bytes(len: usize) -> Vec<u8> {
    vec![0u8; len]
}

pub fn server_name_extension(ctx: &SharedContext) -> Result<Vec<u8>> {
    add_extension_record(SERVER_NAME, &make_server_name(ctx.server_name())?)
}

pub fn session_ticket_extension(ctx: &SharedContext) -> Result<Vec<u8>> {
    add_extension_record(SESSION_TICKET, &make_session_ticket(ctx))
}

pub fn padding_extension(len: usize) -> Result<Vec<u8>> {
    add_extension_record(PADDING, &make_null_bytes(len))
}

/// Walks a concatenation of extension blocks, yielding `(type, data)` pairs.
/// Returns `None` if any block's declared length overruns the input.
pub fn split_extensions(mut blocks: &[u8]) -> Option<Vec<(u16, &[u8])>> {
    let mut out = Vec::new();
    while !blocks.is_empty() {
        if blocks.len() < EXTENSION_HEADER_LEN {
            return None;
        }
        let ext_type = u16::from_be_bytes([blocks[0], blocks[1]]);
        let len = u16::from_be_bytes([blocks[2], blocks[3]]) as usize;
        let data = blocks.get(EXTENSION_HEADER_LEN..EXTENSION_HEADER_LEN + len)?;
        out.push((ext_type, data));
        blocks = &blocks[EXTENSION_HEADER_LEN + len..];
    }
    Some(out)
}

use crate::hello::{self, GREASE_STREAM};
use hush_net::extensions::*;
use hush_net::prng::stream_rng;
use hush_traits::{unix_nanos, BrowserFingerprint, FingerprintVariant, Result, SharedContext};
use rand::Rng;
use tracing::debug;

/// RFC 8701 reserved values.
pub const GREASE_VALUES: [u16; 16] = [
    0x0a0a, 0x1a1a, 0x2a2a, 0x3a3a, 0x4a4a, 0x5a5a, 0x6a6a, 0x7a7a,
    0x8a8a, 0x9a9a, 0xaaaa, 0xbaba, 0xcaca, 0xdada, 0xeaea, 0xfafa,
];

/// Cipher suites following the leading GREASE entry.
const CIPHER_SUITES: [u16; 13] = [
    0xc02b, 0xc02f, 0xc02c, 0xc030, 0xcca9, 0xcca8, 0xc013, 0xc014,
    0x009c, 0x009d, 0x002f, 0x0035, 0x000a,
];

const SIGNATURE_ALGORITHMS_DATA: [u8; 20] = [
    0x00, 0x12, 0x04, 0x03, 0x08, 0x04, 0x04, 0x01, 0x05, 0x03,
    0x08, 0x05, 0x05, 0x01, 0x08, 0x06, 0x06, 0x01, 0x02, 0x01,
];

/// h2, http/1.1
const ALPN_DATA: [u8; 14] = [
    0x00, 0x0c, 0x02, b'h', b'2', 0x08, b'h', b't', b't', b'p', b'/', b'1', b'.', b'1',
];

const STATUS_REQUEST_DATA: [u8; 5] = [0x01, 0x00, 0x00, 0x00, 0x00];

/// x25519, secp256r1, secp384r1 (after the GREASE group)
const GROUPS: [u16; 3] = [0x001d, 0x0017, 0x0018];

/// GREASE values for one hello, drawn from the clock-seeded keystream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grease {
    pub cipher: u16,
    pub group: u16,
    pub first_extension: u16,
    pub last_extension: u16,
}

impl Grease {
    pub fn for_context(ctx: &SharedContext) -> Self {
        let mut rng = stream_rng(unix_nanos(ctx.now()), GREASE_STREAM);
        let mut pick = || GREASE_VALUES[rng.gen_range(0..GREASE_VALUES.len())];
        let cipher = pick();
        let group = pick();
        let first_extension = pick();
        // Chrome never repeats the same GREASE extension type.
        let mut last_extension = pick();
        while last_extension == first_extension {
            last_extension = pick();
        }
        Self { cipher, group, first_extension, last_extension }
    }
}

fn u16_list(values: &[u16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_be_bytes()).collect()
}

fn cipher_suites(grease: &Grease) -> Vec<u8> {
    let mut suites = grease.cipher.to_be_bytes().to_vec();
    suites.extend(u16_list(&CIPHER_SUITES));
    suites
}

fn supported_groups(grease: &Grease) -> Vec<u8> {
    let groups = [&[grease.group][..], &GROUPS[..]].concat();
    let list = u16_list(&groups);
    let mut data = (list.len() as u16).to_be_bytes().to_vec();
    data.extend(list);
    data
}

/// Chrome's hello: GREASE in the cipher list, supported groups and at both
/// ends of the extension list, Channel ID, and size padding.
#[derive(Debug, Clone, Copy, Default)]
pub struct Chrome;

impl BrowserFingerprint for Chrome {
    fn variant(&self) -> FingerprintVariant {
        FingerprintVariant::Chrome
    }

    fn compose_extensions(&self, ctx: &SharedContext) -> Result<Vec<u8>> {
        let grease = Grease::for_context(ctx);
        let blocks = [
            add_extension_record(grease.first_extension, &[])?,
            add_extension_record(RENEGOTIATION_INFO, &[0x00])?,
            server_name_extension(ctx)?,
            add_extension_record(EXTENDED_MASTER_SECRET, &[])?,
            session_ticket_extension(ctx)?,
            add_extension_record(SIGNATURE_ALGORITHMS, &SIGNATURE_ALGORITHMS_DATA)?,
            add_extension_record(STATUS_REQUEST, &STATUS_REQUEST_DATA)?,
            add_extension_record(SIGNED_CERT_TIMESTAMP, &[])?,
            add_extension_record(ALPN, &ALPN_DATA)?,
            add_extension_record(CHANNEL_ID, &[])?,
            add_extension_record(EC_POINT_FORMATS, &[0x01, 0x00])?,
            add_extension_record(SUPPORTED_GROUPS, &supported_groups(&grease))?,
            add_extension_record(grease.last_extension, &[0x00])?,
        ];
        let mut extensions = blocks.concat();
        let padding = hello::pad_to_target(cipher_suites(&grease).len(), extensions.len())?;
        extensions.extend(padding);
        Ok(extensions)
    }

    fn compose_client_hello(&self, ctx: &SharedContext) -> Result<Vec<u8>> {
        let ctx = hello::pinned(ctx);
        let grease = Grease::for_context(&ctx);
        let extensions = self.compose_extensions(&ctx)?;
        let hello = hello::assemble(&ctx, &cipher_suites(&grease), &extensions)?;
        debug!("Composed chrome ClientHello of {} bytes", hello.len());
        Ok(hello)
    }
}

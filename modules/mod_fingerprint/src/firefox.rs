use crate::hello;
use hush_net::extensions::*;
use hush_traits::{BrowserFingerprint, FingerprintVariant, Result, SharedContext};
use tracing::debug;

const CIPHER_SUITES: [u8; 30] = [
    0xc0, 0x2b, 0xc0, 0x2f, 0xcc, 0xa9, 0xcc, 0xa8, 0xc0, 0x2c, 0xc0, 0x30, 0xc0, 0x0a, 0xc0, 0x09,
    0xc0, 0x13, 0xc0, 0x14, 0x00, 0x33, 0x00, 0x39, 0x00, 0x2f, 0x00, 0x35, 0x00, 0x0a,
];

/// x25519, secp256r1, secp384r1, secp521r1
const SUPPORTED_GROUPS_DATA: [u8; 10] = [0x00, 0x08, 0x00, 0x1d, 0x00, 0x17, 0x00, 0x18, 0x00, 0x19];

const SIGNATURE_ALGORITHMS_DATA: [u8; 24] = [
    0x00, 0x16, 0x04, 0x03, 0x05, 0x03, 0x06, 0x03, 0x08, 0x04, 0x08, 0x05, 0x08, 0x06,
    0x04, 0x01, 0x05, 0x01, 0x06, 0x01, 0x02, 0x03, 0x02, 0x01,
];

/// h2, http/1.1
const ALPN_DATA: [u8; 14] = [
    0x00, 0x0c, 0x02, b'h', b'2', 0x08, b'h', b't', b't', b'p', b'/', b'1', b'.', b'1',
];

const STATUS_REQUEST_DATA: [u8; 5] = [0x01, 0x00, 0x00, 0x00, 0x00];

#[derive(Debug, Clone, Copy, Default)]
pub struct Firefox;

impl BrowserFingerprint for Firefox {
    fn variant(&self) -> FingerprintVariant {
        FingerprintVariant::Firefox
    }

    fn compose_extensions(&self, ctx: &SharedContext) -> Result<Vec<u8>> {
        let blocks = [
            server_name_extension(ctx)?,
            add_extension_record(EXTENDED_MASTER_SECRET, &[])?,
            add_extension_record(RENEGOTIATION_INFO, &[0x00])?,
            add_extension_record(SUPPORTED_GROUPS, &SUPPORTED_GROUPS_DATA)?,
            add_extension_record(EC_POINT_FORMATS, &[0x01, 0x00])?,
            session_ticket_extension(ctx)?,
            add_extension_record(ALPN, &ALPN_DATA)?,
            add_extension_record(STATUS_REQUEST, &STATUS_REQUEST_DATA)?,
            add_extension_record(SIGNATURE_ALGORITHMS, &SIGNATURE_ALGORITHMS_DATA)?,
        ];
        let mut extensions = blocks.concat();
        extensions.extend(hello::pad_to_target(CIPHER_SUITES.len(), extensions.len())?);
        Ok(extensions)
    }

    fn compose_client_hello(&self, ctx: &SharedContext) -> Result<Vec<u8>> {
        let ctx = hello::pinned(ctx);
        let extensions = self.compose_extensions(&ctx)?;
        let hello = hello::assemble(&ctx, &CIPHER_SUITES, &extensions)?;
        debug!("Composed firefox ClientHello of {} bytes", hello.len());
        Ok(hello)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hello::{parse_client_hello, PADDED_HELLO_LEN};
    use hush_traits::FixedClock;
    use std::sync::Arc;

    #[test]
    fn hello_layout_matches_firefox() {
        let ctx = SharedContext::new(
            "www.bing.com",
            0,
            vec![0x22; 32],
            60,
            FingerprintVariant::Firefox,
            Arc::new(FixedClock::from_unix(1_600_000_000)),
        )
        .unwrap();
        let msg = Firefox.compose_client_hello(&ctx).unwrap();
        assert_eq!(msg.len(), PADDED_HELLO_LEN);

        let hello = parse_client_hello(&msg).unwrap();
        assert_eq!(hello.cipher_suites, CIPHER_SUITES);
        assert_eq!(hello.session_id.len(), hello::SESSION_ID_LEN);

        let blocks = split_extensions(hello.extensions).unwrap();
        let types: Vec<u16> = blocks.iter().map(|(t, _)| *t).collect();
        assert_eq!(
            types,
            [
                SERVER_NAME,
                EXTENDED_MASTER_SECRET,
                RENEGOTIATION_INFO,
                SUPPORTED_GROUPS,
                EC_POINT_FORMATS,
                SESSION_TICKET,
                ALPN,
                STATUS_REQUEST,
                SIGNATURE_ALGORITHMS,
                PADDING,
            ]
        );
        assert_eq!(blocks[5].1, make_session_ticket(&ctx).as_slice());
    }
}

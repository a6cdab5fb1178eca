//! TLS record framing over a byte stream.
//!
//! A read on a stream socket may hand back part of a record or several records
//! at once. [`read_till_drain`] hides that and yields exactly one record per
//! call, leaving anything after it in the stream for the next call.

use bytes::BufMut;
use hush_traits::{HandshakeError, Result};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::timeout;
use tracing::{debug, warn};

/// type (1) + version (2) + length (2)
pub const HEADER_LEN: usize = 5;

pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize;

/// How long a record payload may take to arrive once its header has been read.
pub const PAYLOAD_DEADLINE: Duration = Duration::from_secs(3);

/// Legacy version carried by the record wrapping a ClientHello.
pub const TLS10: [u8; 2] = [0x03, 0x01];

/// Version carried by records sent after the hello exchange.
pub const TLS12: [u8; 2] = [0x03, 0x03];

/// TLS record content types used by the handshake choreography.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    ChangeCipherSpec = 0x14,
    Handshake = 0x16,
}

/// Prefixes `payload` with a record header.
///
/// Payloads longer than the 16-bit length field are refused rather than
/// truncated, so a declared length never disagrees with the bytes sent.
pub fn add_record_layer(payload: &[u8], record_type: ContentType, version: [u8; 2]) -> Result<Vec<u8>> {
    let len = u16::try_from(payload.len()).map_err(|_| HandshakeError::RecordOverflow { len: payload.len() })?;

    let mut record = Vec::with_capacity(HEADER_LEN + payload.len());
    record.put_u8(record_type as u8);
    record.put_slice(&version);
    record.put_u16(len);
    record.put_slice(payload);
    Ok(record)
}

/// Everything after the 5-byte header.
pub fn peel_record_layer(record: &[u8]) -> Result<&[u8]> {
    record
        .get(HEADER_LEN..)
        .ok_or(HandshakeError::Truncated { len: record.len() })
}

/// Payload length declared by a record header.
pub fn declared_len(header: &[u8; HEADER_LEN]) -> usize {
    u16::from_be_bytes([header[3], header[4]]) as usize
}

/// Reads exactly one record (header and payload) with the default deadline.
pub async fn read_till_drain<S>(stream: &mut S) -> Result<Vec<u8>>
where
    S: AsyncRead + Unpin + ?Sized,
{
    read_till_drain_within(stream, PAYLOAD_DEADLINE).await
}

/// Reads exactly one record, failing with [`HandshakeError::Timeout`] if the
/// payload is not complete within `deadline` of the header arriving.
///
/// Waiting for the header itself is unbounded. Bytes past the declared payload
/// length are never consumed.
pub async fn read_till_drain_within<S>(stream: &mut S, deadline: Duration) -> Result<Vec<u8>>
where
    S: AsyncRead + Unpin + ?Sized,
{
    let mut header = [0u8; HEADER_LEN];
    stream.read_exact(&mut header).await?;

    let expected = declared_len(&header);
    let mut record = Vec::with_capacity(HEADER_LEN + expected);
    record.extend_from_slice(&header);
    record.resize(HEADER_LEN + expected, 0);

    // read_exact loops over short reads and stops at the end of the slice.
    match timeout(deadline, stream.read_exact(&mut record[HEADER_LEN..])).await {
        Ok(read) => {
            read?;
        }
        Err(_) => {
            warn!("Record payload of {} bytes stalled past {:?}", expected, deadline);
            return Err(HandshakeError::Timeout { waited: deadline, expected });
        }
    }

    debug!("Read record type {:#04x} with {} byte payload", header[0], expected);
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportBuilder;
    use tokio::io::AsyncWriteExt;
    use tokio::time::Instant;

    fn record(record_type: ContentType, payload: &[u8]) -> Vec<u8> {
        add_record_layer(payload, record_type, TLS12).unwrap()
    }

    #[test]
    fn framing_round_trips_for_every_length() {
        let buf: Vec<u8> = (0..MAX_PAYLOAD_LEN).map(|i| (i % 251) as u8).collect();
        for len in 0..=MAX_PAYLOAD_LEN {
            let payload = &buf[..len];
            let framed = add_record_layer(payload, ContentType::Handshake, TLS10).unwrap();
            assert_eq!(framed.len(), HEADER_LEN + len);
            assert_eq!(&framed[..3], &[0x16u8, 0x03, 0x01]);
            assert_eq!(u16::from_be_bytes([framed[3], framed[4]]) as usize, len);
            assert_eq!(peel_record_layer(&framed).unwrap(), payload);
        }
    }

    #[test]
    fn content_types_carry_their_wire_bytes() {
        assert_eq!(record(ContentType::ChangeCipherSpec, &[0x01])[0], 0x14);
        assert_eq!(record(ContentType::Handshake, &[])[0], 0x16);
    }

    #[test]
    fn refuses_payload_beyond_length_field() {
        let err = add_record_layer(&vec![0; MAX_PAYLOAD_LEN + 1], ContentType::Handshake, TLS10).unwrap_err();
        assert!(matches!(err, HandshakeError::RecordOverflow { len } if len == MAX_PAYLOAD_LEN + 1));
    }

    #[test]
    fn peel_rejects_short_input() {
        assert!(matches!(peel_record_layer(&[0x16, 0x03]), Err(HandshakeError::Truncated { len: 2 })));
        assert!(peel_record_layer(&[0x16, 0x03, 0x03, 0x00, 0x00]).unwrap().is_empty());
    }

    #[tokio::test]
    async fn coalesced_records_are_returned_one_at_a_time() {
        let r1 = record(ContentType::Handshake, b"server hello");
        let r2 = record(ContentType::ChangeCipherSpec, &[0x01]);
        let (mut tx, mut rx) = tokio::io::duplex(1024);
        tx.write_all(&[r1.clone(), r2.clone()].concat()).await.unwrap();

        assert_eq!(read_till_drain(&mut rx).await.unwrap(), r1);
        assert_eq!(read_till_drain(&mut rx).await.unwrap(), r2);
    }

    #[tokio::test]
    async fn fragmented_record_is_reassembled() {
        let payload: Vec<u8> = (0..300u16).map(|i| i as u8).collect();
        let r = record(ContentType::Handshake, &payload);
        let (tx, mut rx) = tokio::io::duplex(1024);

        let wire = r.clone();
        let writer = tokio::spawn(async move {
            let mut tx = TransportBuilder::wrap_fragmented(tx, 1, Duration::ZERO);
            tx.write_all(&wire).await.unwrap();
            tx
        });

        assert_eq!(read_till_drain(&mut rx).await.unwrap(), r);
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn empty_payload_returns_header_only() {
        let r = record(ContentType::Handshake, &[]);
        let (mut tx, mut rx) = tokio::io::duplex(64);
        tx.write_all(&r).await.unwrap();
        assert_eq!(read_till_drain(&mut rx).await.unwrap(), r);
    }

    #[tokio::test]
    async fn stalled_payload_times_out() {
        let (mut tx, mut rx) = tokio::io::duplex(64);
        tx.write_all(&[0x16, 0x03, 0x03, 0x00, 0x10, 0xAA]).await.unwrap();

        let started = Instant::now();
        let err = read_till_drain_within(&mut rx, Duration::from_millis(100)).await.unwrap_err();
        assert!(matches!(err, HandshakeError::Timeout { expected: 16, .. }));
        assert!(started.elapsed() < Duration::from_secs(2));
        // Writer is still open: the failure came from the deadline, not EOF.
        drop(tx);
    }

    #[tokio::test]
    async fn stream_closed_before_header_is_a_transport_fault() {
        let (mut tx, mut rx) = tokio::io::duplex(64);
        tx.write_all(&[0x16, 0x03]).await.unwrap();
        drop(tx);
        let err = read_till_drain(&mut rx).await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn stream_closed_mid_payload_is_a_transport_fault() {
        let (mut tx, mut rx) = tokio::io::duplex(64);
        tx.write_all(&[0x16, 0x03, 0x03, 0x00, 0x08, 0x01, 0x02]).await.unwrap();
        drop(tx);
        let err = read_till_drain(&mut rx).await.unwrap_err();
        assert!(err.is_transport());
        assert!(!err.is_timeout());
    }
}

use chrono::{DateTime, Utc};
use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use zeroize::Zeroizing;

/// Longest SNI hostname accepted at context construction (RFC 1035 limit for a
/// presentation-format domain name).
pub const MAX_SERVER_NAME_LEN: usize = 253;

pub type Result<T> = std::result::Result<T, HandshakeError>;

/// Failures surfaced by the handshake core.
///
/// The variants fall into three families: transport faults, timeouts and
/// configuration faults. Use the `is_*` helpers to classify without matching.
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// Stream closed, reset or otherwise failed mid-read/write.
    #[error("transport fault: {0}")]
    Transport(#[from] std::io::Error),

    /// The declared record payload did not arrive before the deadline.
    #[error("record payload of {expected} bytes not received within {waited:?}")]
    Timeout { waited: Duration, expected: usize },

    #[error("record payload of {len} bytes exceeds the 16-bit length field")]
    RecordOverflow { len: usize },

    #[error("extension {ext_type:#06x} data of {len} bytes exceeds the 16-bit length field")]
    ExtensionOverflow { ext_type: u16, len: usize },

    #[error("record of {len} bytes is shorter than the 5-byte header")]
    Truncated { len: usize },

    #[error("unsupported browser fingerprint: {0:?}")]
    UnknownFingerprint(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl HandshakeError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, HandshakeError::Timeout { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, HandshakeError::Transport(_))
    }

    /// Everything that is neither a transport fault nor a timeout means the
    /// disguise could not be composed and the handshake must be abandoned.
    pub fn is_config(&self) -> bool {
        !self.is_timeout() && !self.is_transport()
    }
}

/// Source of wall-clock time. Injected so tests can pin the ticket bucket.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    pub fn from_unix(secs: i64) -> Self {
        Self(DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or_default())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Nanoseconds since the Unix epoch, saturating to second precision when the
/// instant falls outside the range representable in an `i64` of nanoseconds.
pub fn unix_nanos(now: DateTime<Utc>) -> i64 {
    now.timestamp_nanos_opt()
        .unwrap_or_else(|| now.timestamp().wrapping_mul(1_000_000_000))
}

/// Browser whose ClientHello wire signature is reproduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FingerprintVariant {
    Chrome,
    Firefox,
}

impl FingerprintVariant {
    pub const ALL: [FingerprintVariant; 2] = [FingerprintVariant::Chrome, FingerprintVariant::Firefox];

    pub fn as_str(&self) -> &'static str {
        match self {
            FingerprintVariant::Chrome => "chrome",
            FingerprintVariant::Firefox => "firefox",
        }
    }
}

impl fmt::Display for FingerprintVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FingerprintVariant {
    type Err = HandshakeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| HandshakeError::UnknownFingerprint(s.to_string()))
    }
}

/// Immutable per-process state shared by every handshake composition.
///
/// Construction validates all fields, so a `SharedContext` that exists can
/// always be composed from. Fields are only reachable through accessors.
#[derive(Clone)]
pub struct SharedContext {
    server_name: String,
    opaque: i64,
    shared_key: Arc<Zeroizing<Vec<u8>>>,
    ticket_time_hint: NonZeroU64,
    fingerprint: FingerprintVariant,
    clock: Arc<dyn Clock>,
}

impl SharedContext {
    pub fn new(
        server_name: impl Into<String>,
        opaque: i64,
        shared_key: Vec<u8>,
        ticket_time_hint: u64,
        fingerprint: FingerprintVariant,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let server_name = server_name.into();
        let shared_key = Zeroizing::new(shared_key);

        if server_name.is_empty() {
            return Err(HandshakeError::InvalidConfig("server name is empty".into()));
        }
        if server_name.len() > MAX_SERVER_NAME_LEN {
            return Err(HandshakeError::InvalidConfig(format!(
                "server name is {} bytes, limit is {}",
                server_name.len(),
                MAX_SERVER_NAME_LEN
            )));
        }
        if shared_key.is_empty() {
            return Err(HandshakeError::InvalidConfig("shared key is empty".into()));
        }
        let ticket_time_hint = NonZeroU64::new(ticket_time_hint)
            .filter(|h| i64::try_from(h.get()).is_ok())
            .ok_or_else(|| {
                HandshakeError::InvalidConfig(format!(
                    "ticket time hint must be within 1..={}, got {}",
                    i64::MAX,
                    ticket_time_hint
                ))
            })?;

        Ok(Self {
            server_name,
            opaque,
            shared_key: Arc::new(shared_key),
            ticket_time_hint,
            fingerprint,
            clock,
        })
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    pub fn opaque(&self) -> i64 {
        self.opaque
    }

    pub fn shared_key(&self) -> &[u8] {
        &self.shared_key
    }

    pub fn ticket_time_hint(&self) -> NonZeroU64 {
        self.ticket_time_hint
    }

    pub fn fingerprint(&self) -> FingerprintVariant {
        self.fingerprint
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// `floor(unix_secs / ticket_time_hint)` for the current clock reading.
    pub fn time_bucket(&self) -> i64 {
        // The hint was checked to fit in an i64 at construction.
        let hint = self.ticket_time_hint.get() as i64;
        self.now().timestamp().div_euclid(hint)
    }

    /// The same context observed through a different clock.
    pub fn with_clock(&self, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            ..self.clone()
        }
    }
}

impl fmt::Debug for SharedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedContext")
            .field("server_name", &self.server_name)
            .field("ticket_time_hint", &self.ticket_time_hint)
            .field("fingerprint", &self.fingerprint)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

/// Uniform contract every browser fingerprint variant satisfies.
pub trait BrowserFingerprint: Send + Sync {
    fn variant(&self) -> FingerprintVariant;

    /// Ordered, concatenated extension blocks for this browser.
    fn compose_extensions(&self, ctx: &SharedContext) -> Result<Vec<u8>>;

    /// Full ClientHello handshake message (type, 24-bit length and body).
    fn compose_client_hello(&self, ctx: &SharedContext) -> Result<Vec<u8>>;
}

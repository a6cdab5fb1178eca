use crate::crypto::CryptoManager;
use anyhow::{Context, Result};
use hush_traits::{Clock, FingerprintVariant, HandshakeError, SharedContext};
use serde::Deserialize;
use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::handshake::HandshakeOptions;

/// Upper bound on establishing the TCP connection to the remote.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client settings as stored on disk (JSON, PascalCase keys).
#[derive(Deserialize, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct ClientConfig {
    pub server_name: String,
    pub key: String,
    pub ticket_time_hint: u64,
    pub browser: String,
    #[serde(default)]
    pub opaque: i64,
    #[serde(default = "default_host")]
    pub remote_host: String,
    #[serde(default = "default_remote_port")]
    pub remote_port: u16,
    #[serde(default = "default_host")]
    pub local_host: String,
    #[serde(default = "default_local_port")]
    pub local_port: u16,
    /// Split the ClientHello into writes of at most this many bytes.
    #[serde(default)]
    pub fragment_client_hello: Option<usize>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_remote_port() -> u16 {
    443
}

fn default_local_port() -> u16 {
    1984
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("server_name", &self.server_name)
            .field("key", &"<redacted>")
            .field("ticket_time_hint", &self.ticket_time_hint)
            .field("browser", &self.browser)
            .field("remote", &format_args!("{}:{}", self.remote_host, self.remote_port))
            .field("local", &format_args!("{}:{}", self.local_host, self.local_port))
            .field("fragment_client_hello", &self.fragment_client_hello)
            .finish()
    }
}

impl ClientConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Applies the SIP003 plugin variables (`SS_REMOTE_HOST` and friends) from
    /// the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(host) = lookup("SS_REMOTE_HOST") {
            self.remote_host = host;
        }
        if let Some(port) = lookup("SS_REMOTE_PORT") {
            self.remote_port = port.parse().with_context(|| format!("SS_REMOTE_PORT={port:?}"))?;
        }
        if let Some(host) = lookup("SS_LOCAL_HOST") {
            self.local_host = host;
        }
        if let Some(port) = lookup("SS_LOCAL_PORT") {
            self.local_port = port.parse().with_context(|| format!("SS_LOCAL_PORT={port:?}"))?;
        }
        Ok(())
    }

    pub fn remote_addr(&self) -> Result<SocketAddr> {
        (self.remote_host.as_str(), self.remote_port)
            .to_socket_addrs()
            .with_context(|| format!("resolving {}:{}", self.remote_host, self.remote_port))?
            .next()
            .with_context(|| format!("no address for {}:{}", self.remote_host, self.remote_port))
    }

    pub fn handshake_options(&self) -> HandshakeOptions {
        HandshakeOptions {
            fragment_size: self.fragment_client_hello,
            ..HandshakeOptions::default()
        }
    }

    /// Validates the settings and builds the immutable context handed to every
    /// handshake. Misconfiguration surfaces here, before any connection.
    pub fn to_context(&self, clock: Arc<dyn Clock>) -> std::result::Result<SharedContext, HandshakeError> {
        let fingerprint: FingerprintVariant = self.browser.parse()?;
        if self.key.is_empty() {
            return Err(HandshakeError::InvalidConfig("key is empty".into()));
        }
        if self.fragment_client_hello == Some(0) {
            return Err(HandshakeError::InvalidConfig("FragmentClientHello must be positive".into()));
        }
        SharedContext::new(
            self.server_name.clone(),
            self.opaque,
            CryptoManager::derive_key(&self.key),
            self.ticket_time_hint,
            fingerprint,
            clock,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hush_traits::SystemClock;

    const SAMPLE: &str = r#"{
        "ServerName": "www.bing.com",
        "Key": "example",
        "TicketTimeHint": 3600,
        "Browser": "chrome"
    }"#;

    #[test]
    fn parses_minimal_config_with_defaults() {
        let config = ClientConfig::from_json(SAMPLE).unwrap();
        assert_eq!(config.server_name, "www.bing.com");
        assert_eq!(config.remote_port, 443);
        assert_eq!(config.opaque, 0);
        assert_eq!(config.fragment_client_hello, None);
    }

    #[test]
    fn builds_context_with_key_digest() {
        let config = ClientConfig::from_json(SAMPLE).unwrap();
        let ctx = config.to_context(Arc::new(SystemClock)).unwrap();
        assert_eq!(ctx.fingerprint(), FingerprintVariant::Chrome);
        assert_eq!(ctx.shared_key(), CryptoManager::derive_key("example").as_slice());
        assert_eq!(ctx.ticket_time_hint().get(), 3600);
    }

    #[test]
    fn browser_name_is_matched_case_insensitively() {
        let config = ClientConfig::from_json(&SAMPLE.replace("\"chrome\"", "\"FireFox\"")).unwrap();
        let ctx = config.to_context(Arc::new(SystemClock)).unwrap();
        assert_eq!(ctx.fingerprint(), FingerprintVariant::Firefox);
    }

    #[test]
    fn unknown_browser_fails_at_startup() {
        let mut config = ClientConfig::from_json(SAMPLE).unwrap();
        config.browser = "opera".into();
        let err = config.to_context(Arc::new(SystemClock)).unwrap_err();
        assert!(matches!(err, HandshakeError::UnknownFingerprint(_)));
    }

    #[test]
    fn zero_time_hint_fails_at_startup() {
        let mut config = ClientConfig::from_json(SAMPLE).unwrap();
        config.ticket_time_hint = 0;
        assert!(config.to_context(Arc::new(SystemClock)).unwrap_err().is_config());
    }

    #[test]
    fn missing_required_field_is_rejected() {
        assert!(ClientConfig::from_json(r#"{"ServerName": "a.com"}"#).is_err());
    }

    #[test]
    fn plugin_environment_overrides_endpoints() {
        let mut config = ClientConfig::from_json(SAMPLE).unwrap();
        config
            .apply_env_from(|name| match name {
                "SS_REMOTE_HOST" => Some("10.0.0.2".into()),
                "SS_REMOTE_PORT" => Some("8443".into()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.remote_addr().unwrap(), "10.0.0.2:8443".parse::<SocketAddr>().unwrap());
        assert_eq!(config.local_port, 1984);

        let bad = config.apply_env_from(|name| (name == "SS_LOCAL_PORT").then(|| "http".to_string()));
        assert!(bad.is_err());
    }

    #[test]
    fn debug_output_hides_key() {
        let config = ClientConfig::from_json(SAMPLE).unwrap();
        assert!(!format!("{config:?}").contains("example"));
    }
}

use sha2::{Digest, Sha256};

pub const SHARED_KEY_LEN: usize = 32;

pub struct CryptoManager;

impl CryptoManager {
    /// SHA-256 of the configured passphrase. The digest, never the passphrase,
    /// is what enters the shared context.
    pub fn derive_key(passphrase: &str) -> Vec<u8> {
        Sha256::digest(passphrase.as_bytes()).to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_key_is_sha256() {
        let key = CryptoManager::derive_key("abc");
        assert_eq!(key.len(), SHARED_KEY_LEN);
        assert_eq!(&key[..4], &[0xba, 0x78, 0x16, 0xbf]);
        assert_eq!(&key[28..], &[0xf2, 0x00, 0x15, 0xad]);
    }
}

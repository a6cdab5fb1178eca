//! Browser ClientHello templates.
//!
//! Each browser is a unit type implementing [`BrowserFingerprint`]; adding a
//! browser means adding a module and an arm to [`fingerprint_for`].

pub mod chrome;
pub mod firefox;
pub mod hello;

pub use chrome::Chrome;
pub use firefox::Firefox;
pub use hello::{parse_client_hello, ParsedHello};

use hush_traits::{BrowserFingerprint, FingerprintVariant};

pub fn fingerprint_for(variant: FingerprintVariant) -> &'static dyn BrowserFingerprint {
    match variant {
        FingerprintVariant::Chrome => &Chrome,
        FingerprintVariant::Firefox => &Firefox,
    }
}

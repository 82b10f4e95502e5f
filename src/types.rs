use core::fmt;

use attest_primitives::{Hash256, Pk32};

use crate::errors::AttestError;

pub const DOMAIN_TAG: &[u8; 14] = b"profile-attest"; // 14-byte ASCII prefix of every attestation message
pub const MESSAGE_VERSION: u8 = 1;
pub const MESSAGE_HEADER_LEN: usize = 14 + 1 + 1 + 32; // tag || version || category || profile id
pub const PUBLIC_KEY_LEN: usize = 32;
pub const SIGNATURE_LEN: usize = 64;
pub const ADDRESS_LEN: usize = 32;

/// Default freshness window: 10 minutes.
pub const DEFAULT_VALIDITY_WINDOW_MS: u64 = 600_000;

// Fixed-size newtypes prevent misuse
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Address(pub [u8; ADDRESS_LEN]);

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ProfileId(pub Hash256);

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct VerificationKey(pub Pk32);

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ReplayKey(pub Hash256);

// Exact-sized decode helpers
macro_rules! impl_tryfrom_slice {
    ($t:ty, $len:expr, $err:expr) => {
        impl TryFrom<&[u8]> for $t {
            type Error = AttestError;
            fn try_from(b: &[u8]) -> Result<Self, Self::Error> {
                if b.len() != $len {
                    return Err($err(b.len()));
                }
                let mut arr = [0u8; $len];
                arr.copy_from_slice(b);
                Ok(Self(arr))
            }
        }
    };
}
impl_tryfrom_slice!(Address, ADDRESS_LEN, |_| AttestError::InvalidClaim("address must be 32 bytes"));
impl_tryfrom_slice!(ProfileId, 32, |_| AttestError::InvalidClaim("profile id must be 32 bytes"));
impl_tryfrom_slice!(VerificationKey, PUBLIC_KEY_LEN, |got| AttestError::InvalidKeyLength { got });
impl_tryfrom_slice!(ReplayKey, 32, |_| AttestError::ReplayLog("replay key must be 32 bytes".into()));

macro_rules! impl_hex_fmt {
    ($t:ty) => {
        impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }
        impl fmt::Debug for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($t), hex::encode(self.0))
            }
        }
    };
}
impl_hex_fmt!(Address);
impl_hex_fmt!(ProfileId);
impl_hex_fmt!(VerificationKey);
impl_hex_fmt!(ReplayKey);

impl VerificationKey {
    #[must_use]
    pub const fn as_bytes(&self) -> &Pk32 {
        &self.0
    }
}

/// Kind of claim an attestation vouches for. The discriminant is part of the
/// signed message and of the replay key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ClaimCategory {
    Wallet = 0x01,
    Social = 0x02,
    Badges = 0x03,
}

impl ClaimCategory {
    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wallet => "wallet",
            Self::Social => "social",
            Self::Badges => "badges",
        }
    }
}

/// A backend-signed claim: canonical message bytes, 64-byte signature and
/// the millisecond timestamp embedded in the message. Never stored.
#[derive(Clone, Copy)]
pub struct Attestation<'a> {
    pub message: &'a [u8],
    pub signature: &'a [u8],
    pub timestamp_ms: u64,
}

/// Achievement badge as held by a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub category: String,
    pub tier: String,
    pub display_name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub tier_number: u8,
}

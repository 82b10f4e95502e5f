use thiserror::Error;

/// Every way an attestation, registry or profile operation can be rejected.
///
/// All variants are synchronous rejections: state is left exactly as it was
/// before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttestError {
    #[error("caller is not authorized for this operation")]
    NotAuthorized,

    #[error("invalid public key length: expected 32 got {got}")]
    InvalidKeyLength { got: usize },

    #[error("invalid signature length: expected 64 got {got}")]
    InvalidSignatureLength { got: usize },

    #[error("invalid signature")]
    InvalidSignature,

    #[error("oracle verification key has not been set")]
    OracleKeyUnset,

    #[error("attestation expired: timestamp {timestamp_ms}, now {now_ms}, window {window_ms}ms")]
    TimestampExpired {
        timestamp_ms: u64,
        now_ms: u64,
        window_ms: u64,
    },

    #[error("attestation timestamp {timestamp_ms} is ahead of now {now_ms} by more than {max_skew_ms}ms")]
    TimestampInFuture {
        timestamp_ms: u64,
        now_ms: u64,
        max_skew_ms: u64,
    },

    #[error("attestation already used")]
    AttestationAlreadyUsed,

    #[error("display name already taken")]
    DisplayNameTaken,

    #[error("owner already has a profile")]
    ProfileAlreadyExists,

    #[error("profile not found")]
    ProfileNotFound,

    #[error("invalid display name: {0}")]
    InvalidDisplayName(&'static str),

    #[error("invalid claim: {0}")]
    InvalidClaim(&'static str),

    #[error("no linked entry for that key")]
    LinkNotFound,

    #[error("malformed badge record {index}: {reason}")]
    MalformedBadgeRecord { index: usize, reason: &'static str },

    #[error("replay log failure: {0}")]
    ReplayLog(String),
}

impl AttestError {
    /// Stable symbolic name of the error kind, suitable for logs and API
    /// responses.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotAuthorized => "NotAuthorized",
            Self::InvalidKeyLength { .. } => "InvalidKeyLength",
            Self::InvalidSignatureLength { .. } => "InvalidSignatureLength",
            Self::InvalidSignature => "InvalidSignature",
            Self::OracleKeyUnset => "OracleKeyUnset",
            Self::TimestampExpired { .. } => "TimestampExpired",
            Self::TimestampInFuture { .. } => "TimestampInFuture",
            Self::AttestationAlreadyUsed => "AttestationAlreadyUsed",
            Self::DisplayNameTaken => "DisplayNameTaken",
            Self::ProfileAlreadyExists => "ProfileAlreadyExists",
            Self::ProfileNotFound => "ProfileNotFound",
            Self::InvalidDisplayName(_) => "InvalidDisplayName",
            Self::InvalidClaim(_) => "InvalidClaim",
            Self::LinkNotFound => "LinkNotFound",
            Self::MalformedBadgeRecord { .. } => "MalformedBadgeRecord",
            Self::ReplayLog(_) => "ReplayLog",
        }
    }
}

impl From<std::io::Error> for AttestError {
    fn from(e: std::io::Error) -> Self {
        Self::ReplayLog(e.to_string())
    }
}

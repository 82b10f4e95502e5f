use ed25519_dalek::{Signature, VerifyingKey};

use crate::{
    errors::AttestError,
    types::{Attestation, PUBLIC_KEY_LEN, SIGNATURE_LEN},
};

/// Verify an Ed25519 signature over `message`.
///
/// Lengths are checked before any cryptographic work. A 32-byte key that is
/// not a valid curve point fails as `InvalidSignature`, the same as a bad
/// signature. Verification is strict: small-order keys and non-canonical
/// signatures are rejected.
///
/// # Errors
///
/// `InvalidKeyLength`, `InvalidSignatureLength` or `InvalidSignature`.
pub fn verify(message: &[u8], public_key: &[u8], signature: &[u8]) -> Result<(), AttestError> {
    let pk: &[u8; PUBLIC_KEY_LEN] = public_key
        .try_into()
        .map_err(|_| AttestError::InvalidKeyLength { got: public_key.len() })?;
    if signature.len() != SIGNATURE_LEN {
        return Err(AttestError::InvalidSignatureLength { got: signature.len() });
    }
    let sig = Signature::from_slice(signature).map_err(|_| AttestError::InvalidSignature)?;
    let vk = VerifyingKey::from_bytes(pk).map_err(|_| AttestError::InvalidSignature)?;
    vk.verify_strict(message, &sig).map_err(|_| AttestError::InvalidSignature)
}

/// Staleness check. Passes iff `now_ms - attestation_ms <= validity_window_ms`;
/// timestamps ahead of `now_ms` pass.
///
/// # Errors
///
/// `TimestampExpired` when the attestation is older than the window.
pub const fn check_freshness(
    now_ms: u64,
    attestation_ms: u64,
    validity_window_ms: u64,
) -> Result<(), AttestError> {
    if now_ms.saturating_sub(attestation_ms) > validity_window_ms {
        return Err(AttestError::TimestampExpired {
            timestamp_ms: attestation_ms,
            now_ms,
            window_ms: validity_window_ms,
        });
    }
    Ok(())
}

/// Foresight check. Passes iff `attestation_ms - now_ms <= max_skew_ms`.
///
/// # Errors
///
/// `TimestampInFuture` when the attestation is dated too far ahead.
pub const fn check_not_future(
    now_ms: u64,
    attestation_ms: u64,
    max_skew_ms: u64,
) -> Result<(), AttestError> {
    if attestation_ms.saturating_sub(now_ms) > max_skew_ms {
        return Err(AttestError::TimestampInFuture {
            timestamp_ms: attestation_ms,
            now_ms,
            max_skew_ms,
        });
    }
    Ok(())
}

/// Time policy applied to every attestation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    pub validity_window_ms: u64,
    pub max_future_skew_ms: Option<u64>,
}

/// Full attestation check: signature first, then staleness, then foresight.
///
/// # Errors
///
/// Any error of [`verify`], [`check_freshness`] or [`check_not_future`].
pub fn verify_attestation(
    att: &Attestation<'_>,
    public_key: &[u8],
    now_ms: u64,
    policy: FreshnessPolicy,
) -> Result<(), AttestError> {
    verify(att.message, public_key, att.signature)?;
    check_freshness(now_ms, att.timestamp_ms, policy.validity_window_ms)?;
    if let Some(skew) = policy.max_future_skew_ms {
        check_not_future(now_ms, att.timestamp_ms, skew)?;
    }
    Ok(())
}

/// Batch verify multiple (message, signature) pairs under one key.
#[must_use]
pub fn verify_batch(items: &[(&[u8], &[u8])], public_key: &[u8]) -> Vec<bool> {
    let mut results = Vec::with_capacity(items.len());

    for (message, signature) in items {
        let is_valid = verify(message, public_key, signature).is_ok();
        results.push(is_valid);
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    fn key() -> SigningKey {
        SigningKey::from_bytes(&[7u8; 32])
    }

    #[test]
    fn accepts_valid_signature() {
        let sk = key();
        let sig = sk.sign(b"hello");
        verify(b"hello", sk.verifying_key().as_bytes(), &sig.to_bytes()).unwrap();
    }

    #[test]
    fn rejects_wrong_message() {
        let sk = key();
        let sig = sk.sign(b"hello");
        assert_eq!(
            verify(b"hellp", sk.verifying_key().as_bytes(), &sig.to_bytes()),
            Err(AttestError::InvalidSignature)
        );
    }

    #[test]
    fn key_length_checked_before_signature_length() {
        assert_eq!(
            verify(b"m", &[0u8; 31], &[0u8; 10]),
            Err(AttestError::InvalidKeyLength { got: 31 })
        );
        assert_eq!(
            verify(b"m", &[0u8; 32], &[0u8; 63]),
            Err(AttestError::InvalidSignatureLength { got: 63 })
        );
    }

    #[test]
    fn garbage_key_is_invalid_signature() {
        let sk = key();
        let sig = sk.sign(b"hello");
        // All-zero bytes decode to a small-order point; strict verification refuses it.
        assert_eq!(
            verify(b"hello", &[0u8; 32], &sig.to_bytes()),
            Err(AttestError::InvalidSignature)
        );
    }

    #[test]
    fn freshness_boundary_is_inclusive() {
        assert!(check_freshness(10_000, 4_000, 6_000).is_ok());
        assert_eq!(
            check_freshness(10_001, 4_000, 6_000),
            Err(AttestError::TimestampExpired { timestamp_ms: 4_000, now_ms: 10_001, window_ms: 6_000 })
        );
    }

    #[test]
    fn future_timestamp_does_not_underflow() {
        assert!(check_freshness(0, u64::MAX, 1).is_ok());
        assert!(check_not_future(1_000, 1_500, 500).is_ok());
        assert!(matches!(
            check_not_future(1_000, 1_501, 500),
            Err(AttestError::TimestampInFuture { .. })
        ));
    }

    #[test]
    fn verify_attestation_orders_checks() {
        let sk = key();
        let sig = sk.sign(b"msg").to_bytes();
        let att = Attestation { message: b"msg", signature: &sig, timestamp_ms: 0 };
        let policy = FreshnessPolicy { validity_window_ms: 10, max_future_skew_ms: Some(0) };
        // Bad signature wins over staleness.
        let bad = Attestation { message: b"msh", ..att };
        assert_eq!(
            verify_attestation(&bad, sk.verifying_key().as_bytes(), 1_000, policy),
            Err(AttestError::InvalidSignature)
        );
        assert!(matches!(
            verify_attestation(&att, sk.verifying_key().as_bytes(), 1_000, policy),
            Err(AttestError::TimestampExpired { .. })
        ));
        verify_attestation(&att, sk.verifying_key().as_bytes(), 5, policy).unwrap();
    }

    #[test]
    fn batch_reports_each_item() {
        let sk = key();
        let a = sk.sign(b"a").to_bytes();
        let b = sk.sign(b"b").to_bytes();
        let items: [(&[u8], &[u8]); 3] = [(b"a", &a), (b"b", &b), (b"a", &b)];
        assert_eq!(verify_batch(&items, sk.verifying_key().as_bytes()), vec![true, true, false]);
    }
}

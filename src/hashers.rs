use attest_primitives::{constants::{TAG_KEY_FINGERPRINT, TAG_PROFILE_ID, TAG_REPLAY}, h_tag, le_bytes, Hash256};

use crate::types::{Address, ClaimCategory, ProfileId, ReplayKey, VerificationKey};

/// D = BLAKE3(message). Identifies one attestation in logs and replay keys.
#[must_use]
pub fn attestation_digest(message: &[u8]) -> Hash256 {
    *blake3::hash(message).as_bytes()
}

/// R = H("attest.replay", [ category, profile_id, D ])
///
/// The message already carries category and profile id; repeating them here
/// keeps keys from different categories disjoint even if two layouts ever
/// collide.
#[must_use]
pub fn replay_key(category: ClaimCategory, profile_id: &ProfileId, message: &[u8]) -> ReplayKey {
    let digest = attestation_digest(message);
    ReplayKey(h_tag(TAG_REPLAY, &[&[category.tag()], &profile_id.0, &digest]))
}

/// ID = H("attest.profile.id", [ owner, LE64(seq) ])
#[must_use]
pub fn derive_profile_id(owner: &Address, seq: u64) -> ProfileId {
    ProfileId(h_tag(TAG_PROFILE_ID, &[&owner.0, &le_bytes::<8>(u128::from(seq))]))
}

/// F = H("attest.key.fingerprint", [ pk ]). Short, log-safe key identifier.
#[must_use]
pub fn key_fingerprint(key: &VerificationKey) -> Hash256 {
    h_tag(TAG_KEY_FINGERPRINT, &[key.as_bytes()])
}

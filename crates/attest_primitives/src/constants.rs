#![forbid(unsafe_code)]

pub const TAG_REPLAY: &str = "attest.replay";
pub const TAG_PROFILE_ID: &str = "attest.profile.id";
pub const TAG_KEY_FINGERPRINT: &str = "attest.key.fingerprint";

pub const ALL_TAGS: &[&str] = &[TAG_REPLAY, TAG_PROFILE_ID, TAG_KEY_FINGERPRINT];

pub const LEN_U8: usize = 1;
pub const LEN_U32: usize = 4;
pub const LEN_U64: usize = 8;

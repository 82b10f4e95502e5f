#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

//! Profile attestation engine.
//!
//! Profiles are extended with claims that an off-chain oracle has signed:
//! linked wallet addresses, linked social handles and achievement badges.
//! This crate only verifies and applies those claims. It checks the Ed25519
//! signature against the oracle key, bounds the attestation age, refuses to
//! apply the same attestation twice, and keeps display names and owners
//! unique across all live profiles.

// Fixed choices:
// - Signature: Ed25519 (strict verification)
// - Attestation digest: BLAKE3
// - Tagged hashing (replay keys, profile ids): length-framed SHA3-256
// - Message domain tag: 14-byte ASCII "profile-attest", version byte 0x01

pub mod clock;
pub mod config;
pub mod errors;
pub mod events;
pub mod hashers;
pub mod linking;
pub mod oracle;
pub mod profile;
pub mod registry;
pub mod replay;
pub mod ser;
pub mod types;
pub mod verifier;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, LinkingConfig};
pub use errors::AttestError;
pub use events::{DomainEvent, EventSink, MemorySink, TracingSink};
pub use hashers::{attestation_digest, derive_profile_id, key_fingerprint, replay_key};
pub use linking::IdentityLinkingService;
pub use oracle::{OracleConfig, OracleKeyStore};
pub use profile::{Directory, Profile};
pub use registry::UniquenessRegistry;
pub use replay::{FileReplayGuard, MemoryReplayGuard, ReplayGuard};
pub use ser::{badges_message, build_message, decode_badges, encode_badges, social_message, wallet_message, BadgeLimits};
pub use types::*;
pub use verifier::{check_freshness, check_not_future, verify, verify_attestation, verify_batch, FreshnessPolicy};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PROTOCOL_VERSION: u8 = MESSAGE_VERSION;

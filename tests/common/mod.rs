#![allow(dead_code)]

use std::sync::Arc;

use ed25519_dalek::{Signer, SigningKey};
use profile_attest::{
    badges_message, encode_badges, social_message, wallet_message, Address, Badge, IdentityLinkingService,
    LinkingConfig, ManualClock, MemoryReplayGuard, MemorySink, OracleKeyStore, ProfileId,
};
use rand_core::OsRng;

pub const ADMIN: Address = Address([0xAD; 32]);
pub const ALICE: Address = Address([0xA1; 32]);
pub const BOB: Address = Address([0xB0; 32]);
pub const NOW: u64 = 1_700_000_000_000;

pub struct Harness {
    pub oracle_key: SigningKey,
    pub oracle: Arc<OracleKeyStore>,
    pub service: IdentityLinkingService,
    pub clock: Arc<ManualClock>,
    pub events: Arc<MemorySink>,
    pub replay: Arc<MemoryReplayGuard>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(LinkingConfig::default())
    }

    pub fn with_config(config: LinkingConfig) -> Self {
        let events = Arc::new(MemorySink::new());
        let oracle = OracleKeyStore::initialize(ADMIN, events.clone());
        let oracle_key = SigningKey::generate(&mut OsRng);
        oracle
            .update_public_key(&ADMIN, oracle_key.verifying_key().as_bytes())
            .unwrap();
        let clock = Arc::new(ManualClock::new(NOW));
        let replay = Arc::new(MemoryReplayGuard::new());
        let service = IdentityLinkingService::new(
            config,
            oracle.clone(),
            replay.clone(),
            clock.clone(),
            events.clone(),
        );
        events.drain();
        Self { oracle_key, oracle, service, clock, events, replay }
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.oracle_key.sign(message).to_bytes()
    }

    pub fn sign_wallet(&self, id: &ProfileId, chain: &str, address: &str, ts: u64) -> [u8; 64] {
        self.sign(&wallet_message(id, chain, address, ts))
    }

    pub fn sign_social(&self, id: &ProfileId, platform: &str, username: &str, ts: u64) -> [u8; 64] {
        self.sign(&social_message(id, platform, username, ts))
    }

    pub fn sign_badges(&self, id: &ProfileId, encoded: &[u8], ts: u64) -> [u8; 64] {
        self.sign(&badges_message(id, encoded, ts))
    }

    pub fn alice(&self) -> ProfileId {
        self.service.create_profile(ALICE, "alice").unwrap()
    }
}

pub fn badge(category: &str, tier_number: u8, image: Option<&str>) -> Badge {
    Badge {
        category: category.to_owned(),
        tier: format!("tier-{tier_number}"),
        display_name: format!("{category} {tier_number}"),
        description: "earned".to_owned(),
        image_url: image.map(str::to_owned),
        tier_number,
    }
}

pub fn encoded(badges: &[Badge]) -> Vec<u8> {
    encode_badges(badges)
}

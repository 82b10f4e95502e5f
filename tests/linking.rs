mod common;

use common::{badge, encoded, Harness, ADMIN, ALICE, BOB, NOW};
use ed25519_dalek::{Signer, SigningKey};
use profile_attest::{replay_key, wallet_message, AttestError, ClaimCategory, DomainEvent, ReplayGuard};

#[test]
fn wallet_link_then_unlink() {
    let h = Harness::new();
    let id = h.alice();
    let sig = h.sign_wallet(&id, "ethereum", "0xabc", NOW);
    h.service.link_wallet(&ALICE, &id, "ethereum", "0xabc", NOW, &sig).unwrap();
    assert_eq!(h.service.profile(&id).unwrap().wallet("ethereum"), Some("0xabc"));

    h.service.unlink_wallet(&ALICE, &id, "ethereum").unwrap();
    assert_eq!(h.service.profile(&id).unwrap().wallet("ethereum"), None);

    // Unlinking an absent entry is an explicit error.
    assert_eq!(
        h.service.unlink_wallet(&ALICE, &id, "ethereum"),
        Err(AttestError::LinkNotFound)
    );

    let names: Vec<_> = h.events.events().iter().map(DomainEvent::name).collect();
    assert_eq!(names, ["profile_created", "wallet_linked", "wallet_unlinked"]);
}

#[test]
fn relinking_a_chain_replaces_the_address() {
    let h = Harness::new();
    let id = h.alice();
    let s1 = h.sign_wallet(&id, "solana", "AAA", NOW);
    h.service.link_wallet(&ALICE, &id, "solana", "AAA", NOW, &s1).unwrap();
    let s2 = h.sign_wallet(&id, "solana", "BBB", NOW + 1);
    h.service.link_wallet(&ALICE, &id, "solana", "BBB", NOW + 1, &s2).unwrap();
    let p = h.service.profile(&id).unwrap();
    assert_eq!(p.wallets.len(), 1);
    assert_eq!(p.wallet("solana"), Some("BBB"));
}

#[test]
fn identical_attestation_applies_once() {
    let h = Harness::new();
    let id = h.alice();
    let sig = h.sign_wallet(&id, "ethereum", "0xabc", NOW);
    h.service.link_wallet(&ALICE, &id, "ethereum", "0xabc", NOW, &sig).unwrap();
    h.service.unlink_wallet(&ALICE, &id, "ethereum").unwrap();

    // Still rejected later, even after the entry is gone.
    h.clock.advance(1_000);
    assert_eq!(
        h.service.link_wallet(&ALICE, &id, "ethereum", "0xabc", NOW, &sig),
        Err(AttestError::AttestationAlreadyUsed)
    );
    assert_eq!(h.service.profile(&id).unwrap().wallet("ethereum"), None);
}

#[test]
fn attestation_is_bound_to_its_profile() {
    let h = Harness::new();
    let alice = h.alice();
    let bob = h.service.create_profile(BOB, "bob").unwrap();
    let sig = h.sign_wallet(&alice, "ethereum", "0xabc", NOW);
    assert_eq!(
        h.service.link_wallet(&BOB, &bob, "ethereum", "0xabc", NOW, &sig),
        Err(AttestError::InvalidSignature)
    );
    assert!(h.service.profile(&bob).unwrap().wallets.is_empty());
}

#[test]
fn rejected_calls_leave_no_trace() {
    let h = Harness::new();
    let id = h.alice();
    let sig = h.sign_wallet(&id, "ethereum", "0xabc", NOW);
    h.events.drain();

    // Wrong caller: ownership is checked before the replay key is consumed.
    assert_eq!(
        h.service.link_wallet(&BOB, &id, "ethereum", "0xabc", NOW, &sig),
        Err(AttestError::NotAuthorized)
    );
    // Tampered payload.
    assert_eq!(
        h.service.link_wallet(&ALICE, &id, "ethereum", "0xabd", NOW, &sig),
        Err(AttestError::InvalidSignature)
    );
    // Truncated signature.
    assert_eq!(
        h.service.link_wallet(&ALICE, &id, "ethereum", "0xabc", NOW, &sig[..63]),
        Err(AttestError::InvalidSignatureLength { got: 63 })
    );
    assert!(h.replay.is_empty());
    assert!(h.events.is_empty());
    assert!(h.service.profile(&id).unwrap().wallets.is_empty());

    // The untouched attestation still works for its owner.
    h.service.link_wallet(&ALICE, &id, "ethereum", "0xabc", NOW, &sig).unwrap();
    let key = replay_key(ClaimCategory::Wallet, &id, &wallet_message(&id, "ethereum", "0xabc", NOW));
    assert!(h.replay.is_consumed(&key));
}

#[test]
fn missing_profile_is_reported_before_replay() {
    let h = Harness::new();
    let id = h.alice();
    h.service.delete_profile(&ALICE, &id).unwrap();
    let sig = h.sign_wallet(&id, "ethereum", "0xabc", NOW);
    assert_eq!(
        h.service.link_wallet(&ALICE, &id, "ethereum", "0xabc", NOW, &sig),
        Err(AttestError::ProfileNotFound)
    );
    assert!(h.replay.is_empty());
}

#[test]
fn empty_claim_fields_rejected() {
    let h = Harness::new();
    let id = h.alice();
    let sig = h.sign_wallet(&id, "", "0xabc", NOW);
    assert!(matches!(
        h.service.link_wallet(&ALICE, &id, "", "0xabc", NOW, &sig),
        Err(AttestError::InvalidClaim(_))
    ));
}

#[test]
fn unset_oracle_key_rejects_everything() {
    use profile_attest::{IdentityLinkingService, LinkingConfig, ManualClock, MemoryReplayGuard, MemorySink, OracleKeyStore};
    use std::sync::Arc;

    let sink = Arc::new(MemorySink::new());
    let oracle = OracleKeyStore::initialize(ADMIN, sink.clone());
    let service = IdentityLinkingService::new(
        LinkingConfig::default(),
        oracle,
        Arc::new(MemoryReplayGuard::new()),
        Arc::new(ManualClock::new(NOW)),
        sink,
    );
    let id = service.create_profile(ALICE, "alice").unwrap();
    assert_eq!(
        service.link_wallet(&ALICE, &id, "ethereum", "0xabc", NOW, &[0u8; 64]),
        Err(AttestError::OracleKeyUnset)
    );
}

#[test]
fn key_rotation_invalidates_outstanding_attestations() {
    let h = Harness::new();
    let id = h.alice();
    let old_sig = h.sign_wallet(&id, "ethereum", "0xabc", NOW);

    let new_key = SigningKey::from_bytes(&[42u8; 32]);
    h.oracle
        .update_public_key(&ADMIN, new_key.verifying_key().as_bytes())
        .unwrap();
    assert_eq!(
        h.service.link_wallet(&ALICE, &id, "ethereum", "0xabc", NOW, &old_sig),
        Err(AttestError::InvalidSignature)
    );

    let new_sig = new_key.sign(&wallet_message(&id, "ethereum", "0xabc", NOW)).to_bytes();
    h.service.link_wallet(&ALICE, &id, "ethereum", "0xabc", NOW, &new_sig).unwrap();
}

#[test]
fn social_link_and_unlink() {
    let h = Harness::new();
    let id = h.alice();
    let sig = h.sign_social(&id, "x", "@alice", NOW);
    h.service.link_social(&ALICE, &id, "x", "@alice", NOW, &sig).unwrap();
    assert_eq!(h.service.profile(&id).unwrap().social("x"), Some("@alice"));

    // Same bytes signed for the wallet table do not verify as a social claim.
    let wallet_sig = h.sign_wallet(&id, "discord", "alice#1", NOW);
    assert_eq!(
        h.service.link_social(&ALICE, &id, "discord", "alice#1", NOW, &wallet_sig),
        Err(AttestError::InvalidSignature)
    );

    assert_eq!(h.service.unlink_social(&BOB, &id, "x"), Err(AttestError::NotAuthorized));
    h.service.unlink_social(&ALICE, &id, "x").unwrap();
    assert_eq!(h.service.unlink_social(&ALICE, &id, "x"), Err(AttestError::LinkNotFound));
}

#[test]
fn badge_mint_freshness_boundary() {
    let h = Harness::new();
    let id = h.alice();
    let window = h.service.config().validity_window_ms;

    let batch = encoded(&[badge("quest", 1, None)]);
    let stale_ts = NOW - window - 1;
    let stale = h.sign_badges(&id, &batch, stale_ts);
    assert_eq!(
        h.service.mint_badges(&ALICE, &id, &batch, stale_ts, &stale),
        Err(AttestError::TimestampExpired { timestamp_ms: stale_ts, now_ms: NOW, window_ms: window })
    );

    let edge_ts = NOW - window;
    let edge = h.sign_badges(&id, &batch, edge_ts);
    h.service.mint_badges(&ALICE, &id, &batch, edge_ts, &edge).unwrap();
    assert_eq!(h.service.profile(&id).unwrap().badges.len(), 1);
}

#[test]
fn badge_batch_is_all_or_nothing() {
    let h = Harness::new();
    let id = h.alice();
    let mut bad = badge("quest", 2, None);
    bad.image_url = Some(String::new());
    let batch = encoded(&[badge("quest", 1, Some("https://img/1.png")), bad]);
    let sig = h.sign_badges(&id, &batch, NOW);
    assert!(matches!(
        h.service.mint_badges(&ALICE, &id, &batch, NOW, &sig),
        Err(AttestError::MalformedBadgeRecord { index: 1, .. })
    ));
    assert!(h.service.profile(&id).unwrap().badges.is_empty());
    assert!(h.replay.is_empty());

    let good = encoded(&[badge("quest", 1, Some("https://img/1.png")), badge("pvp", 3, None)]);
    let sig = h.sign_badges(&id, &good, NOW);
    h.service.mint_badges(&ALICE, &id, &good, NOW, &sig).unwrap();
    let badges = h.service.profile(&id).unwrap().badges;
    assert_eq!(badges.len(), 2);
    assert_eq!(badges[0].image_url.as_deref(), Some("https://img/1.png"));
    assert_eq!(badges[1].tier_number, 3);
    assert_eq!(
        h.events.events().last(),
        Some(&DomainEvent::BadgesMinted { profile_id: id, count: 2 })
    );
}

#[test]
fn future_timestamps_bounded_by_skew() {
    let h = Harness::new();
    let id = h.alice();
    let skew = h.service.config().max_future_skew_ms;

    let ok_ts = NOW + skew;
    let sig = h.sign_wallet(&id, "ethereum", "0x1", ok_ts);
    h.service.link_wallet(&ALICE, &id, "ethereum", "0x1", ok_ts, &sig).unwrap();

    let far_ts = NOW + skew + 1;
    let sig = h.sign_wallet(&id, "ethereum", "0x2", far_ts);
    assert!(matches!(
        h.service.link_wallet(&ALICE, &id, "ethereum", "0x2", far_ts, &sig),
        Err(AttestError::TimestampInFuture { .. })
    ));
}

#[test]
fn future_bound_can_be_disabled() {
    let cfg = profile_attest::LinkingConfig {
        bound_future_timestamps: false,
        ..profile_attest::LinkingConfig::default()
    };
    let h = Harness::with_config(cfg);
    let id = h.alice();
    let ts = NOW + 86_400_000;
    let sig = h.sign_wallet(&id, "ethereum", "0x1", ts);
    h.service.link_wallet(&ALICE, &id, "ethereum", "0x1", ts, &sig).unwrap();
}

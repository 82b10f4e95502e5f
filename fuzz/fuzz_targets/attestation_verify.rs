#![no_main]

use ed25519_dalek::{Signer, SigningKey};
use libfuzzer_sys::fuzz_target;
use profile_attest::{check_freshness, verify, wallet_message, ProfileId};

fuzz_target!(|data: &[u8]| {
    if data.len() < 32 + 64 + 16 { return; }

    let (key, rest) = data.split_at(32);
    let (sig, rest) = rest.split_at(64);
    let (times, message) = rest.split_at(16);

    // Arbitrary inputs must never panic.
    let _ = verify(message, key, sig);

    let now = u64::from_le_bytes(times[..8].try_into().unwrap_or([0u8; 8]));
    let ts = u64::from_le_bytes(times[8..].try_into().unwrap_or([0u8; 8]));
    let _ = check_freshness(now, ts, 600_000);

    // A genuine signature over the canonical message must always verify.
    let mut seed = [0u8; 32];
    seed.copy_from_slice(key);
    let sk = SigningKey::from_bytes(&seed);
    let chain = String::from_utf8_lossy(message);
    let msg = wallet_message(&ProfileId(seed), &chain, "0x0", ts);
    let good = sk.sign(&msg).to_bytes();
    assert!(verify(&msg, sk.verifying_key().as_bytes(), &good).is_ok());
});

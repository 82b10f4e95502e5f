//! Attestation-gated profile mutation.
//!
//! Every linking call runs the same pipeline:
//!
//! 1. validate the claim payload,
//! 2. rebuild the canonical message the oracle signed,
//! 3. verify signature and timestamp against the current oracle key,
//! 4. under the directory lock: resolve the profile and check ownership,
//! 5. consume the replay key,
//! 6. apply the change and publish the event.
//!
//! Step 5 is the last step that can fail. A rejected call leaves no state
//! behind.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{
    clock::Clock,
    config::LinkingConfig,
    errors::AttestError,
    events::{DomainEvent, EventSink},
    hashers::{attestation_digest, replay_key},
    oracle::OracleKeyStore,
    profile::{Directory, Profile},
    replay::ReplayGuard,
    ser::{badges_message, decode_badges, social_message, wallet_message, BadgeLimits},
    types::{Address, Attestation, ClaimCategory, ProfileId},
    verifier::{verify_attestation, FreshnessPolicy},
};

struct GatedClaim<'a> {
    category: ClaimCategory,
    caller: &'a Address,
    profile_id: &'a ProfileId,
    message: &'a [u8],
    signature: &'a [u8],
    timestamp_ms: u64,
}

pub struct IdentityLinkingService {
    config: LinkingConfig,
    oracle: Arc<OracleKeyStore>,
    replay: Arc<dyn ReplayGuard>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
    directory: Mutex<Directory>,
}

impl IdentityLinkingService {
    #[must_use]
    pub fn new(
        config: LinkingConfig,
        oracle: Arc<OracleKeyStore>,
        replay: Arc<dyn ReplayGuard>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let directory = Mutex::new(Directory::with_max_name_len(config.max_display_name_len));
        Self {
            config,
            oracle,
            replay,
            clock,
            events,
            directory,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &LinkingConfig {
        &self.config
    }

    #[must_use]
    pub fn oracle(&self) -> &Arc<OracleKeyStore> {
        &self.oracle
    }

    fn directory(&self) -> MutexGuard<'_, Directory> {
        self.directory.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn policy(&self) -> FreshnessPolicy {
        FreshnessPolicy {
            validity_window_ms: self.config.validity_window_ms,
            max_future_skew_ms: self.config.future_skew_bound(),
        }
    }

    fn check_field(&self, value: &str, what: &'static str) -> Result<(), AttestError> {
        if value.is_empty() || value.len() > self.config.max_field_len {
            return Err(AttestError::InvalidClaim(what));
        }
        Ok(())
    }

    // Profile lifecycle

    /// Create a profile for `owner`, reserving `display_name` and the owner
    /// slot in the same step.
    ///
    /// # Errors
    ///
    /// `InvalidDisplayName`, `DisplayNameTaken` or `ProfileAlreadyExists`.
    pub fn create_profile(&self, owner: Address, display_name: &str) -> Result<ProfileId, AttestError> {
        let id = self.directory().create(owner, display_name).inspect_err(|e| {
            tracing::warn!(owner = %owner, error = e.kind(), "profile creation rejected");
        })?;
        tracing::info!(profile = %id, owner = %owner, "profile created");
        self.events.publish(&DomainEvent::ProfileCreated {
            profile_id: id,
            owner,
            display_name: display_name.to_owned(),
        });
        Ok(id)
    }

    /// Delete a profile and release its registry entries.
    ///
    /// # Errors
    ///
    /// `ProfileNotFound` or `NotAuthorized`.
    pub fn delete_profile(&self, caller: &Address, profile_id: &ProfileId) -> Result<(), AttestError> {
        let removed = self.directory().delete(caller, profile_id)?;
        tracing::info!(profile = %profile_id, "profile deleted");
        self.events.publish(&DomainEvent::ProfileDeleted {
            profile_id: removed.id,
            owner: removed.owner,
            display_name: removed.display_name,
        });
        Ok(())
    }

    /// Change a profile's display name. The old name is released and the new
    /// one reserved atomically.
    ///
    /// # Errors
    ///
    /// `InvalidDisplayName`, `ProfileNotFound`, `NotAuthorized` or
    /// `DisplayNameTaken`.
    pub fn change_display_name(
        &self,
        caller: &Address,
        profile_id: &ProfileId,
        new_name: &str,
    ) -> Result<(), AttestError> {
        let old_name = self.directory().rename(caller, profile_id, new_name)?;
        if old_name != new_name {
            self.events.publish(&DomainEvent::DisplayNameChanged {
                profile_id: *profile_id,
                old_name,
                new_name: new_name.to_owned(),
            });
        }
        Ok(())
    }

    /// Snapshot of a profile.
    #[must_use]
    pub fn profile(&self, profile_id: &ProfileId) -> Option<Profile> {
        self.directory().get(profile_id).cloned()
    }

    #[must_use]
    pub fn profile_by_name(&self, display_name: &str) -> Option<Profile> {
        self.directory().find_by_name(display_name).cloned()
    }

    #[must_use]
    pub fn profile_by_owner(&self, owner: &Address) -> Option<Profile> {
        self.directory().find_by_owner(owner).cloned()
    }

    #[must_use]
    pub fn is_name_taken(&self, display_name: &str) -> bool {
        self.directory().registry().contains_name(display_name)
    }

    #[must_use]
    pub fn is_owner_registered(&self, owner: &Address) -> bool {
        self.directory().registry().contains_owner(owner)
    }

    #[must_use]
    pub fn profile_count(&self) -> usize {
        self.directory().len()
    }

    /// Registry and profile map agree. Always true; exposed for tests.
    #[must_use]
    pub fn registry_consistent(&self) -> bool {
        self.directory().registry_consistent()
    }

    // Attestation pipeline

    fn verify_claim(&self, message: &[u8], signature: &[u8], timestamp_ms: u64) -> Result<(), AttestError> {
        let key = self.oracle.get_key().ok_or(AttestError::OracleKeyUnset)?;
        let att = Attestation { message, signature, timestamp_ms };
        verify_attestation(&att, key.as_bytes(), self.clock.now_ms(), self.policy())
    }

    /// Verify, then under the directory lock check ownership, consume the
    /// replay key and run `apply`. `apply` must not fail.
    fn gated<F>(&self, claim: &GatedClaim<'_>, apply: F) -> Result<(), AttestError>
    where
        F: FnOnce(&mut Profile) -> DomainEvent,
    {
        let digest = hex::encode(attestation_digest(claim.message));
        let outcome = self
            .verify_claim(claim.message, claim.signature, claim.timestamp_ms)
            .and_then(|()| {
                let mut dir = self.directory();
                let profile = dir.owned_mut(claim.caller, claim.profile_id)?;
                self.replay
                    .consume(replay_key(claim.category, claim.profile_id, claim.message))?;
                Ok(apply(profile))
            });
        match outcome {
            Ok(event) => {
                tracing::info!(
                    category = claim.category.as_str(),
                    profile = %claim.profile_id,
                    attestation = %digest,
                    "attestation applied"
                );
                self.events.publish(&event);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    category = claim.category.as_str(),
                    profile = %claim.profile_id,
                    attestation = %digest,
                    error = e.kind(),
                    "attestation rejected"
                );
                Err(e)
            }
        }
    }

    /// Link (or replace) the wallet address for `chain`.
    ///
    /// # Errors
    ///
    /// `InvalidClaim`, `OracleKeyUnset`, any verifier error,
    /// `ProfileNotFound`, `NotAuthorized` or `AttestationAlreadyUsed`.
    pub fn link_wallet(
        &self,
        caller: &Address,
        profile_id: &ProfileId,
        chain: &str,
        address: &str,
        timestamp_ms: u64,
        signature: &[u8],
    ) -> Result<(), AttestError> {
        self.check_field(chain, "chain must be 1..=max_field_len bytes")?;
        self.check_field(address, "address must be 1..=max_field_len bytes")?;
        let message = wallet_message(profile_id, chain, address, timestamp_ms);
        let claim = GatedClaim {
            category: ClaimCategory::Wallet,
            caller,
            profile_id,
            message: &message,
            signature,
            timestamp_ms,
        };
        self.gated(&claim, |p| {
            p.wallets.insert(chain.to_owned(), address.to_owned());
            DomainEvent::WalletLinked {
                profile_id: *profile_id,
                chain: chain.to_owned(),
                address: address.to_owned(),
            }
        })
    }

    /// Link (or replace) the username for `platform`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::link_wallet`].
    pub fn link_social(
        &self,
        caller: &Address,
        profile_id: &ProfileId,
        platform: &str,
        username: &str,
        timestamp_ms: u64,
        signature: &[u8],
    ) -> Result<(), AttestError> {
        self.check_field(platform, "platform must be 1..=max_field_len bytes")?;
        self.check_field(username, "username must be 1..=max_field_len bytes")?;
        let message = social_message(profile_id, platform, username, timestamp_ms);
        let claim = GatedClaim {
            category: ClaimCategory::Social,
            caller,
            profile_id,
            message: &message,
            signature,
            timestamp_ms,
        };
        self.gated(&claim, |p| {
            p.socials.insert(platform.to_owned(), username.to_owned());
            DomainEvent::SocialLinked {
                profile_id: *profile_id,
                platform: platform.to_owned(),
                username: username.to_owned(),
            }
        })
    }

    /// Append an attested batch of badges. The batch is decoded and validated
    /// in full before anything is applied.
    ///
    /// # Errors
    ///
    /// `MalformedBadgeRecord` plus the errors of [`Self::link_wallet`].
    pub fn mint_badges(
        &self,
        caller: &Address,
        profile_id: &ProfileId,
        encoded_badges: &[u8],
        timestamp_ms: u64,
        signature: &[u8],
    ) -> Result<(), AttestError> {
        let limits = BadgeLimits {
            max_badges: self.config.max_badges_per_batch,
            max_field_len: self.config.max_field_len,
        };
        let badges = decode_badges(encoded_badges, limits)?;
        let count = badges.len();
        let message = badges_message(profile_id, encoded_badges, timestamp_ms);
        let claim = GatedClaim {
            category: ClaimCategory::Badges,
            caller,
            profile_id,
            message: &message,
            signature,
            timestamp_ms,
        };
        self.gated(&claim, |p| {
            p.badges.extend(badges);
            DomainEvent::BadgesMinted { profile_id: *profile_id, count }
        })
    }

    // Owner-authorized removal

    /// Remove the wallet linked for `chain`.
    ///
    /// # Errors
    ///
    /// `ProfileNotFound`, `NotAuthorized` or `LinkNotFound`.
    pub fn unlink_wallet(&self, caller: &Address, profile_id: &ProfileId, chain: &str) -> Result<(), AttestError> {
        {
            let mut dir = self.directory();
            let p = dir.owned_mut(caller, profile_id)?;
            p.wallets.remove(chain).ok_or(AttestError::LinkNotFound)?;
        }
        tracing::info!(profile = %profile_id, chain, "wallet unlinked");
        self.events.publish(&DomainEvent::WalletUnlinked {
            profile_id: *profile_id,
            chain: chain.to_owned(),
        });
        Ok(())
    }

    /// Remove the social account linked for `platform`.
    ///
    /// # Errors
    ///
    /// `ProfileNotFound`, `NotAuthorized` or `LinkNotFound`.
    pub fn unlink_social(&self, caller: &Address, profile_id: &ProfileId, platform: &str) -> Result<(), AttestError> {
        {
            let mut dir = self.directory();
            let p = dir.owned_mut(caller, profile_id)?;
            p.socials.remove(platform).ok_or(AttestError::LinkNotFound)?;
        }
        tracing::info!(profile = %profile_id, platform, "social account unlinked");
        self.events.publish(&DomainEvent::SocialUnlinked {
            profile_id: *profile_id,
            platform: platform.to_owned(),
        });
        Ok(())
    }
}

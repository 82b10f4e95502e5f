//! Oracle verification key and its single administrator.
//!
//! The store is created once and shared (`Arc`) for the lifetime of the
//! system. Only the current admin may rotate the key or hand over the admin
//! role; there is no multi-admin or threshold scheme.

use std::sync::{Arc, PoisonError, RwLock};

use crate::{
    errors::AttestError,
    events::{DomainEvent, EventSink},
    hashers::key_fingerprint,
    types::{Address, VerificationKey},
};

/// Snapshot of the oracle configuration. `verification_key` is `None` until
/// the admin installs a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleConfig {
    pub verification_key: Option<VerificationKey>,
    pub admin: Address,
}

pub struct OracleKeyStore {
    config: RwLock<OracleConfig>,
    events: Arc<dyn EventSink>,
}

impl OracleKeyStore {
    /// Create the shared config with no key and `caller` as admin.
    #[must_use]
    pub fn initialize(caller: Address, events: Arc<dyn EventSink>) -> Arc<Self> {
        tracing::info!(admin = %caller, "oracle key store initialized");
        Arc::new(Self {
            config: RwLock::new(OracleConfig { verification_key: None, admin: caller }),
            events,
        })
    }

    /// Whether `caller` currently holds the oracle admin capability.
    #[must_use]
    pub fn is_admin(&self, caller: &Address) -> bool {
        self.config.read().unwrap_or_else(PoisonError::into_inner).admin == *caller
    }

    /// Replace the verification key.
    ///
    /// # Errors
    ///
    /// `NotAuthorized` unless `caller` is the admin; `InvalidKeyLength` unless
    /// `new_key` is exactly 32 bytes.
    pub fn update_public_key(&self, caller: &Address, new_key: &[u8]) -> Result<(), AttestError> {
        let event = {
            let mut cfg = self.config.write().unwrap_or_else(PoisonError::into_inner);
            if cfg.admin != *caller {
                tracing::warn!(caller = %caller, "oracle key rotation refused: not admin");
                return Err(AttestError::NotAuthorized);
            }
            let key = VerificationKey::try_from(new_key)?;
            let old_key = cfg.verification_key.replace(key);
            tracing::info!(
                new_fingerprint = %hex::encode(key_fingerprint(&key)),
                had_key = old_key.is_some(),
                "oracle key rotated"
            );
            DomainEvent::OracleKeyRotated { old_key, new_key: key }
        };
        self.events.publish(&event);
        Ok(())
    }

    /// Hand the admin role to `new_admin`. No further validation.
    ///
    /// # Errors
    ///
    /// `NotAuthorized` unless `caller` is the admin.
    pub fn transfer_admin(&self, caller: &Address, new_admin: Address) -> Result<(), AttestError> {
        let event = {
            let mut cfg = self.config.write().unwrap_or_else(PoisonError::into_inner);
            if cfg.admin != *caller {
                tracing::warn!(caller = %caller, "admin transfer refused: not admin");
                return Err(AttestError::NotAuthorized);
            }
            let old_admin = std::mem::replace(&mut cfg.admin, new_admin);
            tracing::info!(old_admin = %old_admin, new_admin = %new_admin, "oracle admin transferred");
            DomainEvent::AdminTransferred { old_admin, new_admin }
        };
        self.events.publish(&event);
        Ok(())
    }

    #[must_use]
    pub fn get_key(&self) -> Option<VerificationKey> {
        self.config.read().unwrap_or_else(PoisonError::into_inner).verification_key
    }

    #[must_use]
    pub fn get_admin(&self) -> Address {
        self.config.read().unwrap_or_else(PoisonError::into_inner).admin
    }

    #[must_use]
    pub fn snapshot(&self) -> OracleConfig {
        self.config.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

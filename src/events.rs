use std::sync::{Mutex, PoisonError};

use crate::types::{Address, ProfileId, VerificationKey};

/// State changes published after an operation commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    ProfileCreated { profile_id: ProfileId, owner: Address, display_name: String },
    ProfileDeleted { profile_id: ProfileId, owner: Address, display_name: String },
    DisplayNameChanged { profile_id: ProfileId, old_name: String, new_name: String },
    WalletLinked { profile_id: ProfileId, chain: String, address: String },
    WalletUnlinked { profile_id: ProfileId, chain: String },
    SocialLinked { profile_id: ProfileId, platform: String, username: String },
    SocialUnlinked { profile_id: ProfileId, platform: String },
    BadgesMinted { profile_id: ProfileId, count: usize },
    OracleKeyRotated { old_key: Option<VerificationKey>, new_key: VerificationKey },
    AdminTransferred { old_admin: Address, new_admin: Address },
}

impl DomainEvent {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ProfileCreated { .. } => "profile_created",
            Self::ProfileDeleted { .. } => "profile_deleted",
            Self::DisplayNameChanged { .. } => "display_name_changed",
            Self::WalletLinked { .. } => "wallet_linked",
            Self::WalletUnlinked { .. } => "wallet_unlinked",
            Self::SocialLinked { .. } => "social_linked",
            Self::SocialUnlinked { .. } => "social_unlinked",
            Self::BadgesMinted { .. } => "badges_minted",
            Self::OracleKeyRotated { .. } => "oracle_key_rotated",
            Self::AdminTransferred { .. } => "admin_transferred",
        }
    }
}

/// Receiver of committed domain events. Publishing cannot fail the
/// operation that produced the event.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: &DomainEvent);
}

/// Writes every event to the `tracing` subscriber at INFO.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn publish(&self, event: &DomainEvent) {
        tracing::info!(target: "profile_attest::events", event = event.name(), detail = ?event, "domain event");
    }
}

/// Keeps events in memory, in publication order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<DomainEvent>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove and return everything collected so far.
    pub fn drain(&self) -> Vec<DomainEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl EventSink for MemorySink {
    fn publish(&self, event: &DomainEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

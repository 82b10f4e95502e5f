//! Global display-name and owner uniqueness.
//!
//! Two sets moved in lockstep: a name is present iff a live profile carries
//! it, an owner is present iff that owner has a live profile. Mutation is
//! crate-private; the only caller is the profile [`Directory`], which changes
//! the registry and the profile map in the same critical section.
//!
//! [`Directory`]: crate::profile::Directory

use std::collections::HashSet;

use crate::{errors::AttestError, types::Address};

#[derive(Debug, Default, Clone)]
pub struct UniquenessRegistry {
    names: HashSet<String>,
    owners: HashSet<Address>,
}

impl UniquenessRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim both a display name and an owner slot, or neither.
    pub(crate) fn reserve(&mut self, display_name: &str, owner: &Address) -> Result<(), AttestError> {
        if self.names.contains(display_name) {
            return Err(AttestError::DisplayNameTaken);
        }
        if self.owners.contains(owner) {
            return Err(AttestError::ProfileAlreadyExists);
        }
        self.names.insert(display_name.to_owned());
        self.owners.insert(*owner);
        Ok(())
    }

    /// Drop both entries. The caller guarantees both are present.
    pub(crate) fn release(&mut self, display_name: &str, owner: &Address) {
        let had_name = self.names.remove(display_name);
        let had_owner = self.owners.remove(owner);
        debug_assert!(had_name && had_owner, "registry release of an absent entry");
    }

    /// Move an owner's reservation from `old_name` to `new_name`.
    pub(crate) fn rename(&mut self, old_name: &str, new_name: &str) -> Result<(), AttestError> {
        if old_name == new_name {
            return Ok(());
        }
        if self.names.contains(new_name) {
            return Err(AttestError::DisplayNameTaken);
        }
        let had_old = self.names.remove(old_name);
        debug_assert!(had_old, "registry rename of an absent name");
        self.names.insert(new_name.to_owned());
        Ok(())
    }

    #[must_use]
    pub fn contains_name(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    #[must_use]
    pub fn contains_owner(&self, owner: &Address) -> bool {
        self.owners.contains(owner)
    }

    /// Number of live reservations. Names and owners always agree.
    #[must_use]
    pub fn len(&self) -> usize {
        debug_assert_eq!(self.names.len(), self.owners.len());
        self.owners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! Profiles and the directory that owns them.
//!
//! The directory holds the profile map and the [`UniquenessRegistry`] side
//! by side. Creating, deleting and renaming a profile touch both in one
//! `&mut self` call, so a profile can never exist without its registry
//! entry or the other way round.

use std::collections::{BTreeMap, HashMap};

use crate::{
    config::DEFAULT_MAX_DISPLAY_NAME_LEN,
    errors::AttestError,
    hashers::derive_profile_id,
    registry::UniquenessRegistry,
    types::{Address, Badge, ProfileId},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: ProfileId,
    pub owner: Address,
    pub display_name: String,
    /// chain -> address, one per chain
    pub wallets: BTreeMap<String, String>,
    /// platform -> username, one per platform
    pub socials: BTreeMap<String, String>,
    pub badges: Vec<Badge>,
}

impl Profile {
    fn new(id: ProfileId, owner: Address, display_name: String) -> Self {
        Self {
            id,
            owner,
            display_name,
            wallets: BTreeMap::new(),
            socials: BTreeMap::new(),
            badges: Vec::new(),
        }
    }

    #[must_use]
    pub fn wallet(&self, chain: &str) -> Option<&str> {
        self.wallets.get(chain).map(String::as_str)
    }

    #[must_use]
    pub fn social(&self, platform: &str) -> Option<&str> {
        self.socials.get(platform).map(String::as_str)
    }
}

/// Display names are non-empty, carry no surrounding whitespace or control
/// characters, and fit in `max_len` bytes. Comparison is exact.
pub fn validate_display_name(name: &str, max_len: usize) -> Result<(), AttestError> {
    if name.is_empty() {
        return Err(AttestError::InvalidDisplayName("empty"));
    }
    if name.len() > max_len {
        return Err(AttestError::InvalidDisplayName("too long"));
    }
    if name.trim() != name {
        return Err(AttestError::InvalidDisplayName("leading or trailing whitespace"));
    }
    if name.chars().any(char::is_control) {
        return Err(AttestError::InvalidDisplayName("control character"));
    }
    Ok(())
}

#[derive(Debug)]
pub struct Directory {
    profiles: HashMap<ProfileId, Profile>,
    registry: UniquenessRegistry,
    next_seq: u64,
    max_name_len: usize,
}

impl Default for Directory {
    fn default() -> Self {
        Self::with_max_name_len(DEFAULT_MAX_DISPLAY_NAME_LEN)
    }
}

impl Directory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_name_len(max_name_len: usize) -> Self {
        Self {
            profiles: HashMap::new(),
            registry: UniquenessRegistry::default(),
            next_seq: 0,
            max_name_len,
        }
    }

    /// Profile-created hook: validate the name, reserve it and the owner,
    /// then insert.
    pub fn create(&mut self, owner: Address, display_name: &str) -> Result<ProfileId, AttestError> {
        validate_display_name(display_name, self.max_name_len)?;
        self.registry.reserve(display_name, &owner)?;
        let id = derive_profile_id(&owner, self.next_seq);
        self.next_seq += 1;
        self.profiles
            .insert(id, Profile::new(id, owner, display_name.to_owned()));
        Ok(id)
    }

    /// Profile-deleted hook: remove and release.
    pub fn delete(&mut self, caller: &Address, id: &ProfileId) -> Result<Profile, AttestError> {
        self.owned(caller, id)?;
        let profile = self.profiles.remove(id).ok_or(AttestError::ProfileNotFound)?;
        self.registry.release(&profile.display_name, &profile.owner);
        Ok(profile)
    }

    /// Swap the display name, returning the old one.
    pub fn rename(&mut self, caller: &Address, id: &ProfileId, new_name: &str) -> Result<String, AttestError> {
        validate_display_name(new_name, self.max_name_len)?;
        let old = self.owned(caller, id)?.display_name.clone();
        self.registry.rename(&old, new_name)?;
        if let Some(p) = self.profiles.get_mut(id) {
            p.display_name = new_name.to_owned();
        }
        Ok(old)
    }

    #[must_use]
    pub fn get(&self, id: &ProfileId) -> Option<&Profile> {
        self.profiles.get(id)
    }

    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Profile> {
        if !self.registry.contains_name(name) {
            return None;
        }
        self.profiles.values().find(|p| p.display_name == name)
    }

    #[must_use]
    pub fn find_by_owner(&self, owner: &Address) -> Option<&Profile> {
        if !self.registry.contains_owner(owner) {
            return None;
        }
        self.profiles.values().find(|p| p.owner == *owner)
    }

    /// The profile, if it exists and `caller` owns it.
    pub fn owned(&self, caller: &Address, id: &ProfileId) -> Result<&Profile, AttestError> {
        let p = self.profiles.get(id).ok_or(AttestError::ProfileNotFound)?;
        if p.owner != *caller {
            return Err(AttestError::NotAuthorized);
        }
        Ok(p)
    }

    /// Mutable access for table updates. Identity fields stay private to
    /// this module through `create`/`rename`/`delete`.
    pub(crate) fn owned_mut(&mut self, caller: &Address, id: &ProfileId) -> Result<&mut Profile, AttestError> {
        let p = self.profiles.get_mut(id).ok_or(AttestError::ProfileNotFound)?;
        if p.owner != *caller {
            return Err(AttestError::NotAuthorized);
        }
        Ok(p)
    }

    #[must_use]
    pub const fn registry(&self) -> &UniquenessRegistry {
        &self.registry
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Registry entries correspond one-to-one with live profiles.
    #[must_use]
    pub fn registry_consistent(&self) -> bool {
        self.registry.len() == self.profiles.len()
            && self.profiles.values().all(|p| {
                self.registry.contains_name(&p.display_name) && self.registry.contains_owner(&p.owner)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: Address = Address([1; 32]);
    const B: Address = Address([2; 32]);

    #[test]
    fn create_and_delete_move_registry_in_lockstep() {
        let mut d = Directory::new();
        let id = d.create(A, "alice").unwrap();
        assert!(d.registry().contains_name("alice"));
        assert!(d.registry().contains_owner(&A));
        assert!(d.registry_consistent());

        assert_eq!(d.create(B, "alice"), Err(AttestError::DisplayNameTaken));
        assert_eq!(d.create(A, "other"), Err(AttestError::ProfileAlreadyExists));
        assert_eq!(d.len(), 1);
        assert!(d.registry_consistent());

        assert_eq!(d.delete(&B, &id), Err(AttestError::NotAuthorized));
        let gone = d.delete(&A, &id).unwrap();
        assert_eq!(gone.display_name, "alice");
        assert!(d.is_empty());
        assert!(!d.registry().contains_name("alice"));
        assert!(d.registry_consistent());
        assert_eq!(d.delete(&A, &id), Err(AttestError::ProfileNotFound));
    }

    #[test]
    fn recreated_profile_gets_fresh_id() {
        let mut d = Directory::new();
        let first = d.create(A, "alice").unwrap();
        d.delete(&A, &first).unwrap();
        let second = d.create(A, "alice").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn rename_updates_lookup() {
        let mut d = Directory::new();
        let id = d.create(A, "alice").unwrap();
        d.create(B, "bob").unwrap();
        assert_eq!(d.rename(&A, &id, "bob"), Err(AttestError::DisplayNameTaken));
        assert_eq!(d.rename(&A, &id, "alicia").unwrap(), "alice");
        assert_eq!(d.find_by_name("alicia").map(|p| p.id), Some(id));
        assert!(d.find_by_name("alice").is_none());
        assert_eq!(d.find_by_owner(&A).map(|p| p.display_name.as_str()), Some("alicia"));
        assert!(d.registry_consistent());
    }

    #[test]
    fn directory_enforces_name_rules() {
        let mut d = Directory::with_max_name_len(8);
        assert!(matches!(d.create(A, ""), Err(AttestError::InvalidDisplayName(_))));
        assert!(matches!(d.create(A, " alice"), Err(AttestError::InvalidDisplayName(_))));
        assert!(matches!(d.create(A, "alexandria"), Err(AttestError::InvalidDisplayName(_))));
        assert!(d.is_empty());
        assert!(!d.registry().contains_owner(&A));

        let id = d.create(A, "alice").unwrap();
        assert!(matches!(d.rename(&A, &id, "alice "), Err(AttestError::InvalidDisplayName(_))));
        assert!(matches!(d.rename(&A, &id, ""), Err(AttestError::InvalidDisplayName(_))));
        assert_eq!(d.get(&id).map(|p| p.display_name.as_str()), Some("alice"));
        assert!(d.registry().contains_name("alice"));
        assert!(d.registry_consistent());
    }

    #[test]
    fn display_name_rules() {
        assert!(validate_display_name("alice", 8).is_ok());
        assert!(validate_display_name("", 8).is_err());
        assert!(validate_display_name("alice in wonderland", 8).is_err());
        assert!(validate_display_name(" alice", 8).is_err());
        assert!(validate_display_name("al\nice", 8).is_err());
    }
}

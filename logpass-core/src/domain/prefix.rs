//! Storage-namespace registration: a `Prefix` is the owning record for
//! a tree of [`crate::domain::StorageEntry`] values.

use crate::config::STORAGE_PREFIX_MAX_ALLOWED_USERS;
use crate::crypto::UserId;
use crate::error::{CResult, Error};
use crate::serializer::{Codec, Serializer};
use std::collections::BTreeSet;

/// Longest allowed prefix id, in bytes. Not given a literal value by
/// the source material; chosen generously relative to the transaction
/// size cap.
pub const PREFIX_MAX_ID_LENGTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PrefixSettings {
    pub allowed_users: BTreeSet<UserId>,
}

impl PrefixSettings {
    pub fn validate(&self, owner: &UserId) -> CResult<()> {
        if self.allowed_users.len() > STORAGE_PREFIX_MAX_ALLOWED_USERS {
            return Err(Error::transaction_validation(format!(
                "max {STORAGE_PREFIX_MAX_ALLOWED_USERS} users are allowed"
            )));
        }
        if self.allowed_users.contains(owner) {
            return Err(Error::transaction_validation(
                "owner of prefix is in allowed users by default, it shouldn't be included",
            ));
        }
        Ok(())
    }
}

impl Codec for PrefixSettings {
    fn encode(&self, s: &mut Serializer) {
        s.put_set_u8(&self.allowed_users, |s, id| id.encode(s))
            .expect("allowed user count bounded by STORAGE_PREFIX_MAX_ALLOWED_USERS");
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        Ok(PrefixSettings { allowed_users: s.get_set_u8(UserId::decode)? })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prefix {
    pub id: String,
    pub owner: UserId,
    pub created: u32,
    pub last_entry: u32,
    pub entries: u32,
    pub settings: PrefixSettings,
}

impl Prefix {
    pub fn create(id: String, owner: UserId, block_id: u32) -> Self {
        Prefix { id, owner, created: block_id, last_entry: block_id, entries: 0, settings: PrefixSettings::default() }
    }

    /// A prefix id is `1..PREFIX_MAX_ID_LENGTH` printable ASCII bytes.
    pub fn is_id_valid(id: &str) -> bool {
        !id.is_empty()
            && id.len() <= PREFIX_MAX_ID_LENGTH
            && id.bytes().all(|b| b.is_ascii_graphic())
    }

    /// Records a new entry having been stored under this prefix.
    pub fn clone_with_new_entry(&self, block_id: u32) -> (Self, u32) {
        let entry_id = self.entries;
        let mut next = self.clone();
        next.entries += 1;
        next.last_entry = block_id;
        (next, entry_id)
    }
}

impl Codec for Prefix {
    fn encode(&self, s: &mut Serializer) {
        s.put_string_u8(&self.id).expect("prefix id bounded by PREFIX_MAX_ID_LENGTH");
        self.owner.encode(s);
        s.put_u32_le(self.created);
        s.put_u32_le(self.last_entry);
        s.put_u32_le(self.entries);
        self.settings.encode(s);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        Ok(Prefix {
            id: s.get_string_u8()?,
            owner: UserId::decode(s)?,
            created: s.get_u32_le()?,
            last_entry: s.get_u32_le()?,
            entries: s.get_u32_le()?,
            settings: PrefixSettings::decode(s)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_oversized_ids() {
        assert!(!Prefix::is_id_valid(""));
        assert!(!Prefix::is_id_valid(&"a".repeat(PREFIX_MAX_ID_LENGTH + 1)));
        assert!(Prefix::is_id_valid("my-prefix"));
    }

    #[test]
    fn settings_reject_owner_in_allowed_users() {
        let owner = UserId::from_bytes([1u8; 32]);
        let mut settings = PrefixSettings::default();
        settings.allowed_users.insert(owner);
        assert!(settings.validate(&owner).is_err());
    }
}

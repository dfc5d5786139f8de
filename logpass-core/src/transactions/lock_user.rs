//! Locks a subset of the submitting account's own keys and/or
//! supervisors. A locked key or supervisor still contributes to power
//! below `MEDIUM` only when the type-specific settings say to ignore
//! locks (see [`crate::domain::User::get_power_level_with_used_keys`]).

use crate::columns::Columns;
use crate::crypto::{PublicKey, UserId};
use crate::domain::PowerLevel;
use crate::error::{CResult, Error};
use crate::facade;
use crate::serializer::{Codec, Serializer};
use crate::transactions::{Authorization, TransactionBody, TransactionSettings, Transaction, UnsignedTransaction};
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct LockUserTransaction {
    pub keys_to_lock: BTreeSet<PublicKey>,
    pub supervisors_to_lock: BTreeSet<UserId>,
}

impl LockUserTransaction {
    pub fn create(
        block_id: u32,
        pricing: i16,
        keys_to_lock: BTreeSet<PublicKey>,
        supervisors_to_lock: BTreeSet<UserId>,
    ) -> UnsignedTransaction {
        let body = TransactionBody::LockUser(LockUserTransaction { keys_to_lock, supervisors_to_lock });
        UnsignedTransaction::new(block_id, pricing, body)
    }

    pub fn settings(&self) -> TransactionSettings {
        TransactionSettings {
            ignores_lock: true,
            is_user_management_transaction: true,
            minimum_power_level: PowerLevel::LOWEST,
            ..Default::default()
        }
    }

    pub fn validate(
        &self,
        tx: &Transaction,
        current_block_id: u32,
        columns: &Columns,
        _auth: &Authorization,
    ) -> CResult<()> {
        let user = facade::users::get(columns, false, current_block_id, &tx.user_id())?
            .expect("validate_common already confirmed the submitter exists");

        if self.keys_to_lock.is_empty() && self.supervisors_to_lock.is_empty() {
            return Err(Error::transaction_validation("no key or supervisor to lock was provided"));
        }

        let mut has_valid_lock = false;
        for key in &self.keys_to_lock {
            if !user.has_key(key) {
                return Err(Error::transaction_validation("provided key is not part of the account"));
            }
            if !user.locked_keys.contains(key) {
                has_valid_lock = true;
            }
        }
        for supervisor_id in &self.supervisors_to_lock {
            if !user.has_supervisor(supervisor_id) {
                return Err(Error::transaction_validation("provided supervisor is not part of the account"));
            }
            if !user.locked_supervisors.contains(supervisor_id) {
                has_valid_lock = true;
            }
        }
        if !has_valid_lock {
            return Err(Error::transaction_validation("provided keys and supervisors are already locked"));
        }
        Ok(())
    }

    pub fn execute(&self, tx: &Transaction, current_block_id: u32, columns: &Columns) -> CResult<()> {
        let mut user = facade::users::get(columns, false, current_block_id, &tx.user_id())?.expect("validated to exist");
        user.locked_keys.extend(self.keys_to_lock.iter().copied());
        user.locked_supervisors.extend(self.supervisors_to_lock.iter().copied());
        facade::users::update(columns, current_block_id, tx.user_id(), user)?;
        Ok(())
    }
}

impl Codec for LockUserTransaction {
    fn encode(&self, s: &mut Serializer) {
        s.put_set_u8(&self.keys_to_lock, |s, k| k.encode(s)).expect("locked key count bounded by USER_MAX_KEYS");
        s.put_set_u8(&self.supervisors_to_lock, |s, k| k.encode(s))
            .expect("locked supervisor count bounded by USER_MAX_SUPERVISORS");
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        Ok(LockUserTransaction {
            keys_to_lock: s.get_set_u8(PublicKey::decode)?,
            supervisors_to_lock: s.get_set_u8(UserId::decode)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PrivateKey;
    use crate::transactions::init::InitTransaction;
    use std::sync::Arc;

    fn open_columns() -> (tempfile::TempDir, Columns) {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(crate::storage::open(dir.path()).unwrap());
        (dir, Columns::open(db).unwrap())
    }

    fn genesis(columns: &Columns) -> PrivateKey {
        let key = PrivateKey::generate();
        let tx = InitTransaction::create(1, 0, 1_717_200_000, 60).sign(&key);
        tx.validate(1, columns).unwrap();
        tx.execute(1, columns).unwrap();
        key
    }

    #[test]
    fn locks_an_owned_key() {
        let (_dir, columns) = open_columns();
        let key = genesis(&columns);
        let id = crate::crypto::UserId::from_bytes(*key.public_key().derive_user_id().as_bytes());

        let mut keys_to_lock = BTreeSet::new();
        keys_to_lock.insert(key.public_key());
        let tx = LockUserTransaction::create(2, 0, keys_to_lock, BTreeSet::new()).sign(&key);
        tx.validate(2, &columns).unwrap();
        tx.execute(2, &columns).unwrap();

        let user = facade::users::get(&columns, false, 2, &id).unwrap().unwrap();
        assert!(user.locked_keys.contains(&key.public_key()));
    }

    #[test]
    fn rejects_empty_request() {
        let (_dir, columns) = open_columns();
        let key = genesis(&columns);
        let tx = LockUserTransaction::create(2, 0, BTreeSet::new(), BTreeSet::new()).sign(&key);
        assert!(tx.validate(2, &columns).is_err());
    }

    #[test]
    fn rejects_key_not_owned_by_account() {
        let (_dir, columns) = open_columns();
        let key = genesis(&columns);
        let stranger = PrivateKey::generate().public_key();
        let mut keys_to_lock = BTreeSet::new();
        keys_to_lock.insert(stranger);
        let tx = LockUserTransaction::create(2, 0, keys_to_lock, BTreeSet::new()).sign(&key);
        assert!(tx.validate(2, &columns).is_err());
    }
}

//! Unlocks a subset of the submitting account's own keys and/or
//! supervisors. Requires `MEDIUM` power specifically so a merely
//! `LOWEST`/`LOW`-authorized signer (which a lock just below `MEDIUM`
//! would otherwise still permit) cannot unlock itself right back.

use crate::columns::Columns;
use crate::crypto::{PublicKey, UserId};
use crate::domain::PowerLevel;
use crate::error::{CResult, Error};
use crate::facade;
use crate::serializer::{Codec, Serializer};
use crate::transactions::{Authorization, TransactionBody, TransactionSettings, Transaction, UnsignedTransaction};
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct UnlockUserTransaction {
    pub keys_to_unlock: BTreeSet<PublicKey>,
    pub supervisors_to_unlock: BTreeSet<UserId>,
}

impl UnlockUserTransaction {
    pub fn create(
        block_id: u32,
        pricing: i16,
        keys_to_unlock: BTreeSet<PublicKey>,
        supervisors_to_unlock: BTreeSet<UserId>,
    ) -> UnsignedTransaction {
        let body = TransactionBody::UnlockUser(UnlockUserTransaction { keys_to_unlock, supervisors_to_unlock });
        UnsignedTransaction::new(block_id, pricing, body)
    }

    pub fn settings(&self) -> TransactionSettings {
        TransactionSettings {
            ignores_lock: true,
            is_user_management_transaction: true,
            minimum_power_level: PowerLevel::MEDIUM,
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

        if self.keys_to_unlock.is_empty() && self.supervisors_to_unlock.is_empty() {
            return Err(Error::transaction_validation("no key or supervisor to unlock was provided"));
        }

        let mut has_valid_unlock = false;
        for key in &self.keys_to_unlock {
            if !user.has_key(key) {
                return Err(Error::transaction_validation("provided key is not part of the account"));
            }
            if user.locked_keys.contains(key) {
                has_valid_unlock = true;
            }
        }
        for supervisor_id in &self.supervisors_to_unlock {
            if !user.has_supervisor(supervisor_id) {
                return Err(Error::transaction_validation("provided supervisor is not part of the account"));
            }
            if user.locked_supervisors.contains(supervisor_id) {
                has_valid_unlock = true;
            }
        }
        if !has_valid_unlock {
            return Err(Error::transaction_validation("provided keys and supervisors are already unlocked"));
        }
        Ok(())
    }

    pub fn execute(&self, tx: &Transaction, current_block_id: u32, columns: &Columns) -> CResult<()> {
        let mut user = facade::users::get(columns, false, current_block_id, &tx.user_id())?.expect("validated to exist");
        for key in &self.keys_to_unlock {
            user.locked_keys.remove(key);
        }
        for supervisor_id in &self.supervisors_to_unlock {
            user.locked_supervisors.remove(supervisor_id);
        }
        facade::users::update(columns, current_block_id, tx.user_id(), user)?;
        Ok(())
    }
}

impl Codec for UnlockUserTransaction {
    fn encode(&self, s: &mut Serializer) {
        s.put_set_u8(&self.keys_to_unlock, |s, k| k.encode(s)).expect("locked key count bounded by USER_MAX_KEYS");
        s.put_set_u8(&self.supervisors_to_unlock, |s, k| k.encode(s))
            .expect("locked supervisor count bounded by USER_MAX_SUPERVISORS");
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        Ok(UnlockUserTransaction {
            keys_to_unlock: s.get_set_u8(PublicKey::decode)?,
            supervisors_to_unlock: s.get_set_u8(UserId::decode)?,
        })
    }
}

//! The genesis transaction: the one type that bypasses the shared
//! validate/execute template entirely, since it brings the very first
//! account into existence rather than authorizing against one.

use crate::columns::Columns;
use crate::config::{BLOCK_INTERVAL, FIRST_USER_BALANCE, FIRST_USER_STAKE};
use crate::crypto::{MinerId, UserId};
use crate::domain::user_keys::{KeySettings, UserKeys, ALL_SCOPES};
use crate::domain::user_security_rules::UserSecurityRules;
use crate::domain::user_settings::UserSettings;
use crate::domain::user_supervisors::UserSupervisors;
use crate::domain::{Miner, User};
use crate::error::{CResult, Error};
use crate::facade;
use crate::serializer::{Codec, Serializer};
use crate::transactions::{TransactionBody, TransactionSettings, Transaction, UnsignedTransaction};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct InitTransaction {
    pub version: u8,
    pub initialization_time: u64,
    pub block_interval: u32,
}

impl InitTransaction {
    pub fn create(block_id: u32, pricing: i16, initialization_time: u64, block_interval: u32) -> UnsignedTransaction {
        let body = TransactionBody::Init(InitTransaction { version: 1, initialization_time, block_interval });
        UnsignedTransaction::new(block_id, pricing, body)
    }

    pub fn settings(&self) -> TransactionSettings {
        TransactionSettings { is_blockchain_management_transaction: true, ..Default::default() }
    }

    /// Stands in for [`Transaction::validate_common`] plus a
    /// type-specific validate hook: there is no pre-existing account to
    /// derive a power level from, so every check, signature
    /// verification included, happens here instead.
    pub fn validate_genesis(&self, tx: &Transaction, current_block_id: u32, columns: &Columns) -> CResult<()> {
        if tx.block_id != 1 || current_block_id != 1 {
            return Err(Error::transaction_validation("init transaction can only execute in the first block"));
        }
        if tx.pricing != 0 {
            return Err(Error::transaction_validation("init transaction must have pricing set to 0"));
        }
        if self.version != 1 {
            return Err(Error::transaction_validation("invalid version"));
        }
        if facade::blocks::latest_block_id(columns, false) != 0
            || facade::transactions::count(columns, false) != 0
            || facade::users::count(columns, false) != 0
        {
            return Err(Error::transaction_validation("blockchain is already initialized"));
        }
        if self.initialization_time == 0 || self.initialization_time % 60 != 0 {
            return Err(Error::transaction_validation("initialization time can't contain seconds"));
        }
        if self.block_interval as u64 != BLOCK_INTERVAL {
            return Err(Error::transaction_validation("invalid block interval"));
        }
        if !tx.signatures.co_signers.is_empty() || tx.signatures.sponsor_id.is_some() {
            return Err(Error::transaction_validation("init transaction must carry exactly one signature"));
        }
        let derived = UserId::from_bytes(*tx.main_public_key().derive_user_id().as_bytes());
        if derived != tx.user_id() {
            return Err(Error::transaction_validation("signature does not match claimed user id"));
        }
        if !tx.signatures.verify(&tx.hash) {
            return Err(Error::crypto("signature verification failed"));
        }
        Ok(())
    }

    pub fn execute(&self, tx: &Transaction, current_block_id: u32, columns: &Columns) -> CResult<()> {
        let public_key = tx.main_public_key();
        let user_id = tx.user_id();
        let miner_id = MinerId::from_bytes(public_key.derive_miner_id());

        let mut keys = BTreeMap::new();
        keys.insert(public_key, KeySettings { power: 1, scopes: ALL_SCOPES });
        let settings =
            UserSettings { keys: UserKeys(keys), supervisors: UserSupervisors::default(), rules: UserSecurityRules::default() };
        let mut user = User::new(user_id, settings, FIRST_USER_BALANCE);
        user.miner = miner_id;
        facade::users::add(columns, current_block_id, user_id, user)?;

        let miner = Miner::new(user_id, FIRST_USER_STAKE);
        facade::miners::add(columns, miner_id, user_id, miner)?;

        facade::state::set_genesis_params(columns, self.initialization_time, self.block_interval);
        Ok(())
    }
}

impl Codec for InitTransaction {
    fn encode(&self, s: &mut Serializer) {
        s.put_u8(self.version);
        s.put_u64_le(self.initialization_time);
        s.put_u32_le(self.block_interval);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        Ok(InitTransaction {
            version: s.get_u8()?,
            initialization_time: s.get_u64_le()?,
            block_interval: s.get_u32_le()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PrivateKey;
    use std::sync::Arc;

    fn open_columns() -> (tempfile::TempDir, Columns) {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(crate::storage::open(dir.path()).unwrap());
        (dir, Columns::open(db).unwrap())
    }

    #[test]
    fn genesis_creates_first_user_and_miner() {
        let (_dir, columns) = open_columns();
        let key = PrivateKey::generate();
        let tx = InitTransaction::create(1, 0, 1_717_200_000, 60).sign(&key);

        tx.validate(1, &columns).unwrap();
        tx.execute(1, &columns).unwrap();

        let user = facade::users::get(&columns, false, 1, &tx.user_id()).unwrap().unwrap();
        assert_eq!(user.tokens, FIRST_USER_BALANCE);
        assert_eq!(user.miner, MinerId::from_bytes(key.public_key().derive_miner_id()));

        let miner = facade::miners::get(&columns, false, &user.miner).unwrap().unwrap();
        assert_eq!(miner.stake, FIRST_USER_STAKE);
        assert_eq!(facade::state::initialization_time(&columns, false), 1_717_200_000);
        assert_eq!(facade::state::block_interval(&columns, false), 60);
    }

    #[test]
    fn rejects_nonzero_seconds_in_initialization_time() {
        let (_dir, columns) = open_columns();
        let key = PrivateKey::generate();
        let tx = InitTransaction::create(1, 0, 1_717_200_001, 60).sign(&key);
        assert!(tx.validate(1, &columns).is_err());
    }

    #[test]
    fn rejects_second_init_once_initialized() {
        let (_dir, columns) = open_columns();
        let key = PrivateKey::generate();
        let tx = InitTransaction::create(1, 0, 1_717_200_000, 60).sign(&key);
        tx.validate(1, &columns).unwrap();
        tx.execute(1, &columns).unwrap();

        let other = PrivateKey::generate();
        let second = InitTransaction::create(1, 0, 1_717_200_060, 60).sign(&other);
        assert!(second.validate(1, &columns).is_err());
    }
}

//! Chooses which miner the submitting account stakes its fees to.
//! Referenced by `payer.miner` in [`crate::transactions::Transaction::execute_common`]
//! whenever a positive-pricing fee is paid.

use crate::columns::Columns;
use crate::crypto::MinerId;
use crate::domain::PowerLevel;
use crate::error::{CResult, Error};
use crate::facade;
use crate::serializer::{Codec, Serializer};
use crate::transactions::{Authorization, TransactionBody, TransactionSettings, Transaction, UnsignedTransaction};

#[derive(Debug, Clone)]
pub struct SelectMinerTransaction {
    pub miner_id: MinerId,
}

impl SelectMinerTransaction {
    pub fn create(block_id: u32, pricing: i16, miner_id: MinerId) -> UnsignedTransaction {
        let body = TransactionBody::SelectMiner(SelectMinerTransaction { miner_id });
        UnsignedTransaction::new(block_id, pricing, body)
    }

    pub fn settings(&self) -> TransactionSettings {
        TransactionSettings { minimum_power_level: PowerLevel::MEDIUM, ..Default::default() }
    }

    pub fn validate(
        &self,
        tx: &Transaction,
        current_block_id: u32,
        columns: &Columns,
        _auth: &Authorization,
    ) -> CResult<()> {
        if !self.miner_id.is_valid() || !facade::miners::exists(columns, false, &self.miner_id)? {
            return Err(Error::transaction_validation("invalid miner"));
        }
        let user = facade::users::get(columns, false, current_block_id, &tx.user_id())?
            .expect("validate_common already confirmed the submitter exists");
        if user.miner == self.miner_id {
            return Err(Error::transaction_validation("requested miner is already set"));
        }
        Ok(())
    }

    pub fn execute(&self, tx: &Transaction, current_block_id: u32, columns: &Columns) -> CResult<()> {
        let mut user = facade::users::get(columns, false, current_block_id, &tx.user_id())?.expect("validated to exist");
        user.miner = self.miner_id;
        facade::users::update(columns, current_block_id, tx.user_id(), user)?;
        Ok(())
    }
}

impl Codec for SelectMinerTransaction {
    fn encode(&self, s: &mut Serializer) {
        self.miner_id.encode(s);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        Ok(SelectMinerTransaction { miner_id: MinerId::decode(s)? })
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

    #[test]
    fn selects_a_different_miner() {
        let (_dir, columns) = open_columns();
        let key = PrivateKey::generate();
        let init = InitTransaction::create(1, 0, 1_717_200_000, 60).sign(&key);
        init.validate(1, &columns).unwrap();
        init.execute(1, &columns).unwrap();

        let other_key = PrivateKey::generate();
        let create_user = crate::transactions::create_user::CreateUserTransaction::create(
            2,
            0,
            other_key.public_key(),
            0,
            crate::crypto::Hash::default(),
        )
        .sign(&key);
        create_user.validate(2, &columns).unwrap();
        create_user.execute(2, &columns).unwrap();

        let create_miner = crate::transactions::create_miner::CreateMinerTransaction::create(3, 0).sign(&other_key);
        create_miner.validate(3, &columns).unwrap();
        create_miner.execute(3, &columns).unwrap();
        let other_miner = MinerId::from_bytes(other_key.public_key().derive_miner_id());

        let tx = SelectMinerTransaction::create(4, 0, other_miner).sign(&key);
        tx.validate(4, &columns).unwrap();
        tx.execute(4, &columns).unwrap();

        let user = facade::users::get(&columns, false, 4, &key_user_id(&key)).unwrap().unwrap();
        assert_eq!(user.miner, other_miner);
    }

    fn key_user_id(key: &PrivateKey) -> crate::crypto::UserId {
        crate::crypto::UserId::from_bytes(*key.public_key().derive_user_id().as_bytes())
    }

    #[test]
    fn rejects_reselecting_the_current_miner() {
        let (_dir, columns) = open_columns();
        let key = PrivateKey::generate();
        let init = InitTransaction::create(1, 0, 1_717_200_000, 60).sign(&key);
        init.validate(1, &columns).unwrap();
        init.execute(1, &columns).unwrap();
        let own_miner = MinerId::from_bytes(key.public_key().derive_miner_id());

        let tx = SelectMinerTransaction::create(2, 0, own_miner).sign(&key);
        assert!(tx.validate(2, &columns).is_err());
    }

    #[test]
    fn rejects_unknown_miner() {
        let (_dir, columns) = open_columns();
        let key = PrivateKey::generate();
        let init = InitTransaction::create(1, 0, 1_717_200_000, 60).sign(&key);
        init.validate(1, &columns).unwrap();
        init.execute(1, &columns).unwrap();

        let tx = SelectMinerTransaction::create(2, 0, MinerId::random()).sign(&key);
        assert!(tx.validate(2, &columns).is_err());
    }
}

//! Registers a zero-stake miner identified by the submitter's own main
//! signing key, the same self-identifying, single-signature pattern
//! [`crate::transactions::init::InitTransaction`] uses to derive the
//! genesis miner. Not present in the original transaction set: the
//! original only ever creates a miner alongside the first user, so a
//! standalone creation path is added here to let any later account
//! become a miner too.

use crate::columns::Columns;
use crate::crypto::MinerId;
use crate::domain::Miner;
use crate::error::{CResult, Error};
use crate::facade;
use crate::serializer::{Codec, Serializer};
use crate::transactions::{Authorization, TransactionBody, TransactionSettings, Transaction, UnsignedTransaction};

#[derive(Debug, Clone)]
pub struct CreateMinerTransaction;

impl CreateMinerTransaction {
    pub fn create(block_id: u32, pricing: i16) -> UnsignedTransaction {
        UnsignedTransaction::new(block_id, pricing, TransactionBody::CreateMiner(CreateMinerTransaction))
    }

    pub fn settings(&self) -> TransactionSettings {
        TransactionSettings::default()
    }

    pub fn validate(
        &self,
        tx: &Transaction,
        _current_block_id: u32,
        columns: &Columns,
        _auth: &Authorization,
    ) -> CResult<()> {
        if !tx.signatures.co_signers.is_empty() || tx.signatures.sponsor_id.is_some() {
            return Err(Error::transaction_validation("create miner transaction must carry exactly one signature"));
        }
        let miner_id = MinerId::from_bytes(tx.main_public_key().derive_miner_id());
        if facade::miners::exists(columns, false, &miner_id)? {
            return Err(Error::transaction_validation("miner already exists"));
        }
        Ok(())
    }

    pub fn execute(&self, tx: &Transaction, _current_block_id: u32, columns: &Columns) -> CResult<()> {
        let miner_id = MinerId::from_bytes(tx.main_public_key().derive_miner_id());
        let miner = Miner::new(tx.user_id(), 0);
        facade::miners::add(columns, miner_id, tx.user_id(), miner)?;
        Ok(())
    }
}

impl Codec for CreateMinerTransaction {
    fn encode(&self, _s: &mut Serializer) {}

    fn decode(_s: &mut Serializer) -> CResult<Self> {
        Ok(CreateMinerTransaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PrivateKey;
    use crate::transactions::create_user::CreateUserTransaction;
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
    fn creates_a_zero_stake_miner_for_a_new_user() {
        let (_dir, columns) = open_columns();
        let founder = genesis(&columns);
        let new_key = PrivateKey::generate();
        let new_user_id = crate::crypto::UserId::from_bytes(*new_key.public_key().derive_user_id().as_bytes());

        let create_user = CreateUserTransaction::create(2, 0, new_key.public_key(), 0, crate::crypto::Hash::default())
            .sign(&founder);
        create_user.validate(2, &columns).unwrap();
        create_user.execute(2, &columns).unwrap();

        let tx = CreateMinerTransaction::create(3, 0).sign(&new_key);
        tx.validate(3, &columns).unwrap();
        tx.execute(3, &columns).unwrap();

        let miner_id = MinerId::from_bytes(new_key.public_key().derive_miner_id());
        let miner = facade::miners::get(&columns, false, &miner_id).unwrap().unwrap();
        assert_eq!(miner.owner, new_user_id);
        assert_eq!(miner.stake, 0);
    }

    #[test]
    fn rejects_recreating_the_genesis_miner() {
        let (_dir, columns) = open_columns();
        let founder = genesis(&columns);
        let tx = CreateMinerTransaction::create(2, 0).sign(&founder);
        assert!(tx.validate(2, &columns).is_err());
    }
}

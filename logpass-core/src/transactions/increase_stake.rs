//! Converts tokens from the submitter's balance into manual stake on a
//! miner. The amount is the transaction's `cost`, debited by the
//! shared execute tail; this only has to route it into the miner's
//! locked-stake bucket via [`crate::domain::Miner::add_stake`].

use crate::columns::Columns;
use crate::crypto::MinerId;
use crate::error::{CResult, Error};
use crate::facade;
use crate::serializer::{Codec, Serializer};
use crate::transactions::{Authorization, TransactionBody, TransactionSettings, Transaction, UnsignedTransaction};

#[derive(Debug, Clone)]
pub struct IncreaseStakeTransaction {
    pub miner_id: MinerId,
    pub value: u64,
}

impl IncreaseStakeTransaction {
    pub fn create(block_id: u32, pricing: i16, miner_id: MinerId, value: u64) -> UnsignedTransaction {
        let body = TransactionBody::IncreaseStake(IncreaseStakeTransaction { miner_id, value });
        UnsignedTransaction::new(block_id, pricing, body)
    }

    pub fn settings(&self) -> TransactionSettings {
        TransactionSettings::default()
    }

    pub fn validate(
        &self,
        _tx: &Transaction,
        _current_block_id: u32,
        columns: &Columns,
        _auth: &Authorization,
    ) -> CResult<()> {
        if self.value == 0 {
            return Err(Error::transaction_validation("invalid stake value"));
        }
        if !facade::miners::exists(columns, false, &self.miner_id)? {
            return Err(Error::transaction_validation("provided miner does not exist"));
        }
        Ok(())
    }

    pub fn execute(&self, _tx: &Transaction, _current_block_id: u32, columns: &Columns) -> CResult<()> {
        let mut miner = facade::miners::get(columns, false, &self.miner_id)?.expect("validated to exist");
        miner.add_stake(self.value, false);
        facade::miners::update(columns, self.miner_id, miner)?;
        Ok(())
    }
}

impl Codec for IncreaseStakeTransaction {
    fn encode(&self, s: &mut Serializer) {
        self.miner_id.encode(s);
        s.put_u64_le(self.value);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        Ok(IncreaseStakeTransaction { miner_id: MinerId::decode(s)?, value: s.get_u64_le()? })
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

    fn genesis(columns: &Columns) -> (PrivateKey, MinerId) {
        let key = PrivateKey::generate();
        let tx = InitTransaction::create(1, 0, 1_717_200_000, 60).sign(&key);
        tx.validate(1, columns).unwrap();
        tx.execute(1, columns).unwrap();
        let miner_id = MinerId::from_bytes(key.public_key().derive_miner_id());
        (key, miner_id)
    }

    #[test]
    fn increases_stake() {
        let (_dir, columns) = open_columns();
        let (key, miner_id) = genesis(&columns);
        let before = facade::miners::get(&columns, false, &miner_id).unwrap().unwrap().stake;

        let tx = IncreaseStakeTransaction::create(2, 0, miner_id, 500).sign(&key);
        tx.validate(2, &columns).unwrap();
        tx.execute(2, &columns).unwrap();

        let after = facade::miners::get(&columns, false, &miner_id).unwrap().unwrap();
        assert_eq!(after.stake, before + 500);
    }

    #[test]
    fn rejects_zero_value() {
        let (_dir, columns) = open_columns();
        let (key, miner_id) = genesis(&columns);
        let tx = IncreaseStakeTransaction::create(2, 0, miner_id, 0).sign(&key);
        assert!(tx.validate(2, &columns).is_err());
    }

    #[test]
    fn rejects_unknown_miner() {
        let (_dir, columns) = open_columns();
        let (key, _miner_id) = genesis(&columns);
        let tx = IncreaseStakeTransaction::create(2, 0, MinerId::random(), 500).sign(&key);
        assert!(tx.validate(2, &columns).is_err());
    }
}

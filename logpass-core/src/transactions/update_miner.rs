//! Changes a miner's public-facing settings (endpoint, name, etc). The
//! owner alone may do this; stake is untouched.

use crate::columns::Columns;
use crate::crypto::MinerId;
use crate::domain::{MinerSettings, PowerLevel};
use crate::error::{CResult, Error};
use crate::facade;
use crate::serializer::{Codec, Serializer};
use crate::transactions::{Authorization, TransactionBody, TransactionSettings, Transaction, UnsignedTransaction};

#[derive(Debug, Clone)]
pub struct UpdateMinerTransaction {
    pub miner_id: MinerId,
    pub settings: MinerSettings,
}

impl UpdateMinerTransaction {
    pub fn create(block_id: u32, pricing: i16, miner_id: MinerId, settings: MinerSettings) -> UnsignedTransaction {
        let body = TransactionBody::UpdateMiner(UpdateMinerTransaction { miner_id, settings });
        UnsignedTransaction::new(block_id, pricing, body)
    }

    pub fn settings(&self) -> TransactionSettings {
        TransactionSettings { minimum_power_level: PowerLevel::MEDIUM, ..Default::default() }
    }

    pub fn validate(
        &self,
        tx: &Transaction,
        _current_block_id: u32,
        columns: &Columns,
        _auth: &Authorization,
    ) -> CResult<()> {
        if !self.miner_id.is_valid() {
            return Err(Error::transaction_validation("invalid miner"));
        }
        let miner = facade::miners::get(columns, false, &self.miner_id)?
            .ok_or_else(|| Error::transaction_validation("invalid miner"))?;
        if miner.owner != tx.user_id() {
            return Err(Error::transaction_validation("requested miner does not belong to this user"));
        }
        Ok(())
    }

    pub fn execute(&self, _tx: &Transaction, _current_block_id: u32, columns: &Columns) -> CResult<()> {
        let mut miner = facade::miners::get(columns, false, &self.miner_id)?.expect("validated to exist");
        miner.settings = self.settings.clone();
        facade::miners::update(columns, self.miner_id, miner)?;
        Ok(())
    }
}

impl Codec for UpdateMinerTransaction {
    fn encode(&self, s: &mut Serializer) {
        self.miner_id.encode(s);
        self.settings.encode(s);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        Ok(UpdateMinerTransaction { miner_id: MinerId::decode(s)?, settings: MinerSettings::decode(s)? })
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

    fn sample_settings() -> MinerSettings {
        MinerSettings {
            endpoint: "miner.example.com:9000".into(),
            api: "https://miner.example.com/api".into(),
            name: "example miner".into(),
            website: "https://miner.example.com".into(),
            description: String::new(),
        }
    }

    #[test]
    fn owner_can_update_settings() {
        let (_dir, columns) = open_columns();
        let (key, miner_id) = genesis(&columns);

        let tx = UpdateMinerTransaction::create(2, 0, miner_id, sample_settings()).sign(&key);
        tx.validate(2, &columns).unwrap();
        tx.execute(2, &columns).unwrap();

        let miner = facade::miners::get(&columns, false, &miner_id).unwrap().unwrap();
        assert_eq!(miner.settings.name, "example miner");
    }

    #[test]
    fn rejects_non_owner() {
        let (_dir, columns) = open_columns();
        let (_key, miner_id) = genesis(&columns);
        let stranger = PrivateKey::generate();
        let tx = UpdateMinerTransaction::create(2, 0, miner_id, sample_settings()).sign(&stranger);
        assert!(tx.validate(2, &columns).is_err());
    }
}

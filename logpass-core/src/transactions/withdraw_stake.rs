//! Reverses [`crate::transactions::increase_stake::IncreaseStakeTransaction`]:
//! moves stake back out of a miner and credits it to the owner's
//! balance. Withdrawing still-locked stake costs a 5% penalty, grounded
//! in the original's `unlockedStake + (lockedStake * 19) / 20` credit.

use crate::columns::Columns;
use crate::crypto::MinerId;
use crate::domain::PowerLevel;
use crate::error::{CResult, Error};
use crate::facade;
use crate::serializer::{Codec, Serializer};
use crate::transactions::{Authorization, TransactionBody, TransactionSettings, Transaction, UnsignedTransaction};

#[derive(Debug, Clone)]
pub struct WithdrawStakeTransaction {
    pub miner_id: MinerId,
    pub unlocked_stake: u64,
    pub locked_stake: u64,
}

impl WithdrawStakeTransaction {
    pub fn create(
        block_id: u32,
        pricing: i16,
        miner_id: MinerId,
        unlocked_stake: u64,
        locked_stake: u64,
    ) -> UnsignedTransaction {
        let body = TransactionBody::WithdrawStake(WithdrawStakeTransaction { miner_id, unlocked_stake, locked_stake });
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
        let miner = facade::miners::get(columns, false, &self.miner_id)?
            .ok_or_else(|| Error::transaction_validation("provided miner does not exist"))?;
        if miner.owner != tx.user_id() {
            return Err(Error::transaction_validation("provided miner is not owned by transaction user"));
        }
        if self.locked_stake == 0 && self.unlocked_stake == 0 {
            return Err(Error::transaction_validation("stake to withdraw from miner is invalid"));
        }
        if self.locked_stake > miner.locked_stake {
            return Err(Error::transaction_validation("miner does not have enough locked stake to withdraw from it"));
        }
        if self.unlocked_stake > miner.stake - miner.locked_stake {
            return Err(Error::transaction_validation("miner does not have enough unlocked stake to withdraw from it"));
        }
        Ok(())
    }

    pub fn execute(&self, tx: &Transaction, current_block_id: u32, columns: &Columns) -> CResult<()> {
        let mut miner = facade::miners::get(columns, false, &self.miner_id)?.expect("validated to exist");
        miner.withdraw_stake(self.unlocked_stake, self.locked_stake);
        facade::miners::update(columns, self.miner_id, miner)?;

        let mut user =
            facade::users::get(columns, false, current_block_id, &tx.user_id())?.expect("validated to exist");
        user.tokens += self.unlocked_stake + (self.locked_stake * 19) / 20;
        facade::users::update(columns, current_block_id, tx.user_id(), user)?;
        Ok(())
    }
}

impl Codec for WithdrawStakeTransaction {
    fn encode(&self, s: &mut Serializer) {
        self.miner_id.encode(s);
        s.put_u64_le(self.unlocked_stake);
        s.put_u64_le(self.locked_stake);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        Ok(WithdrawStakeTransaction {
            miner_id: MinerId::decode(s)?,
            unlocked_stake: s.get_u64_le()?,
            locked_stake: s.get_u64_le()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PrivateKey;
    use crate::transactions::increase_stake::IncreaseStakeTransaction;
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
    fn withdraws_unlocked_stake_without_penalty() {
        let (_dir, columns) = open_columns();
        let (key, miner_id) = genesis(&columns);

        let stake_tx = IncreaseStakeTransaction::create(2, 0, miner_id, 1_000).sign(&key);
        stake_tx.validate(2, &columns).unwrap();
        stake_tx.execute(2, &columns).unwrap();

        let tx = WithdrawStakeTransaction::create(3, 0, miner_id, 1_000, 0).sign(&key);
        tx.validate(3, &columns).unwrap();
        tx.execute(3, &columns).unwrap();

        let miner = facade::miners::get(&columns, false, &miner_id).unwrap().unwrap();
        assert_eq!(miner.stake, 0);

        let user_id = tx.user_id();
        let user = facade::users::get(&columns, false, 3, &user_id).unwrap().unwrap();
        assert_eq!(user.tokens, 1_000);
    }

    #[test]
    fn withdrawing_locked_stake_applies_penalty() {
        let (_dir, columns) = open_columns();
        let (key, miner_id) = genesis(&columns);
        let miner_before = facade::miners::get(&columns, false, &miner_id).unwrap().unwrap();
        let locked = miner_before.locked_stake;
        assert!(locked > 0, "genesis miner starts with its initial stake fully locked");

        let tx = WithdrawStakeTransaction::create(2, 0, miner_id, 0, locked).sign(&key);
        tx.validate(2, &columns).unwrap();
        tx.execute(2, &columns).unwrap();

        let user_id = tx.user_id();
        let user = facade::users::get(&columns, false, 2, &user_id).unwrap().unwrap();
        assert_eq!(user.tokens, (locked * 19) / 20);
    }

    #[test]
    fn rejects_zero_withdrawal() {
        let (_dir, columns) = open_columns();
        let (key, miner_id) = genesis(&columns);
        let tx = WithdrawStakeTransaction::create(2, 0, miner_id, 0, 0).sign(&key);
        assert!(tx.validate(2, &columns).is_err());
    }

    #[test]
    fn rejects_withdrawal_exceeding_unlocked_stake() {
        let (_dir, columns) = open_columns();
        let (key, miner_id) = genesis(&columns);
        let tx = WithdrawStakeTransaction::create(2, 0, miner_id, 1, 0).sign(&key);
        assert!(tx.validate(2, &columns).is_err());
    }

    #[test]
    fn rejects_non_owner() {
        let (_dir, columns) = open_columns();
        let (_key, miner_id) = genesis(&columns);
        let stranger = PrivateKey::generate();
        let tx = WithdrawStakeTransaction::create(2, 0, miner_id, 0, 0).sign(&stranger);
        assert!(tx.validate(2, &columns).is_err());
    }
}

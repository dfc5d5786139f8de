//! The per-block mining reward claim. Unlike every other transaction
//! type, its validity is tied to the block it is submitted in rather
//! than a bounded window: it must name the block's own scheduled miner
//! (per the upcoming miners queue recorded on the latest block header)
//! and must restate the aggregate counters the reward formula is a
//! function of, so that every node recomputes the same reward
//! independently rather than trusting the claimed value.

use crate::columns::Columns;
use crate::config::{BLOCKS_PER_DAY, STAKING_DURATION, TOTAL_NUMBER_OF_TOKENS, TRANSACTION_FEE};
use crate::crypto::MinerId;
use crate::domain::PowerLevel;
use crate::error::{CResult, Error, SerializerError};
use crate::facade;
use crate::serializer::{Codec, Serializer};
use crate::transactions::{Authorization, TransactionBody, TransactionSettings, Transaction, UnsignedTransaction};

const VERSION: u8 = 1;

#[derive(Debug, Clone)]
pub struct CommitTransaction {
    pub version: u8,
    pub miner_id: MinerId,
    pub transactions: u32,
    pub users: u64,
    pub tokens: u64,
    pub staked_tokens: u64,
    pub reward: u64,
}

impl CommitTransaction {
    pub fn create(
        block_id: u32,
        pricing: i16,
        miner_id: MinerId,
        transactions: u32,
        users: u64,
        tokens: u64,
        staked_tokens: u64,
    ) -> UnsignedTransaction {
        let reward = Self::mining_reward(pricing, transactions, users, tokens, staked_tokens);
        let body = TransactionBody::Commit(CommitTransaction {
            version: VERSION,
            miner_id,
            transactions,
            users,
            tokens,
            staked_tokens,
            reward,
        });
        UnsignedTransaction::new(block_id, pricing, body)
    }

    pub fn settings(&self) -> TransactionSettings {
        TransactionSettings {
            is_blockchain_management_transaction: true,
            minimum_power_level: PowerLevel::LOWEST,
            ..Default::default()
        }
    }

    /// Caps the reward at the tokens still missing from circulation:
    /// a blend of a per-transaction reward and a trickle proportional
    /// to how far the network is from its total token supply.
    pub fn mining_reward(pricing: i16, new_transactions: u32, users: u64, tokens: u64, staked_tokens: u64) -> u64 {
        let missing_tokens = TOTAL_NUMBER_OF_TOKENS.saturating_sub(tokens).saturating_sub(staked_tokens);
        let transaction_fee = (TRANSACTION_FEE * 25) / (24 + pricing as u64);
        let transactions_reward = new_transactions as u64 * transaction_fee / 5;
        let missing_tokens_reward = missing_tokens / (BLOCKS_PER_DAY as u64 * STAKING_DURATION as u64 / 2);
        let _ = users;
        missing_tokens.min(transactions_reward + missing_tokens_reward)
    }

    pub fn validate(
        &self,
        tx: &Transaction,
        current_block_id: u32,
        columns: &Columns,
        _auth: &Authorization,
    ) -> CResult<()> {
        if tx.block_id != current_block_id {
            return Err(Error::transaction_validation("invalid block id"));
        }
        if !tx.signatures.co_signers.is_empty() || tx.signatures.sponsor_id.is_some() {
            return Err(Error::transaction_validation("invalid signatures for commit transaction"));
        }

        let latest_block_id = facade::blocks::latest_block_id(columns, false);
        let mining_queue_index = current_block_id - latest_block_id - 1;
        let mining_queue = facade::blocks::upcoming_miners_queue(columns, false);
        let expected_miner = mining_queue
            .get(mining_queue_index as usize)
            .ok_or_else(|| Error::transaction_validation("invalid index in mining queue"))?;
        if *expected_miner != self.miner_id {
            return Err(Error::transaction_validation("invalid miner id"));
        }

        if facade::transactions::new_transactions_count(columns) != self.transactions as u64 {
            return Err(Error::transaction_validation("invalid number of new transactions"));
        }
        if facade::users::count(columns, false) != self.users {
            return Err(Error::transaction_validation("invalid number of existing users"));
        }
        if facade::users::total_tokens(columns, false) != self.tokens {
            return Err(Error::transaction_validation("invalid number of existing tokens"));
        }
        if facade::miners::total_staked(columns, false) != self.staked_tokens {
            return Err(Error::transaction_validation("invalid number of staked tokens"));
        }

        let reward = Self::mining_reward(tx.pricing, self.transactions, self.users, self.tokens, self.staked_tokens);
        if reward != self.reward {
            return Err(Error::transaction_validation("invalid value of reward"));
        }

        if facade::state::commit_seen(columns, false) {
            return Err(Error::transaction_validation("miner already received reward for this block"));
        }
        Ok(())
    }

    pub fn execute(&self, _tx: &Transaction, current_block_id: u32, columns: &Columns) -> CResult<()> {
        let mut miner = facade::miners::get(columns, false, &self.miner_id)?.expect("validated to exist");
        miner.stake += self.reward;
        miner.unlock_stake(current_block_id, BLOCKS_PER_DAY);
        facade::miners::update(columns, self.miner_id, miner)?;
        facade::state::mark_commit_seen(columns);
        Ok(())
    }
}

impl Codec for CommitTransaction {
    fn encode(&self, s: &mut Serializer) {
        s.put_u8(self.version);
        self.miner_id.encode(s);
        s.put_u32_le(self.transactions);
        s.put_u64_le(self.users);
        s.put_u64_le(self.tokens);
        s.put_u64_le(self.staked_tokens);
        s.put_u64_le(self.reward);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        let version = s.get_u8()?;
        if version != VERSION {
            return Err(SerializerError::InvalidValue(format!("unsupported commit transaction version {version}")).into());
        }
        Ok(CommitTransaction {
            version,
            miner_id: MinerId::decode(s)?,
            transactions: s.get_u32_le()?,
            users: s.get_u64_le()?,
            tokens: s.get_u64_le()?,
            staked_tokens: s.get_u64_le()?,
            reward: s.get_u64_le()?,
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

    fn genesis(columns: &Columns) -> (PrivateKey, MinerId) {
        let key = PrivateKey::generate();
        let tx = InitTransaction::create(1, 0, 1_717_200_000, 60).sign(&key);
        tx.validate(1, columns).unwrap();
        tx.execute(1, columns).unwrap();
        let miner_id = MinerId::from_bytes(key.public_key().derive_miner_id());
        (key, miner_id)
    }

    fn aggregate_counters(columns: &Columns) -> (u64, u64, u64, u64) {
        (
            facade::transactions::new_transactions_count(columns),
            facade::users::count(columns, false),
            facade::users::total_tokens(columns, false),
            facade::miners::total_staked(columns, false),
        )
    }

    #[test]
    fn pays_the_scheduled_miner() {
        let (_dir, columns) = open_columns();
        let (key, miner_id) = genesis(&columns);
        facade::state::set_pricing(&columns, 1);
        facade::blocks::add(
            &columns,
            crate::domain::BlockHeader {
                id: 1,
                depth: 0,
                previous_hash: crate::crypto::Hash::default(),
                body_hash: crate::crypto::Hash::default(),
                miners_queue: vec![miner_id],
            },
            crate::domain::BlockBody { chunk_hashes: Vec::new(), transaction_count: 0 },
            crate::domain::BlockTransactionIds::default(),
        );

        let (new_transactions, users, tokens, staked_tokens) = aggregate_counters(&columns);
        let tx = CommitTransaction::create(2, 1, miner_id, new_transactions as u32, users, tokens, staked_tokens)
            .sign(&key);
        tx.validate(2, &columns).unwrap();
        tx.execute(2, &columns).unwrap();

        assert!(facade::state::commit_seen(&columns, false));
    }

    #[test]
    fn rejects_wrong_scheduled_miner() {
        let (_dir, columns) = open_columns();
        let (key, miner_id) = genesis(&columns);
        facade::state::set_pricing(&columns, 1);
        let scheduled_miner = MinerId::random();
        facade::blocks::add(
            &columns,
            crate::domain::BlockHeader {
                id: 1,
                depth: 0,
                previous_hash: crate::crypto::Hash::default(),
                body_hash: crate::crypto::Hash::default(),
                miners_queue: vec![scheduled_miner],
            },
            crate::domain::BlockBody { chunk_hashes: Vec::new(), transaction_count: 0 },
            crate::domain::BlockTransactionIds::default(),
        );

        let (new_transactions, users, tokens, staked_tokens) = aggregate_counters(&columns);
        let tx = CommitTransaction::create(2, 1, miner_id, new_transactions as u32, users, tokens, staked_tokens)
            .sign(&key);
        assert!(tx.validate(2, &columns).is_err());
    }

    #[test]
    fn rejects_mismatched_aggregate_counters() {
        let (_dir, columns) = open_columns();
        let (key, miner_id) = genesis(&columns);
        facade::state::set_pricing(&columns, 1);
        facade::blocks::add(
            &columns,
            crate::domain::BlockHeader {
                id: 1,
                depth: 0,
                previous_hash: crate::crypto::Hash::default(),
                body_hash: crate::crypto::Hash::default(),
                miners_queue: vec![miner_id],
            },
            crate::domain::BlockBody { chunk_hashes: Vec::new(), transaction_count: 0 },
            crate::domain::BlockTransactionIds::default(),
        );

        let tx = CommitTransaction::create(2, 1, miner_id, 0, 0, 0, 0).sign(&key);
        assert!(tx.validate(2, &columns).is_err());
    }
}

//! Miner account and its locked-stake bucket ring.

use crate::config::STAKING_DURATION as D;
use crate::crypto::UserId;
use crate::domain::miner_settings::MinerSettings;
use crate::error::CResult;
use crate::serializer::{Codec, Serializer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Miner {
    pub owner: UserId,
    pub stake: u64,
    pub locked_stake: u64,
    /// `buckets[0]` holds stake locked today, `buckets[D-1]` the stake
    /// about to unlock; `unlock_stake` rotates this ring forward by
    /// one slot per elapsed day.
    pub locked_stake_buckets: [u64; D],
    pub last_stake_update: u32,
    pub settings: MinerSettings,
    pub banned: bool,
}

impl Miner {
    pub fn new(owner: UserId, stake: u64) -> Self {
        let mut buckets = [0u64; D];
        buckets[D - 1] = stake;
        Miner {
            owner,
            stake,
            locked_stake: stake,
            locked_stake_buckets: buckets,
            last_stake_update: 0,
            settings: MinerSettings::default(),
            banned: false,
        }
    }

    pub fn sum_buckets(&self) -> u64 {
        self.locked_stake_buckets.iter().sum()
    }

    /// Adds freshly locked stake. Fee-derived stake (the stake routed
    /// from a transaction fee, which unlocks fastest) lands in bucket
    /// 0; manually staked tokens land in bucket `D-2` so they serve a
    /// near-full staking period before becoming eligible to unlock.
    pub fn add_stake(&mut self, stake: u64, from_fee: bool) {
        if from_fee {
            self.locked_stake_buckets[0] += stake;
        } else {
            self.locked_stake_buckets[D - 2] += stake;
        }
        self.stake += stake;
        self.locked_stake += stake;
    }

    /// Advances the bucket ring by however many calendar days have
    /// elapsed since `last_stake_update`, unlocking bucket `D-1`'s
    /// stake each day that passes. A no-op within the same day.
    pub fn unlock_stake(&mut self, block_id: u32, blocks_per_day: u32) {
        if block_id / blocks_per_day <= self.last_stake_update / blocks_per_day {
            return;
        }
        self.last_stake_update = block_id;
        self.locked_stake -= self.locked_stake_buckets[D - 1];
        self.locked_stake_buckets[D - 1] = 0;
        self.locked_stake_buckets.rotate_right(1);
    }

    /// Splits a withdrawal into tokens that were already unlocked
    /// (credited 1:1, no bucket accounting) and tokens still locked
    /// (credited at a discount elsewhere; here only the bucket
    /// bookkeeping is performed). Buckets are drained from index 0
    /// forward until `locked_stake` worth has been removed — this is
    /// NOT strictly oldest-bucket-first in calendar terms, since index
    /// 0 holds the most recently added fee-derived stake; it is simply
    /// the order the original implementation walks the ring in.
    pub fn withdraw_stake(&mut self, unlocked_stake: u64, locked_stake: u64) {
        self.stake -= unlocked_stake + locked_stake;
        self.locked_stake -= locked_stake;

        let mut remaining = locked_stake;
        for bucket in self.locked_stake_buckets.iter_mut() {
            if remaining == 0 {
                break;
            }
            if *bucket >= remaining {
                *bucket -= remaining;
                break;
            }
            remaining -= *bucket;
            *bucket = 0;
        }
    }
}

impl Codec for Miner {
    fn encode(&self, s: &mut Serializer) {
        self.owner.encode(s);
        s.put_u64_le(self.stake);
        s.put_u64_le(self.locked_stake);
        for bucket in self.locked_stake_buckets {
            s.put_u64_le(bucket);
        }
        s.put_u32_le(self.last_stake_update);
        self.settings.encode(s);
        s.put_u8(self.banned as u8);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        let owner = UserId::decode(s)?;
        let stake = s.get_u64_le()?;
        let locked_stake = s.get_u64_le()?;
        let mut locked_stake_buckets = [0u64; D];
        for slot in locked_stake_buckets.iter_mut() {
            *slot = s.get_u64_le()?;
        }
        let last_stake_update = s.get_u32_le()?;
        let settings = MinerSettings::decode(s)?;
        let banned = s.get_u8()? != 0;
        Ok(Miner {
            owner,
            stake,
            locked_stake,
            locked_stake_buckets,
            last_stake_update,
            settings,
            banned,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sum_of_buckets_matches_locked_stake() {
        let owner = UserId::from_bytes([1u8; 32]);
        let mut miner = Miner::new(owner, 1_000);
        assert_eq!(miner.sum_buckets(), miner.locked_stake);
        miner.add_stake(200, true);
        assert_eq!(miner.sum_buckets(), miner.locked_stake);
        miner.add_stake(50, false);
        assert_eq!(miner.sum_buckets(), miner.locked_stake);
    }

    #[test]
    fn unlock_stake_is_noop_within_same_day() {
        let owner = UserId::from_bytes([1u8; 32]);
        let mut miner = Miner::new(owner, 1_000);
        miner.unlock_stake(10, 1440);
        assert_eq!(miner.last_stake_update, 0);
        miner.unlock_stake(1439, 1440);
        assert_eq!(miner.last_stake_update, 0);
    }

    #[test]
    fn unlock_stake_rotates_ring_forward_after_a_day() {
        let owner = UserId::from_bytes([1u8; 32]);
        let mut miner = Miner::new(owner, 1_000);
        miner.add_stake(500, false);
        let before = miner.locked_stake_buckets;
        miner.unlock_stake(1440, 1440);
        assert_eq!(miner.last_stake_update, 1440);
        assert_eq!(miner.locked_stake_buckets[0], 0);
        assert_eq!(miner.locked_stake_buckets[1], before[0]);
        assert_eq!(miner.sum_buckets(), miner.locked_stake);
    }

    #[test]
    fn withdraw_stake_drains_buckets_from_index_zero() {
        let owner = UserId::from_bytes([1u8; 32]);
        let mut miner = Miner::new(owner, 0);
        miner.locked_stake_buckets = [0u64; D];
        miner.locked_stake_buckets[0] = 10;
        miner.locked_stake_buckets[1] = 20;
        miner.locked_stake = 30;
        miner.stake = 30;
        miner.withdraw_stake(0, 15);
        assert_eq!(miner.locked_stake_buckets[0], 0);
        assert_eq!(miner.locked_stake_buckets[1], 15);
        assert_eq!(miner.locked_stake, 15);
    }
}

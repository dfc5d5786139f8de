//! Stateless read/write helpers over the `miners` column, keyed by
//! [`MinerId`] — not by the miner's owning [`crate::crypto::UserId`],
//! which every original-system call site (`updateMiner`, `selectMiner`,
//! `increaseStake`, `withdrawStake`) looks the record up by.
//!
//! The top-stake and well-known-endpoints caches the source system
//! keeps alongside this column (spec's miners-column description) are
//! not reproduced here: see `DESIGN.md` for why a plain row count was
//! judged sufficient for this pass.

use crate::columns::Columns;
use crate::crypto::{MinerId, UserId};
use crate::domain::Miner;
use crate::error::CResult;

pub fn get(columns: &Columns, confirmed: bool, id: &MinerId) -> CResult<Option<Miner>> {
    columns.miners.get(confirmed, id)
}

pub fn exists(columns: &Columns, confirmed: bool, id: &MinerId) -> CResult<bool> {
    Ok(columns.miners.get(confirmed, id)?.is_some())
}

/// Picks a uniform random miner the same way [`crate::facade::users::get_random`]
/// picks a user: seek a freshly generated id, no materialized index.
pub fn get_random(columns: &Columns, confirmed: bool) -> CResult<Option<(MinerId, Miner)>> {
    columns.miners.scan_nearest(confirmed, &MinerId::random())
}

/// Publishes a brand-new miner account (`Init`, `CreateMiner`), owned
/// by `owner`.
pub fn add(columns: &Columns, id: MinerId, owner: UserId, miner: Miner) -> CResult<()> {
    debug_assert_eq!(miner.owner, owner);
    let stake = miner.stake;
    columns.miners.put(&id, miner);
    let mut state = columns.miners_state.get(false);
    state.count += 1;
    state.total_staked += stake;
    columns.miners_state.set_unconfirmed(state);
    Ok(())
}

/// Publishes a cloned-and-mutated miner account, folding the stake
/// delta into `miners_state.total_staked`.
pub fn update(columns: &Columns, id: MinerId, miner: Miner) -> CResult<()> {
    let previous_stake = columns.miners.get(false, &id)?.map(|m| m.stake).unwrap_or(miner.stake);
    let new_stake = miner.stake;
    columns.miners.put(&id, miner);
    if new_stake != previous_stake {
        let mut state = columns.miners_state.get(false);
        state.total_staked = if new_stake >= previous_stake {
            state.total_staked + (new_stake - previous_stake)
        } else {
            state.total_staked - (previous_stake - new_stake)
        };
        columns.miners_state.set_unconfirmed(state);
    }
    Ok(())
}

pub fn count(columns: &Columns, confirmed: bool) -> u64 {
    columns.miners_state.get(confirmed).count
}

pub fn total_staked(columns: &Columns, confirmed: bool) -> u64 {
    columns.miners_state.get(confirmed).total_staked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::miner_settings::MinerSettings;
    use std::sync::Arc;

    fn open_columns() -> (tempfile::TempDir, Columns) {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(crate::storage::open(dir.path()).unwrap());
        (dir, Columns::open(db).unwrap())
    }

    #[test]
    fn add_then_get_round_trips_by_miner_id() {
        let (_dir, columns) = open_columns();
        let id = MinerId::from_bytes([4u8; 32]);
        let owner = UserId::from_bytes([5u8; 32]);
        let miner = Miner::new(owner, 1_000);
        add(&columns, id, owner, miner.clone()).unwrap();
        let fetched = get(&columns, false, &id).unwrap().unwrap();
        assert_eq!(fetched.owner, owner);
        assert_eq!(total_staked(&columns, false), 1_000);
    }

    #[test]
    fn get_random_finds_the_only_miner_in_an_otherwise_empty_column() {
        let (_dir, columns) = open_columns();
        let id = MinerId::from_bytes([9u8; 32]);
        let owner = UserId::from_bytes([10u8; 32]);
        add(&columns, id, owner, Miner::new(owner, 0)).unwrap();
        let (found_id, _) = get_random(&columns, false).unwrap().unwrap();
        assert_eq!(found_id, id);
    }

    #[test]
    fn update_adjusts_total_staked_by_delta() {
        let (_dir, columns) = open_columns();
        let id = MinerId::from_bytes([6u8; 32]);
        let owner = UserId::from_bytes([7u8; 32]);
        let mut miner = Miner::new(owner, 1_000);
        miner.settings = MinerSettings::default();
        add(&columns, id, owner, miner.clone()).unwrap();
        miner.add_stake(500, false);
        update(&columns, id, miner).unwrap();
        assert_eq!(total_staked(&columns, false), 1_500);
    }
}

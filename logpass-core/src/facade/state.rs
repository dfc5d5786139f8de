//! Stateless read/write helpers over the `default` column's version
//! and pricing header, plus the `commit_seen` flag a `Commit`
//! transaction uses to refuse a second reward in the same block.

use crate::columns::Columns;

pub fn version(columns: &Columns, confirmed: bool) -> u8 {
    columns.default_state.get(confirmed).version
}

pub fn pricing(columns: &Columns, confirmed: bool) -> i16 {
    columns.default_state.get(confirmed).pricing
}

pub fn set_pricing(columns: &Columns, pricing: i16) {
    let mut state = columns.default_state.get(false);
    state.pricing = pricing;
    columns.default_state.set_unconfirmed(state);
}

pub fn commit_seen(columns: &Columns, confirmed: bool) -> bool {
    columns.default_state.get(confirmed).commit_seen
}

pub fn mark_commit_seen(columns: &Columns) {
    let mut state = columns.default_state.get(false);
    state.commit_seen = true;
    columns.default_state.set_unconfirmed(state);
}

/// Cleared at the start of every new block, alongside the unconfirmed
/// view's rollback to the last confirmed state.
pub fn clear_commit_seen(columns: &Columns) {
    let mut state = columns.default_state.get(false);
    state.commit_seen = false;
    columns.default_state.set_unconfirmed(state);
}

pub fn initialization_time(columns: &Columns, confirmed: bool) -> u64 {
    columns.default_state.get(confirmed).initialization_time
}

pub fn block_interval(columns: &Columns, confirmed: bool) -> u32 {
    columns.default_state.get(confirmed).block_interval
}

/// Block id a committed block was produced at, expressed as a wall
/// clock timestamp: `initializationTime + blockId * blockInterval`.
pub fn committed_at(columns: &Columns, confirmed: bool, block_id: u32) -> u64 {
    initialization_time(columns, confirmed) + block_id as u64 * block_interval(columns, confirmed) as u64
}

/// Set once, by `Init`, to bring the genesis parameters into effect.
pub fn set_genesis_params(columns: &Columns, initialization_time: u64, block_interval: u32) {
    let mut state = columns.default_state.get(false);
    state.initialization_time = initialization_time;
    state.block_interval = block_interval;
    columns.default_state.set_unconfirmed(state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn open_columns() -> (tempfile::TempDir, Columns) {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(crate::storage::open(dir.path()).unwrap());
        (dir, Columns::open(db).unwrap())
    }

    #[test]
    fn pricing_round_trips_unconfirmed_only() {
        let (_dir, columns) = open_columns();
        set_pricing(&columns, 7);
        assert_eq!(pricing(&columns, false), 7);
        assert_eq!(pricing(&columns, true), 0);
    }

    #[test]
    fn commit_seen_sets_and_clears() {
        let (_dir, columns) = open_columns();
        assert!(!commit_seen(&columns, false));
        mark_commit_seen(&columns);
        assert!(commit_seen(&columns, false));
        clear_commit_seen(&columns);
        assert!(!commit_seen(&columns, false));
    }
}

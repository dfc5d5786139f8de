//! Stateless read/write helpers over the `users` + `user_updates`
//! columns, enforcing the one cross-column invariant the facade layer
//! owns here: every add/update is also recorded against its block in
//! `user_updates`.

use crate::columns::keys::UserIdSet;
use crate::columns::Columns;
use crate::crypto::{Hash, TransactionId, UserId};
use crate::domain::{User, UserHistory, UserHistoryType, UserSponsor};
use crate::error::CResult;
use crate::serializer::{Codec, Serializer};

/// Reads a user as of `block_id`, applying its pending settings update
/// in place if `block_id` has reached the update's target block.
pub fn get(columns: &Columns, confirmed: bool, block_id: u32, id: &UserId) -> CResult<Option<User>> {
    let user = columns.users.get(confirmed, id)?;
    Ok(user.map(|mut user| {
        user.apply_pending_update_if_due(block_id);
        user
    }))
}

pub fn exists(columns: &Columns, confirmed: bool, id: &UserId) -> CResult<bool> {
    Ok(columns.users.get(confirmed, id)?.is_some())
}

/// Picks a uniform random user by seeking a freshly generated id in
/// the store, so the result follows the same distribution a uniform
/// index over the whole keyspace would, not an index over however many
/// users happen to exist.
pub fn get_random(columns: &Columns, confirmed: bool, block_id: u32) -> CResult<Option<(UserId, User)>> {
    let seed = UserId::random();
    let found = columns.users.scan_nearest(confirmed, &seed)?;
    Ok(found.map(|(id, mut user)| {
        user.apply_pending_update_if_due(block_id);
        (id, user)
    }))
}

fn touch(columns: &Columns, block_id: u32, id: UserId) -> CResult<()> {
    let mut touched = columns.user_updates.get(false, &block_id)?.unwrap_or_default();
    touched.0.insert(id);
    columns.user_updates.put(&block_id, touched);
    Ok(())
}

/// Publishes a brand-new user record (`Init`, `CreateUser`).
pub fn add(columns: &Columns, block_id: u32, id: UserId, user: User) -> CResult<()> {
    let tokens = user.tokens;
    columns.users.put(&id, user);
    touch(columns, block_id, id)?;
    let mut state = columns.users_state.get(false);
    state.count += 1;
    state.total_tokens += tokens;
    columns.users_state.set_unconfirmed(state);
    Ok(())
}

/// Publishes a cloned-and-mutated user record, folding the token-
/// balance delta into `users_state.total_tokens` so
/// `CommitTransaction`'s reward formula can read the supply in O(1).
pub fn update(columns: &Columns, block_id: u32, id: UserId, mut user: User) -> CResult<()> {
    let previous_tokens = columns.users.get(false, &id)?.map(|u| u.tokens).unwrap_or(user.tokens);
    let new_tokens = user.tokens;
    user.iteration += 1;
    user.committed_in = block_id;
    columns.users.put(&id, user);
    touch(columns, block_id, id)?;
    if new_tokens != previous_tokens {
        let mut state = columns.users_state.get(false);
        state.total_tokens = if new_tokens >= previous_tokens {
            state.total_tokens + (new_tokens - previous_tokens)
        } else {
            state.total_tokens - (previous_tokens - new_tokens)
        };
        columns.users_state.set_unconfirmed(state);
    }
    Ok(())
}

/// Appends an entry to `id`'s incoming/outgoing/sponsored transaction
/// log, read back a page at a time by `UserHistory`'s own callers.
pub fn add_history(
    columns: &Columns,
    block_id: u32,
    id: UserId,
    history_type: UserHistoryType,
    transaction_id: TransactionId,
) -> CResult<()> {
    let record = UserHistory::new(block_id, history_type, transaction_id);
    let mut s = Serializer::with_capacity(UserHistory::SIZE);
    record.encode(&mut s);
    columns.user_history.append(id.as_bytes(), s.into_bytes())
}

/// Appends an entry to `id`'s sponsor log — one record per sponsoring
/// transaction, tracking how many transactions it has covered so far.
pub fn add_sponsor(
    columns: &Columns,
    block_id: u32,
    id: UserId,
    sponsor: Hash,
    sponsored_transactions: u8,
) -> CResult<()> {
    let record = UserSponsor::new(block_id, sponsor, sponsored_transactions);
    let mut s = Serializer::with_capacity(UserSponsor::SIZE);
    record.encode(&mut s);
    columns.user_sponsors.append(id.as_bytes(), s.into_bytes())
}

pub fn count(columns: &Columns, confirmed: bool) -> u64 {
    columns.users_state.get(confirmed).count
}

pub fn total_tokens(columns: &Columns, confirmed: bool) -> u64 {
    columns.users_state.get(confirmed).total_tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user_keys::{KeySettings, UserKeys, ALL_SCOPES};
    use crate::domain::user_security_rules::UserSecurityRules;
    use crate::domain::user_settings::UserSettings;
    use crate::domain::user_supervisors::UserSupervisors;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn open_columns() -> (tempfile::TempDir, Columns) {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(crate::storage::open(dir.path()).unwrap());
        (dir, Columns::open(db).unwrap())
    }

    fn sample_user() -> User {
        let key = crate::crypto::PrivateKey::generate().public_key();
        let mut keys = BTreeMap::new();
        keys.insert(key, KeySettings { power: 10, scopes: ALL_SCOPES });
        User::new(
            UserId::from_bytes(*key.derive_user_id().as_bytes()),
            UserSettings {
                keys: UserKeys(keys),
                supervisors: UserSupervisors::default(),
                rules: UserSecurityRules {
                    power_levels: [1, 5, 20, 100, 500],
                    keys_update_times: [0; 5],
                    supervisors_update_times: [0; 5],
                    rules_update_times: [0; 5],
                    spending_limits: [1_000; 5],
                    supervising_power_level: 2,
                },
            },
            0,
        )
    }

    #[test]
    fn add_is_visible_unconfirmed_but_not_confirmed() {
        let (_dir, columns) = open_columns();
        let id = UserId::from_bytes([7u8; 32]);
        add(&columns, 1, id, sample_user()).unwrap();
        assert!(get(&columns, false, 1, &id).unwrap().is_some());
        assert!(get(&columns, true, 1, &id).unwrap().is_none());
    }

    #[test]
    fn touches_user_updates_for_the_block() {
        let (_dir, columns) = open_columns();
        let id = UserId::from_bytes([3u8; 32]);
        add(&columns, 5, id, sample_user()).unwrap();
        let touched: UserIdSet = columns.user_updates.get(false, &5u32).unwrap().unwrap();
        assert!(touched.0.contains(&id));
    }

    #[test]
    fn get_random_finds_the_only_user_in_an_otherwise_empty_column() {
        let (_dir, columns) = open_columns();
        let id = UserId::from_bytes([42u8; 32]);
        add(&columns, 1, id, sample_user()).unwrap();
        let (found_id, _) = get_random(&columns, false, 1).unwrap().unwrap();
        assert_eq!(found_id, id);
    }

    #[test]
    fn get_random_returns_none_when_empty() {
        let (_dir, columns) = open_columns();
        assert!(get_random(&columns, false, 1).unwrap().is_none());
    }

    #[test]
    fn total_tokens_tracks_additions_and_updates() {
        let (_dir, columns) = open_columns();
        let id = UserId::from_bytes([9u8; 32]);
        let mut user = sample_user();
        user.tokens = 100;
        add(&columns, 1, id, user.clone()).unwrap();
        assert_eq!(total_tokens(&columns, false), 100);
        user.tokens = 40;
        update(&columns, 2, id, user).unwrap();
        assert_eq!(total_tokens(&columns, false), 40);
    }
}

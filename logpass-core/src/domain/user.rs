//! The user account entity and its power-level computation — the
//! mechanism by which a multi-signature envelope is translated into an
//! authorization tier.

use crate::config::{MAX_POWER, USER_POWER_LEVELS as P};
use crate::crypto::{MinerId, PublicKey, TransactionId, UserId};
use crate::domain::power_level::PowerLevel;
use crate::domain::user_settings::UserSettings;
use crate::error::{CResult, Error};
use crate::serializer::{Codec, Serializer};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpdate {
    pub block_id: u32,
    pub settings: UserSettings,
    pub transaction_id: TransactionId,
    pub power_level: PowerLevel,
}

impl Codec for PendingUpdate {
    fn encode(&self, s: &mut Serializer) {
        s.put_u32_le(self.block_id);
        self.settings.encode(s);
        self.transaction_id.encode(s);
        self.power_level.encode(s);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        Ok(PendingUpdate {
            block_id: s.get_u32_le()?,
            settings: UserSettings::decode(s)?,
            transaction_id: TransactionId::decode(s)?,
            power_level: PowerLevel::decode(s)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub creator: UserId,
    /// Monotonic settings-update counter.
    pub iteration: u32,
    /// Block id of the last mutation to this record.
    pub committed_in: u32,
    pub tokens: u64,
    pub free_transactions: u8,
    /// Zero when no miner has been chosen.
    pub miner: MinerId,
    pub locked_keys: BTreeSet<PublicKey>,
    pub locked_supervisors: BTreeSet<UserId>,
    /// Block id at which the user logged out, or 0 if never.
    pub logout: u32,
    /// Tokens spent so far at each power level, reset whenever a
    /// pending settings update takes effect.
    pub spendings: [u64; P],
    pub pending_update: Option<PendingUpdate>,
    pub settings: UserSettings,
    /// Transaction id of the last settings update actually applied.
    pub settings_transaction: TransactionId,
    pub operations: u32,
    pub sponsors: u32,
}

impl User {
    pub fn new(creator: UserId, settings: UserSettings, tokens: u64) -> Self {
        User {
            creator,
            iteration: 0,
            committed_in: 0,
            tokens,
            free_transactions: 0,
            miner: MinerId::default(),
            locked_keys: BTreeSet::new(),
            locked_supervisors: BTreeSet::new(),
            logout: 0,
            spendings: [0; P],
            pending_update: None,
            settings,
            settings_transaction: TransactionId::new(0, 0, 0, crate::crypto::Hash::default()),
            operations: 0,
            sponsors: 0,
        }
    }

    pub fn is_logged_out(&self, block_id: u32) -> bool {
        self.logout != 0 && self.logout <= block_id
    }

    pub fn has_key(&self, key: &PublicKey) -> bool {
        self.settings.keys.0.contains_key(key)
    }

    pub fn has_supervisor(&self, id: &UserId) -> bool {
        self.settings.supervisors.0.contains_key(id)
    }

    /// Computes this user's power level from the keys that actually
    /// signed (`used_signing_keys`) plus whichever configured
    /// supervisors themselves reach `rules.supervisingPowerLevel`.
    /// `resolve_supervisor` looks up a supervisor's record by id; a
    /// missing supervisor contributes nothing.
    pub fn get_power_level(
        &self,
        used_signing_keys: &BTreeSet<PublicKey>,
        resolve_supervisor: impl Fn(&UserId) -> Option<User>,
        ignore_locks: bool,
    ) -> PowerLevel {
        self.get_power_level_with_used_keys(used_signing_keys, resolve_supervisor, ignore_locks).0
    }

    /// As [`User::get_power_level`], but also returns the subset of
    /// `used_signing_keys` that actually matched a key belonging to
    /// `self` or to a qualifying supervisor. Transaction validation
    /// needs this set (unioned with a sponsor's own) to enforce that
    /// every key present in the signature envelope was put to use.
    pub fn get_power_level_with_used_keys(
        &self,
        used_signing_keys: &BTreeSet<PublicKey>,
        resolve_supervisor: impl Fn(&UserId) -> Option<User>,
        ignore_locks: bool,
    ) -> (PowerLevel, BTreeSet<PublicKey>) {
        let rules = &self.settings.rules;
        let mut raw_power: u32 = 0;
        let mut used_keys: BTreeSet<PublicKey> = BTreeSet::new();
        let mut any_locked = false;

        for (public_key, key_settings) in &self.settings.keys.0 {
            if used_signing_keys.contains(public_key) {
                raw_power += key_settings.power as u32;
                used_keys.insert(*public_key);
                if self.locked_keys.contains(public_key) {
                    any_locked = true;
                }
            }
        }

        for (supervisor_id, supervisor_settings) in &self.settings.supervisors.0 {
            let Some(supervisor) = resolve_supervisor(supervisor_id) else { continue };
            // Supervisors contribute based on their OWN keys only —
            // never their own supervisors — so a supervision cycle
            // cannot recurse indefinitely.
            let supervisor_level = supervisor.power_level_from_keys_only(used_signing_keys, ignore_locks);
            let required = PowerLevel::new(supervisor.settings.rules.supervising_power_level, 1, 1);
            if supervisor_level < required {
                continue;
            }
            raw_power += supervisor_settings.power as u32;
            for key in &supervisor.settings.keys.0 {
                if used_signing_keys.contains(key.0) {
                    used_keys.insert(*key.0);
                }
            }
            if self.locked_supervisors.contains(supervisor_id) {
                any_locked = true;
            }
        }

        let raw_power = raw_power.min(u16::MAX as u32) as u16;
        if raw_power == 0 || raw_power < rules.power_levels[0] {
            return (PowerLevel::INVALID, BTreeSet::new());
        }
        let level_index = match rules.level_for_power(raw_power) {
            Some(idx) => idx,
            None => return (PowerLevel::INVALID, BTreeSet::new()),
        };
        let power = raw_power.min(MAX_POWER as u16) as u8;
        let level = PowerLevel::new(level_index, power, used_keys.len() as u8);

        if !ignore_locks && any_locked && level < PowerLevel::MEDIUM {
            return (PowerLevel::INVALID, BTreeSet::new());
        }
        (level, used_keys)
    }

    /// Non-recursive power level used only while evaluating whether
    /// `self` qualifies as a contributing supervisor for someone else.
    fn power_level_from_keys_only(&self, used_signing_keys: &BTreeSet<PublicKey>, ignore_locks: bool) -> PowerLevel {
        let rules = &self.settings.rules;
        let mut raw_power: u32 = 0;
        let mut used_keys_count: u8 = 0;
        let mut any_locked = false;
        for (public_key, key_settings) in &self.settings.keys.0 {
            if used_signing_keys.contains(public_key) {
                raw_power += key_settings.power as u32;
                used_keys_count += 1;
                if self.locked_keys.contains(public_key) {
                    any_locked = true;
                }
            }
        }
        let raw_power = raw_power.min(u16::MAX as u32) as u16;
        if raw_power == 0 || raw_power < rules.power_levels[0] {
            return PowerLevel::INVALID;
        }
        let Some(level_index) = rules.level_for_power(raw_power) else {
            return PowerLevel::INVALID;
        };
        let power = raw_power.min(MAX_POWER as u16) as u8;
        let level = PowerLevel::new(level_index, power, used_keys_count);
        if !ignore_locks && any_locked && level < PowerLevel::MEDIUM {
            return PowerLevel::INVALID;
        }
        level
    }

    /// `level == INVALID` never clears; a zero cost always clears.
    /// Otherwise checks the balance, then, unless the top spending
    /// limit is the unlimited sentinel (`0`), every limit from `level`
    /// up to the highest level (spending at a level counts against
    /// every level above it too).
    pub fn can_spend_tokens(&self, cost: u64, level: PowerLevel) -> bool {
        if level.is_invalid() {
            return false;
        }
        if cost == 0 {
            return true;
        }
        if cost > self.tokens {
            return false;
        }
        let limits = &self.settings.rules.spending_limits;
        if limits[limits.len() - 1] == 0 {
            return true;
        }
        let idx = level.level as usize;
        (idx..limits.len()).all(|i| self.spendings[i].saturating_add(cost) <= limits[i])
    }

    /// Debits `cost` from the balance, adds it to this level's running
    /// spend, and resets every lower level's running spend to zero —
    /// spending at a higher level supersedes the limits below it.
    pub fn spend_tokens(&mut self, cost: u64, level: PowerLevel) {
        self.tokens -= cost;
        let idx = level.level as usize;
        self.spendings[idx] = self.spendings[idx].saturating_add(cost);
        for spending in &mut self.spendings[..idx] {
            *spending = 0;
        }
    }

    /// `self_id` is this user's own id, needed to reject self-
    /// supervision — the record doesn't carry its own id as a field,
    /// since it's the column key instead.
    pub fn validate_new_settings(&self, self_id: &UserId, new_settings: &UserSettings) -> CResult<()> {
        new_settings.validate()?;
        if new_settings.supervisors.0.contains_key(self_id) {
            return Err(Error::settings_validation("a user can't supervise itself"));
        }
        Ok(())
    }

    /// Schedules `settings` to take effect `keysUpdateTimes[power_level]`
    /// blocks after `block_id`, under the CURRENT settings' rules — not
    /// the new ones, which haven't taken effect yet. A pending update
    /// already in flight may only be overwritten by one authorized at
    /// an equal or higher power level.
    pub fn set_pending_update(
        &mut self,
        block_id: u32,
        settings: UserSettings,
        transaction_id: TransactionId,
        power_level: PowerLevel,
    ) -> CResult<()> {
        if let Some(existing) = &self.pending_update {
            if existing.power_level > power_level {
                return Err(Error::transaction_validation(
                    "a pending settings update may only be replaced by one authorized at an equal or higher power level",
                ));
            }
        }
        let delay = self.settings.rules.keys_update_times[power_level.level as usize];
        let target_block_id = block_id + delay;
        self.pending_update =
            Some(PendingUpdate { block_id: target_block_id, settings, transaction_id, power_level });
        Ok(())
    }

    /// Applies a due pending update in place. Called on load, so that
    /// every reader sees the update from the first block at or after
    /// its target block onward.
    pub fn apply_pending_update_if_due(&mut self, block_id: u32) {
        let due = matches!(&self.pending_update, Some(pu) if block_id >= pu.block_id);
        if !due {
            return;
        }
        let pending = self.pending_update.take().expect("checked due above");
        self.settings = pending.settings;
        self.settings_transaction = pending.transaction_id;
        self.spendings = [0; P];
    }
}

impl Codec for User {
    fn encode(&self, s: &mut Serializer) {
        self.creator.encode(s);
        s.put_u32_le(self.iteration);
        s.put_u32_le(self.committed_in);
        s.put_u64_le(self.tokens);
        s.put_u8(self.free_transactions);
        self.miner.encode(s);
        s.put_set_u8(&self.locked_keys, |s, k| k.encode(s))
            .expect("locked key count bounded by USER_MAX_KEYS");
        s.put_set_u8(&self.locked_supervisors, |s, k| k.encode(s))
            .expect("locked supervisor count bounded by USER_MAX_SUPERVISORS");
        s.put_u32_le(self.logout);
        for spending in self.spendings {
            s.put_u64_le(spending);
        }
        s.put_option(&self.pending_update, |s, pu| pu.encode(s));
        self.settings.encode(s);
        self.settings_transaction.encode(s);
        s.put_u32_le(self.operations);
        s.put_u32_le(self.sponsors);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        let creator = UserId::decode(s)?;
        let iteration = s.get_u32_le()?;
        let committed_in = s.get_u32_le()?;
        let tokens = s.get_u64_le()?;
        let free_transactions = s.get_u8()?;
        let miner = MinerId::decode(s)?;
        let locked_keys = s.get_set_u8(PublicKey::decode)?;
        let locked_supervisors = s.get_set_u8(UserId::decode)?;
        let logout = s.get_u32_le()?;
        let mut spendings = [0u64; P];
        for slot in spendings.iter_mut() {
            *slot = s.get_u64_le()?;
        }
        let pending_update = s.get_option(PendingUpdate::decode)?;
        let settings = UserSettings::decode(s)?;
        let settings_transaction = TransactionId::decode(s)?;
        let operations = s.get_u32_le()?;
        let sponsors = s.get_u32_le()?;
        Ok(User {
            creator,
            iteration,
            committed_in,
            tokens,
            free_transactions,
            miner,
            locked_keys,
            locked_supervisors,
            logout,
            spendings,
            pending_update,
            settings,
            settings_transaction,
            operations,
            sponsors,
        })
    }
}

//! Schedules a settings change (keys, supervisors, rules) for the
//! submitting account itself. Takes effect after the current settings'
//! `keysUpdateTimes[powerLevel]` delay, via
//! [`crate::domain::User::apply_pending_update_if_due`].

use crate::columns::Columns;
use crate::domain::user_settings::UserSettings;
use crate::domain::PowerLevel;
use crate::error::CResult;
use crate::facade;
use crate::serializer::{Codec, Serializer};
use crate::transactions::{resolve_user, Authorization, TransactionBody, TransactionSettings, Transaction, UnsignedTransaction};

#[derive(Debug, Clone)]
pub struct UpdateUserTransaction {
    pub settings: UserSettings,
}

impl UpdateUserTransaction {
    pub fn create(block_id: u32, pricing: i16, settings: UserSettings) -> UnsignedTransaction {
        let body = TransactionBody::UpdateUser(UpdateUserTransaction { settings });
        UnsignedTransaction::new(block_id, pricing, body)
    }

    pub fn settings(&self) -> TransactionSettings {
        TransactionSettings {
            ignores_lock: true,
            is_user_management_transaction: true,
            minimum_power_level: PowerLevel::LOWEST,
            ..Default::default()
        }
    }

    pub fn validate(
        &self,
        tx: &Transaction,
        current_block_id: u32,
        columns: &Columns,
        _auth: &Authorization,
    ) -> CResult<()> {
        let user = facade::users::get(columns, false, current_block_id, &tx.user_id())?
            .expect("validate_common already confirmed the submitter exists");
        user.validate_new_settings(&tx.user_id(), &self.settings)
    }

    pub fn execute(&self, tx: &Transaction, current_block_id: u32, columns: &Columns) -> CResult<()> {
        let mut user = facade::users::get(columns, false, current_block_id, &tx.user_id())?.expect("validated to exist");
        let signed = tx.signed_keys();
        let power_level = user.get_power_level(&signed, resolve_user(columns, current_block_id), true);
        user.set_pending_update(current_block_id, self.settings.clone(), tx.id, power_level)?;
        facade::users::update(columns, current_block_id, tx.user_id(), user)?;
        Ok(())
    }
}

impl Codec for UpdateUserTransaction {
    fn encode(&self, s: &mut Serializer) {
        self.settings.encode(s);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        Ok(UpdateUserTransaction { settings: UserSettings::decode(s)? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PrivateKey;
    use crate::domain::user_keys::{KeySettings, UserKeys, ALL_SCOPES};
    use crate::domain::user_security_rules::UserSecurityRules;
    use crate::domain::user_supervisors::UserSupervisors;
    use crate::transactions::init::InitTransaction;
    use std::collections::BTreeMap;
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
    fn schedules_a_pending_update() {
        let (_dir, columns) = open_columns();
        let key = genesis(&columns);
        let id = crate::crypto::UserId::from_bytes(*key.public_key().derive_user_id().as_bytes());

        let mut keys = BTreeMap::new();
        keys.insert(key.public_key(), KeySettings { power: 1, scopes: ALL_SCOPES });
        let new_settings = UserSettings {
            keys: UserKeys(keys),
            supervisors: UserSupervisors::default(),
            rules: UserSecurityRules { supervising_power_level: 2, ..UserSecurityRules::default() },
        };

        let tx = UpdateUserTransaction::create(2, 0, new_settings).sign(&key);
        tx.validate(2, &columns).unwrap();
        tx.execute(2, &columns).unwrap();

        let user = facade::users::get(&columns, false, 2, &id).unwrap().unwrap();
        assert!(user.pending_update.is_some());
    }

    #[test]
    fn rejects_self_supervision() {
        let (_dir, columns) = open_columns();
        let key = genesis(&columns);
        let id = crate::crypto::UserId::from_bytes(*key.public_key().derive_user_id().as_bytes());

        let mut keys = BTreeMap::new();
        keys.insert(key.public_key(), KeySettings { power: 1, scopes: ALL_SCOPES });
        let mut supervisors = BTreeMap::new();
        supervisors.insert(id, KeySettings { power: 1, scopes: ALL_SCOPES });
        let new_settings = UserSettings {
            keys: UserKeys(keys),
            supervisors: crate::domain::user_supervisors::UserSupervisors(supervisors),
            rules: UserSecurityRules::default(),
        };

        let tx = UpdateUserTransaction::create(2, 0, new_settings).sign(&key);
        assert!(tx.validate(2, &columns).is_err());
    }
}

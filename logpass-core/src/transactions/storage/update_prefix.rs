//! Replaces a prefix's access settings. Owner-only.

use crate::columns::Columns;
use crate::domain::{Prefix, PrefixSettings};
use crate::domain::PowerLevel;
use crate::error::{CResult, Error};
use crate::facade;
use crate::serializer::{Codec, Serializer};
use crate::transactions::{Authorization, TransactionBody, TransactionSettings, Transaction, UnsignedTransaction};

#[derive(Debug, Clone)]
pub struct UpdatePrefixTransaction {
    pub prefix: String,
    pub settings: PrefixSettings,
}

impl UpdatePrefixTransaction {
    pub fn create(block_id: u32, pricing: i16, prefix: String, settings: PrefixSettings) -> UnsignedTransaction {
        let body = TransactionBody::StorageUpdatePrefix(UpdatePrefixTransaction { prefix, settings });
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
        if !Prefix::is_id_valid(&self.prefix) {
            return Err(Error::transaction_validation("invalid prefix name"));
        }
        self.settings.validate(&tx.user_id())?;
        let prefix = facade::storage::get_prefix(columns, false, &self.prefix)?
            .ok_or_else(|| Error::transaction_validation("prefix doesn't exist"))?;
        if prefix.owner != tx.user_id() {
            return Err(Error::transaction_validation("prefix does not belong to transaction user"));
        }
        Ok(())
    }

    pub fn execute(&self, _tx: &Transaction, _current_block_id: u32, columns: &Columns) -> CResult<()> {
        let mut prefix = facade::storage::get_prefix(columns, false, &self.prefix)?.expect("validated to exist");
        prefix.settings = self.settings.clone();
        facade::storage::update_prefix(columns, prefix);
        Ok(())
    }
}

impl Codec for UpdatePrefixTransaction {
    fn encode(&self, s: &mut Serializer) {
        s.put_string_u8(&self.prefix).expect("prefix id bounded by PREFIX_MAX_ID_LENGTH");
        self.settings.encode(s);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        Ok(UpdatePrefixTransaction { prefix: s.get_string_u8()?, settings: PrefixSettings::decode(s)? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{PrivateKey, UserId};
    use crate::transactions::init::InitTransaction;
    use crate::transactions::storage::create_prefix::CreatePrefixTransaction;
    use std::sync::Arc;

    fn open_columns() -> (tempfile::TempDir, Columns) {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(crate::storage::open(dir.path()).unwrap());
        (dir, Columns::open(db).unwrap())
    }

    fn genesis_with_prefix(columns: &Columns) -> PrivateKey {
        let key = PrivateKey::generate();
        let init = InitTransaction::create(1, 0, 1_717_200_000, 60).sign(&key);
        init.validate(1, columns).unwrap();
        init.execute(1, columns).unwrap();

        let create = CreatePrefixTransaction::create(2, 0, "my-app".to_string()).sign(&key);
        create.validate(2, columns).unwrap();
        create.execute(2, columns).unwrap();
        key
    }

    #[test]
    fn owner_can_replace_allowed_users() {
        let (_dir, columns) = open_columns();
        let key = genesis_with_prefix(&columns);

        let mut settings = PrefixSettings::default();
        settings.allowed_users.insert(UserId::from_bytes([7u8; 32]));

        let tx = UpdatePrefixTransaction::create(3, 0, "my-app".to_string(), settings.clone()).sign(&key);
        tx.validate(3, &columns).unwrap();
        tx.execute(3, &columns).unwrap();

        let prefix = facade::storage::get_prefix(&columns, false, "my-app").unwrap().unwrap();
        assert_eq!(prefix.settings, settings);
    }

    fn key_user_id(key: &PrivateKey) -> UserId {
        UserId::from_bytes(*key.public_key().derive_user_id().as_bytes())
    }

    #[test]
    fn rejects_owner_listed_as_allowed_user() {
        let (_dir, columns) = open_columns();
        let key = genesis_with_prefix(&columns);
        let mut settings = PrefixSettings::default();
        settings.allowed_users.insert(key_user_id(&key));

        let tx = UpdatePrefixTransaction::create(3, 0, "my-app".to_string(), settings).sign(&key);
        assert!(tx.validate(3, &columns).is_err());
    }

    #[test]
    fn rejects_non_owner() {
        let (_dir, columns) = open_columns();
        let _key = genesis_with_prefix(&columns);
        let stranger = PrivateKey::generate();
        let tx =
            UpdatePrefixTransaction::create(3, 0, "my-app".to_string(), PrefixSettings::default()).sign(&stranger);
        assert!(tx.validate(3, &columns).is_err());
    }
}

//! Appends a key/value pair under a registered prefix. Fee scales with
//! payload size (one extra multiple of the base fee per started KiB of
//! `key` + `value`), applied in [`crate::transactions::TransactionBody::fee`].

use crate::columns::Columns;
use crate::config::STORAGE_ENTRY_MAX_VALUE_LENGTH;
use crate::domain::{Prefix, StorageEntry};
use crate::error::{CResult, Error};
use crate::facade;
use crate::serializer::{Codec, Serializer};
use crate::transactions::{Authorization, TransactionBody, TransactionSettings, Transaction, UnsignedTransaction};

#[derive(Debug, Clone)]
pub struct AddEntryTransaction {
    pub prefix: String,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl AddEntryTransaction {
    pub fn create(block_id: u32, pricing: i16, prefix: String, key: Vec<u8>, value: Vec<u8>) -> UnsignedTransaction {
        let body = TransactionBody::StorageAddEntry(AddEntryTransaction { prefix, key, value });
        UnsignedTransaction::new(block_id, pricing, body)
    }

    pub fn settings(&self) -> TransactionSettings {
        TransactionSettings::default()
    }

    pub fn validate(
        &self,
        tx: &Transaction,
        _current_block_id: u32,
        columns: &Columns,
        _auth: &Authorization,
    ) -> CResult<()> {
        if !Prefix::is_id_valid(&self.prefix) {
            return Err(Error::transaction_validation("invalid prefix"));
        }
        if self.key.is_empty() {
            return Err(Error::transaction_validation("key can't be empty"));
        }
        if self.value.len() > STORAGE_ENTRY_MAX_VALUE_LENGTH {
            return Err(Error::transaction_validation("value is too long"));
        }
        let prefix = facade::storage::get_prefix(columns, false, &self.prefix)?
            .ok_or_else(|| Error::transaction_validation("prefix doesn't exist"))?;
        if prefix.owner != tx.user_id() && !prefix.settings.allowed_users.contains(&tx.user_id()) {
            return Err(Error::transaction_validation("user is not allowed to use selected prefix"));
        }
        if facade::storage::entry_exists(columns, false, &self.prefix, &self.key)? {
            return Err(Error::transaction_validation("storage with given prefix and key already exists"));
        }
        Ok(())
    }

    pub fn execute(&self, tx: &Transaction, current_block_id: u32, columns: &Columns) -> CResult<()> {
        let prefix = facade::storage::get_prefix(columns, false, &self.prefix)?.expect("validated to exist");
        let (prefix, entry_id) = prefix.clone_with_new_entry(current_block_id);
        facade::storage::update_prefix(columns, prefix);

        let entry = StorageEntry { id: entry_id, transaction_id: tx.id };
        facade::storage::add_entry(columns, &self.prefix, &self.key, entry)?;
        Ok(())
    }
}

impl Codec for AddEntryTransaction {
    fn encode(&self, s: &mut Serializer) {
        s.put_string_u8(&self.prefix).expect("prefix id bounded by PREFIX_MAX_ID_LENGTH");
        s.put_bytes_u8(&self.key).expect("key length bounded by transaction size limits");
        s.put_bytes_u16(&self.value).expect("value length bounded by STORAGE_ENTRY_MAX_VALUE_LENGTH");
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        Ok(AddEntryTransaction { prefix: s.get_string_u8()?, key: s.get_bytes_u8()?, value: s.get_bytes_u16()? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PrivateKey;
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
    fn stores_an_entry_under_the_prefix() {
        let (_dir, columns) = open_columns();
        let key = genesis_with_prefix(&columns);

        let tx = AddEntryTransaction::create(3, 0, "my-app".to_string(), b"key".to_vec(), b"value".to_vec())
            .sign(&key);
        tx.validate(3, &columns).unwrap();
        tx.execute(3, &columns).unwrap();

        let entry = facade::storage::get_entry(&columns, false, "my-app", b"key").unwrap().unwrap();
        assert_eq!(entry.id, 0);
        assert_eq!(entry.transaction_id, tx.id);

        let prefix = facade::storage::get_prefix(&columns, false, "my-app").unwrap().unwrap();
        assert_eq!(prefix.entries, 1);
        assert_eq!(prefix.last_entry, 3);
    }

    #[test]
    fn rejects_empty_key() {
        let (_dir, columns) = open_columns();
        let key = genesis_with_prefix(&columns);
        let tx = AddEntryTransaction::create(3, 0, "my-app".to_string(), Vec::new(), b"value".to_vec()).sign(&key);
        assert!(tx.validate(3, &columns).is_err());
    }

    #[test]
    fn rejects_unauthorized_user() {
        let (_dir, columns) = open_columns();
        let _key = genesis_with_prefix(&columns);
        let stranger = PrivateKey::generate();
        let tx =
            AddEntryTransaction::create(3, 0, "my-app".to_string(), b"key".to_vec(), b"value".to_vec()).sign(&stranger);
        assert!(tx.validate(3, &columns).is_err());
    }

    #[test]
    fn rejects_duplicate_key() {
        let (_dir, columns) = open_columns();
        let key = genesis_with_prefix(&columns);
        let tx = AddEntryTransaction::create(3, 0, "my-app".to_string(), b"key".to_vec(), b"value".to_vec())
            .sign(&key);
        tx.validate(3, &columns).unwrap();
        tx.execute(3, &columns).unwrap();

        let tx2 = AddEntryTransaction::create(4, 0, "my-app".to_string(), b"key".to_vec(), b"other".to_vec())
            .sign(&key);
        assert!(tx2.validate(4, &columns).is_err());
    }
}

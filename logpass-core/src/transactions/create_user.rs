//! Brings a new user into existence, sponsored by whoever submits it.
//! The submitter pays the (possibly multiplied) fee; the new account
//! starts with the submitted key as its sole owner and the
//! free-transaction allowance the submitter chose to grant it.

use crate::columns::Columns;
use crate::config::{USER_MAX_FREE_TRANSACTIONS, USER_MIN_FREE_TRANSACTIONS};
use crate::crypto::{Hash, PublicKey, UserId};
use crate::domain::user_keys::{KeySettings, UserKeys, ALL_SCOPES};
use crate::domain::user_security_rules::UserSecurityRules;
use crate::domain::user_settings::UserSettings;
use crate::domain::user_supervisors::UserSupervisors;
use crate::domain::{User, UserHistoryType};
use crate::error::{CResult, Error};
use crate::facade;
use crate::serializer::{Codec, Serializer};
use crate::transactions::{Authorization, TransactionBody, TransactionSettings, Transaction, UnsignedTransaction};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct CreateUserTransaction {
    pub public_key: PublicKey,
    pub sponsored_transactions: u8,
    /// Opaque reference the submitter attaches to the sponsorship
    /// record, e.g. identifying an off-chain campaign; not otherwise
    /// interpreted.
    pub sponsor: Hash,
}

impl CreateUserTransaction {
    pub fn create(
        block_id: u32,
        pricing: i16,
        public_key: PublicKey,
        sponsored_transactions: u8,
        sponsor: Hash,
    ) -> UnsignedTransaction {
        let body = TransactionBody::CreateUser(CreateUserTransaction { public_key, sponsored_transactions, sponsor });
        UnsignedTransaction::new(block_id, pricing, body)
    }

    pub fn settings(&self) -> TransactionSettings {
        TransactionSettings::default()
    }

    pub fn validate(
        &self,
        _tx: &Transaction,
        _current_block_id: u32,
        columns: &Columns,
        _auth: &Authorization,
    ) -> CResult<()> {
        let new_user_id = UserId::from_bytes(*self.public_key.derive_user_id().as_bytes());
        if facade::users::exists(columns, false, &new_user_id)? {
            return Err(Error::transaction_validation("user already exists"));
        }
        if self.sponsored_transactions < USER_MIN_FREE_TRANSACTIONS
            || self.sponsored_transactions > USER_MAX_FREE_TRANSACTIONS
        {
            return Err(Error::transaction_validation("sponsored transactions out of allowed range"));
        }
        Ok(())
    }

    pub fn execute(&self, tx: &Transaction, current_block_id: u32, columns: &Columns) -> CResult<()> {
        let new_user_id = UserId::from_bytes(*self.public_key.derive_user_id().as_bytes());

        let mut keys = BTreeMap::new();
        keys.insert(self.public_key, KeySettings { power: 1, scopes: ALL_SCOPES });
        let settings = UserSettings {
            keys: UserKeys(keys),
            supervisors: UserSupervisors::default(),
            rules: UserSecurityRules::default(),
        };
        let mut user = User::new(tx.user_id(), settings, 0);
        user.free_transactions = self.sponsored_transactions;

        facade::users::add_history(columns, current_block_id, new_user_id, UserHistoryType::IncomingTransaction, tx.id)?;
        facade::users::add_sponsor(columns, current_block_id, new_user_id, self.sponsor, self.sponsored_transactions)?;
        user.operations += 1;
        user.sponsors += 1;
        facade::users::add(columns, current_block_id, new_user_id, user)?;
        Ok(())
    }
}

impl Codec for CreateUserTransaction {
    fn encode(&self, s: &mut Serializer) {
        self.public_key.encode(s);
        s.put_u8(self.sponsored_transactions);
        self.sponsor.encode(s);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        Ok(CreateUserTransaction {
            public_key: PublicKey::decode(s)?,
            sponsored_transactions: s.get_u8()?,
            sponsor: Hash::decode(s)?,
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

    fn genesis(columns: &Columns) -> PrivateKey {
        let key = PrivateKey::generate();
        let tx = InitTransaction::create(1, 0, 1_717_200_000, 60).sign(&key);
        tx.validate(1, columns).unwrap();
        tx.execute(1, columns).unwrap();
        key
    }

    #[test]
    fn creates_new_user_with_sponsored_allowance() {
        let (_dir, columns) = open_columns();
        let founder = genesis(&columns);
        let new_key = PrivateKey::generate();
        let new_user_id = UserId::from_bytes(*new_key.public_key().derive_user_id().as_bytes());

        let tx = CreateUserTransaction::create(2, 0, new_key.public_key(), 5, Hash::default()).sign(&founder);
        tx.validate(2, &columns).unwrap();
        tx.execute(2, &columns).unwrap();

        let user = facade::users::get(&columns, false, 2, &new_user_id).unwrap().unwrap();
        assert_eq!(user.tokens, 0);
        assert_eq!(user.free_transactions, 5);
        assert_eq!(user.sponsors, 1);
    }

    #[test]
    fn rejects_duplicate_user() {
        let (_dir, columns) = open_columns();
        let founder = genesis(&columns);
        let new_key = PrivateKey::generate();

        let first = CreateUserTransaction::create(2, 0, new_key.public_key(), 0, Hash::default()).sign(&founder);
        first.validate(2, &columns).unwrap();
        first.execute(2, &columns).unwrap();

        let second = CreateUserTransaction::create(3, 0, new_key.public_key(), 0, Hash::default()).sign(&founder);
        assert!(second.validate(3, &columns).is_err());
    }

    #[test]
    fn rejects_out_of_range_sponsored_transactions() {
        let (_dir, columns) = open_columns();
        let founder = genesis(&columns);
        let new_key = PrivateKey::generate();
        let tx = CreateUserTransaction::create(2, 0, new_key.public_key(), USER_MAX_FREE_TRANSACTIONS + 1, Hash::default())
            .sign(&founder);
        assert!(tx.validate(2, &columns).is_err());
    }
}

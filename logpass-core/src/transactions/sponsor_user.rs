//! Tops up another user's free-transaction allowance. Unlike
//! [`crate::transactions::create_user`] the target account must
//! already exist; this only ever grows its `free_transactions`.

use crate::columns::Columns;
use crate::config::USER_MAX_FREE_TRANSACTIONS;
use crate::crypto::{EnvelopeType, Hash, UserId};
use crate::domain::UserHistoryType;
use crate::error::{CResult, Error};
use crate::facade;
use crate::serializer::{Codec, Serializer};
use crate::transactions::{Authorization, TransactionBody, TransactionSettings, Transaction, UnsignedTransaction};

#[derive(Debug, Clone)]
pub struct SponsorUserTransaction {
    pub user_id: UserId,
    pub sponsored_transactions: u8,
    pub sponsor: Hash,
}

impl SponsorUserTransaction {
    pub fn create(
        block_id: u32,
        pricing: i16,
        user_id: UserId,
        sponsored_transactions: u8,
        sponsor: Hash,
    ) -> UnsignedTransaction {
        let body = TransactionBody::SponsorUser(SponsorUserTransaction { user_id, sponsored_transactions, sponsor });
        UnsignedTransaction::new(block_id, pricing, body)
    }

    pub fn settings(&self) -> TransactionSettings {
        TransactionSettings::default()
    }

    pub fn validate(
        &self,
        tx: &Transaction,
        current_block_id: u32,
        columns: &Columns,
        _auth: &Authorization,
    ) -> CResult<()> {
        if !facade::users::exists(columns, false, &self.user_id)? {
            return Err(Error::transaction_validation("user does not exist"));
        }
        if self.sponsored_transactions == 0 || self.sponsored_transactions > USER_MAX_FREE_TRANSACTIONS {
            return Err(Error::transaction_validation("invalid number of sponsored transactions"));
        }
        if matches!(tx.signatures.envelope_type, EnvelopeType::Sponsor) && tx.signatures.sponsor_id == Some(self.user_id)
        {
            return Err(Error::transaction_validation("a sponsor user transaction cannot sponsor itself"));
        }
        let _ = current_block_id;
        Ok(())
    }

    pub fn execute(&self, tx: &Transaction, current_block_id: u32, columns: &Columns) -> CResult<()> {
        let mut user = facade::users::get(columns, false, current_block_id, &self.user_id)?.expect("validated to exist");
        user.free_transactions =
            (user.free_transactions as u16 + self.sponsored_transactions as u16).min(USER_MAX_FREE_TRANSACTIONS as u16)
                as u8;

        facade::users::add_history(columns, current_block_id, self.user_id, UserHistoryType::IncomingTransaction, tx.id)?;
        user.operations += 1;
        facade::users::add_sponsor(columns, current_block_id, self.user_id, self.sponsor, self.sponsored_transactions)?;
        user.sponsors += 1;
        facade::users::update(columns, current_block_id, self.user_id, user)?;
        Ok(())
    }
}

impl Codec for SponsorUserTransaction {
    fn encode(&self, s: &mut Serializer) {
        self.user_id.encode(s);
        s.put_u8(self.sponsored_transactions);
        self.sponsor.encode(s);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        Ok(SponsorUserTransaction {
            user_id: UserId::decode(s)?,
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

    fn genesis(columns: &Columns) -> (PrivateKey, UserId) {
        let key = PrivateKey::generate();
        let tx = InitTransaction::create(1, 0, 1_717_200_000, 60).sign(&key);
        tx.validate(1, columns).unwrap();
        tx.execute(1, columns).unwrap();
        let id = tx.user_id();
        (key, id)
    }

    #[test]
    fn tops_up_free_transactions() {
        let (_dir, columns) = open_columns();
        let (key, id) = genesis(&columns);

        let tx = SponsorUserTransaction::create(2, 0, id, 3, Hash::default()).sign(&key);
        tx.validate(2, &columns).unwrap();
        tx.execute(2, &columns).unwrap();

        let user = facade::users::get(&columns, false, 2, &id).unwrap().unwrap();
        assert_eq!(user.free_transactions, 3);
        assert_eq!(user.sponsors, 1);
    }

    #[test]
    fn caps_at_the_maximum_allowance() {
        let (_dir, columns) = open_columns();
        let (key, id) = genesis(&columns);

        let first = SponsorUserTransaction::create(2, 0, id, USER_MAX_FREE_TRANSACTIONS, Hash::default()).sign(&key);
        first.validate(2, &columns).unwrap();
        first.execute(2, &columns).unwrap();

        let second = SponsorUserTransaction::create(3, 0, id, USER_MAX_FREE_TRANSACTIONS, Hash::default()).sign(&key);
        second.validate(3, &columns).unwrap();
        second.execute(3, &columns).unwrap();

        let user = facade::users::get(&columns, false, 3, &id).unwrap().unwrap();
        assert_eq!(user.free_transactions, USER_MAX_FREE_TRANSACTIONS);
    }

    #[test]
    fn rejects_zero_sponsored_transactions() {
        let (_dir, columns) = open_columns();
        let (key, id) = genesis(&columns);
        let tx = SponsorUserTransaction::create(2, 0, id, 0, Hash::default()).sign(&key);
        assert!(tx.validate(2, &columns).is_err());
    }

    #[test]
    fn rejects_unknown_user() {
        let (_dir, columns) = open_columns();
        let (key, _id) = genesis(&columns);
        let tx = SponsorUserTransaction::create(2, 0, UserId::random(), 3, Hash::default()).sign(&key);
        assert!(tx.validate(2, &columns).is_err());
    }
}

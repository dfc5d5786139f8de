//! Moves tokens from the submitter (or its sponsor) to another
//! account. The transfer amount is the transaction's `cost`
//! (see [`crate::transactions::TransactionBody::cost`]), debited by
//! the shared execute tail; this module only has to credit the
//! destination.

use crate::columns::Columns;
use crate::crypto::{EnvelopeType, UserId};
use crate::domain::UserHistoryType;
use crate::error::{CResult, Error};
use crate::facade;
use crate::serializer::{Codec, Serializer};
use crate::transactions::{Authorization, TransactionBody, TransactionSettings, Transaction, UnsignedTransaction};

#[derive(Debug, Clone)]
pub struct TransferTransaction {
    pub destination: UserId,
    pub value: u64,
}

impl TransferTransaction {
    pub fn create(block_id: u32, pricing: i16, destination: UserId, value: u64) -> UnsignedTransaction {
        let body = TransactionBody::Transfer(TransferTransaction { destination, value });
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
        if self.value == 0 {
            return Err(Error::transaction_validation("transfer amount must be nonzero"));
        }
        if self.destination == tx.user_id() {
            return Err(Error::transaction_validation("cannot transfer tokens to oneself"));
        }
        if matches!(tx.signatures.envelope_type, EnvelopeType::Sponsor) && tx.signatures.sponsor_id == Some(self.destination)
        {
            return Err(Error::transaction_validation("a sponsor cannot sponsor transferring tokens to itself"));
        }
        if !facade::users::exists(columns, false, &self.destination)? {
            return Err(Error::transaction_validation("destination user does not exist"));
        }
        Ok(())
    }

    pub fn execute(&self, tx: &Transaction, current_block_id: u32, columns: &Columns) -> CResult<()> {
        let mut destination =
            facade::users::get(columns, false, current_block_id, &self.destination)?.expect("validated to exist");
        destination.tokens += self.value;
        facade::users::add_history(
            columns,
            current_block_id,
            self.destination,
            UserHistoryType::IncomingTransaction,
            tx.id,
        )?;
        destination.operations += 1;
        facade::users::update(columns, current_block_id, self.destination, destination)?;
        Ok(())
    }
}

impl Codec for TransferTransaction {
    fn encode(&self, s: &mut Serializer) {
        self.destination.encode(s);
        s.put_u64_le(self.value);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        Ok(TransferTransaction { destination: UserId::decode(s)?, value: s.get_u64_le()? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PrivateKey;
    use crate::transactions::create_user::CreateUserTransaction;
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

    fn new_user(columns: &Columns, founder: &PrivateKey) -> UserId {
        let new_key = PrivateKey::generate();
        let id = UserId::from_bytes(*new_key.public_key().derive_user_id().as_bytes());
        let tx = CreateUserTransaction::create(2, 0, new_key.public_key(), 0, crate::crypto::Hash::default())
            .sign(founder);
        tx.validate(2, columns).unwrap();
        tx.execute(2, columns).unwrap();
        id
    }

    #[test]
    fn transfers_tokens_to_destination() {
        let (_dir, columns) = open_columns();
        let (founder, _founder_id) = genesis(&columns);
        let destination = new_user(&columns, &founder);

        let tx = TransferTransaction::create(3, 0, destination, 1_000).sign(&founder);
        tx.validate(3, &columns).unwrap();
        tx.execute(3, &columns).unwrap();

        let user = facade::users::get(&columns, false, 3, &destination).unwrap().unwrap();
        assert_eq!(user.tokens, 1_000);
    }

    #[test]
    fn rejects_zero_value_transfer() {
        let (_dir, columns) = open_columns();
        let (founder, _founder_id) = genesis(&columns);
        let destination = new_user(&columns, &founder);
        let tx = TransferTransaction::create(3, 0, destination, 0).sign(&founder);
        assert!(tx.validate(3, &columns).is_err());
    }

    #[test]
    fn rejects_self_transfer() {
        let (_dir, columns) = open_columns();
        let (founder, founder_id) = genesis(&columns);
        let tx = TransferTransaction::create(2, 0, founder_id, 10).sign(&founder);
        assert!(tx.validate(2, &columns).is_err());
    }
}

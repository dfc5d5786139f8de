//! Registers a new [`crate::domain::Prefix`] owned by the submitter.
//! Carries a hundredfold fee multiplier, grounded in the original's
//! `transactionFeeMultiplier = 100` for namespace registration.

use crate::columns::Columns;
use crate::domain::Prefix;
use crate::error::{CResult, Error};
use crate::facade;
use crate::serializer::{Codec, Serializer};
use crate::transactions::{Authorization, TransactionBody, TransactionSettings, Transaction, UnsignedTransaction};

#[derive(Debug, Clone)]
pub struct CreatePrefixTransaction {
    pub prefix: String,
}

impl CreatePrefixTransaction {
    pub fn create(block_id: u32, pricing: i16, prefix: String) -> UnsignedTransaction {
        let body = TransactionBody::StorageCreatePrefix(CreatePrefixTransaction { prefix });
        UnsignedTransaction::new(block_id, pricing, body)
    }

    pub fn settings(&self) -> TransactionSettings {
        TransactionSettings { transaction_fee_multiplier: 100, ..Default::default() }
    }

    pub fn validate(
        &self,
        _tx: &Transaction,
        _current_block_id: u32,
        columns: &Columns,
        _auth: &Authorization,
    ) -> CResult<()> {
        if !Prefix::is_id_valid(&self.prefix) {
            return Err(Error::transaction_validation("invalid prefix name"));
        }
        if facade::storage::prefix_exists(columns, false, &self.prefix)? {
            return Err(Error::transaction_validation("prefix already exists"));
        }
        Ok(())
    }

    pub fn execute(&self, tx: &Transaction, current_block_id: u32, columns: &Columns) -> CResult<()> {
        let prefix = Prefix::create(self.prefix.clone(), tx.user_id(), current_block_id);
        facade::storage::add_prefix(columns, prefix);
        Ok(())
    }
}

impl Codec for CreatePrefixTransaction {
    fn encode(&self, s: &mut Serializer) {
        s.put_string_u8(&self.prefix).expect("prefix id bounded by PREFIX_MAX_ID_LENGTH");
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        Ok(CreatePrefixTransaction { prefix: s.get_string_u8()? })
    }
}

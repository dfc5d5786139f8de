//! Marks the submitting account logged out as of the current block.
//! Carries no fields: the shared validate preamble is the entire
//! check, and [`crate::domain::User::is_logged_out`] is the only
//! reader of the resulting flag.

use crate::columns::Columns;
use crate::domain::PowerLevel;
use crate::error::CResult;
use crate::facade;
use crate::serializer::{Codec, Serializer};
use crate::transactions::{Authorization, TransactionBody, TransactionSettings, Transaction, UnsignedTransaction};

#[derive(Debug, Clone)]
pub struct LogoutUserTransaction;

impl LogoutUserTransaction {
    pub fn create(block_id: u32, pricing: i16) -> UnsignedTransaction {
        UnsignedTransaction::new(block_id, pricing, TransactionBody::LogoutUser(LogoutUserTransaction))
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
        _tx: &Transaction,
        _current_block_id: u32,
        _columns: &Columns,
        _auth: &Authorization,
    ) -> CResult<()> {
        Ok(())
    }

    pub fn execute(&self, tx: &Transaction, current_block_id: u32, columns: &Columns) -> CResult<()> {
        let mut user = facade::users::get(columns, false, current_block_id, &tx.user_id())?.expect("validated to exist");
        user.logout = current_block_id;
        facade::users::update(columns, current_block_id, tx.user_id(), user)?;
        Ok(())
    }
}

impl Codec for LogoutUserTransaction {
    fn encode(&self, _s: &mut Serializer) {}

    fn decode(_s: &mut Serializer) -> CResult<Self> {
        Ok(LogoutUserTransaction)
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

    #[test]
    fn marks_the_account_logged_out() {
        let (_dir, columns) = open_columns();
        let key = PrivateKey::generate();
        let init = InitTransaction::create(1, 0, 1_717_200_000, 60).sign(&key);
        init.validate(1, &columns).unwrap();
        init.execute(1, &columns).unwrap();
        let id = init.user_id();

        let tx = LogoutUserTransaction::create(2, 0).sign(&key);
        tx.validate(2, &columns).unwrap();
        tx.execute(2, &columns).unwrap();

        let user = facade::users::get(&columns, false, 2, &id).unwrap().unwrap();
        assert_eq!(user.logout, 2);
        assert!(user.is_logged_out(2));
    }
}

//! Fixed-width entries appended to a user's transaction history log.

use crate::crypto::TransactionId;
use crate::error::{CResult, SerializerError};
use crate::serializer::{Codec, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserHistoryType {
    /// This user was the counterparty receiving effects of someone
    /// else's transaction (e.g. a `Transfer` destination).
    IncomingTransaction,
    /// This user originated the transaction.
    OutgoingTransaction,
    /// This user paid as sponsor for someone else's transaction.
    SponsoredTransaction,
}

impl UserHistoryType {
    fn tag(self) -> u8 {
        match self {
            UserHistoryType::IncomingTransaction => 0x01,
            UserHistoryType::OutgoingTransaction => 0x02,
            UserHistoryType::SponsoredTransaction => 0x03,
        }
    }

    fn from_tag(tag: u8) -> CResult<Self> {
        match tag {
            0x01 => Ok(UserHistoryType::IncomingTransaction),
            0x02 => Ok(UserHistoryType::OutgoingTransaction),
            0x03 => Ok(UserHistoryType::SponsoredTransaction),
            other => Err(SerializerError::InvalidValue(format!("unknown user history type {other:#04x}")).into()),
        }
    }
}

/// One row of a user's append-only history log. Rows are merge-
/// appended into 100-row pages (see `columns::user_history`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserHistory {
    pub block_id: u32,
    pub history_type: UserHistoryType,
    pub transaction_id: TransactionId,
}

impl UserHistory {
    pub const SIZE: usize = 4 + 1 + TransactionId::SIZE;

    pub fn new(block_id: u32, history_type: UserHistoryType, transaction_id: TransactionId) -> Self {
        UserHistory { block_id, history_type, transaction_id }
    }
}

impl Codec for UserHistory {
    fn encode(&self, s: &mut Serializer) {
        s.put_u32_le(self.block_id);
        s.put_u8(self.history_type.tag());
        self.transaction_id.encode(s);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        let block_id = s.get_u32_le()?;
        let history_type = UserHistoryType::from_tag(s.get_u8()?)?;
        let transaction_id = TransactionId::decode(s)?;
        Ok(UserHistory { block_id, history_type, transaction_id })
    }
}

//! A single value stored under a [`crate::domain::Prefix`].

use crate::crypto::TransactionId;
use crate::error::CResult;
use crate::serializer::{Codec, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageEntry {
    /// Sequential index within the owning prefix, assigned from the
    /// prefix's `entries` counter at the moment the entry was added.
    pub id: u32,
    pub transaction_id: TransactionId,
}

impl Codec for StorageEntry {
    fn encode(&self, s: &mut Serializer) {
        s.put_u32_le(self.id);
        self.transaction_id.encode(s);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        Ok(StorageEntry { id: s.get_u32_le()?, transaction_id: TransactionId::decode(s)? })
    }
}

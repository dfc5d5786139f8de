//! Record of a sponsorship grant: who sponsored a user into having free
//! transactions, and how many were granted at that block.

use crate::crypto::Hash;
use crate::error::CResult;
use crate::serializer::{Codec, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserSponsor {
    pub block_id: u32,
    /// Duplication hash of the sponsoring transaction, not a `UserId`:
    /// a sponsor need not already have an account (e.g. `Init`'s grant).
    pub sponsor: Hash,
    pub sponsored_transactions: u8,
}

impl UserSponsor {
    pub const SIZE: usize = 4 + Hash::SIZE + 1;

    pub fn new(block_id: u32, sponsor: Hash, sponsored_transactions: u8) -> Self {
        UserSponsor { block_id, sponsor, sponsored_transactions }
    }
}

impl Codec for UserSponsor {
    fn encode(&self, s: &mut Serializer) {
        s.put_u32_le(self.block_id);
        self.sponsor.encode(s);
        s.put_u8(self.sponsored_transactions);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        let block_id = s.get_u32_le()?;
        let sponsor = Hash::decode(s)?;
        let sponsored_transactions = s.get_u8()?;
        Ok(UserSponsor { block_id, sponsor, sponsored_transactions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let sponsor = UserSponsor::new(3, Hash::sha256(b"sponsor-tx"), 5);
        let mut s = Serializer::new();
        sponsor.encode(&mut s);
        let mut s = Serializer::from_bytes(s.into_bytes());
        assert_eq!(UserSponsor::decode(&mut s).unwrap(), sponsor);
    }
}

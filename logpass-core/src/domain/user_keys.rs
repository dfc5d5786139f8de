use crate::config::USER_MAX_KEYS;
use crate::crypto::PublicKey;
use crate::error::{CResult, Error};
use crate::serializer::{Codec, Serializer};
use std::collections::BTreeMap;

/// Bitmask restricting which transaction categories a key or
/// supervisor may authorize. Kept opaque at this layer; transaction
/// types interpret individual bits.
pub type Scopes = u32;

pub const ALL_SCOPES: Scopes = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySettings {
    pub power: u8,
    pub scopes: Scopes,
}

impl Codec for KeySettings {
    fn encode(&self, s: &mut Serializer) {
        s.put_u8(self.power);
        s.put_u32_le(self.scopes);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        Ok(KeySettings { power: s.get_u8()?, scopes: s.get_u32_le()? })
    }
}

/// `1..=USER_MAX_KEYS` public keys authorized to act for a user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserKeys(pub BTreeMap<PublicKey, KeySettings>);

impl UserKeys {
    pub fn validate(&self) -> CResult<()> {
        if self.0.is_empty() {
            return Err(Error::settings_validation("a user must have at least one key"));
        }
        if self.0.len() > USER_MAX_KEYS {
            return Err(Error::settings_validation(format!(
                "at most {USER_MAX_KEYS} keys allowed, got {}",
                self.0.len()
            )));
        }
        Ok(())
    }
}

impl Codec for UserKeys {
    fn encode(&self, s: &mut Serializer) {
        s.put_map_u8(&self.0, |s, k| k.encode(s), |s, v| v.encode(s))
            .expect("key count already bounded by validate()");
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        Ok(UserKeys(s.get_map_u8(PublicKey::decode, KeySettings::decode)?))
    }
}

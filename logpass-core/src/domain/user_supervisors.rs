use crate::config::USER_MAX_SUPERVISORS;
use crate::crypto::UserId;
use crate::domain::user_keys::KeySettings;
use crate::error::{CResult, Error};
use crate::serializer::{Codec, Serializer};
use std::collections::BTreeMap;

pub type SupervisorSettings = KeySettings;

/// `0..=USER_MAX_SUPERVISORS` other users whose own power level, if it
/// reaches the owning user's `supervisingPowerLevel`, contributes
/// `power` toward the owning user's total.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserSupervisors(pub BTreeMap<UserId, SupervisorSettings>);

impl UserSupervisors {
    pub fn validate(&self) -> CResult<()> {
        if self.0.len() > USER_MAX_SUPERVISORS {
            return Err(Error::settings_validation(format!(
                "at most {USER_MAX_SUPERVISORS} supervisors allowed, got {}",
                self.0.len()
            )));
        }
        Ok(())
    }
}

impl Codec for UserSupervisors {
    fn encode(&self, s: &mut Serializer) {
        s.put_map_u8(&self.0, |s, k| k.encode(s), |s, v| v.encode(s))
            .expect("supervisor count already bounded by validate()");
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        Ok(UserSupervisors(s.get_map_u8(UserId::decode, SupervisorSettings::decode)?))
    }
}

use crate::domain::user_keys::UserKeys;
use crate::domain::user_security_rules::UserSecurityRules;
use crate::domain::user_supervisors::UserSupervisors;
use crate::error::CResult;
use crate::serializer::{Codec, Serializer};

/// The full authorization configuration for a user account: the keys
/// and supervisors that may act for it, plus the rules governing how
/// those contribute to a power level and how settings updates of its
/// own are delayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSettings {
    pub keys: UserKeys,
    pub supervisors: UserSupervisors,
    pub rules: UserSecurityRules,
}

impl UserSettings {
    pub fn validate(&self) -> CResult<()> {
        self.keys.validate()?;
        self.supervisors.validate()?;
        self.rules.validate()?;
        Ok(())
    }
}

impl Codec for UserSettings {
    fn encode(&self, s: &mut Serializer) {
        self.keys.encode(s);
        self.supervisors.encode(s);
        self.rules.encode(s);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        let keys = UserKeys::decode(s)?;
        let supervisors = UserSupervisors::decode(s)?;
        let rules = UserSecurityRules::decode(s)?;
        Ok(UserSettings { keys, supervisors, rules })
    }
}

use crate::config::MAX_POWER;
use crate::error::CResult;
use crate::serializer::{Codec, Serializer};

/// A `(level, power, participants)` triple. Ordered lexicographically
/// by field declaration order, matching the derived three-way
/// comparison it is grounded on: level dominates, then power, then
/// participant count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct PowerLevel {
    pub level: u8,
    pub power: u8,
    pub participants: u8,
}

impl PowerLevel {
    pub const INVALID: PowerLevel = PowerLevel { level: 0, power: 0, participants: 0 };
    pub const LOWEST: PowerLevel = PowerLevel { level: 0, power: 1, participants: 1 };
    pub const LOW: PowerLevel = PowerLevel { level: 1, power: 1, participants: 1 };
    pub const MEDIUM: PowerLevel = PowerLevel { level: 2, power: 1, participants: 1 };
    pub const HIGH: PowerLevel = PowerLevel { level: 3, power: 1, participants: 1 };
    pub const HIGHEST: PowerLevel = PowerLevel { level: 4, power: 1, participants: 1 };

    pub fn new(level: u8, power: u8, participants: u8) -> Self {
        PowerLevel { level, power: power.min(MAX_POWER), participants }
    }

    pub fn is_invalid(&self) -> bool {
        *self == PowerLevel::INVALID
    }
}

impl Codec for PowerLevel {
    fn encode(&self, s: &mut Serializer) {
        s.put_u8(self.level);
        s.put_u8(self.power);
        s.put_u8(self.participants);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        Ok(PowerLevel {
            level: s.get_u8()?,
            power: s.get_u8()?,
            participants: s.get_u8()?,
        })
    }
}

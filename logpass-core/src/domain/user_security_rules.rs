use crate::config::USER_POWER_LEVELS as P;
use crate::domain::power_level::PowerLevel;
use crate::error::{CResult, Error};
use crate::serializer::{Codec, Serializer};

/// The per-power-level thresholds and delays that govern a user
/// account. Arrays are indexed by power level (`0..P`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSecurityRules {
    // all-zero by default (see `Default` below): every threshold and
    // delay is zero, so a single signed key reaches `HIGHEST` power
    // immediately and the top spending limit's zero acts as the
    // unlimited-spending sentinel. Matches what `User::create` leaves
    // a freshly created account with in the original implementation;
    // `UpdateUser` is how an account later tightens these.
    /// Raw accumulated power required to reach level `k`. Must be
    /// non-decreasing.
    pub power_levels: [u16; P],
    /// Blocks a keys-settings update at level `k` must wait before
    /// taking effect. Must be non-increasing (higher power, less
    /// delay).
    pub keys_update_times: [u32; P],
    pub supervisors_update_times: [u32; P],
    pub rules_update_times: [u32; P],
    /// Token spending ceiling per power level, reset by the embedding
    /// column's bookkeeping (see [`crate::domain::user::User::spendings`]).
    /// Must be non-decreasing.
    pub spending_limits: [u64; P],
    /// Minimum power level a supervisor must itself reach before its
    /// configured power contributes to a supervisee's total.
    pub supervising_power_level: u8,
}

impl Default for UserSecurityRules {
    fn default() -> Self {
        UserSecurityRules {
            power_levels: [0; P],
            keys_update_times: [0; P],
            supervisors_update_times: [0; P],
            rules_update_times: [0; P],
            spending_limits: [0; P],
            supervising_power_level: 0,
        }
    }
}

impl UserSecurityRules {
    /// Checks the monotonicity invariants spec'd for rule arrays, plus
    /// `supervisingPowerLevel < P`.
    pub fn validate(&self) -> CResult<()> {
        if self.supervising_power_level as usize >= P {
            return Err(Error::settings_validation("supervisingPowerLevel must be < P"));
        }
        if !is_non_decreasing(&self.power_levels) {
            return Err(Error::settings_validation("powerLevels must be non-decreasing"));
        }
        if !is_non_decreasing(&self.spending_limits) {
            return Err(Error::settings_validation("spendingLimits must be non-decreasing"));
        }
        if !is_non_increasing(&self.keys_update_times) {
            return Err(Error::settings_validation("keysUpdateTimes must be non-increasing"));
        }
        if !is_non_increasing(&self.supervisors_update_times) {
            return Err(Error::settings_validation("supervisorsUpdateTimes must be non-increasing"));
        }
        if !is_non_increasing(&self.rules_update_times) {
            return Err(Error::settings_validation("rulesUpdateTimes must be non-increasing"));
        }
        Ok(())
    }

    /// Highest level `k` such that `rawPower >= powerLevels[k]`, or
    /// `None` if even level 0's threshold is unmet.
    pub fn level_for_power(&self, raw_power: u16) -> Option<u8> {
        self.power_levels
            .iter()
            .enumerate()
            .rev()
            .find(|(_, threshold)| raw_power >= **threshold)
            .map(|(idx, _)| idx as u8)
    }

    pub fn power_level_at(&self, index: u8) -> PowerLevel {
        match index {
            0 => PowerLevel::LOWEST,
            1 => PowerLevel::LOW,
            2 => PowerLevel::MEDIUM,
            3 => PowerLevel::HIGH,
            _ => PowerLevel::HIGHEST,
        }
    }
}

fn is_non_decreasing<T: PartialOrd>(values: &[T]) -> bool {
    values.windows(2).all(|w| w[0] <= w[1])
}

fn is_non_increasing<T: PartialOrd>(values: &[T]) -> bool {
    values.windows(2).all(|w| w[0] >= w[1])
}

impl Codec for UserSecurityRules {
    fn encode(&self, s: &mut Serializer) {
        for v in self.power_levels {
            s.put_u16_le(v);
        }
        for v in self.keys_update_times {
            s.put_u32_le(v);
        }
        for v in self.supervisors_update_times {
            s.put_u32_le(v);
        }
        for v in self.rules_update_times {
            s.put_u32_le(v);
        }
        for v in self.spending_limits {
            s.put_u64_le(v);
        }
        s.put_u8(self.supervising_power_level);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        let mut read_u16 = || -> CResult<[u16; P]> {
            let mut out = [0u16; P];
            for slot in out.iter_mut() {
                *slot = s.get_u16_le()?;
            }
            Ok(out)
        };
        let power_levels = read_u16()?;
        let mut read_u32 = || -> CResult<[u32; P]> {
            let mut out = [0u32; P];
            for slot in out.iter_mut() {
                *slot = s.get_u32_le()?;
            }
            Ok(out)
        };
        let keys_update_times = read_u32()?;
        let supervisors_update_times = read_u32()?;
        let rules_update_times = read_u32()?;
        let mut spending_limits = [0u64; P];
        for slot in spending_limits.iter_mut() {
            *slot = s.get_u64_le()?;
        }
        let supervising_power_level = s.get_u8()?;
        Ok(UserSecurityRules {
            power_levels,
            keys_update_times,
            supervisors_update_times,
            rules_update_times,
            spending_limits,
            supervising_power_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> UserSecurityRules {
        UserSecurityRules {
            power_levels: [1, 5, 20, 100, 500],
            keys_update_times: [1000, 500, 100, 10, 0],
            supervisors_update_times: [1000, 500, 100, 10, 0],
            rules_update_times: [1000, 500, 100, 10, 0],
            spending_limits: [100, 1_000, 10_000, 100_000, 1_000_000],
            supervising_power_level: 2,
        }
    }

    #[test]
    fn accepts_well_formed_rules() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn rejects_decreasing_power_levels() {
        let mut rules = sample();
        rules.power_levels[4] = 1;
        assert!(rules.validate().is_err());
    }

    #[test]
    fn level_for_power_picks_highest_satisfied_threshold() {
        let rules = sample();
        assert_eq!(rules.level_for_power(0), None);
        assert_eq!(rules.level_for_power(1), Some(0));
        assert_eq!(rules.level_for_power(19), Some(1));
        assert_eq!(rules.level_for_power(500), Some(4));
    }
}

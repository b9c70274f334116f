//! Rule configuration: seat count, role distribution and pacing.

use crate::error::ConfigError;
use crate::role::{Catalog, RoleType};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Number of roles drawn from each type before setup adjustments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    /// Townsfolk drawn.
    pub townsfolk: usize,
    /// Outsiders drawn.
    pub outsider: usize,
    /// Minions drawn.
    pub minion: usize,
    /// Demons drawn.
    pub demon: usize,
}

impl Distribution {
    /// Count requested for one type.
    pub fn count(&self, role_type: RoleType) -> usize {
        match role_type {
            RoleType::Townsfolk => self.townsfolk,
            RoleType::Outsider => self.outsider,
            RoleType::Minion => self.minion,
            RoleType::Demon => self.demon,
        }
    }

    /// Total roles drawn.
    pub fn total(&self) -> usize {
        self.townsfolk + self.outsider + self.minion + self.demon
    }
}

impl Default for Distribution {
    /// Six-seat setup: 3 Townsfolk, 1 Outsider, 1 Minion, 1 Demon.
    fn default() -> Self {
        Self {
            townsfolk: 3,
            outsider: 1,
            minion: 1,
            demon: 1,
        }
    }
}

/// Immutable rules for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Seats at the table.
    pub player_count: usize,
    /// Seat number (1-based) played by the human.
    pub human_seat: u8,
    /// Roles drawn per type.
    pub distribution: Distribution,
    /// Private chat rounds per day.
    pub private_chat_rounds: u32,
    /// Public speech rounds per day.
    pub public_speech_rounds: u32,
    /// Maximum exchanges in one private chat with the human.
    pub chat_turn_cap: u32,
    /// Days played before the session ends without a winner.
    pub max_days: u32,
    /// Living seats needed for the Scarlet Woman to inherit the Demon.
    pub inheritance_min_living: usize,
    /// Public history lines handed to the oracle.
    pub history_window: usize,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            player_count: 6,
            human_seat: 4,
            distribution: Distribution::default(),
            private_chat_rounds: 2,
            public_speech_rounds: 2,
            chat_turn_cap: 10,
            max_days: 10,
            inheritance_min_living: 4,
            history_window: 40,
        }
    }
}

impl RulesConfig {
    /// Checks the rules against a catalog before any roster is built.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the distribution does not fill the table,
    /// asks for more roles of a type than the catalog holds, or the human
    /// seat is outside the table.
    #[instrument(skip(self, catalog), fields(player_count = self.player_count))]
    pub fn validate(&self, catalog: &Catalog) -> Result<(), ConfigError> {
        if self.player_count == 0 || self.player_count > u8::MAX as usize {
            return Err(ConfigError::new(format!(
                "Unsupported player count: {}",
                self.player_count
            )));
        }

        if self.distribution.total() != self.player_count {
            return Err(ConfigError::new(format!(
                "Distribution draws {} roles for {} seats",
                self.distribution.total(),
                self.player_count
            )));
        }

        for role_type in [
            RoleType::Townsfolk,
            RoleType::Outsider,
            RoleType::Minion,
            RoleType::Demon,
        ] {
            let wanted = self.distribution.count(role_type);
            let available = catalog.of_type(role_type).len();
            if wanted > available {
                return Err(ConfigError::new(format!(
                    "Distribution asks for {} {} roles but the catalog has {}",
                    wanted, role_type, available
                )));
            }
        }

        if self.distribution.demon != 1 {
            return Err(ConfigError::new(format!(
                "Exactly one Demon is required, got {}",
                self.distribution.demon
            )));
        }

        if self.human_seat == 0 || self.human_seat as usize > self.player_count {
            return Err(ConfigError::new(format!(
                "Human seat {} is outside 1..={}",
                self.human_seat, self.player_count
            )));
        }

        debug!("Rules validated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;

    #[test]
    fn test_default_rules_are_valid() {
        let rules = RulesConfig::default();
        assert!(rules.validate(&Catalog::trouble_brewing()).is_ok());
    }

    #[test]
    fn test_overdrawn_type_is_rejected() {
        let rules = RulesConfig {
            player_count: 7,
            distribution: Distribution {
                townsfolk: 2,
                outsider: 1,
                minion: 3,
                demon: 1,
            },
            ..RulesConfig::default()
        };
        let catalog = Catalog::from_roles([
            Role::Chef,
            Role::Empath,
            Role::Saint,
            Role::Poisoner,
            Role::Spy,
            Role::Imp,
        ]);
        let err = rules.validate(&catalog).unwrap_err();
        assert!(err.message.contains("Minion"), "{err}");
    }

    #[test]
    fn test_mismatched_total_is_rejected() {
        let rules = RulesConfig {
            player_count: 7,
            ..RulesConfig::default()
        };
        assert!(rules.validate(&Catalog::trouble_brewing()).is_err());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let rules: RulesConfig = toml::from_str(
            "human_seat = 1\nmax_days = 3\n[distribution]\ntownsfolk = 3\noutsider = 1\nminion = 1\ndemon = 1\n",
        )
        .expect("toml");
        assert_eq!(rules.human_seat, 1);
        assert_eq!(rules.max_days, 3);
        assert_eq!(rules.player_count, 6);
        assert_eq!(rules.inheritance_min_living, 4);
        assert!(rules.validate(&Catalog::trouble_brewing()).is_ok());
    }

    #[test]
    fn test_human_seat_out_of_range() {
        let rules = RulesConfig {
            human_seat: 9,
            ..RulesConfig::default()
        };
        assert!(rules.validate(&Catalog::trouble_brewing()).is_err());
    }
}

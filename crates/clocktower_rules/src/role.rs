//! Role catalog for the Trouble Brewing script.
//!
//! Every character is a variant of [`Role`]. Its capabilities (type, night
//! window, ability shape) come from a single `const` table, so the engine
//! never branches on role names at runtime.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tracing::instrument;

/// Character type printed on the token.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumIter,
)]
pub enum RoleType {
    /// Good, with a useful ability.
    Townsfolk,
    /// Good, with a harmful ability.
    Outsider,
    /// Evil helper of the Demon.
    Minion,
    /// Evil killer. The game ends when it dies without an heir.
    Demon,
}

impl RoleType {
    /// Team this type plays for.
    pub fn alignment(self) -> Alignment {
        match self {
            RoleType::Townsfolk | RoleType::Outsider => Alignment::Good,
            RoleType::Minion | RoleType::Demon => Alignment::Evil,
        }
    }
}

/// Good or Evil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum Alignment {
    /// Townsfolk and Outsiders.
    Good,
    /// Minions and the Demon.
    Evil,
}

/// Which nights a role wakes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NightWindow {
    /// Never wakes.
    Never,
    /// Setup night only (`day_count == 0`).
    FirstNightOnly,
    /// Every night except the setup night.
    OtherNights,
    /// Every night, setup night included.
    EveryNight,
    /// Only once an execution has happened.
    AfterExecution,
    /// Only on the night the seat is marked to die.
    OnDeath,
}

/// What a seat learns from an informational ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Information {
    /// Number of adjacent Evil pairs around the table.
    EvilPairs,
    /// Number of Evil living neighbours.
    EvilNeighbours,
    /// Whether either of two chosen seats is the Demon.
    DemonCheck,
    /// One of two seats holds a role of the given type.
    OneOfTwo(RoleType),
    /// Character of the last executed seat.
    LastExecution,
    /// Character of one chosen seat, learned on the way out.
    Corpse,
    /// Every seat's character.
    Grimoire,
}

/// Shape of a role's night ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ability {
    /// Nothing happens at night.
    Passive,
    /// Poisons one seat until the next night.
    Poison,
    /// Shields one other seat from the Demon.
    Protect,
    /// Marks one seat to die.
    Kill,
    /// Picks the seat whose vote the Butler must follow.
    ChooseMaster,
    /// Learns something.
    Inform(Information),
}

/// Capability record resolved once per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleTraits {
    /// Token type.
    pub role_type: RoleType,
    /// Night ability.
    pub ability: Ability,
    /// Nights the role wakes on.
    pub window: NightWindow,
    /// Number of seats the ability asks for (0 when no choice is made).
    pub targets: usize,
}

/// Every Trouble Brewing character.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
pub enum Role {
    /// Learns that one of two seats is a particular Townsfolk.
    Washerwoman,
    /// Learns that one of two seats is a particular Outsider.
    Librarian,
    /// Learns that one of two seats is a particular Minion.
    Investigator,
    /// Learns how many Evil pairs sit together.
    Chef,
    /// Learns how many living neighbours are Evil.
    Empath,
    /// Chooses two seats and learns if either is the Demon.
    #[strum(to_string = "Fortune Teller")]
    FortuneTeller,
    /// Learns the character of today's executed seat.
    Undertaker,
    /// Protects another seat from the Demon.
    Monk,
    /// Learns a seat's character when dying at night.
    Ravenkeeper,
    /// Executes a Townsfolk who nominates her.
    Virgin,
    /// Once per game, shoots a seat during the day.
    Slayer,
    /// Safe from the Demon.
    Soldier,
    /// No night ability in this engine.
    Mayor,
    /// Chooses a master and may only vote alongside them.
    Butler,
    /// Believes to be a Townsfolk.
    Drunk,
    /// Registers as Evil.
    Recluse,
    /// Loses the game for Good when executed.
    Saint,
    /// Poisons a seat each night.
    Poisoner,
    /// Sees the grimoire and registers as Good.
    Spy,
    /// Adds an Outsider at setup.
    Baron,
    /// Becomes the Demon when it dies.
    #[strum(to_string = "Scarlet Woman")]
    ScarletWoman,
    /// Kills each night.
    Imp,
}

/// Fixed order in which roles wake during a night.
pub const NIGHT_ORDER: [Role; 14] = [
    Role::Poisoner,
    Role::Monk,
    Role::ScarletWoman,
    Role::Imp,
    Role::Ravenkeeper,
    Role::Undertaker,
    Role::Washerwoman,
    Role::Librarian,
    Role::Investigator,
    Role::Chef,
    Role::Empath,
    Role::FortuneTeller,
    Role::Butler,
    Role::Spy,
];

/// Role handed to the Drunk when every Townsfolk is already in play.
pub const DRUNK_FALLBACK: Role = Role::Soldier;

impl Role {
    /// Capability record for this role.
    pub const fn traits(self) -> RoleTraits {
        use Ability::*;
        use NightWindow::*;
        use RoleType::*;
        let (role_type, ability, window, targets) = match self {
            Role::Washerwoman => (Townsfolk, Inform(Information::OneOfTwo(Townsfolk)), FirstNightOnly, 0),
            Role::Librarian => (Townsfolk, Inform(Information::OneOfTwo(Outsider)), FirstNightOnly, 0),
            Role::Investigator => (Townsfolk, Inform(Information::OneOfTwo(Minion)), FirstNightOnly, 0),
            Role::Chef => (Townsfolk, Inform(Information::EvilPairs), FirstNightOnly, 0),
            Role::Empath => (Townsfolk, Inform(Information::EvilNeighbours), EveryNight, 0),
            Role::FortuneTeller => (Townsfolk, Inform(Information::DemonCheck), EveryNight, 2),
            Role::Undertaker => (Townsfolk, Inform(Information::LastExecution), AfterExecution, 0),
            Role::Monk => (Townsfolk, Protect, EveryNight, 1),
            Role::Ravenkeeper => (Townsfolk, Inform(Information::Corpse), OnDeath, 1),
            Role::Virgin => (Townsfolk, Passive, Never, 0),
            Role::Slayer => (Townsfolk, Passive, Never, 0),
            Role::Soldier => (Townsfolk, Passive, Never, 0),
            Role::Mayor => (Townsfolk, Passive, Never, 0),
            Role::Butler => (Outsider, ChooseMaster, EveryNight, 1),
            Role::Drunk => (Outsider, Passive, Never, 0),
            Role::Recluse => (Outsider, Passive, Never, 0),
            Role::Saint => (Outsider, Passive, Never, 0),
            Role::Poisoner => (Minion, Poison, EveryNight, 1),
            Role::Spy => (Minion, Inform(Information::Grimoire), EveryNight, 0),
            Role::Baron => (Minion, Passive, Never, 0),
            Role::ScarletWoman => (Minion, Passive, EveryNight, 0),
            Role::Imp => (Demon, Kill, OtherNights, 1),
        };
        RoleTraits {
            role_type,
            ability,
            window,
            targets,
        }
    }

    /// Token type.
    pub const fn role_type(self) -> RoleType {
        self.traits().role_type
    }

    /// Team this role plays for.
    pub fn alignment(self) -> Alignment {
        self.role_type().alignment()
    }

    /// Whether waking this role asks the seat to choose targets.
    pub const fn needs_target(self) -> bool {
        self.traits().targets > 0
    }

    /// Position in [`NIGHT_ORDER`], if the role wakes at all.
    pub fn wake_index(self) -> Option<usize> {
        NIGHT_ORDER.iter().position(|r| *r == self)
    }

    /// Whether this role setting up the game swaps a Townsfolk for an Outsider.
    pub const fn adds_outsider(self) -> bool {
        matches!(self, Role::Baron)
    }

    /// Parses a role name loosely (case and whitespace insensitive).
    #[instrument]
    pub fn parse_loose(name: &str) -> Option<Role> {
        let wanted = normalize(name);
        Role::iter().find(|role| normalize(&role.to_string()) == wanted)
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// The set of roles a game may draw from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    roles: Vec<Role>,
}

impl Catalog {
    /// The full Trouble Brewing script.
    #[instrument]
    pub fn trouble_brewing() -> Self {
        Self {
            roles: Role::iter().collect(),
        }
    }

    /// A catalog restricted to the given roles.
    pub fn from_roles(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            roles: roles.into_iter().collect(),
        }
    }

    /// All roles in catalog order.
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// Roles of one type, in catalog order.
    pub fn of_type(&self, role_type: RoleType) -> Vec<Role> {
        self.roles
            .iter()
            .copied()
            .filter(|r| r.role_type() == role_type)
            .collect()
    }

    /// Good roles (Townsfolk and Outsiders), in catalog order.
    pub fn good_roles(&self) -> Vec<Role> {
        self.roles
            .iter()
            .copied()
            .filter(|r| r.alignment() == Alignment::Good)
            .collect()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::trouble_brewing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_follows_type() {
        for role in Role::iter() {
            let expected = match role.role_type() {
                RoleType::Townsfolk | RoleType::Outsider => Alignment::Good,
                RoleType::Minion | RoleType::Demon => Alignment::Evil,
            };
            assert_eq!(role.alignment(), expected, "{role}");
        }
    }

    #[test]
    fn test_catalog_counts() {
        let catalog = Catalog::trouble_brewing();
        assert_eq!(catalog.of_type(RoleType::Townsfolk).len(), 13);
        assert_eq!(catalog.of_type(RoleType::Outsider).len(), 4);
        assert_eq!(catalog.of_type(RoleType::Minion).len(), 4);
        assert_eq!(catalog.of_type(RoleType::Demon).len(), 1);
    }

    #[test]
    fn test_target_required_roles() {
        let needs: Vec<Role> = Role::iter().filter(|r| r.needs_target()).collect();
        assert_eq!(
            needs,
            vec![
                Role::FortuneTeller,
                Role::Monk,
                Role::Ravenkeeper,
                Role::Butler,
                Role::Poisoner,
                Role::Imp,
            ]
        );
    }

    #[test]
    fn test_every_waking_role_is_in_night_order() {
        for role in Role::iter() {
            let wakes = role.traits().window != NightWindow::Never;
            assert_eq!(wakes, role.wake_index().is_some(), "{role}");
        }
    }

    #[test]
    fn test_parse_loose() {
        assert_eq!(Role::parse_loose("fortune teller"), Some(Role::FortuneTeller));
        assert_eq!(Role::parse_loose("ScarletWoman"), Some(Role::ScarletWoman));
        assert_eq!(Role::parse_loose(" IMP "), Some(Role::Imp));
        assert_eq!(Role::parse_loose("Villager"), None);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(Role::FortuneTeller.to_string(), "Fortune Teller");
        assert_eq!(Role::ScarletWoman.to_string(), "Scarlet Woman");
        assert_eq!(Role::Imp.to_string(), "Imp");
    }
}

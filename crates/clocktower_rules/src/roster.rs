//! Deals characters to seats.

use crate::config::Distribution;
use crate::error::ConfigError;
use crate::player::{Player, Seat};
use crate::role::{Catalog, DRUNK_FALLBACK, Role, RoleType};
use derive_getters::Getters;
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use tracing::{debug, info, instrument};

/// Temperaments handed to automated seats.
pub const PERSONALITIES: [&str; 5] = [
    "rational",
    "aggressive",
    "master of disguise",
    "cautious",
    "chaotic",
];

/// The outcome of dealing: one role per seat plus the hidden extras.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Roster {
    /// True roles in seat order.
    roles: Vec<Role>,
    /// What the Drunk believes to be, when a Drunk is in play.
    drunk_perception: Option<Role>,
    /// Good characters not in play, for the Demon to claim.
    bluffs: Vec<Role>,
}

/// Draws a roster from a catalog according to a distribution.
#[derive(Debug, Clone)]
pub struct RosterBuilder<'a> {
    catalog: &'a Catalog,
    distribution: Distribution,
}

impl<'a> RosterBuilder<'a> {
    /// Creates a builder over `catalog`.
    pub fn new(catalog: &'a Catalog, distribution: Distribution) -> Self {
        Self {
            catalog,
            distribution,
        }
    }

    /// Deals a complete roster.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the distribution asks for more roles of a
    /// type than the catalog holds.
    #[instrument(skip(self, rng), fields(seats = self.distribution.total()))]
    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Roster, ConfigError> {
        let mut pool = self.draw_pool(rng)?;
        self.apply_setup_adjustment(&mut pool, rng);
        pool.shuffle(rng);

        let drunk_perception = pool
            .contains(&Role::Drunk)
            .then(|| self.drunk_perception(&pool, rng));
        let bluffs = self.bluffs(&pool, drunk_perception, rng);

        info!(roles = ?pool, ?drunk_perception, ?bluffs, "Roster dealt");
        Ok(Roster {
            roles: pool,
            drunk_perception,
            bluffs,
        })
    }

    /// Samples the configured count from each type without replacement.
    fn draw_pool<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<Role>, ConfigError> {
        let mut pool = Vec::with_capacity(self.distribution.total());
        for role_type in [
            RoleType::Townsfolk,
            RoleType::Outsider,
            RoleType::Minion,
            RoleType::Demon,
        ] {
            let wanted = self.distribution.count(role_type);
            let available = self.catalog.of_type(role_type);
            if wanted > available.len() {
                return Err(ConfigError::new(format!(
                    "Cannot draw {} {} roles from {}",
                    wanted,
                    role_type,
                    available.len()
                )));
            }
            pool.extend(available.choose_multiple(rng, wanted).copied());
        }
        debug!(?pool, "Initial pool drawn");
        Ok(pool)
    }

    /// Swaps one Townsfolk for an unused Outsider when the pool holds the Baron.
    ///
    /// Does nothing unless both a Townsfolk to remove and an Outsider to add
    /// exist, so the seat count never changes.
    fn apply_setup_adjustment<R: Rng + ?Sized>(&self, pool: &mut Vec<Role>, rng: &mut R) {
        if !pool.iter().any(|r| r.adds_outsider()) {
            return;
        }

        let townsfolk: Vec<usize> = pool
            .iter()
            .enumerate()
            .filter(|(_, r)| r.role_type() == RoleType::Townsfolk)
            .map(|(i, _)| i)
            .collect();
        let unused_outsiders: Vec<Role> = self
            .catalog
            .of_type(RoleType::Outsider)
            .into_iter()
            .filter(|r| !pool.contains(r))
            .collect();

        if let (Some(&index), Some(&outsider)) =
            (townsfolk.choose(rng), unused_outsiders.choose(rng))
        {
            let removed = pool.remove(index);
            pool.push(outsider);
            info!(%removed, added = %outsider, "Baron in play: Townsfolk swapped for Outsider");
        } else {
            debug!("Baron in play but no swap available");
        }
    }

    /// Picks an unused Townsfolk for the Drunk to believe in.
    fn drunk_perception<R: Rng + ?Sized>(&self, pool: &[Role], rng: &mut R) -> Role {
        let unused: Vec<Role> = self
            .catalog
            .of_type(RoleType::Townsfolk)
            .into_iter()
            .filter(|r| !pool.contains(r))
            .collect();
        unused.choose(rng).copied().unwrap_or(DRUNK_FALLBACK)
    }

    /// Samples up to three Good roles that nobody holds or believes to hold.
    fn bluffs<R: Rng + ?Sized>(
        &self,
        pool: &[Role],
        drunk_perception: Option<Role>,
        rng: &mut R,
    ) -> Vec<Role> {
        let unused: Vec<Role> = self
            .catalog
            .good_roles()
            .into_iter()
            .filter(|r| !pool.contains(r) && *r != Role::Drunk && Some(*r) != drunk_perception)
            .collect();
        unused.choose_multiple(rng, 3).copied().collect()
    }
}

impl Roster {
    /// Seats one player per role, with `human_seat` played by the human.
    #[instrument(skip(self, rng))]
    pub fn seat_players<R: Rng + ?Sized>(&self, human_seat: Seat, rng: &mut R) -> Vec<Player> {
        self.roles
            .iter()
            .enumerate()
            .map(|(index, role)| {
                let seat = Seat::new(index as u8 + 1);
                let personality = PERSONALITIES[rng.random_range(0..PERSONALITIES.len())];
                let mut player = Player::new(seat, seat == human_seat, *role, personality);
                if *role == Role::Drunk {
                    player.make_drunk(self.drunk_perception.unwrap_or(DRUNK_FALLBACK));
                }
                player
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn six_seats() -> Distribution {
        Distribution::default()
    }

    #[test]
    fn test_roster_fills_every_seat() {
        let catalog = Catalog::trouble_brewing();
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let roster = RosterBuilder::new(&catalog, six_seats())
                .build(&mut rng)
                .expect("valid distribution");
            assert_eq!(roster.roles().len(), 6, "seed {seed}");
            let demons = roster
                .roles
                .iter()
                .filter(|r| r.role_type() == RoleType::Demon)
                .count();
            assert_eq!(demons, 1, "seed {seed}");
        }
    }

    #[test]
    fn test_baron_swaps_exactly_one_townsfolk() {
        let catalog = Catalog::trouble_brewing();
        let mut seen = 0;
        for seed in 0..400 {
            let mut rng = StdRng::seed_from_u64(seed);
            let roster = RosterBuilder::new(&catalog, six_seats())
                .build(&mut rng)
                .expect("valid distribution");
            let count = |t: RoleType| roster.roles().iter().filter(|r| r.role_type() == t).count();
            if roster.roles().contains(&Role::Baron) {
                seen += 1;
                assert_eq!(count(RoleType::Townsfolk), 2, "seed {seed}");
                assert_eq!(count(RoleType::Outsider), 2, "seed {seed}");
            } else {
                assert_eq!(count(RoleType::Townsfolk), 3, "seed {seed}");
                assert_eq!(count(RoleType::Outsider), 1, "seed {seed}");
            }
            assert_eq!(roster.roles().len(), 6);
        }
        assert!(seen > 0, "Baron never drawn in 400 seeds");
    }

    #[test]
    fn test_roles_are_unique() {
        let catalog = Catalog::trouble_brewing();
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let roster = RosterBuilder::new(&catalog, six_seats())
                .build(&mut rng)
                .expect("valid distribution");
            let mut sorted = roster.roles().clone();
            sorted.sort();
            sorted.dedup();
            assert_eq!(sorted.len(), roster.roles().len(), "seed {seed}");
        }
    }

    #[test]
    fn test_drunk_believes_unused_townsfolk() {
        let catalog = Catalog::trouble_brewing();
        let mut seen = 0;
        for seed in 0..400 {
            let mut rng = StdRng::seed_from_u64(seed);
            let roster = RosterBuilder::new(&catalog, six_seats())
                .build(&mut rng)
                .expect("valid distribution");
            if !roster.roles().contains(&Role::Drunk) {
                assert_eq!(*roster.drunk_perception(), None);
                continue;
            }
            seen += 1;
            let perceived = roster.drunk_perception().expect("drunk in play");
            assert_eq!(perceived.role_type(), RoleType::Townsfolk);
            assert!(!roster.roles().contains(&perceived), "seed {seed}");

            let players = roster.seat_players(Seat::new(4), &mut rng);
            let drunk = players
                .iter()
                .find(|p| p.true_role == Role::Drunk)
                .expect("drunk seated");
            assert!(drunk.is_drunk);
            assert_eq!(drunk.perceived_role, perceived);
        }
        assert!(seen > 0, "Drunk never drawn in 400 seeds");
    }

    #[test]
    fn test_drunk_falls_back_when_every_townsfolk_is_used() {
        let catalog = Catalog::from_roles([Role::Chef, Role::Empath, Role::Drunk, Role::Imp]);
        let distribution = Distribution {
            townsfolk: 2,
            outsider: 1,
            minion: 0,
            demon: 1,
        };
        let mut rng = StdRng::seed_from_u64(7);
        let roster = RosterBuilder::new(&catalog, distribution)
            .build(&mut rng)
            .expect("valid distribution");
        assert_eq!(*roster.drunk_perception(), Some(DRUNK_FALLBACK));
    }

    #[test]
    fn test_bluffs_are_good_and_out_of_play() {
        let catalog = Catalog::trouble_brewing();
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let roster = RosterBuilder::new(&catalog, six_seats())
                .build(&mut rng)
                .expect("valid distribution");
            assert_eq!(roster.bluffs().len(), 3);
            for bluff in roster.bluffs() {
                assert_eq!(bluff.alignment(), crate::role::Alignment::Good);
                assert!(!roster.roles().contains(bluff));
                assert_ne!(*bluff, Role::Drunk);
                assert_ne!(Some(*bluff), *roster.drunk_perception());
            }
        }
    }

    #[test]
    fn test_small_pool_yields_fewer_bluffs() {
        let catalog = Catalog::from_roles([Role::Chef, Role::Empath, Role::Monk, Role::Imp]);
        let distribution = Distribution {
            townsfolk: 2,
            outsider: 0,
            minion: 0,
            demon: 1,
        };
        let mut rng = StdRng::seed_from_u64(1);
        let roster = RosterBuilder::new(&catalog, distribution)
            .build(&mut rng)
            .expect("valid distribution");
        assert_eq!(roster.bluffs().len(), 1);
    }

    #[test]
    fn test_overdrawn_distribution_fails() {
        let catalog = Catalog::from_roles([Role::Chef, Role::Imp]);
        let distribution = Distribution {
            townsfolk: 2,
            outsider: 0,
            minion: 0,
            demon: 1,
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert!(RosterBuilder::new(&catalog, distribution).build(&mut rng).is_err());
    }

    #[test]
    fn test_same_seed_same_roster() {
        let catalog = Catalog::trouble_brewing();
        let a = RosterBuilder::new(&catalog, six_seats())
            .build(&mut StdRng::seed_from_u64(99))
            .expect("valid");
        let b = RosterBuilder::new(&catalog, six_seats())
            .build(&mut StdRng::seed_from_u64(99))
            .expect("valid");
        assert_eq!(a, b);
    }
}

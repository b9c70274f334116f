//! True readings for informational roles.
//!
//! Everything here is pure: it looks at the state and returns the statement a
//! sober, healthy seat would receive. Replacing it with misinformation for
//! impaired seats is the night engine's job.

use crate::player::{Player, Seat};
use crate::role::{Ability, Alignment, Information, Role, RoleType};
use crate::state::GameState;
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use tracing::{debug, instrument};

/// Alignment as registered by abilities. The Spy reads Good, the Recluse Evil.
pub fn apparent_alignment(player: &Player) -> Alignment {
    match player.true_role {
        Role::Spy => Alignment::Good,
        Role::Recluse => Alignment::Evil,
        _ => player.alignment,
    }
}

/// Type as registered by abilities. The Spy reads Townsfolk, the Recluse Minion.
pub fn apparent_type(player: &Player) -> RoleType {
    match player.true_role {
        Role::Spy => RoleType::Townsfolk,
        Role::Recluse => RoleType::Minion,
        other => other.role_type(),
    }
}

/// The statement `actor` would learn with a working ability, or `None` if its
/// role learns nothing tonight.
///
/// `targets` must already be validated seats at this table.
#[instrument(skip(state, rng), fields(role = ?state.player(actor).map(|p| p.perceived_role)))]
pub fn true_information<R: Rng + ?Sized>(
    state: &GameState,
    actor: Seat,
    targets: &[Seat],
    rng: &mut R,
) -> Option<String> {
    let player = state.player(actor)?;
    let Ability::Inform(kind) = player.perceived_role.traits().ability else {
        return None;
    };

    let info = match kind {
        Information::EvilPairs => Some(evil_pairs(state)),
        Information::EvilNeighbours => evil_neighbours(state, actor),
        Information::DemonCheck => demon_check(state, targets),
        Information::OneOfTwo(role_type) => Some(one_of_two(state, actor, role_type, rng)),
        Information::LastExecution => last_execution(state),
        Information::Corpse => corpse(state, targets),
        Information::Grimoire => Some(grimoire(state)),
    };
    debug!(?info, "True information computed");
    info
}

fn evil_pairs(state: &GameState) -> String {
    let players = state.players();
    let count = players.len();
    let pairs = (0..count)
        .filter(|&i| {
            apparent_alignment(&players[i]) == Alignment::Evil
                && apparent_alignment(&players[(i + 1) % count]) == Alignment::Evil
        })
        .count();
    format!("There are {pairs} pairs of evil players sitting next to each other.")
}

fn evil_neighbours(state: &GameState, actor: Seat) -> Option<String> {
    let alive: Vec<&Player> = state.living().collect();
    let index = alive.iter().position(|p| p.seat == actor)?;
    let len = alive.len();
    let left = alive[(index + len - 1) % len];
    let right = alive[(index + 1) % len];

    let evil = [left, right]
        .into_iter()
        .filter(|p| p.seat != actor && apparent_alignment(p) == Alignment::Evil)
        .count();
    Some(format!("{evil} of your living neighbours are evil."))
}

fn demon_check(state: &GameState, targets: &[Seat]) -> Option<String> {
    let [first, second, ..] = targets else {
        return None;
    };
    let reads_as_demon = |seat: &Seat| {
        state.player(*seat).is_some_and(|p| {
            p.true_role.role_type() == RoleType::Demon || p.true_role == Role::Recluse
        })
    };
    let found = reads_as_demon(first) || reads_as_demon(second);
    Some(if found {
        format!("Reading on seats {first} and {second}: there is a Demon among them.")
    } else {
        format!("Reading on seats {first} and {second}: there is no Demon among them.")
    })
}

fn one_of_two<R: Rng + ?Sized>(
    state: &GameState,
    actor: Seat,
    role_type: RoleType,
    rng: &mut R,
) -> String {
    let pool: Vec<&Player> = state
        .players()
        .iter()
        .filter(|p| p.seat != actor && apparent_type(p) == role_type)
        .collect();

    let Some(matched) = pool.choose(rng) else {
        return match role_type {
            RoleType::Townsfolk => "There are no other Townsfolk.".to_string(),
            RoleType::Outsider => "There are no Outsiders in play.".to_string(),
            RoleType::Minion => "There are no Minions in play.".to_string(),
            RoleType::Demon => "There is no Demon in play.".to_string(),
        };
    };

    let others: Vec<Seat> = state
        .players()
        .iter()
        .map(|p| p.seat)
        .filter(|s| *s != matched.seat && *s != actor)
        .collect();
    let decoy = others.choose(rng).copied().unwrap_or(matched.seat);

    let mut seats = [matched.seat, decoy];
    seats.shuffle(rng);
    // The pool follows registration; the name is always the real one.
    format!(
        "One of seats {} and {} is the {}.",
        seats[0], seats[1], matched.true_role
    )
}

fn last_execution(state: &GameState) -> Option<String> {
    let executed = state.player(state.last_executed()?)?;
    let shown = match executed.true_role {
        Role::Spy => "Townsfolk".to_string(),
        other => other.to_string(),
    };
    Some(format!("The player executed yesterday was the {shown}."))
}

fn corpse(state: &GameState, targets: &[Seat]) -> Option<String> {
    let target = state.player(*targets.first()?)?;
    let shown = match target.true_role {
        Role::Spy => "Townsfolk".to_string(),
        Role::Recluse => Role::Poisoner.to_string(),
        other => other.to_string(),
    };
    Some(format!("Seat {} is the {shown}.", target.seat))
}

fn grimoire(state: &GameState) -> String {
    let entries: Vec<String> = state
        .players()
        .iter()
        .map(|p| format!("{}:{}", p.seat, p.true_role))
        .collect();
    format!("Grimoire: {}", entries.join(", "))
}

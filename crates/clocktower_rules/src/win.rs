//! Win evaluation after a death.

use crate::player::Seat;
use crate::role::{Alignment, Role, RoleType};
use crate::state::GameState;
use tracing::{debug, info, instrument};

/// How a seat died. Only executions can trigger the Saint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum DeathCause {
    /// Voted out, or struck down by the Virgin.
    Execution,
    /// Killed during the night sweep.
    Night,
    /// Shot during the day.
    DayAbility,
}

/// Outcome of evaluating one death.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Nobody has won yet.
    Continue,
    /// The game is over.
    Winner(Alignment),
    /// The Demon died and the seat takes over as Demon.
    Inherit(Seat),
}

/// Decides what a death means without touching the state.
///
/// Rules, in order: an unimpaired Saint executed hands Evil the game; a dead
/// Demon passes to a healthy Scarlet Woman while at least `min_living` seats
/// live, otherwise Good wins; with the Demon alive, Evil wins at two living
/// seats, or at three when two of them are Evil.
#[instrument(skip(state))]
pub fn evaluate(state: &GameState, dead: Seat, cause: DeathCause, min_living: usize) -> Verdict {
    let Some(victim) = state.player(dead) else {
        return Verdict::Continue;
    };

    if cause == DeathCause::Execution && victim.true_role == Role::Saint && !victim.is_impaired() {
        debug!("Saint executed");
        return Verdict::Winner(Alignment::Evil);
    }

    let living = state.living_count();

    if victim.true_role.role_type() == RoleType::Demon {
        let heir = state
            .living()
            .find(|p| p.true_role == Role::ScarletWoman && !p.is_impaired());
        return match heir {
            Some(heir) if living >= min_living => Verdict::Inherit(heir.seat),
            _ => Verdict::Winner(Alignment::Good),
        };
    }

    if state.demon_alive() {
        if living <= 2 {
            return Verdict::Winner(Alignment::Evil);
        }
        if living == 3 && state.living_evil_count() >= 2 {
            return Verdict::Winner(Alignment::Evil);
        }
    }

    Verdict::Continue
}

/// Evaluates a death and applies the result to the state.
///
/// Inheritance replaces the heir's true and perceived role with the Imp.
#[instrument(skip(state))]
pub fn resolve_death(
    state: &mut GameState,
    dead: Seat,
    cause: DeathCause,
    min_living: usize,
) -> Verdict {
    let verdict = evaluate(state, dead, cause, min_living);
    match verdict {
        Verdict::Continue => {}
        Verdict::Winner(team) => state.declare_winner(team),
        Verdict::Inherit(heir) => {
            if let Some(player) = state.player_mut(heir) {
                player.inherit(Role::Imp);
                info!(seat = %heir, "Scarlet Woman becomes the Demon");
            }
        }
    }
    verdict
}

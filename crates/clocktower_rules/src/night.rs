//! Night resolution: wake order, abilities, information and deaths.

use crate::error::GameError;
use crate::game::Game;
use crate::info::true_information;
use crate::oracle::{DecisionKind, parse_targets};
use crate::player::Seat;
use crate::role::{Ability, Alignment, NIGHT_ORDER, NightWindow, Role, RoleType};
use crate::state::GameState;
use crate::win::DeathCause;
use tracing::{debug, info, instrument, warn};

/// Prefix on readings that may be false.
pub const UNRELIABLE_PREFIX: &str = "[unreliable]";

/// Reading given to an impaired seat when no fabrication is available.
pub const DIZZY_MESSAGE: &str = "[unreliable] You feel dizzy and learn nothing useful.";

/// What resolving one night action did to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Nothing: no target, an impaired seat, or a passive role.
    None,
    /// The seat is poisoned until the next night.
    Poisoned(Seat),
    /// The seat is safe from the Demon tonight.
    Protected(Seat),
    /// The seat will die when the night resolves.
    Marked(Seat),
    /// The Butler follows this seat's vote.
    MasterChosen(Seat),
    /// The actor learns something; see [`true_information`].
    Inform,
}

/// Whether a role with `window` wakes on night `night`.
pub fn wakes_tonight(window: NightWindow, night: u32, has_execution: bool) -> bool {
    match window {
        NightWindow::Never => false,
        NightWindow::FirstNightOnly => night == 0,
        NightWindow::OtherNights => night > 0,
        NightWindow::EveryNight | NightWindow::OnDeath => true,
        NightWindow::AfterExecution => has_execution,
    }
}

/// Applies `actor`'s ability to the table.
///
/// The ability shape comes from the perceived role. Harmful and protective
/// abilities only work for a seat that truly holds its role and is not
/// impaired; the Butler records a master regardless. `targets` must already
/// be seats at this table.
#[instrument(skip(state))]
pub fn apply_effect(state: &mut GameState, actor: Seat, targets: &[Seat]) -> Effect {
    let Some(player) = state.player(actor) else {
        return Effect::None;
    };
    let has_ability = player.has_ability();
    let ability = player.perceived_role.traits().ability;
    let target = targets.first().copied();

    let effect = match (ability, target) {
        (Ability::Inform(_), _) => Effect::Inform,
        (Ability::Passive, _) | (_, None) => Effect::None,
        (Ability::Poison, Some(t)) if has_ability => {
            if let Some(p) = state.player_mut(t) {
                p.is_poisoned = true;
            }
            Effect::Poisoned(t)
        }
        (Ability::Protect, Some(t)) if has_ability && t != actor => {
            if let Some(p) = state.player_mut(t) {
                p.is_protected = true;
            }
            Effect::Protected(t)
        }
        (Ability::Kill, Some(t)) if has_ability => {
            if let Some(p) = state.player_mut(t) {
                p.is_demon_target = true;
                p.pending_death = true;
            }
            Effect::Marked(t)
        }
        (Ability::ChooseMaster, Some(t)) if t != actor => {
            if let Some(p) = state.player_mut(actor) {
                p.master = Some(t);
            }
            Effect::MasterChosen(t)
        }
        _ => Effect::None,
    };
    debug!(?effect, has_ability, "Night action resolved");
    effect
}

impl Game {
    /// Runs one night: reset, setup-night planning, wake order, death sweep.
    ///
    /// # Errors
    ///
    /// Fails only when the human input closes or a death breaks an invariant.
    #[instrument(skip(self), fields(night = self.state.day_count()))]
    pub async fn run_night(&mut self) -> Result<(), GameError> {
        let night = self.state.day_count();
        self.say(&format!("\n>>> Night {night} falls. Everyone close your eyes. <<<"));
        self.state.begin_night();
        self.notify();

        if night == 0 {
            self.run_setup_night().await?;
        }

        for role in NIGHT_ORDER {
            let traits = role.traits();
            if !wakes_tonight(traits.window, night, self.state.last_executed().is_some()) {
                continue;
            }
            let actors: Vec<Seat> = self
                .state
                .living()
                .filter(|p| p.perceived_role == role)
                .filter(|p| traits.window != NightWindow::OnDeath || p.pending_death)
                .map(|p| p.seat)
                .collect();
            for actor in actors {
                self.process_night_action(actor).await?;
            }
        }

        self.resolve_night_deaths()?;
        self.say("\nDawn breaks.");
        Ok(())
    }

    /// Setup-night planning for automated seats, and the evil briefing chat
    /// when the human is Evil.
    #[instrument(skip(self))]
    async fn run_setup_night(&mut self) -> Result<(), GameError> {
        let team = self.evil_team();
        let bluffs = self.bluff_list();
        let demon_seat = self
            .state
            .players()
            .iter()
            .find(|p| p.true_role.role_type() == RoleType::Demon)
            .map(|p| p.seat.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let planners: Vec<Seat> = self
            .state
            .players()
            .iter()
            .filter(|p| !p.is_human)
            .map(|p| p.seat)
            .collect();

        for seat in planners {
            let Some(player) = self.state.player(seat) else {
                continue;
            };
            let situation = if player.true_role.role_type() == RoleType::Demon {
                format!(
                    "First night. You are the Demon. Your evil team: {team}. \
                     Characters not in play you may claim: {bluffs}. Choose the role you will claim."
                )
            } else if player.alignment == Alignment::Evil {
                format!(
                    "First night. You are a Minion. Your evil team: {team}. \
                     The Demon sits in seat {demon_seat}. Choose the role you will claim."
                )
            } else {
                "First night. Plan how you will use and share your information, \
                 and choose the role you will claim."
                    .to_string()
            };

            let Some(context) = self.context_for(seat, DecisionKind::Planning) else {
                continue;
            };
            let decision = self.consult(context.with_situation(situation)).await;

            let Some(player) = self.state.player_mut(seat) else {
                continue;
            };
            player.add_thought(0, &decision.thought);
            match decision.bluff_role.as_deref().map(Role::parse_loose) {
                Some(Some(bluff)) => {
                    debug!(%seat, %bluff, "Claim chosen");
                    player.bluff_role = bluff;
                }
                Some(None) => warn!(%seat, "Ignoring unknown claimed role"),
                None => {}
            }
        }

        let human = self.state.human();
        if human.alignment == Alignment::Evil {
            let human_seat = human.seat;
            let teammate = self
                .state
                .players()
                .iter()
                .find(|p| p.alignment == Alignment::Evil && !p.is_human)
                .map(|p| p.seat);
            if let Some(teammate) = teammate {
                self.say(&format!(
                    "\n>>> You are Evil. You meet your teammate in seat {teammate} in secret. <<<"
                ));
                self.run_private_chat(human_seat, teammate, 0).await?;
            }
        }
        Ok(())
    }

    /// Wakes one seat: asks for targets when its role needs them, then
    /// applies the ability and delivers any information.
    #[instrument(skip(self))]
    async fn process_night_action(&mut self, actor: Seat) -> Result<(), GameError> {
        let Some(player) = self.state.player(actor) else {
            return Ok(());
        };
        let role = player.perceived_role;
        let is_human = player.is_human;

        let raw = if !role.needs_target() {
            Vec::new()
        } else if is_human {
            let wanted = role.traits().targets;
            self.say(&format!("\n>>> Your turn ({role}) <<<"));
            let answer = self
                .ask_human(&format!(
                    "Choose {wanted} target seat(s), separated by spaces, or press Enter for none: "
                ))
                .await?;
            parse_targets(&answer)
        } else {
            let night = self.state.day_count();
            let candidates: Vec<Seat> = self.state.players().iter().map(|p| p.seat).collect();
            match self.context_for(actor, DecisionKind::NightAction) {
                Some(context) => {
                    let decision = self
                        .consult(
                            context
                                .with_situation(format!(
                                    "Night {night}. Use your ability as the {role}: choose {} seat(s).",
                                    role.traits().targets
                                ))
                                .with_candidates(candidates),
                        )
                        .await;
                    if let Some(p) = self.state.player_mut(actor) {
                        p.add_thought(night, &decision.thought);
                    }
                    decision.targets
                }
                None => Vec::new(),
            }
        };

        let targets = self.valid_targets(&raw);
        if targets.len() != raw.len() {
            warn!(?raw, ?targets, "Ignoring out-of-range targets");
        }

        match apply_effect(&mut self.state, actor, &targets) {
            Effect::Inform => self.deliver_information(actor, &targets).await,
            Effect::MasterChosen(master) if is_human => {
                self.say(&format!("--> Your master tonight is seat {master}."));
            }
            _ => {}
        }
        Ok(())
    }

    /// Keeps only numbers that name a seat at this table.
    pub(crate) fn valid_targets(&self, raw: &[i64]) -> Vec<Seat> {
        raw.iter().filter_map(|n| self.state.seat_at(*n)).collect()
    }

    /// Gives `actor` its reading, or misinformation if it is impaired.
    #[instrument(skip(self))]
    async fn deliver_information(&mut self, actor: Seat, targets: &[Seat]) {
        let Some(truth) = true_information(&self.state, actor, targets, &mut self.rng) else {
            return;
        };
        let impaired = self.state.player(actor).is_some_and(|p| p.is_impaired());

        let message = if impaired {
            info!(seat = %actor, "Impaired seat receives misinformation");
            self.misinformation(actor, &truth).await
        } else {
            truth
        };

        if let Some(player) = self.state.player_mut(actor) {
            player.night_messages.push(message);
        }
    }

    /// Asks the oracle for a believable false reading.
    async fn misinformation(&self, actor: Seat, truth: &str) -> String {
        let Some(context) = self.context_for(actor, DecisionKind::Misinformation) else {
            return DIZZY_MESSAGE.to_string();
        };
        let role = context.claimed_role;
        let decision = self
            .consult(
                context
                    .with_situation(format!(
                        "Invent a believable but false reading for a {role} in the same format \
                         as the truth."
                    ))
                    .with_hidden_truth(truth),
            )
            .await;
        let fake = decision.text.trim();
        if fake.is_empty() {
            DIZZY_MESSAGE.to_string()
        } else {
            format!("{UNRELIABLE_PREFIX} {fake}")
        }
    }

    /// Kills every marked seat that is neither protected nor a Soldier.
    #[instrument(skip(self))]
    fn resolve_night_deaths(&mut self) -> Result<(), GameError> {
        let marked: Vec<Seat> = self
            .state
            .players()
            .iter()
            .filter(|p| p.pending_death)
            .map(|p| p.seat)
            .collect();

        for seat in marked {
            let Some(player) = self.state.player_mut(seat) else {
                continue;
            };
            if player.is_protected
                || player.true_role == Role::Soldier
                || player.perceived_role == Role::Soldier
            {
                debug!(%seat, "Night kill prevented");
                continue;
            }
            if player.kill() {
                info!(%seat, "Killed in the night");
                self.state.record_night_death(seat);
                if !self.state.is_over() {
                    self.apply_death(seat, DeathCause::Night)?;
                }
            }
        }
        self.notify();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Player;

    fn table(roles: &[Role]) -> GameState {
        let players = roles
            .iter()
            .enumerate()
            .map(|(i, r)| Player::new(Seat::new(i as u8 + 1), i == 0, *r, "rational"))
            .collect();
        GameState::new(players, Vec::new()).expect("valid table")
    }

    #[test]
    fn test_wake_windows() {
        assert!(wakes_tonight(NightWindow::FirstNightOnly, 0, false));
        assert!(!wakes_tonight(NightWindow::FirstNightOnly, 1, false));
        assert!(!wakes_tonight(NightWindow::OtherNights, 0, false));
        assert!(wakes_tonight(NightWindow::OtherNights, 2, false));
        assert!(!wakes_tonight(NightWindow::AfterExecution, 3, false));
        assert!(wakes_tonight(NightWindow::AfterExecution, 3, true));
        assert!(!wakes_tonight(NightWindow::Never, 0, true));
    }

    #[test]
    fn test_poisoner_poisons() {
        let mut state = table(&[Role::Poisoner, Role::Chef, Role::Imp]);
        let effect = apply_effect(&mut state, Seat::new(1), &[Seat::new(2)]);
        assert_eq!(effect, Effect::Poisoned(Seat::new(2)));
        assert!(state.player(Seat::new(2)).expect("seat").is_poisoned);
    }

    #[test]
    fn test_impaired_monk_never_protects() {
        let mut state = table(&[Role::Monk, Role::Chef, Role::Imp]);
        state.player_mut(Seat::new(1)).expect("seat").is_poisoned = true;
        assert_eq!(apply_effect(&mut state, Seat::new(1), &[Seat::new(2)]), Effect::None);
        assert!(state.players().iter().all(|p| !p.is_protected));

        let mut drunk = table(&[Role::Drunk, Role::Chef, Role::Imp]);
        drunk.player_mut(Seat::new(1)).expect("seat").make_drunk(Role::Monk);
        assert_eq!(apply_effect(&mut drunk, Seat::new(1), &[Seat::new(2)]), Effect::None);
        assert!(drunk.players().iter().all(|p| !p.is_protected));
    }

    #[test]
    fn test_monk_cannot_protect_self() {
        let mut state = table(&[Role::Monk, Role::Chef, Role::Imp]);
        assert_eq!(apply_effect(&mut state, Seat::new(1), &[Seat::new(1)]), Effect::None);
        assert!(!state.player(Seat::new(1)).expect("seat").is_protected);
    }

    #[test]
    fn test_demon_marks_target() {
        let mut state = table(&[Role::Chef, Role::Imp, Role::Monk]);
        assert_eq!(
            apply_effect(&mut state, Seat::new(2), &[Seat::new(3)]),
            Effect::Marked(Seat::new(3))
        );
        let target = state.player(Seat::new(3)).expect("seat");
        assert!(target.is_demon_target);
        assert!(target.pending_death);
    }

    #[test]
    fn test_poisoned_demon_kills_nobody() {
        let mut state = table(&[Role::Chef, Role::Imp, Role::Monk]);
        state.player_mut(Seat::new(2)).expect("seat").is_poisoned = true;
        assert_eq!(apply_effect(&mut state, Seat::new(2), &[Seat::new(3)]), Effect::None);
        assert!(!state.player(Seat::new(3)).expect("seat").pending_death);
    }

    #[test]
    fn test_impaired_butler_still_picks_master() {
        let mut state = table(&[Role::Chef, Role::Butler, Role::Imp]);
        state.player_mut(Seat::new(2)).expect("seat").is_poisoned = true;
        assert_eq!(
            apply_effect(&mut state, Seat::new(2), &[Seat::new(3)]),
            Effect::MasterChosen(Seat::new(3))
        );
        assert_eq!(state.player(Seat::new(2)).expect("seat").master, Some(Seat::new(3)));
    }

    #[test]
    fn test_no_target_no_effect() {
        let mut state = table(&[Role::Poisoner, Role::Chef, Role::Imp]);
        assert_eq!(apply_effect(&mut state, Seat::new(1), &[]), Effect::None);
    }

    #[test]
    fn test_informational_roles_defer_to_info() {
        let mut state = table(&[Role::Chef, Role::Spy, Role::Imp]);
        assert_eq!(apply_effect(&mut state, Seat::new(1), &[]), Effect::Inform);
        assert_eq!(apply_effect(&mut state, Seat::new(2), &[]), Effect::Inform);
    }
}

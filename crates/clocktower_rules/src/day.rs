//! The day: announcements, talk, the Slayer's shot, nominations and votes.

use crate::error::GameError;
use crate::game::Game;
use crate::oracle::{DecisionKind, parse_targets, parse_yes};
use crate::player::Seat;
use crate::role::{Role, RoleType};
use crate::state::GameState;
use crate::win::DeathCause;
use tracing::{debug, info, instrument, warn};

/// Votes needed to execute with `living` seats alive: half, rounded up.
pub fn vote_threshold(living: usize) -> usize {
    living.div_ceil(2)
}

/// Seats in voting order: starting after `nominator`, wrapping round.
pub fn voting_order(seat_count: usize, nominator: Seat) -> Vec<Seat> {
    let start = nominator.number() as usize % seat_count.max(1);
    (0..seat_count)
        .map(|k| Seat::new(((start + k) % seat_count) as u8 + 1))
        .collect()
}

/// Whether `voter` must keep its hand down.
///
/// Applies to a healthy Butler whose living master has already had a turn
/// in this pass (`earlier`) without raising a hand. A master who votes later
/// in the order does not restrict the Butler.
pub fn must_abstain(state: &GameState, earlier: &[Seat], voter: Seat) -> bool {
    let Some(butler) = state.player(voter) else {
        return false;
    };
    if butler.true_role != Role::Butler || butler.is_impaired() {
        return false;
    }
    let Some(master) = butler.master.and_then(|m| state.player(m)) else {
        return false;
    };
    master.is_alive && earlier.contains(&master.seat) && !master.has_voted_this_round
}

impl Game {
    /// Runs one day from dawn announcements to the last nomination.
    ///
    /// # Errors
    ///
    /// Fails only when the human input closes or a death breaks an invariant.
    #[instrument(skip(self))]
    pub async fn run_day(&mut self) -> Result<(), GameError> {
        self.state.begin_day();
        let day = self.state.day_count();
        self.say(&format!("\n\n>>> Day {day} <<<"));

        let deaths = self.state.tonight_deaths().to_vec();
        let announcement = if deaths.is_empty() {
            "Last night was peaceful. Nobody died.".to_string()
        } else {
            let seats = deaths
                .iter()
                .map(|s| format!("seat {s}"))
                .collect::<Vec<_>>()
                .join(", ");
            format!("Last night, {seats} died.")
        };
        self.say(&announcement);
        self.state.record_public(format!("Day {day}: {announcement}"));

        let messages = self.state.human().night_messages.clone();
        for message in messages {
            self.say(&format!("[Your night information]: {message}"));
        }
        self.notify();

        for round in 1..=self.rules.private_chat_rounds {
            self.run_chat_round(round).await?;
        }
        for round in 1..=self.rules.public_speech_rounds {
            self.run_public_speech(round).await?;
        }

        self.run_day_ability().await?;
        if self.state.is_over() {
            return Ok(());
        }

        self.say("\n--- Nominations ---");
        self.run_nomination_phase().await
    }

    /// Every living seat speaks once, in seat order.
    ///
    /// # Errors
    ///
    /// Fails only when the human input closes.
    #[instrument(skip(self))]
    pub async fn run_public_speech(&mut self, round: u32) -> Result<(), GameError> {
        self.say(&format!("\n[Public speeches, round {round}]"));
        let speakers: Vec<Seat> = self.state.living().map(|p| p.seat).collect();

        for seat in speakers {
            let is_human = self.state.player(seat).is_some_and(|p| p.is_human);
            let speech = if is_human {
                self.ask_human(&format!("\n--> Your turn to speak (seat {seat}): "))
                    .await?
            } else {
                let situation = format!(
                    "Day {}, public speech round {round}. Speak to the whole town.",
                    self.state.day_count()
                );
                self.automated_text(seat, DecisionKind::PublicSpeech, round, situation)
                    .await
            };
            self.announce(&format!("[Seat {seat}]: {speech}"));
        }
        Ok(())
    }

    /// The living human Slayer may take the once-per-game shot.
    #[instrument(skip(self))]
    async fn run_day_ability(&mut self) -> Result<(), GameError> {
        let human = self.state.human();
        if !human.is_alive || human.perceived_role != Role::Slayer || human.slayer_shot_used {
            return Ok(());
        }
        let shooter = human.seat;
        let real = human.true_role == Role::Slayer && !human.is_impaired();

        let answer = self
            .ask_human("\n[Ability] You are the Slayer. Enter a seat to shoot, or press Enter to skip: ")
            .await?;
        let Some(target) = parse_targets(&answer)
            .first()
            .and_then(|n| self.state.seat_at(*n))
        else {
            return Ok(());
        };

        if let Some(p) = self.state.player_mut(shooter) {
            p.slayer_shot_used = true;
        }
        self.announce(&format!("Seat {shooter} shoots at seat {target}!"));

        let hit = real
            && self.state.player(target).is_some_and(|p| {
                p.is_alive && p.true_role.role_type() == RoleType::Demon
            });
        if hit && self.state.player_mut(target).is_some_and(|p| p.kill()) {
            info!(%target, "Slayer killed the Demon");
            self.announce(&format!("Seat {target} was the Demon and dies!"));
            self.apply_death(target, DeathCause::DayAbility)?;
        } else {
            self.announce("Nothing happens.");
        }
        Ok(())
    }

    /// Nominations in seat order until one execution happens or everyone has
    /// had a turn.
    ///
    /// # Errors
    ///
    /// Fails only when the human input closes or a death breaks an invariant.
    #[instrument(skip(self))]
    pub async fn run_nomination_phase(&mut self) -> Result<(), GameError> {
        let order: Vec<Seat> = self.state.players().iter().map(|p| p.seat).collect();

        for nominator in order {
            if self.state.is_over() {
                break;
            }
            let Some(player) = self.state.player(nominator) else {
                continue;
            };
            if !player.is_alive || player.has_nominated {
                continue;
            }

            let Some((nominee, reason)) = self.choose_nomination(nominator).await? else {
                continue;
            };

            if let Some(p) = self.state.player_mut(nominator) {
                p.has_nominated = true;
            }
            self.state.record_nomination(nominee);
            self.announce(&format!(
                "Seat {nominator} nominates seat {nominee}. Reason: {reason}"
            ));
            self.run_defense(nominee).await?;

            if self.virgin_triggers(nominee, nominator) {
                self.announce(&format!(
                    "The Virgin's power triggers! Seat {nominator} is executed at once."
                ));
                self.execute(nominator)?;
                break;
            }

            if self.run_voting_phase(nominee, nominator).await? {
                self.execute(nominee)?;
                break;
            }
        }
        Ok(())
    }

    /// Asks a seat whether and whom to nominate. Invalid choices are ignored.
    async fn choose_nomination(&mut self, nominator: Seat) -> Result<Option<(Seat, String)>, GameError> {
        let eligible: Vec<Seat> = self
            .state
            .living()
            .map(|p| p.seat)
            .filter(|s| !self.state.nominated_today().contains(s))
            .collect();
        let is_human = self.state.player(nominator).is_some_and(|p| p.is_human);

        let (raw, reason) = if is_human {
            let answer = self
                .ask_human(&format!(
                    "\nSeat {nominator}, do you nominate someone? (seat number, Enter to skip): "
                ))
                .await?;
            match answer.trim().parse::<i64>() {
                Ok(n) => (Some(n), self.ask_human("Reason: ").await?),
                Err(_) => (None, String::new()),
            }
        } else {
            let Some(context) = self.context_for(nominator, DecisionKind::Nomination) else {
                return Ok(None);
            };
            let already = self
                .state
                .nominated_today()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            let decision = self
                .consult(
                    context
                        .with_situation(format!(
                            "Day {}, nominations. Already nominated today: [{already}]. \
                             Name one seat to nominate, or none to pass.",
                            self.state.day_count()
                        ))
                        .with_candidates(eligible.clone()),
                )
                .await;
            (decision.targets.first().copied(), decision.text)
        };

        let Some(raw) = raw else {
            return Ok(None);
        };
        match self.state.seat_at(raw).filter(|s| eligible.contains(s)) {
            Some(nominee) => Ok(Some((nominee, reason))),
            None => {
                warn!(%nominator, raw, "Ignoring invalid nomination");
                Ok(None)
            }
        }
    }

    /// The nominee speaks in their own defense.
    async fn run_defense(&mut self, nominee: Seat) -> Result<(), GameError> {
        let is_human = self.state.player(nominee).is_some_and(|p| p.is_human);
        let defense = if is_human {
            self.ask_human("--> Your defense: ").await?
        } else {
            let situation = format!(
                "Day {}, you have been nominated for execution. Defend yourself.",
                self.state.day_count()
            );
            self.automated_text(nominee, DecisionKind::Defense, 0, situation)
                .await
        };
        self.announce(&format!("[Seat {nominee} defends]: {defense}"));
        Ok(())
    }

    fn virgin_triggers(&self, nominee: Seat, nominator: Seat) -> bool {
        let Some(virgin) = self.state.player(nominee) else {
            return false;
        };
        let Some(nominator) = self.state.player(nominator) else {
            return false;
        };
        virgin.true_role == Role::Virgin
            && !virgin.is_impaired()
            && nominator.true_role.role_type() == RoleType::Townsfolk
    }

    /// Collects votes on `nominee` and reports whether the threshold was met.
    ///
    /// # Errors
    ///
    /// Fails only when the human input closes.
    #[instrument(skip(self))]
    pub async fn run_voting_phase(&mut self, nominee: Seat, nominator: Seat) -> Result<bool, GameError> {
        for player in self.state.players_mut() {
            player.has_voted_this_round = false;
        }
        let living = self.state.living_count();
        let threshold = vote_threshold(living);
        self.say(&format!(
            "\n=== Vote on seat {nominee}: {living} alive, {threshold} votes needed ==="
        ));

        let order = voting_order(self.state.seat_count(), nominator);
        let mut tally = 0;

        for (position, &voter) in order.iter().enumerate() {
            let Some(player) = self.state.player(voter) else {
                continue;
            };
            if player.vote_power() == 0 {
                self.say(&format!("--> Seat {voter}: no vote left."));
                continue;
            }
            let is_human = player.is_human;

            let mut raised = if is_human {
                let answer = self
                    .ask_human(&format!(
                        "Seat {voter}, vote to execute seat {nominee}? (y/n) [votes so far: {tally}]: "
                    ))
                    .await?;
                parse_yes(&answer)
            } else {
                match self.context_for(voter, DecisionKind::Vote) {
                    Some(context) => {
                        self.consult(
                            context
                                .with_situation(format!(
                                    "Vote on executing seat {nominee} (nominated by seat {nominator}). \
                                     Votes so far: {tally}, needed: {threshold}."
                                ))
                                .with_candidates(vec![nominee]),
                        )
                        .await
                        .vote
                    }
                    None => false,
                }
            };

            if raised && must_abstain(&self.state, &order[..position], voter) {
                self.say(&format!(
                    "--> Seat {voter}'s master did not vote, so their hand stays down."
                ));
                raised = false;
            }

            if raised {
                tally += 1;
                if let Some(p) = self.state.player_mut(voter) {
                    p.has_voted_this_round = true;
                    if !p.is_alive {
                        p.dead_vote_used = true;
                    }
                }
            }
            debug!(%voter, raised, tally, "Vote cast");
            self.say(&format!(
                "--> Seat {voter}: {}",
                if raised { "raises a hand." } else { "does not vote." }
            ));
        }

        let passed = tally >= threshold;
        self.announce(&format!(
            "Vote on seat {nominee}: {tally} of {threshold} needed. {}",
            if passed { "Execution!" } else { "Not enough votes." }
        ));
        self.notify();
        Ok(passed)
    }

    /// Kills `seat` by execution and evaluates the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Invariant`] if the death left the table incoherent.
    #[instrument(skip(self))]
    pub fn execute(&mut self, seat: Seat) -> Result<(), GameError> {
        self.announce(&format!("Seat {seat} is executed."));
        if let Some(p) = self.state.player_mut(seat) {
            p.kill();
        }
        self.state.set_last_executed(seat);
        let saint = self
            .state
            .player(seat)
            .is_some_and(|p| p.true_role == Role::Saint && !p.is_impaired());
        self.apply_death(seat, DeathCause::Execution)?;
        if saint {
            self.announce("The Saint has been executed! Evil wins.");
        }
        Ok(())
    }

    /// Speech-like text from an automated seat.
    async fn automated_text(
        &mut self,
        seat: Seat,
        kind: DecisionKind,
        round: u32,
        situation: String,
    ) -> String {
        let Some(context) = self.context_for(seat, kind) else {
            return "...".to_string();
        };
        let context = context.with_round(round).with_situation(situation);
        let decision = self.consult(context).await;

        let day = self.state.day_count();
        if let Some(p) = self.state.player_mut(seat) {
            p.add_thought(day, &decision.thought);
        }
        let text = decision.text.trim();
        if text.is_empty() {
            "...".to_string()
        } else {
            text.to_string()
        }
    }
}

//! Aggregate game state: the seats, the clock, and the outcome.

use crate::error::InvariantError;
use crate::player::{Player, Seat};
use crate::role::{Alignment, Role, RoleType};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Coarse phase of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum Phase {
    /// Roles are being dealt.
    Setup,
    /// Abilities resolve in wake order.
    Night,
    /// Talk, nominate, vote.
    Day,
    /// A winner is known, or the session stopped. Terminal.
    GameOver,
}

/// Everything the engine knows about the table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    players: Vec<Player>,
    day_count: u32,
    phase: Phase,
    winner: Option<Alignment>,
    demon_bluffs: Vec<Role>,
    last_executed: Option<Seat>,
    tonight_deaths: Vec<Seat>,
    public_history: Vec<String>,
    nominated_today: Vec<Seat>,
}

impl GameState {
    /// Creates the state for a freshly dealt table.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantError`] if the seats are not numbered `1..=N` in
    /// order, or if the table does not have exactly one human seat.
    #[instrument(skip(players, demon_bluffs), fields(seats = players.len()))]
    pub fn new(players: Vec<Player>, demon_bluffs: Vec<Role>) -> Result<Self, InvariantError> {
        for (index, player) in players.iter().enumerate() {
            if player.seat.index() != index {
                return Err(InvariantError::new(format!(
                    "Seat {} listed at position {}",
                    player.seat,
                    index + 1
                )));
            }
        }

        let humans = players.iter().filter(|p| p.is_human).count();
        if humans != 1 {
            return Err(InvariantError::new(format!(
                "Expected exactly one human seat, found {humans}"
            )));
        }

        info!(bluffs = ?demon_bluffs, "Game state created");
        Ok(Self {
            players,
            day_count: 0,
            phase: Phase::Setup,
            winner: None,
            demon_bluffs,
            last_executed: None,
            tonight_deaths: Vec::new(),
            public_history: Vec::new(),
            nominated_today: Vec::new(),
        })
    }

    /// All seats in seat order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Mutable access to all seats.
    pub fn players_mut(&mut self) -> &mut [Player] {
        &mut self.players
    }

    /// The player in `seat`.
    pub fn player(&self, seat: Seat) -> Option<&Player> {
        self.players.get(seat.index())
    }

    /// Mutable access to the player in `seat`.
    pub fn player_mut(&mut self, seat: Seat) -> Option<&mut Player> {
        self.players.get_mut(seat.index())
    }

    /// The human seat.
    pub fn human(&self) -> &Player {
        // `new` guarantees exactly one human seat.
        self.players
            .iter()
            .find(|p| p.is_human)
            .unwrap_or(&self.players[0])
    }

    /// Seat count.
    pub fn seat_count(&self) -> usize {
        self.players.len()
    }

    /// Turns a raw number into a seat at this table.
    pub fn seat_at(&self, number: i64) -> Option<Seat> {
        if number >= 1 && number as usize <= self.players.len() {
            Some(Seat::new(number as u8))
        } else {
            None
        }
    }

    /// Living seats in seat order.
    pub fn living(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.is_alive)
    }

    /// Number of living seats.
    pub fn living_count(&self) -> usize {
        self.living().count()
    }

    /// Number of living Evil seats.
    pub fn living_evil_count(&self) -> usize {
        self.living()
            .filter(|p| p.alignment == Alignment::Evil)
            .count()
    }

    /// Whether any living seat truly is a Demon.
    pub fn demon_alive(&self) -> bool {
        self.living()
            .any(|p| p.true_role.role_type() == RoleType::Demon)
    }

    /// 0 during the setup night, then the number of the current or last day.
    pub fn day_count(&self) -> u32 {
        self.day_count
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Winning team, once decided.
    pub fn winner(&self) -> Option<Alignment> {
        self.winner
    }

    /// Whether the session has reached its terminal phase.
    pub fn is_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// Up to three Good characters not in play, for Evil to claim.
    pub fn demon_bluffs(&self) -> &[Role] {
        &self.demon_bluffs
    }

    /// Seat executed most recently.
    pub fn last_executed(&self) -> Option<Seat> {
        self.last_executed
    }

    /// Seats killed in the last night sweep.
    pub fn tonight_deaths(&self) -> &[Seat] {
        &self.tonight_deaths
    }

    /// Session-long public record.
    pub fn public_history(&self) -> &[String] {
        &self.public_history
    }

    /// The last `window` lines of the public record.
    pub fn recent_history(&self, window: usize) -> Vec<String> {
        let start = self.public_history.len().saturating_sub(window);
        self.public_history[start..].to_vec()
    }

    /// Seats already nominated today.
    pub fn nominated_today(&self) -> &[Seat] {
        &self.nominated_today
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        debug!(%phase, "Phase change");
        self.phase = phase;
    }

    /// Advances the clock into a new day and clears daily bookkeeping.
    pub fn begin_day(&mut self) {
        self.day_count += 1;
        self.phase = Phase::Day;
        self.nominated_today.clear();
        for player in &mut self.players {
            player.has_nominated = false;
            player.has_voted_this_round = false;
        }
    }

    /// Starts a night: every seat, dead or alive, loses its night flags.
    pub fn begin_night(&mut self) {
        self.phase = Phase::Night;
        self.tonight_deaths.clear();
        for player in &mut self.players {
            player.reset_night_status();
        }
    }

    pub(crate) fn record_night_death(&mut self, seat: Seat) {
        self.tonight_deaths.push(seat);
    }

    pub(crate) fn set_last_executed(&mut self, seat: Seat) {
        self.last_executed = Some(seat);
    }

    pub(crate) fn record_nomination(&mut self, nominee: Seat) {
        self.nominated_today.push(nominee);
    }

    /// Appends a line to the public record.
    pub fn record_public(&mut self, line: impl Into<String>) {
        self.public_history.push(line.into());
    }

    /// Ends the game in favour of `team`.
    #[instrument(skip(self))]
    pub fn declare_winner(&mut self, team: Alignment) {
        info!(winner = %team, day = self.day_count, "Game over");
        self.winner = Some(team);
        self.phase = Phase::GameOver;
    }

    /// Ends the session without a winner.
    pub fn declare_draw(&mut self) {
        info!(day = self.day_count, "Game over without a winner");
        self.winner = None;
        self.phase = Phase::GameOver;
    }

    /// Checks structural invariants that the rules should always uphold.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantError`] if more than one Demon is alive or an
    /// alignment no longer matches the role it was dealt with.
    #[instrument(skip(self))]
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let demons = self
            .living()
            .filter(|p| p.true_role.role_type() == RoleType::Demon)
            .count();
        if demons > 1 {
            return Err(InvariantError::new(format!("{demons} Demons alive")));
        }

        if let Some(p) = self
            .players
            .iter()
            .find(|p| p.alignment == Alignment::Good && p.true_role.alignment() == Alignment::Evil)
        {
            return Err(InvariantError::new(format!(
                "Seat {} is Good but holds {}",
                p.seat, p.true_role
            )));
        }

        Ok(())
    }
}

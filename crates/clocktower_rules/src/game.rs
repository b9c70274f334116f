//! Top-level driver: night, day, night, ... until someone wins.

use crate::config::RulesConfig;
use crate::error::GameError;
use crate::oracle::{Decision, DecisionContext, DecisionKind, HumanIo, Oracle, Presenter};
use crate::player::Seat;
use crate::role::{Alignment, Catalog, RoleType};
use crate::roster::RosterBuilder;
use crate::state::GameState;
use crate::win::{self, DeathCause, Verdict};
use rand::rngs::StdRng;
use tracing::{debug, info, instrument, warn};

/// One session at the table.
///
/// Owns the state, the random source and the three boundaries. All phases
/// run strictly one after another.
pub struct Game {
    pub(crate) state: GameState,
    pub(crate) rules: RulesConfig,
    pub(crate) rng: StdRng,
    oracle: Box<dyn Oracle>,
    human: Box<dyn HumanIo>,
    presenter: Box<dyn Presenter>,
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("state", &self.state)
            .field("rules", &self.rules)
            .field("oracle", &self.oracle.name())
            .finish_non_exhaustive()
    }
}

impl Game {
    /// Validates the rules, deals a roster and seats everyone.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Config`] if the rules cannot be satisfied from
    /// the catalog. Nothing is dealt in that case.
    #[instrument(skip_all, fields(seats = rules.player_count, human_seat = rules.human_seat))]
    pub fn setup(
        rules: RulesConfig,
        catalog: &Catalog,
        mut rng: StdRng,
        oracle: Box<dyn Oracle>,
        human: Box<dyn HumanIo>,
        presenter: Box<dyn Presenter>,
    ) -> Result<Self, GameError> {
        rules.validate(catalog)?;
        let roster = RosterBuilder::new(catalog, rules.distribution).build(&mut rng)?;
        let players = roster.seat_players(Seat::new(rules.human_seat), &mut rng);
        let state = GameState::new(players, roster.bluffs().clone())?;
        info!(oracle = oracle.name(), "Game set up");
        Ok(Self::from_state(state, rules, rng, oracle, human, presenter))
    }

    /// Wraps an existing state, for scripted tables.
    pub fn from_state(
        state: GameState,
        rules: RulesConfig,
        rng: StdRng,
        oracle: Box<dyn Oracle>,
        human: Box<dyn HumanIo>,
        presenter: Box<dyn Presenter>,
    ) -> Self {
        Self {
            state,
            rules,
            rng,
            oracle,
            human,
            presenter,
        }
    }

    /// Current state.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Mutable state, for scripted tables.
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    /// Rules in force.
    pub fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    /// Plays until a team wins or the day cap is reached.
    ///
    /// Returns the winning team, or `None` for a draw.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Aborted`] when the human input closes and
    /// [`GameError::Invariant`] when the state becomes incoherent. The state
    /// is left valid either way.
    #[instrument(skip(self))]
    pub async fn run(&mut self) -> Result<Option<Alignment>, GameError> {
        info!("Starting game");
        self.brief_human();
        self.notify();

        self.run_night().await?;
        while !self.state.is_over() {
            if self.state.day_count() >= self.rules.max_days {
                self.say("The clock runs out. The game ends in a draw.");
                self.state.declare_draw();
                break;
            }
            self.run_day().await?;
            if self.state.is_over() {
                break;
            }
            self.run_night().await?;
        }

        let winner = self.state.winner();
        match winner {
            Some(team) => self.say(&format!("\nGame over! {team} wins.")),
            None => self.say("\nGame over! Nobody wins."),
        }
        self.reveal_grimoire();
        Ok(winner)
    }

    /// Tells the human who they are.
    fn brief_human(&mut self) {
        let human = self.state.human().clone();
        self.say(&format!(
            "You are seat {}. Your character: {} ({}).",
            human.seat, human.perceived_role, human.alignment
        ));

        if human.alignment == Alignment::Evil {
            let team = self.evil_team();
            self.say(&format!("Your evil team: {team}."));
            if human.true_role.role_type() == RoleType::Demon {
                let bluffs = self.bluff_list();
                self.say(&format!("Characters not in play you may claim: {bluffs}."));
            }
        }
    }

    fn reveal_grimoire(&mut self) {
        let lines: Vec<String> = self.state.players().iter().map(ToString::to_string).collect();
        for line in lines {
            self.say(&line);
        }
    }

    /// "2 (Imp), 5 (Poisoner)"
    pub(crate) fn evil_team(&self) -> String {
        self.state
            .players()
            .iter()
            .filter(|p| p.alignment == Alignment::Evil)
            .map(|p| format!("{} ({})", p.seat, p.true_role))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub(crate) fn bluff_list(&self) -> String {
        self.state
            .demon_bluffs()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Asks the oracle. Any failure becomes the conservative default.
    #[instrument(skip(self, context), fields(seat = %context.seat, kind = %context.kind))]
    pub(crate) async fn consult(&self, context: DecisionContext) -> Decision {
        match self.oracle.decide(&context).await {
            Ok(decision) => {
                debug!(?decision, "Oracle decided");
                decision
            }
            Err(e) => {
                warn!(error = %e, "Oracle failed, using default decision");
                Decision::default()
            }
        }
    }

    /// Starts a context for `seat`, with recent public history and the seat's
    /// own night information attached.
    pub(crate) fn context_for(&self, seat: Seat, kind: DecisionKind) -> Option<DecisionContext> {
        let player = self.state.player(seat)?;
        let mut history = self.state.recent_history(self.rules.history_window);
        history.extend(
            player
                .night_messages
                .iter()
                .map(|m| format!("Your night information: {m}")),
        );
        Some(DecisionContext::for_player(player, kind, self.state.day_count()).with_history(history))
    }

    /// Shows a line to the human.
    pub(crate) fn say(&mut self, text: &str) {
        self.human.say(text);
    }

    /// Shows a line to the human and appends it to the public record.
    pub(crate) fn announce(&mut self, text: &str) {
        self.human.say(text);
        self.state.record_public(text);
    }

    /// Reads a line from the human. A closed input aborts the session.
    pub(crate) async fn ask_human(&mut self, prompt: &str) -> Result<String, GameError> {
        self.human.ask(prompt).await.map_err(|e| {
            warn!(error = %e, "Human input closed");
            GameError::aborted(e)
        })
    }

    pub(crate) fn notify(&mut self) {
        self.presenter.seats_changed(self.state.players());
    }

    /// Evaluates a seat that has just died and applies the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Invariant`] if the death left the table incoherent.
    #[instrument(skip(self))]
    pub(crate) fn apply_death(&mut self, seat: Seat, cause: DeathCause) -> Result<Verdict, GameError> {
        let verdict = win::resolve_death(
            &mut self.state,
            seat,
            cause,
            self.rules.inheritance_min_living,
        );
        if let Verdict::Inherit(heir) = verdict {
            if self.state.player(heir).is_some_and(|p| p.is_human) {
                self.say("The Demon has died. You are now the Imp.");
            }
        }
        self.state.check_invariants()?;
        self.notify();
        Ok(verdict)
    }
}

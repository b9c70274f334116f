//! Scripted boundaries for deterministic games.

#![allow(dead_code)]

use clocktower_rules::{
    Decision, DecisionContext, DecisionKind, Game, GameState, HumanIo, NullPresenter, Oracle,
    Player, Presenter, Role, RulesConfig, Seat,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Oracle that answers from per-seat, per-kind queues and logs every request.
#[derive(Clone, Default)]
pub struct ScriptedOracle {
    script: Arc<Mutex<HashMap<(Seat, DecisionKind), VecDeque<Decision>>>>,
    log: Arc<Mutex<Vec<DecisionContext>>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a decision for `seat` deciding `kind`.
    pub fn on(self, seat: u8, kind: DecisionKind, decision: Decision) -> Self {
        self.script
            .lock()
            .expect("script lock")
            .entry((Seat::new(seat), kind))
            .or_default()
            .push_back(decision);
        self
    }

    pub fn targets(self, seat: u8, kind: DecisionKind, targets: &[i64]) -> Self {
        self.on(
            seat,
            kind,
            Decision {
                targets: targets.to_vec(),
                ..Decision::default()
            },
        )
    }

    pub fn vote(self, seat: u8, yes: bool) -> Self {
        self.on(
            seat,
            DecisionKind::Vote,
            Decision {
                vote: yes,
                ..Decision::default()
            },
        )
    }

    pub fn text(self, seat: u8, kind: DecisionKind, text: &str) -> Self {
        self.on(
            seat,
            kind,
            Decision {
                text: text.to_string(),
                ..Decision::default()
            },
        )
    }

    /// Every context the engine sent.
    pub fn requests(&self) -> Vec<DecisionContext> {
        self.log.lock().expect("log lock").clone()
    }

    pub fn requests_of(&self, kind: DecisionKind) -> Vec<DecisionContext> {
        self.requests()
            .into_iter()
            .filter(|c| c.kind == kind)
            .collect()
    }
}

#[async_trait::async_trait]
impl Oracle for ScriptedOracle {
    async fn decide(&self, context: &DecisionContext) -> anyhow::Result<Decision> {
        self.log.lock().expect("log lock").push(context.clone());
        let next = self
            .script
            .lock()
            .expect("script lock")
            .get_mut(&(context.seat, context.kind))
            .and_then(VecDeque::pop_front);
        Ok(next.unwrap_or_default())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Oracle that always fails.
pub struct FailingOracle;

#[async_trait::async_trait]
impl Oracle for FailingOracle {
    async fn decide(&self, _context: &DecisionContext) -> anyhow::Result<Decision> {
        anyhow::bail!("oracle unavailable")
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Human that answers from a queue and records what it was shown.
///
/// Once the queue is empty it presses Enter, or reports closed input when
/// built with [`ScriptedHuman::closing`].
#[derive(Clone, Default)]
pub struct ScriptedHuman {
    answers: Arc<Mutex<VecDeque<String>>>,
    shown: Arc<Mutex<Vec<String>>>,
    close_when_empty: bool,
}

impl ScriptedHuman {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: Arc::new(Mutex::new(answers.iter().map(|a| a.to_string()).collect())),
            ..Self::default()
        }
    }

    pub fn closing(answers: &[&str]) -> Self {
        Self {
            close_when_empty: true,
            ..Self::new(answers)
        }
    }

    pub fn shown(&self) -> Vec<String> {
        self.shown.lock().expect("shown lock").clone()
    }

    pub fn saw(&self, needle: &str) -> bool {
        self.shown().iter().any(|line| line.contains(needle))
    }

    pub fn remaining(&self) -> usize {
        self.answers.lock().expect("answers lock").len()
    }
}

#[async_trait::async_trait]
impl HumanIo for ScriptedHuman {
    fn say(&mut self, text: &str) {
        self.shown.lock().expect("shown lock").push(text.to_string());
    }

    async fn ask(&mut self, prompt: &str) -> anyhow::Result<String> {
        self.shown.lock().expect("shown lock").push(prompt.to_string());
        match self.answers.lock().expect("answers lock").pop_front() {
            Some(answer) => Ok(answer),
            None if self.close_when_empty => anyhow::bail!("input closed"),
            None => Ok(String::new()),
        }
    }
}

/// Presenter that keeps the alive flags of every seat list it is handed.
#[derive(Clone, Default)]
pub struct RecordingPresenter {
    snapshots: Arc<Mutex<Vec<Vec<bool>>>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> Vec<Vec<bool>> {
        self.snapshots.lock().expect("snapshots lock").clone()
    }
}

impl Presenter for RecordingPresenter {
    fn seats_changed(&mut self, players: &[Player]) {
        let alive = players.iter().map(|p| p.is_alive).collect();
        self.snapshots.lock().expect("snapshots lock").push(alive);
    }
}

/// A table with one player per role; `human` is the 1-based human seat.
pub fn table(roles: &[Role], human: u8) -> GameState {
    let players = roles
        .iter()
        .enumerate()
        .map(|(i, role)| {
            let seat = Seat::new(i as u8 + 1);
            Player::new(seat, seat == Seat::new(human), *role, "rational")
        })
        .collect();
    GameState::new(players, vec![Role::Mayor, Role::Virgin, Role::Saint]).expect("valid table")
}

/// The usual six seats with the human in seat 1.
pub fn six_seats() -> GameState {
    table(
        &[
            Role::Chef,
            Role::Empath,
            Role::Monk,
            Role::Imp,
            Role::Soldier,
            Role::Poisoner,
        ],
        1,
    )
}

pub fn game(state: GameState, oracle: impl Oracle + 'static, human: ScriptedHuman) -> Game {
    watched_game(state, oracle, human, NullPresenter)
}

pub fn watched_game(
    state: GameState,
    oracle: impl Oracle + 'static,
    human: ScriptedHuman,
    presenter: impl Presenter + 'static,
) -> Game {
    let rules = RulesConfig {
        player_count: state.seat_count(),
        human_seat: state.human().seat.number(),
        ..RulesConfig::default()
    };
    Game::from_state(
        state,
        rules,
        StdRng::seed_from_u64(42),
        Box::new(oracle),
        Box::new(human),
        Box::new(presenter),
    )
}

pub fn seat(n: u8) -> Seat {
    Seat::new(n)
}

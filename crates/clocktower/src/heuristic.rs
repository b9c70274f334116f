//! Offline oracle: simple rules of thumb and a seeded coin.

use clocktower_rules::{
    Alignment, Catalog, Decision, DecisionContext, DecisionKind, Oracle, Role, RoleType, Seat,
};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use tracing::{debug, instrument};

/// History prefix the engine puts on a seat's own night readings.
const NIGHT_NOTE: &str = "Your night information: ";

/// Plays every automated seat without a network.
///
/// Good seats repeat what they learned and vote now and then; Evil seats
/// claim a Good character and vote a little more eagerly.
#[derive(Debug)]
pub struct HeuristicOracle {
    rng: Mutex<StdRng>,
}

impl HeuristicOracle {
    /// Creates an oracle; the same seed gives the same table talk.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng: Mutex::new(rng),
        }
    }

    #[instrument(skip(self, context), fields(seat = %context.seat, kind = %context.kind))]
    fn decide_now(&self, context: &DecisionContext) -> anyhow::Result<Decision> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| anyhow::anyhow!("Heuristic oracle lock poisoned"))?;
        let evil = context.alignment == Alignment::Evil;
        let others: Vec<Seat> = context
            .candidates
            .iter()
            .copied()
            .filter(|s| *s != context.seat)
            .collect();

        let decision = match context.kind {
            DecisionKind::Planning => Decision {
                bluff_role: evil.then(|| claim_for(&mut *rng).to_string()),
                thought: if evil {
                    "Blend in with a quiet Good claim.".to_string()
                } else {
                    "Share what I learn.".to_string()
                },
                ..Decision::default()
            },
            DecisionKind::NightAction => {
                let wanted = context.claimed_role.traits().targets;
                let pool = if others.is_empty() {
                    &context.candidates
                } else {
                    &others
                };
                Decision {
                    targets: pool
                        .choose_multiple(&mut *rng, wanted)
                        .map(|s| i64::from(s.number()))
                        .collect(),
                    ..Decision::default()
                }
            }
            DecisionKind::Misinformation => Decision::default(),
            DecisionKind::PrivateChat => Decision {
                text: format!(
                    "I'm the {}. Who are you worried about?",
                    context.bluff_role
                ),
                terminate: rng.random_bool(0.3),
                ..Decision::default()
            },
            DecisionKind::PublicSpeech => Decision {
                text: speech(context, evil),
                ..Decision::default()
            },
            DecisionKind::Nomination => {
                let eager = if evil { 0.4 } else { 0.25 };
                match others.choose(&mut *rng) {
                    Some(seat) if rng.random_bool(eager) => Decision {
                        targets: vec![i64::from(seat.number())],
                        text: format!("Seat {seat} has not convinced me."),
                        ..Decision::default()
                    },
                    _ => Decision::default(),
                }
            }
            DecisionKind::Defense => Decision {
                text: format!("I am the {}, and I am on your side.", context.bluff_role),
                ..Decision::default()
            },
            DecisionKind::Vote => {
                let own = context.candidates.contains(&context.seat);
                Decision {
                    vote: !own && rng.random_bool(if evil { 0.55 } else { 0.45 }),
                    ..Decision::default()
                }
            }
        };
        debug!(?decision, "Heuristic decision");
        Ok(decision)
    }
}

#[async_trait::async_trait]
impl Oracle for HeuristicOracle {
    async fn decide(&self, context: &DecisionContext) -> anyhow::Result<Decision> {
        self.decide_now(context)
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}

/// A Townsfolk claim for an Evil seat.
fn claim_for<R: Rng + ?Sized>(rng: &mut R) -> Role {
    let townsfolk = Catalog::trouble_brewing().of_type(RoleType::Townsfolk);
    townsfolk.choose(rng).copied().unwrap_or(Role::Soldier)
}

fn speech(context: &DecisionContext, evil: bool) -> String {
    let mut text = format!("I am the {}.", context.bluff_role);
    let notes: Vec<&str> = context
        .history
        .iter()
        .filter_map(|line| line.strip_prefix(NIGHT_NOTE))
        .collect();
    if !evil && !notes.is_empty() {
        text.push_str(" I learned: ");
        text.push_str(&notes.join(" "));
    } else {
        text.push_str(" Nothing solid yet; I'm listening.");
    }
    text
}

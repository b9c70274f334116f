//! Boundaries between the engine and whoever makes decisions or watches.
//!
//! The engine never knows how an automated seat thinks or how the human
//! types. It hands an [`Oracle`] a [`DecisionContext`] and reads back a
//! [`Decision`]; it asks the [`HumanIo`] for a line of text; it tells the
//! [`Presenter`] when the seats change.

use crate::player::{Player, Seat};
use crate::role::{Alignment, Role};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// What an automated seat is being asked to decide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum DecisionKind {
    /// Opening plan on the setup night, including a claimed identity.
    Planning,
    /// Targets for a night ability.
    NightAction,
    /// A believable but false night reading for an impaired seat.
    Misinformation,
    /// One line of a private conversation.
    PrivateChat,
    /// A public statement.
    PublicSpeech,
    /// Whether and whom to nominate.
    Nomination,
    /// A defense after being nominated.
    Defense,
    /// Yes or no on the current nomination.
    Vote,
}

/// Everything an automated seat is told before it decides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionContext {
    /// Seat deciding.
    pub seat: Seat,
    /// What is being decided.
    pub kind: DecisionKind,
    /// The character the seat believes it holds.
    pub claimed_role: Role,
    /// The character the seat says it holds in public.
    pub bluff_role: Role,
    /// The seat's team.
    pub alignment: Alignment,
    /// Temperament tag.
    pub personality: String,
    /// Day number (0 on the setup night).
    pub day: u32,
    /// Round within the phase (chat round, speech round, chat turn).
    pub round: u32,
    /// Free-form description of the moment.
    pub situation: String,
    /// Private truth the seat may use but must not reveal verbatim.
    pub hidden_truth: Option<String>,
    /// Seats that are legal answers, when the answer is a seat.
    pub candidates: Vec<Seat>,
    /// Recent public record and the seat's own private notes.
    pub history: Vec<String>,
}

impl DecisionContext {
    /// Starts a context for `player` deciding `kind`.
    pub fn for_player(player: &Player, kind: DecisionKind, day: u32) -> Self {
        Self {
            seat: player.seat,
            kind,
            claimed_role: player.perceived_role,
            bluff_role: player.bluff_role,
            alignment: player.alignment,
            personality: player.personality.clone(),
            day,
            round: 0,
            situation: String::new(),
            hidden_truth: None,
            candidates: Vec::new(),
            history: Vec::new(),
        }
    }

    /// Sets the round number.
    pub fn with_round(mut self, round: u32) -> Self {
        self.round = round;
        self
    }

    /// Sets the situation text.
    pub fn with_situation(mut self, situation: impl Into<String>) -> Self {
        self.situation = situation.into();
        self
    }

    /// Attaches private truth.
    pub fn with_hidden_truth(mut self, truth: impl Into<String>) -> Self {
        self.hidden_truth = Some(truth.into());
        self
    }

    /// Sets the legal seat answers.
    pub fn with_candidates(mut self, candidates: Vec<Seat>) -> Self {
        self.candidates = candidates;
        self
    }

    /// Sets the history lines.
    pub fn with_history(mut self, history: Vec<String>) -> Self {
        self.history = history;
        self
    }
}

/// A structured answer from an automated seat.
///
/// The default value is the conservative answer: no targets, no vote, keep
/// talking, say nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Decision {
    /// Seat numbers chosen, in order. Unchecked until the engine validates them.
    pub targets: Vec<i64>,
    /// Spoken text: speech, chat line, defense or fabricated reading.
    pub text: String,
    /// Private reasoning, appended to the seat's log.
    pub thought: String,
    /// Yes on the current vote.
    pub vote: bool,
    /// Ends a private conversation.
    pub terminate: bool,
    /// Claimed identity chosen while planning.
    pub bluff_role: Option<String>,
}

/// Produces decisions for automated seats.
///
/// Implementations apply their own time limits. Any error is treated by the
/// engine as [`Decision::default`].
#[async_trait::async_trait]
pub trait Oracle: Send + Sync {
    /// Decides for one seat.
    async fn decide(&self, context: &DecisionContext) -> anyhow::Result<Decision>;

    /// Display name used in logs.
    fn name(&self) -> &str;
}

/// Text-in, text-out channel to the human seat.
#[async_trait::async_trait]
pub trait HumanIo: Send {
    /// Shows a line to the human.
    fn say(&mut self, text: &str);

    /// Asks the human a question and waits for a line.
    ///
    /// An error means the input is closed and the session should stop.
    async fn ask(&mut self, prompt: &str) -> anyhow::Result<String>;
}

/// Fire-and-forget notifications for a display layer.
pub trait Presenter: Send {
    /// The seat list changed.
    fn seats_changed(&mut self, players: &[Player]);
}

/// A presenter that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn seats_changed(&mut self, _players: &[Player]) {}
}

/// Parses whitespace-separated seat numbers. Any unparsable token yields no targets.
#[instrument]
pub fn parse_targets(input: &str) -> Vec<i64> {
    let parsed: Result<Vec<i64>, _> = input.split_whitespace().map(str::parse::<i64>).collect();
    match parsed {
        Ok(targets) => targets,
        Err(e) => {
            debug!(error = %e, "Ignoring unparsable target input");
            Vec::new()
        }
    }
}

/// Whether a human answer means yes.
pub fn parse_yes(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Whether a human chat line asks to leave the conversation.
pub fn is_chat_exit(input: &str) -> bool {
    matches!(
        input.trim().to_lowercase().as_str(),
        "end" | "0" | "exit" | "quit"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_targets() {
        assert_eq!(parse_targets("3"), vec![3]);
        assert_eq!(parse_targets(" 2  5 "), vec![2, 5]);
        assert_eq!(parse_targets(""), Vec::<i64>::new());
        assert_eq!(parse_targets("2 x"), Vec::<i64>::new());
        assert_eq!(parse_targets("-1"), vec![-1]);
    }

    #[test]
    fn test_parse_yes() {
        assert!(parse_yes("y"));
        assert!(parse_yes(" YES "));
        assert!(!parse_yes("n"));
        assert!(!parse_yes("yeah"));
    }

    #[test]
    fn test_chat_exit_words() {
        for word in ["end", "0", "EXIT", " quit "] {
            assert!(is_chat_exit(word), "{word}");
        }
        assert!(!is_chat_exit("bye"));
    }

    #[test]
    fn test_default_decision_is_conservative() {
        let d = Decision::default();
        assert!(d.targets.is_empty());
        assert!(!d.vote);
        assert!(!d.terminate);
        assert!(d.text.is_empty());
    }

    #[test]
    fn test_partial_decision_deserializes() {
        let d: Decision = serde_json::from_str(r#"{"targets":[2],"vote":true}"#).expect("json");
        assert_eq!(d.targets, vec![2]);
        assert!(d.vote);
        assert!(!d.terminate);
    }
}

//! Per-seat state.

use crate::role::{Alignment, Role};
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// A seat number, 1-based, as players say it out loud.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, From,
)]
pub struct Seat(u8);

impl Seat {
    /// Creates a seat from its 1-based number.
    pub const fn new(number: u8) -> Self {
        Self(number)
    }

    /// The 1-based seat number.
    pub const fn number(self) -> u8 {
        self.0
    }

    /// Zero-based index into the seat list.
    pub const fn index(self) -> usize {
        self.0 as usize - 1
    }
}

/// One participant, alive or dead, for the whole session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Seat number.
    pub seat: Seat,
    /// Whether the human plays this seat.
    pub is_human: bool,
    /// Temperament handed to the oracle.
    pub personality: String,

    /// Authoritative character.
    pub true_role: Role,
    /// Character the seat believes it has. Differs only for the Drunk.
    pub perceived_role: Role,
    /// Team, fixed at assignment.
    pub alignment: Alignment,
    /// Character the seat claims in public.
    pub bluff_role: Role,

    /// Still in the game.
    pub is_alive: bool,
    /// Holds the Drunk token.
    pub is_drunk: bool,
    /// Poisoned until the next night.
    pub is_poisoned: bool,
    /// Safe from the Demon tonight.
    pub is_protected: bool,
    /// Chosen by the Demon tonight.
    pub is_demon_target: bool,
    /// Marked to die when the night resolves.
    pub pending_death: bool,

    /// Seat the Butler has chosen. A reference, not ownership.
    pub master: Option<Seat>,

    /// The single vote a dead seat may still cast has been spent.
    pub dead_vote_used: bool,
    /// Raised a hand in the vote currently being counted.
    pub has_voted_this_round: bool,
    /// Already nominated today.
    pub has_nominated: bool,
    /// The once-per-game day shot has been taken.
    pub slayer_shot_used: bool,

    /// Information gathered tonight, cleared every night.
    pub night_messages: Vec<String>,
    /// Private chat transcripts keyed by counterpart.
    pub chat_history: BTreeMap<Seat, Vec<String>>,
    /// Append-only reasoning log.
    pub thoughts: Vec<String>,
}

impl Player {
    /// Seats a player holding `role`.
    #[instrument(skip(personality))]
    pub fn new(seat: Seat, is_human: bool, role: Role, personality: impl Into<String>) -> Self {
        debug!(%seat, %role, "Seating player");
        Self {
            seat,
            is_human,
            personality: personality.into(),
            true_role: role,
            perceived_role: role,
            alignment: role.alignment(),
            bluff_role: role,
            is_alive: true,
            is_drunk: false,
            is_poisoned: false,
            is_protected: false,
            is_demon_target: false,
            pending_death: false,
            master: None,
            dead_vote_used: false,
            has_voted_this_round: false,
            has_nominated: false,
            slayer_shot_used: false,
            night_messages: Vec::new(),
            chat_history: BTreeMap::new(),
            thoughts: Vec::new(),
        }
    }

    /// Makes this seat the Drunk who believes to be `perceived`.
    pub fn make_drunk(&mut self, perceived: Role) {
        self.is_drunk = true;
        self.perceived_role = perceived;
        self.bluff_role = perceived;
    }

    /// Replaces the character wholesale, as happens on Demon inheritance.
    ///
    /// Alignment is left untouched.
    #[instrument(skip(self), fields(seat = %self.seat, from = %self.true_role))]
    pub fn inherit(&mut self, role: Role) {
        debug!(to = %role, "Role inherited");
        self.true_role = role;
        self.perceived_role = role;
    }

    /// Poisoned or drunk.
    pub fn is_impaired(&self) -> bool {
        self.is_drunk || self.is_poisoned
    }

    /// The seat's ability is real: it is what it believes it is and is not impaired.
    pub fn has_ability(&self) -> bool {
        self.true_role == self.perceived_role && !self.is_impaired()
    }

    /// Votes this seat can cast right now.
    pub fn vote_power(&self) -> u32 {
        if self.is_alive || !self.dead_vote_used {
            1
        } else {
            0
        }
    }

    /// Marks the seat dead. Returns `false` if it already was.
    #[instrument(skip(self), fields(seat = %self.seat))]
    pub fn kill(&mut self) -> bool {
        if self.is_alive {
            self.is_alive = false;
            debug!("Player died");
            true
        } else {
            false
        }
    }

    /// Clears the flags that only last one night.
    pub fn reset_night_status(&mut self) {
        self.is_poisoned = false;
        self.is_protected = false;
        self.is_demon_target = false;
        self.pending_death = false;
        self.night_messages.clear();
    }

    /// Appends to the reasoning log.
    pub fn add_thought(&mut self, day: u32, thought: &str) {
        if !thought.trim().is_empty() {
            self.thoughts.push(format!("Day {day}: {}", thought.trim()));
        }
    }

    /// Records one line of a private chat with `counterpart`.
    pub fn add_chat_record(&mut self, counterpart: Seat, message: &str, is_me: bool) {
        let sender = if is_me {
            "Me".to_string()
        } else {
            format!("Seat {counterpart}")
        };
        self.chat_history
            .entry(counterpart)
            .or_default()
            .push(format!("{sender}: {message}"));
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let owner = if self.is_human { "[human]" } else { "[agent]" };
        let status = if self.is_alive { "alive" } else { "dead" };
        let mut marks = String::new();
        if self.is_poisoned {
            marks.push_str("[poisoned]");
        }
        if self.is_protected {
            marks.push_str("[protected]");
        }
        if self.is_drunk {
            marks.push_str("[drunk]");
        }
        write!(
            f,
            "Seat {} {} {}{} ({})",
            self.seat, owner, self.true_role, marks, status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drunk_never_has_ability() {
        let mut p = Player::new(Seat::new(1), false, Role::Drunk, "cautious");
        p.make_drunk(Role::Monk);
        assert_eq!(p.true_role, Role::Drunk);
        assert_eq!(p.perceived_role, Role::Monk);
        assert!(!p.has_ability());
    }

    #[test]
    fn test_poison_removes_ability() {
        let mut p = Player::new(Seat::new(2), false, Role::Monk, "cautious");
        assert!(p.has_ability());
        p.is_poisoned = true;
        assert!(!p.has_ability());
        p.reset_night_status();
        assert!(p.has_ability());
    }

    #[test]
    fn test_dead_vote_is_spent_once() {
        let mut p = Player::new(Seat::new(3), false, Role::Chef, "cautious");
        assert_eq!(p.vote_power(), 1);
        assert!(p.kill());
        assert!(!p.kill());
        assert_eq!(p.vote_power(), 1);
        p.dead_vote_used = true;
        assert_eq!(p.vote_power(), 0);
    }

    #[test]
    fn test_alignment_fixed_at_assignment() {
        let mut p = Player::new(Seat::new(5), false, Role::ScarletWoman, "chaotic");
        p.inherit(Role::Imp);
        assert_eq!(p.alignment, Alignment::Evil);
        assert_eq!(p.true_role, Role::Imp);
    }

    #[test]
    fn test_chat_records_by_counterpart() {
        let mut p = Player::new(Seat::new(1), true, Role::Chef, "");
        p.add_chat_record(Seat::new(3), "hello", true);
        p.add_chat_record(Seat::new(3), "hi", false);
        assert_eq!(
            p.chat_history[&Seat::new(3)],
            vec!["Me: hello".to_string(), "Seat 3: hi".to_string()]
        );
    }
}

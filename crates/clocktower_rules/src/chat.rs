//! Private one-to-one conversations.

use crate::error::GameError;
use crate::game::Game;
use crate::oracle::{DecisionKind, is_chat_exit};
use crate::player::Seat;
use crate::role::{Alignment, RoleType};
use rand::seq::SliceRandom;
use tracing::{debug, instrument};

/// Reply used when an automated seat has nothing to say.
const SILENCE: &str = "...";

impl Game {
    /// One private-chat round: the human picks a partner, everyone else is
    /// paired at random. A leftover seat sits the round out.
    ///
    /// # Errors
    ///
    /// Fails only when the human input closes.
    #[instrument(skip(self))]
    pub async fn run_chat_round(&mut self, round: u32) -> Result<(), GameError> {
        self.say(&format!("\n[Private chat, round {round}]"));
        let mut available: Vec<Seat> = self.state.living().map(|p| p.seat).collect();
        let mut pairs: Vec<(Seat, Seat)> = Vec::new();

        let human = self.state.human();
        let human_seat = human.seat;
        if human.is_alive {
            let listed = available
                .iter()
                .filter(|s| **s != human_seat)
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            let answer = self
                .ask_human(&format!(
                    "Who would you like to talk to privately? (available: {listed}; 0 to skip): "
                ))
                .await?;
            available.retain(|s| *s != human_seat);

            let partner = answer
                .trim()
                .parse::<i64>()
                .ok()
                .and_then(|n| self.state.seat_at(n))
                .filter(|s| available.contains(s));
            match partner {
                Some(partner) => {
                    available.retain(|s| *s != partner);
                    pairs.push((human_seat, partner));
                }
                None => self.say("No private chat this round."),
            }
        }

        available.shuffle(&mut self.rng);
        while let (Some(a), Some(b)) = (available.pop(), available.pop()) {
            pairs.push((a, b));
        }
        debug!(?pairs, "Chat pairs");

        for (a, b) in pairs {
            self.run_private_chat(a, b, round).await?;
        }
        Ok(())
    }

    /// Runs one conversation between `a` and `b`.
    ///
    /// With the human involved, the human types and the other seat answers
    /// until the turn cap, an exit word, or the other seat ends it. Between
    /// two automated seats, `a` opens and `b` replies once.
    ///
    /// # Errors
    ///
    /// Fails only when the human input closes.
    #[instrument(skip(self))]
    pub async fn run_private_chat(&mut self, a: Seat, b: Seat, round: u32) -> Result<(), GameError> {
        let a_human = self.state.player(a).is_some_and(|p| p.is_human);
        let b_human = self.state.player(b).is_some_and(|p| p.is_human);

        match (a_human, b_human) {
            (false, false) => {
                self.automated_chat(a, b, round).await;
                Ok(())
            }
            (true, _) => self.human_chat(a, b, round).await,
            (false, true) => self.human_chat(b, a, round).await,
        }
    }

    async fn automated_chat(&mut self, opener: Seat, replier: Seat, round: u32) {
        self.say(&format!("    (Seats {opener} and {replier} whisper together...)"));

        let opening = self
            .chat_line(opener, replier, round, &[], "(you open the conversation)")
            .await
            .0;
        self.record_exchange(opener, replier, &opening);

        let transcript = vec![format!("Seat {opener}: {opening}")];
        let reply = self
            .chat_line(replier, opener, round, &transcript, &opening)
            .await
            .0;
        self.record_exchange(replier, opener, &reply);
    }

    async fn human_chat(&mut self, human: Seat, other: Seat, round: u32) -> Result<(), GameError> {
        self.say(&format!(
            "\n>>> Private room: you and seat {other} (type 'end' or '0' to leave) <<<"
        ));
        let mut transcript: Vec<String> = Vec::new();

        for _ in 0..self.rules.chat_turn_cap {
            let line = self.ask_human("Me: ").await?;
            if is_chat_exit(&line) {
                self.say("(You end the conversation.)");
                break;
            }
            transcript.push(format!("Seat {human}: {line}"));
            self.record_exchange(human, other, &line);

            let (reply, terminate) = self.chat_line(other, human, round, &transcript, &line).await;
            self.say(&format!("Seat {other}: {reply}"));
            transcript.push(format!("Seat {other}: {reply}"));
            self.record_exchange(other, human, &reply);

            if terminate {
                self.say(&format!("(Seat {other} ends the conversation.)"));
                break;
            }
        }
        Ok(())
    }

    /// Asks `speaker` for its next line to `listener`.
    async fn chat_line(
        &mut self,
        speaker: Seat,
        listener: Seat,
        round: u32,
        transcript: &[String],
        last_message: &str,
    ) -> (String, bool) {
        let Some(context) = self.context_for(speaker, DecisionKind::PrivateChat) else {
            return (SILENCE.to_string(), false);
        };

        let mut situation = format!(
            "Day {}, private chat round {round} with seat {listener}. You claim to be the {}. \
             They just said: \"{last_message}\"",
            self.state.day_count(),
            context.bluff_role
        );
        if let Some(extra) = self.teammate_instruction(speaker, listener) {
            situation.push(' ');
            situation.push_str(&extra);
        }

        let mut history = context.history.clone();
        history.extend(transcript.iter().cloned());
        let night_info = self
            .state
            .player(speaker)
            .map(|p| p.night_messages.join(" | "))
            .unwrap_or_default();

        let mut context = context.with_situation(situation).with_history(history);
        if !night_info.is_empty() {
            context = context.with_hidden_truth(night_info);
        }
        let decision = self.consult(context).await;

        let day = self.state.day_count();
        if let Some(p) = self.state.player_mut(speaker) {
            p.add_thought(day, &format!("Chat with seat {listener}: {}", decision.thought));
        }

        let text = decision.text.trim();
        let text = if text.is_empty() { SILENCE } else { text };
        (text.to_string(), decision.terminate)
    }

    /// Extra orders when two Evil seats talk.
    fn teammate_instruction(&self, speaker: Seat, listener: Seat) -> Option<String> {
        let speaker = self.state.player(speaker)?;
        let listener = self.state.player(listener)?;
        if speaker.alignment != Alignment::Evil || listener.alignment != Alignment::Evil {
            return None;
        }
        Some(if speaker.true_role.role_type() == RoleType::Demon {
            format!(
                "You are talking to your evil teammate. You are the Demon: tell them the \
                 characters not in play ({}) and which one they should claim.",
                self.bluff_list()
            )
        } else {
            "You are talking to your evil teammate. You are a Minion: ask the Demon which \
             character you should claim."
                .to_string()
        })
    }

    fn record_exchange(&mut self, speaker: Seat, listener: Seat, message: &str) {
        if let Some(p) = self.state.player_mut(speaker) {
            p.add_chat_record(listener, message, true);
        }
        if let Some(p) = self.state.player_mut(listener) {
            p.add_chat_record(speaker, message, false);
        }
    }
}

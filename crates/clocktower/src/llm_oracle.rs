//! Automated seats played by a language model.
//!
//! Each decision is one completion: a system prompt describing the seat and
//! the script, a user prompt describing the moment, and a JSON object back.
//! Replies are parsed leniently; anything unusable is an error the engine
//! turns into its default decision.

use crate::llm_client::LlmClient;
use clocktower_rules::{Alignment, Decision, DecisionContext, DecisionKind, Oracle, Role};
use std::fmt::Write as _;
use std::time::Duration;
use strum::IntoEnumIterator;
use tracing::{debug, instrument, warn};

/// Oracle backed by an [`LlmClient`].
#[derive(Debug, Clone)]
pub struct LlmOracle {
    client: LlmClient,
    timeout: Duration,
    name: String,
}

impl LlmOracle {
    /// Wraps `client`, allowing `timeout` per decision.
    pub fn new(client: LlmClient, timeout: Duration) -> Self {
        let name = format!("llm:{}", client.config().model());
        Self {
            client,
            timeout,
            name,
        }
    }
}

#[async_trait::async_trait]
impl Oracle for LlmOracle {
    #[instrument(skip(self, context), fields(seat = %context.seat, kind = %context.kind))]
    async fn decide(&self, context: &DecisionContext) -> anyhow::Result<Decision> {
        let system = system_prompt(context);
        let user = user_prompt(context);

        let reply = match tokio::time::timeout(self.timeout, self.client.generate(&system, &user))
            .await
        {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "Oracle timed out");
                anyhow::bail!(
                    "No decision within {} seconds",
                    self.timeout.as_secs()
                )
            }
        };
        parse_decision(&reply)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Finds the JSON object in a model reply.
///
/// Tries the whole reply, then a fenced `json` block, then the span from the
/// first `{` to the last `}`.
pub fn extract_json(reply: &str) -> Option<serde_json::Value> {
    let reply = reply.trim();
    if let Ok(value) = serde_json::from_str(reply) {
        return Some(value);
    }

    if let Some(start) = reply.find("```json") {
        let body = &reply[start + 7..];
        if let Some(end) = body.find("```") {
            if let Ok(value) = serde_json::from_str(body[..end].trim()) {
                return Some(value);
            }
        }
    }

    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&reply[start..=end]).ok()
}

/// Parses a model reply into a [`Decision`]. Missing fields take their defaults.
///
/// # Errors
///
/// Fails when no JSON object can be found or its fields have the wrong shape.
pub fn parse_decision(reply: &str) -> anyhow::Result<Decision> {
    let Some(value) = extract_json(reply) else {
        let preview: String = reply.chars().take(60).collect();
        warn!(preview = %preview, "No JSON in model reply");
        anyhow::bail!("No JSON object in reply");
    };
    let decision: Decision = serde_json::from_value(value)?;
    debug!(?decision, "Parsed decision");
    Ok(decision)
}

fn role_summary(role: Role) -> &'static str {
    match role {
        Role::Washerwoman => "first night, learns one of two seats is a particular Townsfolk",
        Role::Librarian => "first night, learns one of two seats is a particular Outsider",
        Role::Investigator => "first night, learns one of two seats is a particular Minion",
        Role::Chef => "first night, learns how many pairs of evil players sit together",
        Role::Empath => "each night, learns how many living neighbours are evil",
        Role::FortuneTeller => "each night, picks two seats and learns if either is the Demon",
        Role::Undertaker => "each night after an execution, learns the executed character",
        Role::Monk => "each night, protects another seat from the Demon",
        Role::Ravenkeeper => "if killed at night, picks a seat and learns its character",
        Role::Virgin => "the first Townsfolk to nominate her is executed instead",
        Role::Slayer => "once per game, shoots a seat by day; a Demon dies",
        Role::Soldier => "safe from the Demon",
        Role::Mayor => "no ability in this game",
        Role::Butler => "each night picks a master, and may only vote if the master votes first",
        Role::Drunk => "believes to be a Townsfolk, but has no ability and gets false information",
        Role::Recluse => "may register as evil and as a Minion",
        Role::Saint => "if executed, the good team loses",
        Role::Poisoner => "each night poisons a seat: its ability fails until the next night",
        Role::Spy => "each night sees the grimoire; registers as good",
        Role::Baron => "adds an extra Outsider to the game",
        Role::ScarletWoman => "becomes the Demon if the Demon dies with enough players alive",
        Role::Imp => "each night after the first, kills a seat; killing itself passes the Demon on",
    }
}

fn answer_format(kind: DecisionKind) -> &'static str {
    match kind {
        DecisionKind::Planning => {
            r#"{"thought": "<your plan>", "bluff_role": "<the character you will claim>"}"#
        }
        DecisionKind::NightAction => {
            r#"{"thought": "<your reasoning>", "targets": [<seat numbers>]}"#
        }
        DecisionKind::Misinformation => r#"{"text": "<the false reading>"}"#,
        DecisionKind::PrivateChat => {
            r#"{"thought": "<your reasoning>", "text": "<what you say>", "terminate": <true to end the chat>}"#
        }
        DecisionKind::PublicSpeech | DecisionKind::Defense => {
            r#"{"thought": "<your reasoning>", "text": "<what you say>"}"#
        }
        DecisionKind::Nomination => {
            r#"{"thought": "<your reasoning>", "targets": [<one seat, or empty to pass>], "text": "<your reason>"}"#
        }
        DecisionKind::Vote => r#"{"thought": "<your reasoning>", "vote": <true or false>}"#,
    }
}

/// Who the seat is and how to answer.
pub fn system_prompt(context: &DecisionContext) -> String {
    let mut prompt = format!(
        "You are playing Blood on the Clocktower (Trouble Brewing) at a six-seat table. \
         You sit in seat {}. You believe you are the {}, on the {} team. \
         In public you claim to be the {}. Personality: {}.\n",
        context.seat, context.claimed_role, context.alignment, context.bluff_role, context.personality
    );
    prompt.push_str(match context.alignment {
        Alignment::Good => {
            "Good wins when the Demon dies. Share what you learn, find the liars, \
             and execute the Demon.\n"
        }
        Alignment::Evil => {
            "Evil wins when only two players are left alive with the Demon. \
             Never reveal your true character; keep your claim consistent.\n"
        }
    });
    prompt.push_str("\nCharacters on this script:\n");
    for role in Role::iter() {
        let _ = writeln!(prompt, "- {role} ({}): {}", role.role_type(), role_summary(role));
    }
    let _ = write!(
        prompt,
        "\nAnswer with a single JSON object and nothing else, in this form:\n{}",
        answer_format(context.kind)
    );
    prompt
}

/// The moment being decided.
pub fn user_prompt(context: &DecisionContext) -> String {
    let mut prompt = String::new();
    if !context.history.is_empty() {
        prompt.push_str("What has happened so far:\n");
        for line in &context.history {
            let _ = writeln!(prompt, "{line}");
        }
        prompt.push('\n');
    }
    if let Some(truth) = &context.hidden_truth {
        let _ = writeln!(prompt, "Private to you: {truth}\n");
    }
    if !context.candidates.is_empty() {
        let seats = context
            .candidates
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(prompt, "Seats you may choose: {seats}");
    }
    let _ = write!(prompt, "Day {}. {}", context.day, context.situation);
    prompt
}

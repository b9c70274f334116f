//! Terminal play: the human types at stdin, the table prints to stdout.

use clocktower_rules::{HumanIo, Player, Presenter};
use crossterm::style::Stylize;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{debug, instrument};

/// The human seat, read line by line from stdin.
pub struct ConsoleHuman {
    lines: Lines<BufReader<Stdin>>,
}

impl ConsoleHuman {
    /// Reads from this process's stdin.
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for ConsoleHuman {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConsoleHuman {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleHuman").finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl HumanIo for ConsoleHuman {
    fn say(&mut self, text: &str) {
        let headline = text.trim_start();
        if headline.starts_with(">>>") || headline.starts_with("===") || headline.starts_with("---") {
            println!("{}", text.bold().cyan());
        } else if headline.starts_with("[Your night information]") {
            println!("{}", text.magenta());
        } else {
            println!("{text}");
        }
    }

    #[instrument(skip(self))]
    async fn ask(&mut self, prompt: &str) -> anyhow::Result<String> {
        print!("{}", prompt.yellow());
        std::io::stdout().flush()?;
        match self.lines.next_line().await? {
            Some(line) => {
                debug!(len = line.len(), "Human answered");
                Ok(line)
            }
            None => anyhow::bail!("Standard input closed"),
        }
    }
}

/// Prints the seat list whenever someone dies.
///
/// Only public facts are shown: seat numbers, who is alive, and the human's
/// own believed character.
#[derive(Debug, Default)]
pub struct ConsolePresenter {
    last_alive: Option<Vec<bool>>,
}

impl ConsolePresenter {
    /// Creates a presenter that has printed nothing yet.
    pub fn new() -> Self {
        Self::default()
    }
}

/// One seat as the human sees it.
pub fn seat_line(player: &Player) -> String {
    let status = if player.is_alive { "alive" } else { "dead" };
    if player.is_human {
        format!("Seat {} (you, {}): {status}", player.seat, player.perceived_role)
    } else {
        format!("Seat {}: {status}", player.seat)
    }
}

impl Presenter for ConsolePresenter {
    fn seats_changed(&mut self, seats: &[Player]) {
        let alive: Vec<bool> = seats.iter().map(|p| p.is_alive).collect();
        if self.last_alive.as_ref() == Some(&alive) {
            return;
        }
        self.last_alive = Some(alive);

        println!("{}", "+--- Table ---".dark_grey());
        for player in seats {
            let line = seat_line(player);
            if player.is_alive {
                println!("| {line}");
            } else {
                println!("| {}", line.dark_grey());
            }
        }
        println!("{}", "+-------------".dark_grey());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clocktower_rules::{Role, Seat};

    #[test]
    fn test_seat_line_hides_other_roles() {
        let human = Player::new(Seat::new(4), true, Role::Empath, "rational");
        let mut other = Player::new(Seat::new(2), false, Role::Imp, "chaotic");
        other.kill();

        assert_eq!(seat_line(&human), "Seat 4 (you, Empath): alive");
        assert_eq!(seat_line(&other), "Seat 2: dead");
    }

    #[test]
    fn test_drunk_human_sees_believed_role() {
        let mut human = Player::new(Seat::new(1), true, Role::Drunk, "rational");
        human.make_drunk(Role::Monk);
        assert_eq!(seat_line(&human), "Seat 1 (you, Monk): alive");
    }
}

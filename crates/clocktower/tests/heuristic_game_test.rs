//! Whole games against the offline oracle.

use clocktower::HeuristicOracle;
use clocktower_rules::{Catalog, Game, HumanIo, NullPresenter, Phase, RulesConfig};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// A human who presses Enter at every prompt.
struct Passive;

#[async_trait::async_trait]
impl HumanIo for Passive {
    fn say(&mut self, _text: &str) {}

    async fn ask(&mut self, _prompt: &str) -> anyhow::Result<String> {
        Ok(String::new())
    }
}

#[tokio::test]
async fn test_heuristic_games_always_finish() {
    for seed in 0..20 {
        let mut game = Game::setup(
            RulesConfig::default(),
            &Catalog::trouble_brewing(),
            StdRng::seed_from_u64(seed),
            Box::new(HeuristicOracle::new(Some(seed))),
            Box::new(Passive),
            Box::new(NullPresenter),
        )
        .expect("valid setup");

        let winner = game.run().await.expect("game completes");

        let state = game.state();
        assert_eq!(state.phase(), Phase::GameOver, "seed {seed}");
        assert_eq!(state.winner(), winner, "seed {seed}");
        assert!(state.day_count() <= 10, "seed {seed}");
        assert!(state.check_invariants().is_ok(), "seed {seed}");
    }
}

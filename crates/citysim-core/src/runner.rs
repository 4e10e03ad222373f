//! Match loop runner.
//!
//! This module provides [`run_match`], the top-level async function that
//! plays one configured match from `init` to `finish`:
//!
//! - **Percepts**: `pre_step` builds every agent's view of the round
//! - **Decisions**: the [`DecisionSource`] answers within the round's budget,
//!   otherwise every agent skips
//! - **Resolution**: `step` applies the batch
//! - **Pacing**: the runner sleeps `round_interval_ms` between rounds
//!
//! Rounds are numbered from 1.

use std::collections::BTreeMap;
use std::time::Instant;

use citysim_types::{AgentName, MatchId, SimEndPercept, TeamName};
use tracing::{info, warn};

use crate::config::CitySimConfig;
use crate::decision::{DecisionError, DecisionSource};
use crate::perception;
use crate::simulation::{CitySimulation, InitError};
use crate::world_state::StateError;

/// Errors that can end a match early.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The match could not be built from its configuration.
    #[error("init error: {source}")]
    Init {
        /// The underlying init error.
        #[from]
        source: InitError,
    },

    /// Percept assembly or round resolution failed.
    #[error("round error: {source}")]
    Round {
        /// The underlying state error.
        #[from]
        source: StateError,
    },

    /// The decision source failed for a reason other than a timeout.
    #[error("decision error: {source}")]
    Decision {
        /// The underlying decision error.
        #[from]
        source: DecisionError,
    },
}

/// Result of a finished match.
#[derive(Debug)]
pub struct MatchResult {
    /// The match that was played.
    pub match_id: MatchId,
    /// Rank of every team (1-based, ties share a rank).
    pub ranking: BTreeMap<TeamName, u32>,
    /// Final money of every team.
    pub scores: BTreeMap<TeamName, i64>,
    /// Rounds resolved.
    pub rounds_played: u64,
    /// Rounds in which every agent skipped because decisions came too late.
    pub timed_out_rounds: u64,
    /// Match-end percept of every agent.
    pub end_percepts: BTreeMap<AgentName, SimEndPercept>,
}

/// Play one match to completion.
///
/// # Errors
///
/// Returns [`RunnerError`] if the configuration is rejected, if a round
/// fails in the money bookkeeping, or if the decision source fails with
/// anything other than a timeout.
pub async fn run_match(
    config: &CitySimConfig,
    decision_source: &mut dyn DecisionSource,
) -> Result<MatchResult, RunnerError> {
    let server = &config.server;
    let (mut sim, _start_percepts) =
        CitySimulation::init(server.rounds, &config.match_config, &server.teams)?;
    let mut timed_out_rounds: u64 = 0;

    info!(
        rounds = server.rounds,
        round_interval_ms = server.round_interval_ms,
        decision_budget_ms = server.decision_budget_ms,
        "Match starting"
    );

    for round in 1..=server.rounds {
        // --- Percepts ---
        let percepts = sim.pre_step(round)?;

        // --- Decisions ---
        let started = Instant::now();
        let decisions = match decision_source.collect_decisions(round, &percepts) {
            Ok(decisions) => {
                let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                if elapsed_ms > server.decision_budget_ms {
                    warn!(round, elapsed_ms, budget_ms = server.decision_budget_ms, "Decisions arrived late, everyone skips");
                    timed_out_rounds = timed_out_rounds.saturating_add(1);
                    BTreeMap::new()
                } else {
                    decisions
                }
            }
            Err(DecisionError::Timeout { round, budget_ms }) => {
                warn!(round, budget_ms, "Decision source timed out, everyone skips");
                timed_out_rounds = timed_out_rounds.saturating_add(1);
                BTreeMap::new()
            }
            Err(err) => return Err(err.into()),
        };

        // --- Resolution ---
        sim.step(round, &decisions)?;

        // --- Pacing ---
        if server.round_interval_ms > 0 && round < server.rounds {
            tokio::time::sleep(tokio::time::Duration::from_millis(server.round_interval_ms)).await;
        }
    }

    let end_percepts = sim.finish();
    let world = sim.world_state();
    Ok(MatchResult {
        match_id: world.match_id(),
        ranking: perception::ranking(world),
        scores: world.wallets(),
        rounds_played: sim.rounds_played(),
        timed_out_rounds,
        end_percepts,
    })
}

/// Log the match end.
pub fn log_match_end(result: &MatchResult) {
    let winners: Vec<&str> = result
        .ranking
        .iter()
        .filter(|(_, rank)| **rank == 1)
        .map(|(team, _)| team.as_str())
        .collect();
    info!(
        match_id = %result.match_id.into_inner(),
        rounds_played = result.rounds_played,
        timed_out_rounds = result.timed_out_rounds,
        ?winners,
        "Match ended"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use citysim_types::{Action, StepPercept};

    use super::*;
    use crate::decision::SkipDecisionSource;

    const SCENARIO: &str = r"
server:
  rounds: 4
  teams:
    - name: A
      agents:
        - { name: agentA1, role: car }
    - name: B
      agents:
        - { name: agentB1, role: car }
match:
  starting_money: 100
  roles:
    car: { speed: 100000, load: 50, battery: 500 }
  items:
    - { name: item0, volume: 5 }
  shops:
    - name: shop0
      lat: 51.5
      lon: -0.1
      offers:
        - { item: item0, price: 30, stock: 9 }
";

    fn config() -> CitySimConfig {
        serde_yml::from_str(SCENARIO).unwrap()
    }

    /// Sends agentA1 to the shop, then buys every round.
    struct Shopper;

    impl DecisionSource for Shopper {
        fn collect_decisions(
            &mut self,
            round: u64,
            _percepts: &BTreeMap<AgentName, StepPercept>,
        ) -> Result<BTreeMap<AgentName, Action>, DecisionError> {
            let action = if round == 1 {
                Action::new("goto", ["shop0"])
            } else {
                Action::new("buy", ["item0", "1"])
            };
            Ok(BTreeMap::from([(AgentName::from("agentA1"), action)]))
        }
    }

    struct Failing(DecisionError);

    impl DecisionSource for Failing {
        fn collect_decisions(
            &mut self,
            round: u64,
            _percepts: &BTreeMap<AgentName, StepPercept>,
        ) -> Result<BTreeMap<AgentName, Action>, DecisionError> {
            Err(match &self.0 {
                DecisionError::Timeout { budget_ms, .. } => DecisionError::Timeout {
                    round,
                    budget_ms: *budget_ms,
                },
                DecisionError::Internal { message } => DecisionError::Internal {
                    message: message.clone(),
                },
            })
        }
    }

    #[tokio::test]
    async fn skip_match_runs_every_round() {
        let mut source = SkipDecisionSource::new();
        let result = run_match(&config(), &mut source).await.unwrap();
        assert_eq!(result.rounds_played, 4);
        assert_eq!(result.timed_out_rounds, 0);
        assert_eq!(result.ranking.get("A"), Some(&1));
        assert_eq!(result.ranking.get("B"), Some(&1));
        assert_eq!(result.end_percepts.len(), 2);
        log_match_end(&result);
    }

    #[tokio::test]
    async fn decisions_drive_the_economy() {
        let result = run_match(&config(), &mut Shopper).await.unwrap();
        // One goto, then three buys of 30 each.
        assert_eq!(result.scores.get("A"), Some(&10));
        assert_eq!(result.scores.get("B"), Some(&100));
        assert_eq!(result.ranking.get("A"), Some(&2));
        assert_eq!(result.end_percepts.get("agentA1").unwrap().score, 10);
    }

    #[tokio::test]
    async fn timeouts_skip_the_round() {
        let mut source = Failing(DecisionError::Timeout {
            round: 0,
            budget_ms: 10,
        });
        let result = run_match(&config(), &mut source).await.unwrap();
        assert_eq!(result.rounds_played, 4);
        assert_eq!(result.timed_out_rounds, 4);
    }

    #[tokio::test]
    async fn internal_errors_end_the_match() {
        let mut source = Failing(DecisionError::Internal {
            message: "connection lost".into(),
        });
        let err = run_match(&config(), &mut source).await.unwrap_err();
        assert!(matches!(err, RunnerError::Decision { .. }));
    }

    #[tokio::test]
    async fn bad_configuration_is_an_init_error() {
        let mut config = config();
        config.server.teams.first_mut().unwrap().agents.first_mut().unwrap().role = "tank".into();
        let err = run_match(&config, &mut SkipDecisionSource::new()).await.unwrap_err();
        assert!(matches!(err, RunnerError::Init { .. }));
    }
}

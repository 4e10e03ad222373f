//! Decision source trait and the skip-only implementation.
//!
//! Before each round the runner hands every agent's [`StepPercept`] to a
//! [`DecisionSource`] and waits for one [`Action`] per agent. The trait
//! abstracts where decisions come from: remote agent connections, a
//! scripted bot, or a test stub. Session handling and wire encoding live
//! behind it.

use std::collections::BTreeMap;

use citysim_types::{Action, AgentName, StepPercept};

/// Errors that can occur while collecting decisions.
#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    /// Decisions did not arrive within the round's budget.
    #[error("decisions for round {round} timed out (budget: {budget_ms}ms)")]
    Timeout {
        /// The round being collected.
        round: u64,
        /// The budget in milliseconds.
        budget_ms: u64,
    },

    /// An internal error in the decision source.
    #[error("decision source error: {message}")]
    Internal {
        /// Description of the error.
        message: String,
    },
}

/// A source of agent decisions.
///
/// The runner calls [`collect_decisions`] once per round.
///
/// [`collect_decisions`]: DecisionSource::collect_decisions
pub trait DecisionSource {
    /// Collect one action per agent for `round`.
    ///
    /// Agents missing from the returned map are resolved as `skip`, which
    /// is how a source reports an individual agent that did not answer in
    /// time.
    ///
    /// # Errors
    ///
    /// Returns [`DecisionError`] if collection fails as a whole. A
    /// [`DecisionError::Timeout`] makes every agent skip the round; any
    /// other error ends the match.
    fn collect_decisions(
        &mut self,
        round: u64,
        percepts: &BTreeMap<AgentName, StepPercept>,
    ) -> Result<BTreeMap<AgentName, Action>, DecisionError>;
}

/// A decision source that answers `skip` for every agent.
#[derive(Debug, Clone, Default)]
pub struct SkipDecisionSource;

impl SkipDecisionSource {
    /// Create a new skip decision source.
    pub const fn new() -> Self {
        Self
    }
}

impl DecisionSource for SkipDecisionSource {
    fn collect_decisions(
        &mut self,
        _round: u64,
        percepts: &BTreeMap<AgentName, StepPercept>,
    ) -> Result<BTreeMap<AgentName, Action>, DecisionError> {
        Ok(percepts
            .keys()
            .map(|agent| (agent.clone(), Action::skip()))
            .collect())
    }
}

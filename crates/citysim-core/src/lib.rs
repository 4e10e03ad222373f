//! World state, job economy, action resolution, and match orchestration for
//! the CitySim scenario engine.
//!
//! This crate owns the per-round resolution pipeline that turns a batch of
//! simultaneously submitted actions into one deterministic new world state:
//! job activation, parsing, random failure, application in canonical agent
//! order, passive-action finalisation, job expiry, shop restock, and ledger
//! reconciliation.
//!
//! # Modules
//!
//! - [`actions`] -- One handler per verb, run inside a [`Resolution`] pass.
//! - [`config`] -- Configuration loading from `citysim-config.yaml` into
//!   strongly-typed structs.
//! - [`decision`] -- [`DecisionSource`] trait and [`SkipDecisionSource`].
//! - [`job`] -- The job and auction state machine.
//! - [`perception`] -- Match-start, round-start, and match-end percepts.
//! - [`rng`] -- The seeded random source passed into resolution.
//! - [`round`] -- The round pipeline, [`resolve_round`].
//! - [`runner`] -- The async match loop, [`run_match`].
//! - [`simulation`] -- The [`CitySimulation`] facade: `init`, `pre_step`,
//!   `step`, `finish`.
//! - [`world_state`] -- [`WorldState`], the single source of truth for a match.
//!
//! [`Resolution`]: actions::Resolution
//! [`DecisionSource`]: decision::DecisionSource
//! [`SkipDecisionSource`]: decision::SkipDecisionSource
//! [`resolve_round`]: round::resolve_round
//! [`run_match`]: runner::run_match
//! [`CitySimulation`]: simulation::CitySimulation
//! [`WorldState`]: world_state::WorldState

pub mod actions;
pub mod config;
pub mod decision;
pub mod job;
pub mod perception;
pub mod rng;
pub mod round;
pub mod runner;
pub mod simulation;
pub mod world_state;

#[cfg(test)]
mod test_support;

pub use config::CitySimConfig;
pub use round::RoundReport;
pub use simulation::{CitySimulation, InitError};
pub use world_state::{Rules, StateError, WorldState};

//! Shared type definitions for the CitySim scenario engine.
//!
//! This crate is the single source of truth for the types that cross the
//! engine boundary: identities, action verbs and result codes, wire actions,
//! and percepts. Types defined here flow downstream to `TypeScript` via
//! `ts-rs` for agent client authors.
//!
//! # Modules
//!
//! - [`ids`] -- Name newtypes for agents, teams, facilities, items, jobs, roles
//! - [`enums`] -- Action verbs, result codes, facility kinds, job status
//! - [`structs`] -- Locations and roles
//! - [`actions`] -- Wire actions, typed parameters, last-action records
//! - [`perception`] -- Percepts delivered at match start, each round, and match end

pub mod actions;
pub mod enums;
pub mod ids;
pub mod perception;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use actions::{Action, ActionParameters, GotoTarget, LastAction};
pub use enums::{ActionResultCode, ActionType, FacilityKind, JobStatus};
pub use ids::{AgentName, FacilityName, ItemName, JobName, MatchId, RoleName, TeamName};
pub use perception::{
    FacilityDetails, ItemInfo, SelfPercept, ShopOffer, SimEndPercept, SimStartPercept,
    StepPercept, VisibleAuction, VisibleEntity, VisibleFacility, VisibleJob,
};
pub use structs::{Location, Role};

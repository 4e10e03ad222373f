//! Error types for the citysim-agents crate.
//!
//! All entity and team operations that can fail return typed errors rather
//! than panicking. A failed operation leaves the entity or team unchanged.

use citysim_types::{AgentName, ItemName, TeamName};
use citysim_world::WorldError;

/// Errors that can occur during entity and team operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AgentError {
    /// Adding the items would exceed the load capacity.
    #[error("inventory overflow: adding {attempted} volume of {item} would exceed capacity (current load: {current_load}, capacity: {capacity})")]
    InventoryOverflow {
        /// The item being added.
        item: ItemName,
        /// Volume the caller attempted to add.
        attempted: u32,
        /// Volume already carried.
        current_load: u32,
        /// The role's load capacity.
        capacity: u32,
    },

    /// Attempted to remove more of an item than the entity holds.
    #[error("insufficient item: wanted {requested} of {item} but only have {available}")]
    InsufficientItem {
        /// The item being removed.
        item: ItemName,
        /// Units requested.
        requested: u32,
        /// Units held.
        available: u32,
    },

    /// Catalog lookup failed.
    #[error(transparent)]
    World(#[from] WorldError),

    /// An entity name was registered twice.
    #[error("duplicate agent name: {0}")]
    DuplicateAgent(AgentName),

    /// A team name was registered twice.
    #[error("duplicate team name: {0}")]
    DuplicateTeam(TeamName),

    /// Arithmetic overflow during a checked computation.
    #[error("arithmetic overflow: {context}")]
    ArithmeticOverflow {
        /// Description of what was being computed.
        context: String,
    },
}

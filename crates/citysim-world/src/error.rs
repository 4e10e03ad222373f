//! Error types for the `citysim-world` crate.
//!
//! Facility operations return [`WorldError`] when a request cannot be
//! applied. They never partially apply: on `Err` the facility is unchanged.

use citysim_types::{FacilityName, ItemName};

/// Errors that can occur during catalog and facility operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorldError {
    /// An item name is not in the catalog.
    #[error("unknown item: {0}")]
    UnknownItem(ItemName),

    /// An item was registered twice.
    #[error("duplicate item: {0}")]
    DuplicateItem(ItemName),

    /// An item requires itself, directly or transitively.
    #[error("item {0} requires itself through its assembly recipe")]
    CyclicRecipe(ItemName),

    /// Item volumes must be positive.
    #[error("item {0} has zero volume")]
    ZeroVolume(ItemName),

    /// A facility name is not registered.
    #[error("unknown facility: {0}")]
    UnknownFacility(FacilityName),

    /// A facility was registered twice.
    #[error("duplicate facility: {0}")]
    DuplicateFacility(FacilityName),

    /// A resource node gather probability outside `(0, 1)`.
    #[error("resource node {node} has gather probability {probability}, expected (0, 1)")]
    InvalidGatherProbability {
        /// The misconfigured node.
        node: FacilityName,
        /// The configured probability.
        probability: f64,
    },

    /// The shop does not offer the item.
    #[error("item {0} is not offered here")]
    NotOffered(ItemName),

    /// The shop has fewer units in stock than requested.
    #[error("insufficient stock of {item}: wanted {requested}, have {available}")]
    InsufficientStock {
        /// The item.
        item: ItemName,
        /// Units requested.
        requested: u32,
        /// Units in stock.
        available: u32,
    },

    /// A storage bucket holds fewer units than requested.
    #[error("insufficient {item} in storage: wanted {requested}, have {available}")]
    InsufficientStored {
        /// The item.
        item: ItemName,
        /// Units requested.
        requested: u32,
        /// Units held.
        available: u32,
    },

    /// The storage does not have room for the volume.
    #[error("storage full: {requested} volume requested, {free} free")]
    StorageFull {
        /// Volume requested.
        requested: u32,
        /// Volume still free.
        free: u32,
    },

    /// Arithmetic overflow during a checked operation.
    #[error("arithmetic overflow in world calculation")]
    ArithmeticOverflow,
}

//! Static world data and facilities for the CitySim scenario engine.
//!
//! This crate models everything in a match that is not an agent: the item
//! catalog with its assembly recipes, map geometry, and the facility family
//! agents interact with.
//!
//! # Modules
//!
//! - [`error`] -- Error types for catalog and facility operations.
//! - [`facility`] -- [`Facility`] records, their kind-specific payloads, and
//!   the [`FacilityRegistry`] that owns them.
//! - [`item`] -- The validated, acyclic [`ItemCatalog`].
//! - [`location`] -- Distances, bounded per-round movement, map bounds.
//! - [`shop`] -- Priced, stock-limited offers with periodic restocking.
//! - [`storage`] -- Capacity-bounded team stores and job delivery buckets.

pub mod error;
pub mod facility;
pub mod item;
pub mod location;
pub mod shop;
pub mod storage;

// Re-export primary types at crate root.
pub use error::WorldError;
pub use facility::{ChargingStation, Facility, FacilityPayload, FacilityRegistry, ResourceNode};
pub use item::{Item, ItemCatalog};
pub use location::{MapBounds, Step, distance, step_toward};
pub use shop::{Shop, ShopItem};
pub use storage::{Bucket, Storage};

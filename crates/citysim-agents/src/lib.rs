//! Entity state, inventories, and team wallets for the CitySim scenario engine.
//!
//! This crate contains the logic layer for agents: everything that operates
//! on a single entity or team without looking at the rest of the world. It
//! sits between `citysim-world` (catalog and facilities) and `citysim-core`
//! (world state and action resolution).
//!
//! # Modules
//!
//! - [`entity`] -- [`Entity`] runtime state: location, battery, inventory, last action
//! - [`error`] -- Error types for entity and team operations ([`AgentError`])
//! - [`inventory`] -- Volume-weighted inventory operations with load capacity
//! - [`team`] -- [`Team`] wallet and roster

pub mod entity;
pub mod error;
pub mod inventory;
pub mod team;

pub use entity::Entity;
pub use error::AgentError;
pub use inventory::Inventory;
pub use team::Team;

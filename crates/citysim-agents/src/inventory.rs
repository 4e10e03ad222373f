//! Inventory operations for entities.
//!
//! An inventory is a bag of items bounded by the role's load capacity, where
//! each unit weighs its catalog volume. Every function here uses checked
//! arithmetic and either applies in full or leaves the bag untouched.

use std::collections::BTreeMap;

use citysim_types::ItemName;
use citysim_world::ItemCatalog;

use crate::error::AgentError;

/// A bag of items.
pub type Inventory = BTreeMap<ItemName, u32>;

/// Total volume carried.
pub fn load(inventory: &Inventory, catalog: &ItemCatalog) -> Result<u32, AgentError> {
    Ok(catalog.volume_of_all(inventory)?)
}

/// Units of `item` held.
pub fn count(inventory: &Inventory, item: &str) -> u32 {
    inventory.get(item).copied().unwrap_or(0)
}

/// Whether `volume` more fits under `capacity`.
pub fn fits(
    inventory: &Inventory,
    catalog: &ItemCatalog,
    capacity: u32,
    volume: u32,
) -> Result<bool, AgentError> {
    let current = load(inventory, catalog)?;
    Ok(current
        .checked_add(volume)
        .is_some_and(|total| total <= capacity))
}

/// Add `amount` units of `item`.
///
/// Fails if the added volume would exceed `capacity`.
pub fn add_item(
    inventory: &mut Inventory,
    catalog: &ItemCatalog,
    capacity: u32,
    item: &ItemName,
    amount: u32,
) -> Result<(), AgentError> {
    let current_load = load(inventory, catalog)?;
    let attempted = catalog.volume_of(item.as_str(), amount)?;
    let overflow = || AgentError::InventoryOverflow {
        item: item.clone(),
        attempted,
        current_load,
        capacity,
    };

    let new_load = current_load.checked_add(attempted).ok_or_else(overflow)?;
    if new_load > capacity {
        return Err(overflow());
    }

    let entry = inventory.entry(item.clone()).or_insert(0);
    *entry = entry
        .checked_add(amount)
        .ok_or_else(|| AgentError::ArithmeticOverflow {
            context: String::from("item quantity overflow in add_item"),
        })?;
    Ok(())
}

/// Remove `amount` units of `item`. The key disappears at zero.
pub fn remove_item(inventory: &mut Inventory, item: &str, amount: u32) -> Result<(), AgentError> {
    let current = count(inventory, item);
    let remaining = current
        .checked_sub(amount)
        .ok_or_else(|| AgentError::InsufficientItem {
            item: ItemName::from(item),
            requested: amount,
            available: current,
        })?;

    if remaining == 0 {
        inventory.remove(item);
    } else if let Some(entry) = inventory.get_mut(item) {
        *entry = remaining;
    }
    Ok(())
}

/// Empty the inventory, returning what it held.
pub const fn drain_all(inventory: &mut Inventory) -> Inventory {
    let mut drained = BTreeMap::new();
    core::mem::swap(inventory, &mut drained);
    drained
}

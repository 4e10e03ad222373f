//! Runtime state of one agent-controlled entity.
//!
//! An [`Entity`] is created at match init from the team roster, mutated once
//! per round by the resolver, and dropped when the match ends. Its inventory
//! never weighs more than the role's load capacity.

use citysim_types::{AgentName, ItemName, LastAction, Location, Role, SelfPercept, TeamName};
use citysim_world::ItemCatalog;

use crate::error::AgentError;
use crate::inventory::{self, Inventory};

/// One entity's mutable state.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Entity name.
    pub name: AgentName,
    /// Owning team.
    pub team: TeamName,
    /// Speed, load, and battery limits.
    pub role: Role,
    /// Current position.
    pub location: Location,
    /// Where an unfinished `goto` is headed.
    pub destination: Option<Location>,
    /// Current charge, at most `role.battery`.
    pub battery: u32,
    /// Last round's action and result.
    pub last_action: LastAction,
    inventory: Inventory,
}

impl Entity {
    /// A fully charged entity with an empty inventory.
    pub fn new(name: AgentName, team: TeamName, role: Role, location: Location) -> Self {
        let battery = role.battery;
        Self {
            name,
            team,
            role,
            location,
            destination: None,
            battery,
            last_action: LastAction::default(),
            inventory: Inventory::new(),
        }
    }

    /// The carried items.
    pub const fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Units of `item` carried.
    pub fn item_count(&self, item: &str) -> u32 {
        inventory::count(&self.inventory, item)
    }

    /// Volume carried.
    pub fn load(&self, catalog: &ItemCatalog) -> Result<u32, AgentError> {
        inventory::load(&self.inventory, catalog)
    }

    /// Whether `volume` more fits.
    pub fn can_carry(&self, catalog: &ItemCatalog, volume: u32) -> Result<bool, AgentError> {
        inventory::fits(&self.inventory, catalog, self.role.load, volume)
    }

    /// Add items, bounded by the role's load capacity.
    pub fn add_item(
        &mut self,
        catalog: &ItemCatalog,
        item: &ItemName,
        amount: u32,
    ) -> Result<(), AgentError> {
        inventory::add_item(&mut self.inventory, catalog, self.role.load, item, amount)
    }

    /// Remove items.
    pub fn remove_item(&mut self, item: &str, amount: u32) -> Result<(), AgentError> {
        inventory::remove_item(&mut self.inventory, item, amount)
    }

    /// Drop everything carried.
    pub fn clear_inventory(&mut self) -> Inventory {
        inventory::drain_all(&mut self.inventory)
    }

    /// Move to `location`. Reaching the route target clears it.
    pub fn set_location(&mut self, location: Location) {
        self.location = location;
        if self
            .destination
            .is_some_and(|target| target.same_place(&location))
        {
            self.destination = None;
        }
    }

    /// Whether the entity stands on `location`.
    pub fn is_at(&self, location: &Location) -> bool {
        self.location.same_place(location)
    }

    /// Use `amount` charge. Returns `false` (and uses nothing) if the
    /// battery holds less.
    pub fn discharge(&mut self, amount: u32) -> bool {
        match self.battery.checked_sub(amount) {
            Some(left) => {
                self.battery = left;
                true
            }
            None => false,
        }
    }

    /// Add `amount` charge, capped at the role's maximum. Returns the charge
    /// actually added.
    pub fn charge(&mut self, amount: u32) -> u32 {
        let before = self.battery;
        self.battery = before.saturating_add(amount).min(self.role.battery);
        self.battery.saturating_sub(before)
    }

    /// The entity's own part of its percept.
    pub fn self_percept(&self, catalog: &ItemCatalog) -> Result<SelfPercept, AgentError> {
        Ok(SelfPercept {
            name: self.name.clone(),
            team: self.team.clone(),
            role: self.role.name.clone(),
            location: self.location,
            destination: self.destination,
            battery: self.battery,
            load: self.load(catalog)?,
            load_capacity: self.role.load,
            inventory: self.inventory.clone(),
            last_action: self.last_action.clone(),
        })
    }
}

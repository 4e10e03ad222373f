//! The static item catalog.
//!
//! Every item has a volume (for inventory and storage accounting) and an
//! optional assembly recipe: items consumed and tools that must be present
//! but are not consumed. Items without a recipe are base resources.
//!
//! The catalog is validated once at construction. After that every name it
//! hands out resolves, and the requirement graph is known to be acyclic.

use std::collections::{BTreeMap, BTreeSet};

use citysim_types::{ItemInfo, ItemName};

use crate::error::WorldError;

/// One item definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Item name.
    pub name: ItemName,
    /// Volume per unit.
    pub volume: u32,
    /// Items consumed by assembly.
    pub required_items: BTreeMap<ItemName, u32>,
    /// Tools required (not consumed) by assembly.
    pub required_tools: BTreeSet<ItemName>,
}

impl Item {
    /// A base item with no recipe.
    pub fn base(name: impl Into<ItemName>, volume: u32) -> Self {
        Self {
            name: name.into(),
            volume,
            required_items: BTreeMap::new(),
            required_tools: BTreeSet::new(),
        }
    }

    /// Whether the item has no recipe.
    pub fn is_base(&self) -> bool {
        self.required_items.is_empty() && self.required_tools.is_empty()
    }

    /// Agent-facing description of the item.
    pub fn info(&self) -> ItemInfo {
        ItemInfo {
            name: self.name.clone(),
            volume: self.volume,
            required_items: self.required_items.clone(),
            required_tools: self.required_tools.clone(),
        }
    }
}

/// DFS colouring for cycle detection.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// The validated set of items in a match.
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    items: BTreeMap<ItemName, Item>,
    /// Registration order, which is the order agents see the catalog in.
    order: Vec<ItemName>,
}

impl ItemCatalog {
    /// Build and validate a catalog.
    ///
    /// # Errors
    ///
    /// Fails on duplicate names, zero volumes, recipe references to items
    /// not in the catalog, and cyclic requirement graphs.
    pub fn new(items: Vec<Item>) -> Result<Self, WorldError> {
        let mut catalog = Self::default();
        for item in items {
            if item.volume == 0 {
                return Err(WorldError::ZeroVolume(item.name));
            }
            if catalog.items.contains_key(&item.name) {
                return Err(WorldError::DuplicateItem(item.name));
            }
            catalog.order.push(item.name.clone());
            catalog.items.insert(item.name.clone(), item);
        }

        for item in catalog.items.values() {
            for dep in item.required_items.keys().chain(&item.required_tools) {
                if !catalog.items.contains_key(dep) {
                    return Err(WorldError::UnknownItem(dep.clone()));
                }
            }
        }

        let mut marks = BTreeMap::new();
        for name in &catalog.order {
            catalog.visit(name, &mut marks)?;
        }

        Ok(catalog)
    }

    fn visit(&self, name: &ItemName, marks: &mut BTreeMap<ItemName, Mark>) -> Result<(), WorldError> {
        match marks.get(name) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::InProgress) => return Err(WorldError::CyclicRecipe(name.clone())),
            None => {}
        }
        marks.insert(name.clone(), Mark::InProgress);
        let item = self.get(name.as_str())?;
        for dep in item.required_items.keys().chain(&item.required_tools) {
            self.visit(dep, marks)?;
        }
        marks.insert(name.clone(), Mark::Done);
        Ok(())
    }

    /// Look up an item.
    pub fn get(&self, name: &str) -> Result<&Item, WorldError> {
        self.items
            .get(name)
            .ok_or_else(|| WorldError::UnknownItem(ItemName::from(name)))
    }

    /// Whether the item exists.
    pub fn contains(&self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    /// Items in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.order.iter().filter_map(|name| self.items.get(name))
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Volume of `count` units of `name`.
    pub fn volume_of(&self, name: &str, count: u32) -> Result<u32, WorldError> {
        self.get(name)?
            .volume
            .checked_mul(count)
            .ok_or(WorldError::ArithmeticOverflow)
    }

    /// Total volume of a bag of items.
    pub fn volume_of_all(&self, items: &BTreeMap<ItemName, u32>) -> Result<u32, WorldError> {
        items.iter().try_fold(0_u32, |acc, (name, count)| {
            acc.checked_add(self.volume_of(name.as_str(), *count)?)
                .ok_or(WorldError::ArithmeticOverflow)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn recipe(name: &str, volume: u32, items: &[(&str, u32)], tools: &[&str]) -> Item {
        Item {
            name: ItemName::from(name),
            volume,
            required_items: items.iter().map(|(n, c)| (ItemName::from(*n), *c)).collect(),
            required_tools: tools.iter().map(|n| ItemName::from(*n)).collect(),
        }
    }

    #[test]
    fn keeps_registration_order() {
        let catalog = ItemCatalog::new(vec![
            Item::base("item1", 5),
            Item::base("item0", 3),
            Item::base("tool0", 10),
        ])
        .unwrap();
        let names: Vec<&str> = catalog.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["item1", "item0", "tool0"]);
    }

    #[test]
    fn accepts_layered_recipes() {
        let catalog = ItemCatalog::new(vec![
            Item::base("item0", 3),
            Item::base("tool0", 10),
            recipe("item1", 7, &[("item0", 2)], &["tool0"]),
            recipe("item2", 12, &[("item1", 1), ("item0", 1)], &[]),
        ]);
        assert!(catalog.is_ok());
        let catalog = catalog.unwrap();
        assert!(catalog.get("item0").unwrap().is_base());
        assert!(!catalog.get("item2").unwrap().is_base());
    }

    #[test]
    fn rejects_self_requirement() {
        let result = ItemCatalog::new(vec![recipe("item0", 3, &[("item0", 1)], &[])]);
        assert_eq!(result.err(), Some(WorldError::CyclicRecipe(ItemName::from("item0"))));
    }

    #[test]
    fn rejects_transitive_cycle_through_tools() {
        let result = ItemCatalog::new(vec![
            recipe("a", 1, &[("b", 1)], &[]),
            recipe("b", 1, &[], &["c"]),
            recipe("c", 1, &[("a", 1)], &[]),
        ]);
        assert!(matches!(result, Err(WorldError::CyclicRecipe(_))));
    }

    #[test]
    fn rejects_unknown_requirement() {
        let result = ItemCatalog::new(vec![recipe("a", 1, &[("ghost", 1)], &[])]);
        assert_eq!(result.err(), Some(WorldError::UnknownItem(ItemName::from("ghost"))));
    }

    #[test]
    fn rejects_duplicates_and_zero_volume() {
        let dup = ItemCatalog::new(vec![Item::base("a", 1), Item::base("a", 2)]);
        assert_eq!(dup.err(), Some(WorldError::DuplicateItem(ItemName::from("a"))));
        let zero = ItemCatalog::new(vec![Item::base("a", 0)]);
        assert_eq!(zero.err(), Some(WorldError::ZeroVolume(ItemName::from("a"))));
    }

    #[test]
    fn volume_of_all_weights_by_volume() {
        let catalog =
            ItemCatalog::new(vec![Item::base("item0", 3), Item::base("tool0", 10)]).unwrap();
        let bag = BTreeMap::from([(ItemName::from("item0"), 4), (ItemName::from("tool0"), 1)]);
        assert_eq!(catalog.volume_of_all(&bag), Ok(22));
        assert!(catalog.volume_of("ghost", 1).is_err());
    }
}

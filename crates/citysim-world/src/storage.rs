//! Storages: volume-bounded per-team stores plus per-team delivery buckets.
//!
//! Each team has two buckets at every storage. `stored` holds goods the team
//! put there itself and counts against the storage capacity. `delivered`
//! holds goods other teams delivered to the team's jobs and does not.

use std::collections::BTreeMap;

use citysim_types::{ItemName, TeamName};

use crate::error::WorldError;
use crate::item::ItemCatalog;

/// A bag of items.
pub type Bucket = BTreeMap<ItemName, u32>;

/// Storage payload of a facility.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Storage {
    /// Total volume the `stored` buckets may occupy.
    pub capacity: u32,
    stored: BTreeMap<TeamName, Bucket>,
    delivered: BTreeMap<TeamName, Bucket>,
}

impl Storage {
    /// An empty storage.
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// Volume occupied by all teams' stored goods.
    pub fn used_capacity(&self, catalog: &ItemCatalog) -> Result<u32, WorldError> {
        self.stored.values().try_fold(0_u32, |acc, bucket| {
            acc.checked_add(catalog.volume_of_all(bucket)?)
                .ok_or(WorldError::ArithmeticOverflow)
        })
    }

    /// Volume still free.
    pub fn free_capacity(&self, catalog: &ItemCatalog) -> Result<u32, WorldError> {
        Ok(self.capacity.saturating_sub(self.used_capacity(catalog)?))
    }

    /// Units of `item` the team has stored here.
    pub fn stored(&self, team: &str, item: &str) -> u32 {
        count(&self.stored, team, item)
    }

    /// Units of `item` delivered to the team here.
    pub fn delivered(&self, team: &str, item: &str) -> u32 {
        count(&self.delivered, team, item)
    }

    /// The team's whole stored bucket.
    pub fn stored_bucket(&self, team: &str) -> Bucket {
        self.stored.get(team).cloned().unwrap_or_default()
    }

    /// The team's whole delivered bucket.
    pub fn delivered_bucket(&self, team: &str) -> Bucket {
        self.delivered.get(team).cloned().unwrap_or_default()
    }

    /// Put `amount` units into the team's stored bucket.
    ///
    /// Fails without storing anything if the volume does not fit.
    pub fn store(
        &mut self,
        catalog: &ItemCatalog,
        team: &TeamName,
        item: &ItemName,
        amount: u32,
    ) -> Result<(), WorldError> {
        let requested = catalog.volume_of(item.as_str(), amount)?;
        let free = self.free_capacity(catalog)?;
        if requested > free {
            return Err(WorldError::StorageFull { requested, free });
        }
        add(&mut self.stored, team, item, amount)
    }

    /// Take `amount` units out of the team's stored bucket.
    pub fn remove_stored(&mut self, team: &str, item: &str, amount: u32) -> Result<(), WorldError> {
        remove(&mut self.stored, team, item, amount)
    }

    /// Put `amount` units into the team's delivered bucket (no capacity limit).
    pub fn add_delivered(
        &mut self,
        team: &TeamName,
        item: &ItemName,
        amount: u32,
    ) -> Result<(), WorldError> {
        add(&mut self.delivered, team, item, amount)
    }

    /// Take `amount` units out of the team's delivered bucket.
    pub fn remove_delivered(
        &mut self,
        team: &str,
        item: &str,
        amount: u32,
    ) -> Result<(), WorldError> {
        remove(&mut self.delivered, team, item, amount)
    }
}

fn count(buckets: &BTreeMap<TeamName, Bucket>, team: &str, item: &str) -> u32 {
    buckets
        .get(team)
        .and_then(|bucket| bucket.get(item))
        .copied()
        .unwrap_or(0)
}

fn add(
    buckets: &mut BTreeMap<TeamName, Bucket>,
    team: &TeamName,
    item: &ItemName,
    amount: u32,
) -> Result<(), WorldError> {
    let entry = buckets
        .entry(team.clone())
        .or_default()
        .entry(item.clone())
        .or_insert(0);
    *entry = entry
        .checked_add(amount)
        .ok_or(WorldError::ArithmeticOverflow)?;
    Ok(())
}

fn remove(
    buckets: &mut BTreeMap<TeamName, Bucket>,
    team: &str,
    item: &str,
    amount: u32,
) -> Result<(), WorldError> {
    let available = count(buckets, team, item);
    let remaining = available
        .checked_sub(amount)
        .ok_or_else(|| WorldError::InsufficientStored {
            item: ItemName::from(item),
            requested: amount,
            available,
        })?;
    if let Some(bucket) = buckets.get_mut(team) {
        if remaining == 0 {
            bucket.remove(item);
        } else if let Some(entry) = bucket.get_mut(item) {
            *entry = remaining;
        }
    }
    Ok(())
}

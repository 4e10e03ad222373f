//! The facility family and the registry that owns every facility of a match.
//!
//! A facility is a named, fixed location with a kind-specific payload. The
//! resolver dispatches on [`FacilityPayload`] by pattern matching; there is
//! no behaviour attached to the facility record itself.

use std::collections::BTreeMap;

use citysim_types::{FacilityDetails, FacilityKind, FacilityName, ItemName, Location, VisibleFacility};
use tracing::debug;

use crate::error::WorldError;
use crate::item::ItemCatalog;
use crate::shop::Shop;
use crate::storage::Storage;

/// Charging station payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargingStation {
    /// Battery added per `charge`.
    pub rate: u32,
}

/// Resource node payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceNode {
    /// The item a successful gather yields.
    pub resource: ItemName,
    /// Chance that one gather attempt succeeds, in `(0, 1)`.
    pub gather_probability: f64,
}

/// Kind-specific facility state.
#[derive(Debug, Clone, PartialEq)]
pub enum FacilityPayload {
    /// See [`Shop`].
    Shop(Shop),
    /// See [`Storage`].
    Storage(Storage),
    /// Assembly happens here.
    Workshop,
    /// Items are destroyed here.
    Dump,
    /// See [`ChargingStation`].
    ChargingStation(ChargingStation),
    /// See [`ResourceNode`].
    ResourceNode(ResourceNode),
}

impl FacilityPayload {
    /// The kind this payload belongs to.
    pub const fn kind(&self) -> FacilityKind {
        match self {
            Self::Shop(_) => FacilityKind::Shop,
            Self::Storage(_) => FacilityKind::Storage,
            Self::Workshop => FacilityKind::Workshop,
            Self::Dump => FacilityKind::Dump,
            Self::ChargingStation(_) => FacilityKind::ChargingStation,
            Self::ResourceNode(_) => FacilityKind::ResourceNode,
        }
    }
}

/// A named facility at a fixed location.
#[derive(Debug, Clone, PartialEq)]
pub struct Facility {
    /// Facility name.
    pub name: FacilityName,
    /// Facility position. Never changes during a match.
    pub location: Location,
    /// Kind-specific state.
    pub payload: FacilityPayload,
}

impl Facility {
    /// Create a facility.
    pub fn new(name: impl Into<FacilityName>, location: Location, payload: FacilityPayload) -> Self {
        Self {
            name: name.into(),
            location,
            payload,
        }
    }

    /// The facility kind.
    pub const fn kind(&self) -> FacilityKind {
        self.payload.kind()
    }

    /// The shop payload, if this is a shop.
    pub fn as_shop_mut(&mut self) -> Option<&mut Shop> {
        match &mut self.payload {
            FacilityPayload::Shop(shop) => Some(shop),
            _ => None,
        }
    }

    /// The storage payload, if this is a storage.
    pub fn as_storage(&self) -> Option<&Storage> {
        match &self.payload {
            FacilityPayload::Storage(storage) => Some(storage),
            _ => None,
        }
    }

    /// The storage payload, if this is a storage.
    pub fn as_storage_mut(&mut self) -> Option<&mut Storage> {
        match &mut self.payload {
            FacilityPayload::Storage(storage) => Some(storage),
            _ => None,
        }
    }

    /// What a member of `team` sees of this facility.
    pub fn view_for(&self, team: &str, catalog: &ItemCatalog) -> Result<VisibleFacility, WorldError> {
        let details = match &self.payload {
            FacilityPayload::Shop(shop) => FacilityDetails::Shop {
                offers: shop.visible_offers(),
            },
            FacilityPayload::Storage(storage) => FacilityDetails::Storage {
                capacity: storage.capacity,
                used: storage.used_capacity(catalog)?,
                stored: storage.stored_bucket(team),
                delivered: storage.delivered_bucket(team),
            },
            FacilityPayload::Workshop => FacilityDetails::Workshop,
            FacilityPayload::Dump => FacilityDetails::Dump,
            FacilityPayload::ChargingStation(station) => {
                FacilityDetails::ChargingStation { rate: station.rate }
            }
            FacilityPayload::ResourceNode(node) => FacilityDetails::ResourceNode {
                resource: node.resource.clone(),
            },
        };
        Ok(VisibleFacility {
            name: self.name.clone(),
            kind: self.kind(),
            location: self.location,
            details,
        })
    }
}

/// Every facility of a match, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct FacilityRegistry {
    facilities: BTreeMap<FacilityName, Facility>,
}

impl FacilityRegistry {
    /// Build a registry, validating names and payloads against the catalog.
    pub fn new(facilities: Vec<Facility>, catalog: &ItemCatalog) -> Result<Self, WorldError> {
        let mut registry = Self::default();
        for facility in facilities {
            registry.insert(facility, catalog)?;
        }
        debug!(facilities = registry.facilities.len(), "facility registry built");
        Ok(registry)
    }

    fn insert(&mut self, facility: Facility, catalog: &ItemCatalog) -> Result<(), WorldError> {
        if self.facilities.contains_key(&facility.name) {
            return Err(WorldError::DuplicateFacility(facility.name));
        }
        match &facility.payload {
            FacilityPayload::Shop(shop) => {
                if let Some(unknown) = shop.offered_items().find(|i| !catalog.contains(i.as_str())) {
                    return Err(WorldError::UnknownItem(unknown.clone()));
                }
            }
            FacilityPayload::ResourceNode(node) => {
                catalog.get(node.resource.as_str())?;
                let p = node.gather_probability;
                if !(p > 0.0 && p < 1.0) {
                    return Err(WorldError::InvalidGatherProbability {
                        node: facility.name,
                        probability: p,
                    });
                }
            }
            FacilityPayload::Storage(_)
            | FacilityPayload::Workshop
            | FacilityPayload::Dump
            | FacilityPayload::ChargingStation(_) => {}
        }
        self.facilities.insert(facility.name.clone(), facility);
        Ok(())
    }

    /// Look up a facility by name.
    pub fn get(&self, name: &str) -> Result<&Facility, WorldError> {
        self.facilities
            .get(name)
            .ok_or_else(|| WorldError::UnknownFacility(FacilityName::from(name)))
    }

    /// Look up a facility by name for mutation.
    pub fn get_mut(&mut self, name: &str) -> Result<&mut Facility, WorldError> {
        self.facilities
            .get_mut(name)
            .ok_or_else(|| WorldError::UnknownFacility(FacilityName::from(name)))
    }

    /// The facility standing at `location`, if any.
    ///
    /// If several share a spot the first by name wins.
    pub fn at(&self, location: &Location) -> Option<&Facility> {
        self.facilities.values().find(|f| f.location.same_place(location))
    }

    /// Name of the facility of `kind` standing at `location`, if any.
    pub fn name_of_kind_at(&self, kind: FacilityKind, location: &Location) -> Option<FacilityName> {
        self.facilities
            .values()
            .find(|f| f.kind() == kind && f.location.same_place(location))
            .map(|f| f.name.clone())
    }

    /// All facilities in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Facility> {
        self.facilities.values()
    }

    /// All facilities in name order, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Facility> {
        self.facilities.values_mut()
    }

    /// Facilities of one kind, in name order.
    pub fn of_kind(&self, kind: FacilityKind) -> impl Iterator<Item = &Facility> {
        self.facilities.values().filter(move |f| f.kind() == kind)
    }

    /// Number of facilities.
    pub fn len(&self) -> usize {
        self.facilities.len()
    }

    /// Whether there are no facilities.
    pub fn is_empty(&self) -> bool {
        self.facilities.is_empty()
    }
}

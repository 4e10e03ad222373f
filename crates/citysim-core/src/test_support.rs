//! Shared fixture for unit tests: a small city with one facility of each
//! kind and two teams.

#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

use std::collections::{BTreeMap, BTreeSet};

use citysim_agents::{Entity, Team};
use citysim_types::{Action, ActionResultCode, AgentName, ItemName, JobName, Location, Role, TeamName};
use citysim_world::{
    ChargingStation, Facility, FacilityPayload, FacilityRegistry, Item, ItemCatalog, ResourceNode,
    Shop, ShopItem, Storage,
};

use crate::rng::SimRng;
use crate::round::{RoundReport, resolve_round};
use crate::world_state::{Rules, WorldState};

/// Fixture locations, about a kilometre apart.
pub mod at {
    use citysim_types::Location;

    pub const START: Location = Location::new(51.50, -0.10);
    pub const SHOP: Location = Location::new(51.51, -0.10);
    pub const STORAGE: Location = Location::new(51.52, -0.10);
    pub const WORKSHOP: Location = Location::new(51.50, -0.11);
    pub const DUMP: Location = Location::new(51.50, -0.12);
    pub const CHARGER: Location = Location::new(51.49, -0.10);
    pub const NODE: Location = Location::new(51.48, -0.10);
}

pub struct Fixture {
    pub world: WorldState,
    pub rng: SimRng,
    pub round: u64,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_random_fail(0)
    }

    pub fn with_random_fail(random_fail_pct: u8) -> Self {
        let gadget = Item {
            name: ItemName::from("gadget"),
            volume: 20,
            required_items: BTreeMap::from([(ItemName::from("item0"), 1), (ItemName::from("item1"), 1)]),
            required_tools: BTreeSet::from([ItemName::from("tool0")]),
        };
        let catalog = ItemCatalog::new(vec![
            Item::base("item0", 5),
            Item::base("item1", 10),
            Item::base("tool0", 5),
            gadget,
        ])
        .unwrap();

        let shop = Shop::new(
            BTreeMap::from([(
                ItemName::from("item0"),
                ShopItem {
                    price: 10,
                    stock: 5,
                    max_stock: 5,
                },
            )]),
            5,
        );
        let facilities = FacilityRegistry::new(
            vec![
                Facility::new("shop0", at::SHOP, FacilityPayload::Shop(shop)),
                Facility::new("storage0", at::STORAGE, FacilityPayload::Storage(Storage::new(50))),
                Facility::new("workshop0", at::WORKSHOP, FacilityPayload::Workshop),
                Facility::new("dump0", at::DUMP, FacilityPayload::Dump),
                Facility::new(
                    "charge0",
                    at::CHARGER,
                    FacilityPayload::ChargingStation(ChargingStation { rate: 50 }),
                ),
                Facility::new(
                    "node0",
                    at::NODE,
                    FacilityPayload::ResourceNode(ResourceNode {
                        resource: ItemName::from("item0"),
                        gather_probability: 0.9,
                    }),
                ),
            ],
            &catalog,
        )
        .unwrap();

        let role = Role {
            name: "truck".into(),
            speed: 1_000_000,
            load: 100,
            battery: 100,
        };
        let roster = [("agentA1", "A"), ("agentA2", "A"), ("agentB1", "B")];
        let mut teams = BTreeMap::from([
            (TeamName::from("A"), Team::new(TeamName::from("A"), 1_000)),
            (TeamName::from("B"), Team::new(TeamName::from("B"), 1_000)),
        ]);
        let mut entities = Vec::new();
        for (agent, team) in roster {
            teams
                .get_mut(team)
                .unwrap()
                .add_member(AgentName::from(agent))
                .unwrap();
            entities.push(Entity::new(
                AgentName::from(agent),
                TeamName::from(team),
                role.clone(),
                at::START,
            ));
        }

        let rules = Rules {
            random_fail_pct,
            ..Rules::default()
        };
        let world = WorldState::new(rules, catalog, facilities, teams.into_values().collect(), entities).unwrap();
        Self {
            world,
            rng: SimRng::new(7),
            round: 1,
        }
    }

    /// Resolve one round with the given actions; everyone else skips.
    pub fn round(&mut self, actions: Vec<(&str, Action)>) -> RoundReport {
        let batch: BTreeMap<AgentName, Action> = actions
            .into_iter()
            .map(|(agent, action)| (AgentName::from(agent), action))
            .collect();
        let report = resolve_round(&mut self.world, &mut self.rng, self.round, &batch).unwrap();
        self.round += 1;
        report
    }

    /// Resolve one round in which only `agent` acts.
    pub fn act(&mut self, agent: &str, action: Action) -> ActionResultCode {
        self.round(vec![(agent, action)]).result(agent).unwrap()
    }

    pub fn place(&mut self, agent: &str, location: Location) {
        let entity = self.world.entity_mut(agent).unwrap();
        entity.location = location;
        entity.destination = None;
    }

    pub fn give_items(&mut self, agent: &str, item: &str, amount: u32) {
        let world = &mut self.world;
        world
            .entities
            .get_mut(agent)
            .unwrap()
            .add_item(&world.catalog, &ItemName::from(item), amount)
            .unwrap();
    }

    /// Take money out of a team through the fine sink so the ledger stays balanced.
    pub fn drain_money(&mut self, team: &str, amount: i64) {
        self.world
            .charge_fine(0, &JobName::from("fixture"), &TeamName::from(team), amount)
            .unwrap();
    }

    pub fn shop_stock(&self, item: &str) -> u32 {
        match &self.world.facilities().get("shop0").unwrap().payload {
            FacilityPayload::Shop(shop) => shop.stock(item),
            _ => 0,
        }
    }
}

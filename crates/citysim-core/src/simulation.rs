//! The match facade: `init`, `pre_step`, `step`, and `finish`.
//!
//! [`CitySimulation`] owns the world state and the seeded random source of
//! one match. External collaborators only talk to the engine through it:
//! they build it from configuration, ask for percepts at the start of each
//! round, hand over the round's action batch, and collect the final
//! percepts when the match is over.

use std::collections::{BTreeMap, BTreeSet};

use citysim_agents::{AgentError, Entity, Team};
use citysim_types::{
    Action, AgentName, FacilityName, ItemName, Location, Role, RoleName, SimEndPercept,
    SimStartPercept, StepPercept, TeamName,
};
use citysim_world::{
    ChargingStation, Facility, FacilityPayload, FacilityRegistry, Item, ItemCatalog, ResourceNode,
    Shop, ShopItem, Storage, WorldError,
};
use tracing::{info, warn};

use crate::config::{MatchConfig, TeamConfig};
use crate::job::{AuctionSpec, JobSpec};
use crate::perception;
use crate::rng::SimRng;
use crate::round::{RoundReport, resolve_round};
use crate::world_state::{Rules, StateError, WorldState};

/// Errors raised while building a match from configuration.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    /// Item catalog or facility data was rejected.
    #[error("invalid scenario data: {source}")]
    World {
        /// The underlying error.
        #[from]
        source: WorldError,
    },

    /// A team or agent was rejected.
    #[error("invalid roster: {source}")]
    Agent {
        /// The underlying error.
        #[from]
        source: AgentError,
    },

    /// The assembled world or one of its jobs was rejected.
    #[error("invalid world: {source}")]
    State {
        /// The underlying error.
        #[from]
        source: StateError,
    },

    /// An agent names a role the match does not define.
    #[error("agent {agent} has unknown role {role}")]
    UnknownRole {
        /// The agent.
        agent: String,
        /// The role it asked for.
        role: String,
    },

    /// The random failure percentage is above 100.
    #[error("random_fail_pct must be at most 100, got {0}")]
    RandomFailPct(u8),
}

/// One match in progress.
#[derive(Debug)]
pub struct CitySimulation {
    world: WorldState,
    rng: SimRng,
    total_rounds: u64,
    rounds_played: u64,
}

impl CitySimulation {
    /// Build the world from `config` and the team roster, and return the
    /// match-start percept of every agent.
    ///
    /// Agents spawn at uniformly random positions inside the map bounds,
    /// drawn from the match seed. Environment jobs from the configuration
    /// are registered in order.
    pub fn init(
        total_rounds: u64,
        config: &MatchConfig,
        teams: &[TeamConfig],
    ) -> Result<(Self, BTreeMap<AgentName, SimStartPercept>), InitError> {
        if config.random_fail_pct > 100 {
            return Err(InitError::RandomFailPct(config.random_fail_pct));
        }
        let mut rng = SimRng::new(config.seed);

        let catalog = build_catalog(config)?;
        let facilities = FacilityRegistry::new(build_facilities(config), &catalog)?;
        for facility in facilities.iter() {
            if !config.map.contains(&facility.location) {
                warn!(facility = %facility.name, "facility lies outside the map bounds");
            }
        }

        let roles: BTreeMap<&str, Role> = config
            .roles
            .iter()
            .map(|(name, r)| {
                (
                    name.as_str(),
                    Role {
                        name: RoleName::new(name.as_str()),
                        speed: r.speed,
                        load: r.load,
                        battery: r.battery,
                    },
                )
            })
            .collect();

        let mut roster = Vec::with_capacity(teams.len());
        let mut entities = Vec::new();
        for team_config in teams {
            let team_name = TeamName::new(team_config.name.as_str());
            let mut team = Team::new(team_name.clone(), config.starting_money);
            for agent in &team_config.agents {
                let role = roles.get(agent.role.as_str()).ok_or_else(|| InitError::UnknownRole {
                    agent: agent.name.clone(),
                    role: agent.role.clone(),
                })?;
                let name = AgentName::new(agent.name.as_str());
                team.add_member(name.clone())?;
                let spawn = config.map.interpolate(rng.unit(), rng.unit());
                entities.push(Entity::new(name, team_name.clone(), role.clone(), spawn));
            }
            roster.push(team);
        }

        let rules = Rules {
            map: config.map,
            cell_size: config.cell_size,
            goto_cost: config.goto_cost,
            recharge_min: config.recharge_min,
            recharge_max: config.recharge_max,
            random_fail_pct: config.random_fail_pct,
        };
        let mut world = WorldState::new(rules, catalog, facilities, roster, entities)?;

        for job in &config.jobs {
            let spec = JobSpec {
                poster: None,
                storage: FacilityName::new(job.storage.as_str()),
                required: job
                    .required
                    .iter()
                    .map(|(item, n)| (ItemName::new(item.as_str()), *n))
                    .collect(),
                reward: job.reward,
                start: job.start,
                end: job.end,
                auction: job.auction.map(|a| AuctionSpec {
                    auction_time: a.auction_time,
                    fine: a.fine,
                    max_bid: a.max_bid.unwrap_or(job.reward),
                }),
            };
            world.add_job(spec)?;
        }

        let percepts = perception::sim_start_percepts(&world, total_rounds);
        info!(
            match_id = %world.match_id().into_inner(),
            seed = config.seed,
            total_rounds,
            teams = teams.len(),
            agents = percepts.len(),
            facilities = world.facilities().len(),
            items = world.catalog().len(),
            "Match initialised"
        );

        Ok((
            Self {
                world,
                rng,
                total_rounds,
                rounds_played: 0,
            },
            percepts,
        ))
    }

    /// Every agent's view at the start of `round`. Does not mutate the world.
    pub fn pre_step(&self, round: u64) -> Result<BTreeMap<AgentName, StepPercept>, StateError> {
        perception::step_percepts(&self.world, round)
    }

    /// Resolve `round` with the submitted actions. Agents missing from
    /// `actions` skip. Afterwards every entity's last action holds its result.
    pub fn step(
        &mut self,
        round: u64,
        actions: &BTreeMap<AgentName, Action>,
    ) -> Result<RoundReport, StateError> {
        let report = resolve_round(&mut self.world, &mut self.rng, round, actions)?;
        self.rounds_played = self.rounds_played.saturating_add(1);
        Ok(report)
    }

    /// Rank the teams and return every agent's match-end percept.
    pub fn finish(&self) -> BTreeMap<AgentName, SimEndPercept> {
        let percepts = perception::sim_end_percepts(&self.world);
        for (team, rank) in perception::ranking(&self.world) {
            info!(
                team = %team,
                rank,
                money = self.world.team_money(team.as_str()).unwrap_or_default(),
                "Final standing"
            );
        }
        percepts
    }

    /// The world state.
    pub const fn world_state(&self) -> &WorldState {
        &self.world
    }

    /// The world state, mutably. For scenario setup and tests.
    pub const fn world_state_mut(&mut self) -> &mut WorldState {
        &mut self.world
    }

    /// Rounds the match was configured for.
    pub const fn total_rounds(&self) -> u64 {
        self.total_rounds
    }

    /// Rounds resolved so far.
    pub const fn rounds_played(&self) -> u64 {
        self.rounds_played
    }
}

fn build_catalog(config: &MatchConfig) -> Result<ItemCatalog, WorldError> {
    let items = config
        .items
        .iter()
        .map(|item| Item {
            name: ItemName::new(item.name.as_str()),
            volume: item.volume,
            required_items: item
                .required_items
                .iter()
                .map(|(name, n)| (ItemName::new(name.as_str()), *n))
                .collect(),
            required_tools: item
                .required_tools
                .iter()
                .map(|name| ItemName::new(name.as_str()))
                .collect::<BTreeSet<_>>(),
        })
        .collect();
    ItemCatalog::new(items)
}

fn build_facilities(config: &MatchConfig) -> Vec<Facility> {
    let mut facilities = Vec::new();
    for shop in &config.shops {
        let offers = shop
            .offers
            .iter()
            .map(|o| {
                (
                    ItemName::new(o.item.as_str()),
                    ShopItem {
                        price: o.price,
                        stock: o.stock,
                        max_stock: o.max_stock.unwrap_or(o.stock),
                    },
                )
            })
            .collect();
        facilities.push(Facility::new(
            shop.name.as_str(),
            Location::new(shop.lat, shop.lon),
            FacilityPayload::Shop(Shop::new(offers, shop.restock_interval)),
        ));
    }
    for storage in &config.storages {
        facilities.push(Facility::new(
            storage.name.as_str(),
            Location::new(storage.lat, storage.lon),
            FacilityPayload::Storage(Storage::new(storage.capacity)),
        ));
    }
    for place in &config.workshops {
        facilities.push(Facility::new(
            place.name.as_str(),
            Location::new(place.lat, place.lon),
            FacilityPayload::Workshop,
        ));
    }
    for place in &config.dumps {
        facilities.push(Facility::new(
            place.name.as_str(),
            Location::new(place.lat, place.lon),
            FacilityPayload::Dump,
        ));
    }
    for station in &config.charging_stations {
        facilities.push(Facility::new(
            station.name.as_str(),
            Location::new(station.lat, station.lon),
            FacilityPayload::ChargingStation(ChargingStation { rate: station.rate }),
        ));
    }
    for node in &config.resource_nodes {
        facilities.push(Facility::new(
            node.name.as_str(),
            Location::new(node.lat, node.lon),
            FacilityPayload::ResourceNode(ResourceNode {
                resource: ItemName::new(node.resource.as_str()),
                gather_probability: node.gather_probability,
            }),
        ));
    }
    facilities
}

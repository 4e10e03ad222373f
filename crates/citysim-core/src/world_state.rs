//! The aggregate state of one match.
//!
//! [`WorldState`] owns every entity, facility, team, and job, plus the item
//! catalog and the money ledger. It is the single source of truth the
//! resolver mutates and percepts are read from. Jobs are never removed, so
//! every job name handed to an agent keeps resolving until the match ends.
//!
//! Money only moves through the `charge_*` and `pay_*` methods here, which
//! update the team wallet and the ledger together.

use std::collections::BTreeMap;

use citysim_agents::{AgentError, Entity, Team};
use citysim_ledger::{Ledger, LedgerError};
use citysim_types::{AgentName, FacilityKind, FacilityName, ItemName, JobName, MatchId, TeamName};
use citysim_world::{FacilityRegistry, ItemCatalog, MapBounds, Storage, WorldError};
use tracing::debug;

use crate::job::{Job, JobSpec};

/// Errors raised by world-state bookkeeping.
///
/// These never come from an agent's action being refused; they signal
/// inconsistent scenario data or an arithmetic limit.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StateError {
    /// No entity with this name.
    #[error("unknown agent: {0}")]
    UnknownAgent(AgentName),

    /// No team with this name.
    #[error("unknown team: {0}")]
    UnknownTeam(TeamName),

    /// A job could not be registered.
    #[error("invalid job: {reason}")]
    InvalidJob {
        /// What was wrong with it.
        reason: String,
    },

    /// Entity or team operation failed.
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// Ledger operation failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Catalog or facility operation failed.
    #[error(transparent)]
    World(#[from] WorldError),
}

/// Economy and movement knobs of a match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rules {
    /// Rectangle agents may travel in.
    pub map: MapBounds,
    /// Coordinate distance of one unit of role speed.
    pub cell_size: f64,
    /// Battery used per round of travel.
    pub goto_cost: u32,
    /// Smallest charge a `recharge` adds.
    pub recharge_min: u32,
    /// Largest charge a `recharge` adds.
    pub recharge_max: u32,
    /// Percentage of actions dropped at random.
    pub random_fail_pct: u8,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            map: MapBounds::default(),
            cell_size: 0.001,
            goto_cost: 10,
            recharge_min: 1,
            recharge_max: 5,
            random_fail_pct: 0,
        }
    }
}

/// Everything one match consists of.
#[derive(Debug)]
pub struct WorldState {
    pub(crate) match_id: MatchId,
    pub(crate) rules: Rules,
    pub(crate) catalog: ItemCatalog,
    pub(crate) facilities: FacilityRegistry,
    pub(crate) entities: BTreeMap<AgentName, Entity>,
    pub(crate) teams: BTreeMap<TeamName, Team>,
    pub(crate) jobs: BTreeMap<JobName, Job>,
    pub(crate) ledger: Ledger,
    job_counter: u64,
}

impl WorldState {
    /// Assemble a world from validated parts. Teams must already hold
    /// their members; opening balances are written to the ledger.
    pub fn new(
        rules: Rules,
        catalog: ItemCatalog,
        facilities: FacilityRegistry,
        teams: Vec<Team>,
        entities: Vec<Entity>,
    ) -> Result<Self, StateError> {
        let mut world = Self {
            match_id: MatchId::new(),
            rules,
            catalog,
            facilities,
            entities: BTreeMap::new(),
            teams: BTreeMap::new(),
            jobs: BTreeMap::new(),
            ledger: Ledger::new(),
            job_counter: 0,
        };

        for team in teams {
            if world.teams.contains_key(&team.name) {
                return Err(AgentError::DuplicateTeam(team.name).into());
            }
            world.ledger.record_opening(0, &team.name, team.money)?;
            world.teams.insert(team.name.clone(), team);
        }
        for entity in entities {
            if !world.teams.contains_key(&entity.team) {
                return Err(StateError::UnknownTeam(entity.team));
            }
            if world.entities.contains_key(&entity.name) {
                return Err(AgentError::DuplicateAgent(entity.name).into());
            }
            world.entities.insert(entity.name.clone(), entity);
        }
        Ok(world)
    }

    /// Identifier of this match.
    pub const fn match_id(&self) -> MatchId {
        self.match_id
    }

    /// Economy and movement knobs.
    pub const fn rules(&self) -> &Rules {
        &self.rules
    }

    /// The item catalog.
    pub const fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    /// All facilities.
    pub const fn facilities(&self) -> &FacilityRegistry {
        &self.facilities
    }

    /// All facilities, mutably.
    pub const fn facilities_mut(&mut self) -> &mut FacilityRegistry {
        &mut self.facilities
    }

    /// A storage by name.
    pub fn storage(&self, name: &str) -> Result<&Storage, StateError> {
        self.facilities
            .get(name)?
            .as_storage()
            .ok_or_else(|| WorldError::UnknownFacility(FacilityName::from(name)).into())
    }

    /// A storage by name, mutably.
    pub fn storage_mut(&mut self, name: &str) -> Result<&mut Storage, StateError> {
        self.facilities
            .get_mut(name)?
            .as_storage_mut()
            .ok_or_else(|| WorldError::UnknownFacility(FacilityName::from(name)).into())
    }

    /// Name of the facility of `kind` at the agent's location, if any.
    pub fn facility_of_kind_under(&self, agent: &str, kind: FacilityKind) -> Option<FacilityName> {
        let entity = self.entities.get(agent)?;
        self.facilities.name_of_kind_at(kind, &entity.location)
    }

    /// All entities in canonical (name) order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// An entity by name.
    pub fn entity(&self, name: &str) -> Result<&Entity, StateError> {
        self.entities
            .get(name)
            .ok_or_else(|| StateError::UnknownAgent(AgentName::from(name)))
    }

    /// An entity by name, mutably.
    pub fn entity_mut(&mut self, name: &str) -> Result<&mut Entity, StateError> {
        self.entities
            .get_mut(name)
            .ok_or_else(|| StateError::UnknownAgent(AgentName::from(name)))
    }

    /// Put items into an entity's inventory, subject to its load capacity.
    /// For scenario setup; actions move items through their handlers.
    pub fn add_to_inventory(&mut self, agent: &str, item: &ItemName, amount: u32) -> Result<(), StateError> {
        let entity = self
            .entities
            .get_mut(agent)
            .ok_or_else(|| StateError::UnknownAgent(AgentName::from(agent)))?;
        entity.add_item(&self.catalog, item, amount)?;
        Ok(())
    }

    /// Agent names in canonical order.
    pub fn agents(&self) -> impl Iterator<Item = &AgentName> {
        self.entities.keys()
    }

    /// All teams in name order.
    pub fn teams(&self) -> impl Iterator<Item = &Team> {
        self.teams.values()
    }

    /// A team by name.
    pub fn team(&self, name: &str) -> Result<&Team, StateError> {
        self.teams
            .get(name)
            .ok_or_else(|| StateError::UnknownTeam(TeamName::from(name)))
    }

    /// A team's money.
    pub fn team_money(&self, name: &str) -> Result<i64, StateError> {
        self.team(name).map(|t| t.money)
    }

    /// Money `name` can still spend: its balance minus the rewards of the
    /// open jobs it posted, which completion will debit.
    pub fn spendable_money(&self, name: &str) -> Result<i64, StateError> {
        let committed = self
            .jobs
            .values()
            .filter(|job| !job.status().is_terminal())
            .filter(|job| job.poster.as_ref().is_some_and(|p| p.as_str() == name))
            .fold(0_i64, |sum, job| sum.saturating_add(job.reward));
        Ok(self.team_money(name)?.saturating_sub(committed))
    }

    /// Every team's money.
    pub fn wallets(&self) -> BTreeMap<TeamName, i64> {
        self.teams
            .iter()
            .map(|(name, team)| (name.clone(), team.money))
            .collect()
    }

    /// The money ledger.
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// All jobs in name order.
    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }

    /// A job by name.
    pub fn job(&self, name: &str) -> Option<&Job> {
        self.jobs.get(name)
    }

    /// Register a job and return its assigned name.
    ///
    /// Plain jobs are named `job<N>`, auctions `auction<N>`, from one
    /// counter per match.
    pub fn add_job(&mut self, spec: JobSpec) -> Result<JobName, StateError> {
        self.storage(spec.storage.as_str())?;
        if spec.required.is_empty() || spec.required.values().any(|n| *n == 0) {
            return Err(StateError::InvalidJob {
                reason: "a job must request at least one unit of every listed item".to_owned(),
            });
        }
        for item in spec.required.keys() {
            self.catalog.get(item.as_str())?;
        }
        if spec.reward <= 0 {
            return Err(StateError::InvalidJob {
                reason: format!("reward must be positive, got {}", spec.reward),
            });
        }
        if spec.end < spec.start {
            return Err(StateError::InvalidJob {
                reason: format!("end round {} precedes start round {}", spec.end, spec.start),
            });
        }
        if let Some(auction) = &spec.auction {
            let closes = spec.start.saturating_add(auction.auction_time);
            if auction.auction_time == 0 || closes > spec.end {
                return Err(StateError::InvalidJob {
                    reason: format!(
                        "bidding must close by the end round {}, closes at {closes}",
                        spec.end
                    ),
                });
            }
        }
        if let Some(poster) = &spec.poster {
            self.team(poster.as_str())?;
        }

        let prefix = if spec.auction.is_some() { "auction" } else { "job" };
        let name = JobName::new(format!("{prefix}{}", self.job_counter));
        self.job_counter = self.job_counter.saturating_add(1);
        debug!(job = %name, storage = %spec.storage, reward = spec.reward, "job registered");
        self.jobs.insert(name.clone(), Job::new(name.clone(), spec));
        Ok(name)
    }

    fn team_mut(&mut self, name: &str) -> Result<&mut Team, StateError> {
        self.teams
            .get_mut(name)
            .ok_or_else(|| StateError::UnknownTeam(TeamName::from(name)))
    }

    // -----------------------------------------------------------------------
    // Money
    // -----------------------------------------------------------------------

    /// Debit a purchase from `team` and record it.
    pub fn charge_purchase(
        &mut self,
        round: u64,
        team: &TeamName,
        shop: &FacilityName,
        amount: i64,
    ) -> Result<(), StateError> {
        self.ledger.record_purchase(round, team, shop, amount)?;
        self.team_mut(team.as_str())?.debit(amount)?;
        Ok(())
    }

    /// Pay a job reward to `deliverer`, debiting the poster if there is one.
    pub fn pay_job_reward(
        &mut self,
        round: u64,
        job: &JobName,
        poster: Option<&TeamName>,
        deliverer: &TeamName,
        amount: i64,
    ) -> Result<(), StateError> {
        self.ledger
            .record_job_reward(round, job, poster, deliverer, amount)?;
        if let Some(poster) = poster {
            self.team_mut(poster.as_str())?.debit(amount)?;
        }
        self.team_mut(deliverer.as_str())?.credit(amount)?;
        Ok(())
    }

    /// Charge an auction fine to `team`. Nobody receives it.
    pub fn charge_fine(
        &mut self,
        round: u64,
        job: &JobName,
        team: &TeamName,
        amount: i64,
    ) -> Result<(), StateError> {
        self.ledger.record_fine(round, job, team, amount)?;
        self.team_mut(team.as_str())?.debit(amount)?;
        Ok(())
    }
}

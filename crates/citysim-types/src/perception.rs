//! Percept payloads handed to the agent-communication layer.
//!
//! The percept is the **only** information an agent receives about the
//! world. There are three kinds:
//!
//! - [`SimStartPercept`] once per agent when the match is initialised,
//! - [`StepPercept`] at the start of every round,
//! - [`SimEndPercept`] once per agent when the match finishes.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::actions::LastAction;
use crate::enums::FacilityKind;
use crate::ids::{AgentName, FacilityName, ItemName, JobName, MatchId, RoleName, TeamName};
use crate::structs::{Location, Role};

// ---------------------------------------------------------------------------
// Match start
// ---------------------------------------------------------------------------

/// Static description of an item as shown to agents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ItemInfo {
    /// Item name.
    pub name: ItemName,
    /// Volume per unit.
    pub volume: u32,
    /// Items consumed by assembly.
    pub required_items: BTreeMap<ItemName, u32>,
    /// Tools needed (not consumed) by assembly.
    pub required_tools: BTreeSet<ItemName>,
}

/// The percept an agent receives when the match starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SimStartPercept {
    /// The match being played.
    pub match_id: MatchId,
    /// The agent's own name.
    pub agent: AgentName,
    /// The agent's team.
    pub team: TeamName,
    /// The agent's role.
    pub role: Role,
    /// Number of rounds in the match.
    pub total_rounds: u64,
    /// The full item catalog.
    pub items: Vec<ItemInfo>,
}

// ---------------------------------------------------------------------------
// Round start
// ---------------------------------------------------------------------------

/// The agent's own state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SelfPercept {
    /// The agent's name.
    pub name: AgentName,
    /// The agent's team.
    pub team: TeamName,
    /// The agent's role name.
    pub role: RoleName,
    /// Current position.
    pub location: Location,
    /// Where an unfinished `goto` is headed, if anywhere.
    pub destination: Option<Location>,
    /// Current battery charge.
    pub battery: u32,
    /// Volume currently carried.
    pub load: u32,
    /// Volume the role can carry.
    pub load_capacity: u32,
    /// Inventory contents.
    pub inventory: BTreeMap<ItemName, u32>,
    /// Last round's action and result.
    pub last_action: LastAction,
}

/// Another entity as seen in a percept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct VisibleEntity {
    /// Entity name.
    pub name: AgentName,
    /// Owning team.
    pub team: TeamName,
    /// Role name.
    pub role: RoleName,
    /// Current position.
    pub location: Location,
}

/// One item offered by a shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ShopOffer {
    /// Price per unit.
    pub price: i64,
    /// Units in stock.
    pub stock: u32,
}

/// Kind-specific facility details as seen by one team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum FacilityDetails {
    /// A shop and its offers.
    Shop {
        /// Offers keyed by item.
        offers: BTreeMap<ItemName, ShopOffer>,
    },
    /// A storage, showing only the viewing team's buckets.
    Storage {
        /// Total volume capacity.
        capacity: u32,
        /// Volume in use by all teams.
        used: u32,
        /// The team's stored goods.
        stored: BTreeMap<ItemName, u32>,
        /// Goods delivered to the team's jobs (or returned to it).
        delivered: BTreeMap<ItemName, u32>,
    },
    /// A workshop.
    Workshop,
    /// A dump.
    Dump,
    /// A charging station.
    ChargingStation {
        /// Charge added per `charge` action.
        rate: u32,
    },
    /// A resource node (only visible while standing on it).
    ResourceNode {
        /// The item the node yields.
        resource: ItemName,
    },
}

/// A facility as seen in a percept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct VisibleFacility {
    /// Facility name.
    pub name: FacilityName,
    /// Facility kind.
    pub kind: FacilityKind,
    /// Facility position.
    pub location: Location,
    /// Kind-specific details.
    pub details: FacilityDetails,
}

/// Auction-specific job details. Bids are sealed, so the lowest bid is
/// never shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct VisibleAuction {
    /// Highest bid that can be accepted.
    pub max_bid: i64,
    /// Fine charged to an assignee that fails to deliver.
    pub fine: i64,
    /// Last round in which bids are accepted.
    pub bidding_until: u64,
    /// Whether the viewing team won the auction.
    pub assigned_to_you: bool,
}

/// A job as seen in a percept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct VisibleJob {
    /// Job name.
    pub name: JobName,
    /// Storage the items go to.
    pub storage: FacilityName,
    /// Posting team, `None` for environment jobs.
    pub poster: Option<TeamName>,
    /// Items requested.
    pub required: BTreeMap<ItemName, u32>,
    /// Items the viewing team has delivered so far.
    pub delivered_by_you: BTreeMap<ItemName, u32>,
    /// Nominal reward.
    pub reward: i64,
    /// First round of the job.
    pub start: u64,
    /// Last round of the job.
    pub end: u64,
    /// Present for auctions.
    pub auction: Option<VisibleAuction>,
}

/// The percept an agent receives at the start of each round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StepPercept {
    /// Current round.
    pub round: u64,
    /// The team's money.
    pub team_money: i64,
    /// The agent's own state.
    pub self_state: SelfPercept,
    /// All entities in the match (including the agent itself).
    pub entities: Vec<VisibleEntity>,
    /// Facilities the agent can see.
    pub facilities: Vec<VisibleFacility>,
    /// Jobs open for deliveries or bids.
    pub jobs: Vec<VisibleJob>,
}

// ---------------------------------------------------------------------------
// Match end
// ---------------------------------------------------------------------------

/// The percept an agent receives when the match ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SimEndPercept {
    /// The match that ended.
    pub match_id: MatchId,
    /// The team's 1-based rank (ties share a rank).
    pub ranking: u32,
    /// The team's final money.
    pub score: i64,
}

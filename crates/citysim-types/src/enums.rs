//! Enumeration types for the City scenario.
//!
//! The action verbs and result codes in this module are part of the
//! agent-visible contract: their snake_case spellings travel over the wire
//! and must stay stable between releases.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Action verbs
// ---------------------------------------------------------------------------

/// The verb of an action an agent can submit in a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ActionType {
    /// Do nothing this round.
    Skip,
    /// Drop the current route target.
    Abort,
    /// Move towards coordinates, a facility, or another entity.
    Goto,
    /// Hand items to a co-located agent who submits `receive`.
    Give,
    /// Accept items from a co-located agent who submits `give`.
    Receive,
    /// Move items from inventory into the team's storage bucket.
    Store,
    /// Move items from the team's storage bucket into inventory.
    Retrieve,
    /// Move items from the team's delivered bucket into inventory.
    RetrieveDelivered,
    /// Buy items at a shop.
    Buy,
    /// Destroy items at a dump.
    Dump,
    /// Charge the battery at a charging station.
    Charge,
    /// Slowly recharge the battery anywhere.
    Recharge,
    /// Try to gather the yield item of a resource node.
    Gather,
    /// Assemble an item at a workshop.
    Assemble,
    /// Lend inventory and tools to a co-located assembler.
    AssistAssemble,
    /// Post a job that other teams can complete.
    PostJob,
    /// Deliver items towards a job.
    DeliverJob,
    /// Bid on an auction job.
    BidForJob,
}

impl ActionType {
    /// Every verb, in declaration order.
    pub const ALL: [Self; 18] = [
        Self::Skip,
        Self::Abort,
        Self::Goto,
        Self::Give,
        Self::Receive,
        Self::Store,
        Self::Retrieve,
        Self::RetrieveDelivered,
        Self::Buy,
        Self::Dump,
        Self::Charge,
        Self::Recharge,
        Self::Gather,
        Self::Assemble,
        Self::AssistAssemble,
        Self::PostJob,
        Self::DeliverJob,
        Self::BidForJob,
    ];

    /// The wire spelling of this verb.
    pub const fn as_verb(self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Abort => "abort",
            Self::Goto => "goto",
            Self::Give => "give",
            Self::Receive => "receive",
            Self::Store => "store",
            Self::Retrieve => "retrieve",
            Self::RetrieveDelivered => "retrieve_delivered",
            Self::Buy => "buy",
            Self::Dump => "dump",
            Self::Charge => "charge",
            Self::Recharge => "recharge",
            Self::Gather => "gather",
            Self::Assemble => "assemble",
            Self::AssistAssemble => "assist_assemble",
            Self::PostJob => "post_job",
            Self::DeliverJob => "deliver_job",
            Self::BidForJob => "bid_for_job",
        }
    }

    /// Look up a verb by its wire spelling.
    pub fn from_verb(verb: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_verb() == verb)
    }

    /// Whether the verb only succeeds through a counterpart's action.
    pub const fn is_passive(self) -> bool {
        matches!(self, Self::Receive | Self::AssistAssemble)
    }
}

impl core::fmt::Display for ActionType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_verb())
    }
}

// ---------------------------------------------------------------------------
// Action results
// ---------------------------------------------------------------------------

/// The closed vocabulary of action outcomes reported to agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ActionResultCode {
    /// The action was applied in full.
    Successful,
    /// A job delivery was accepted but did not complete the job.
    SuccessfulPartial,
    /// Generic failure (e.g. not enough battery to move).
    Failed,
    /// The action was dropped by the configured random failure rate, or a
    /// gather attempt came up empty.
    FailedRandom,
    /// The agent is not where the action requires it to be.
    FailedLocation,
    /// Unknown verb, wrong parameter count, or unparseable parameter.
    FailedWrongParam,
    /// The named agent does not exist.
    FailedUnknownAgent,
    /// The named item does not exist or is not offered here.
    FailedUnknownItem,
    /// The named facility does not exist or cannot be targeted.
    FailedUnknownFacility,
    /// The named job does not exist.
    FailedUnknownJob,
    /// The agent is not at a facility of the required kind.
    FailedWrongFacility,
    /// A goto had no destination to continue towards.
    FailedNoRoute,
    /// Not enough items, stock, stored goods, or money.
    FailedItemAmount,
    /// Inventory or storage volume would be exceeded.
    FailedCapacity,
    /// The required counterpart action was not submitted this round.
    FailedCounterpart,
    /// Required tools were not present for an assembly.
    FailedTools,
    /// The job is not in a state that allows this action.
    FailedJobStatus,
    /// The job is of the wrong kind for this action.
    FailedJobType,
}

impl ActionResultCode {
    /// The wire spelling of this result code.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Successful => "successful",
            Self::SuccessfulPartial => "successful_partial",
            Self::Failed => "failed",
            Self::FailedRandom => "failed_random",
            Self::FailedLocation => "failed_location",
            Self::FailedWrongParam => "failed_wrong_param",
            Self::FailedUnknownAgent => "failed_unknown_agent",
            Self::FailedUnknownItem => "failed_unknown_item",
            Self::FailedUnknownFacility => "failed_unknown_facility",
            Self::FailedUnknownJob => "failed_unknown_job",
            Self::FailedWrongFacility => "failed_wrong_facility",
            Self::FailedNoRoute => "failed_no_route",
            Self::FailedItemAmount => "failed_item_amount",
            Self::FailedCapacity => "failed_capacity",
            Self::FailedCounterpart => "failed_counterpart",
            Self::FailedTools => "failed_tools",
            Self::FailedJobStatus => "failed_job_status",
            Self::FailedJobType => "failed_job_type",
        }
    }

    /// Whether the code reports a (possibly partial) success.
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Successful | Self::SuccessfulPartial)
    }
}

impl core::fmt::Display for ActionResultCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Facilities
// ---------------------------------------------------------------------------

/// The capability of a facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum FacilityKind {
    /// Sells items for money.
    Shop,
    /// Holds team goods and job deliveries.
    Storage,
    /// Allows assembly.
    Workshop,
    /// Destroys items.
    Dump,
    /// Charges batteries.
    ChargingStation,
    /// Yields a raw item to gatherers.
    ResourceNode,
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

/// Lifecycle state of a job or auction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum JobStatus {
    /// Registered but not yet visible (start round not reached).
    Posted,
    /// An auction inside its bidding window.
    Auctioning,
    /// Open for deliveries.
    Active,
    /// Fully delivered.
    Completed,
    /// End round reached without completion.
    Expired,
}

impl JobStatus {
    /// Whether the job will never change state again.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_verb_round_trips_through_its_spelling() {
        for verb in ActionType::ALL {
            assert_eq!(ActionType::from_verb(verb.as_verb()), Some(verb));
        }
        assert_eq!(ActionType::from_verb("teleport"), None);
    }

    #[test]
    fn serde_spelling_matches_wire_spelling() {
        let json = serde_json::to_string(&ActionResultCode::FailedCounterpart).ok();
        assert_eq!(json.as_deref(), Some("\"failed_counterpart\""));
        let json = serde_json::to_string(&ActionType::AssistAssemble).ok();
        assert_eq!(json.as_deref(), Some("\"assist_assemble\""));
    }

    #[test]
    fn partial_delivery_counts_as_success() {
        assert!(ActionResultCode::SuccessfulPartial.is_success());
        assert!(!ActionResultCode::FailedTools.is_success());
    }

    #[test]
    fn passive_verbs() {
        assert!(ActionType::Receive.is_passive());
        assert!(ActionType::AssistAssemble.is_passive());
        assert!(!ActionType::Give.is_passive());
    }

    #[test]
    fn terminal_job_states() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Expired.is_terminal());
        assert!(!JobStatus::Auctioning.is_terminal());
    }
}

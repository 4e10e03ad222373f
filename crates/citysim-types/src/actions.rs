//! Action request and result types for agent-to-engine communication.
//!
//! Agents submit an [`Action`]: a verb plus an ordered list of string
//! parameters, exactly as it arrives from the wire. The resolver turns it
//! into typed [`ActionParameters`] with [`ActionParameters::parse`]; anything
//! that does not parse is answered with
//! [`ActionResultCode::FailedWrongParam`] and otherwise treated as a skip.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ActionResultCode, ActionType};
use crate::ids::{AgentName, FacilityName, ItemName, JobName};
use crate::structs::Location;

// ---------------------------------------------------------------------------
// Wire action
// ---------------------------------------------------------------------------

/// An action as submitted by an agent: a named verb and its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Action {
    /// The verb, e.g. `give` or `goto`.
    pub verb: String,
    /// Ordered string parameters.
    pub params: Vec<String>,
}

impl Action {
    /// Build an action from a verb and its parameters.
    pub fn new<I, S>(verb: &str, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            verb: verb.to_owned(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    /// The action substituted for agents that did not answer in time.
    pub fn skip() -> Self {
        Self {
            verb: ActionType::Skip.as_verb().to_owned(),
            params: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Typed parameters
// ---------------------------------------------------------------------------

/// Where a `goto` is headed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum GotoTarget {
    /// Explicit coordinates.
    Coordinates(Location),
    /// A facility or entity name, resolved against the world at apply time.
    Named(String),
    /// Continue towards the current route target.
    Continue,
}

/// A parsed action, one variant per [`ActionType`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ActionParameters {
    /// [`ActionType::Skip`].
    Skip,
    /// [`ActionType::Abort`].
    Abort,
    /// [`ActionType::Goto`].
    Goto(GotoTarget),
    /// [`ActionType::Give`].
    Give {
        /// Agent that must submit `receive`.
        receiver: AgentName,
        /// Item handed over.
        item: ItemName,
        /// Units handed over.
        amount: u32,
    },
    /// [`ActionType::Receive`].
    Receive,
    /// [`ActionType::Store`].
    Store {
        /// Item stored.
        item: ItemName,
        /// Units stored.
        amount: u32,
    },
    /// [`ActionType::Retrieve`].
    Retrieve {
        /// Item retrieved.
        item: ItemName,
        /// Units retrieved.
        amount: u32,
    },
    /// [`ActionType::RetrieveDelivered`].
    RetrieveDelivered {
        /// Item retrieved.
        item: ItemName,
        /// Units retrieved.
        amount: u32,
    },
    /// [`ActionType::Buy`].
    Buy {
        /// Item bought.
        item: ItemName,
        /// Units bought.
        amount: u32,
    },
    /// [`ActionType::Dump`].
    Dump {
        /// Item destroyed.
        item: ItemName,
        /// Maximum units destroyed.
        amount: u32,
    },
    /// [`ActionType::Charge`].
    Charge,
    /// [`ActionType::Recharge`].
    Recharge,
    /// [`ActionType::Gather`].
    Gather,
    /// [`ActionType::Assemble`].
    Assemble {
        /// Item to assemble.
        item: ItemName,
    },
    /// [`ActionType::AssistAssemble`].
    AssistAssemble {
        /// The agent being assisted.
        assembler: AgentName,
    },
    /// [`ActionType::PostJob`].
    PostJob {
        /// Money paid on completion.
        reward: i64,
        /// Rounds the job stays open.
        duration: u64,
        /// Storage the items must be delivered to.
        storage: FacilityName,
        /// Requested item.
        item: ItemName,
        /// Requested units.
        amount: u32,
    },
    /// [`ActionType::DeliverJob`].
    DeliverJob {
        /// Job delivered to.
        job: JobName,
    },
    /// [`ActionType::BidForJob`].
    BidForJob {
        /// Auction bid on.
        job: JobName,
        /// Price the team would accept.
        amount: i64,
    },
}

impl ActionParameters {
    /// Parse a wire action into typed parameters.
    ///
    /// Unknown verbs, wrong parameter counts, and unparseable or
    /// non-positive numbers all fail with
    /// [`ActionResultCode::FailedWrongParam`].
    pub fn parse(action: &Action) -> Result<Self, ActionResultCode> {
        let action_type =
            ActionType::from_verb(&action.verb).ok_or(ActionResultCode::FailedWrongParam)?;
        let p: Vec<&str> = action.params.iter().map(String::as_str).collect();

        let parsed = match (action_type, p.as_slice()) {
            (ActionType::Skip, []) => Self::Skip,
            (ActionType::Abort, []) => Self::Abort,
            (ActionType::Goto, []) => Self::Goto(GotoTarget::Continue),
            (ActionType::Goto, [name]) => Self::Goto(GotoTarget::Named((*name).to_owned())),
            (ActionType::Goto, [lat, lon]) => Self::Goto(GotoTarget::Coordinates(Location::new(
                parse_coordinate(lat)?,
                parse_coordinate(lon)?,
            ))),
            (ActionType::Give, [receiver, item, amount]) => Self::Give {
                receiver: AgentName::from(*receiver),
                item: ItemName::from(*item),
                amount: parse_amount(amount)?,
            },
            (ActionType::Receive, []) => Self::Receive,
            (ActionType::Store, [item, amount]) => Self::Store {
                item: ItemName::from(*item),
                amount: parse_amount(amount)?,
            },
            (ActionType::Retrieve, [item, amount]) => Self::Retrieve {
                item: ItemName::from(*item),
                amount: parse_amount(amount)?,
            },
            (ActionType::RetrieveDelivered, [item, amount]) => Self::RetrieveDelivered {
                item: ItemName::from(*item),
                amount: parse_amount(amount)?,
            },
            (ActionType::Buy, [item, amount]) => Self::Buy {
                item: ItemName::from(*item),
                amount: parse_amount(amount)?,
            },
            (ActionType::Dump, [item, amount]) => Self::Dump {
                item: ItemName::from(*item),
                amount: parse_amount(amount)?,
            },
            (ActionType::Charge, []) => Self::Charge,
            (ActionType::Recharge, []) => Self::Recharge,
            (ActionType::Gather, []) => Self::Gather,
            (ActionType::Assemble, [item]) => Self::Assemble {
                item: ItemName::from(*item),
            },
            (ActionType::AssistAssemble, [assembler]) => Self::AssistAssemble {
                assembler: AgentName::from(*assembler),
            },
            (ActionType::PostJob, [reward, duration, storage, item, amount]) => Self::PostJob {
                reward: parse_money(reward)?,
                duration: u64::from(parse_amount(duration)?),
                storage: FacilityName::from(*storage),
                item: ItemName::from(*item),
                amount: parse_amount(amount)?,
            },
            (ActionType::DeliverJob, [job]) => Self::DeliverJob {
                job: JobName::from(*job),
            },
            (ActionType::BidForJob, [job, amount]) => Self::BidForJob {
                job: JobName::from(*job),
                amount: parse_money(amount)?,
            },
            _ => return Err(ActionResultCode::FailedWrongParam),
        };

        Ok(parsed)
    }

    /// The verb these parameters belong to.
    pub const fn action_type(&self) -> ActionType {
        match self {
            Self::Skip => ActionType::Skip,
            Self::Abort => ActionType::Abort,
            Self::Goto(_) => ActionType::Goto,
            Self::Give { .. } => ActionType::Give,
            Self::Receive => ActionType::Receive,
            Self::Store { .. } => ActionType::Store,
            Self::Retrieve { .. } => ActionType::Retrieve,
            Self::RetrieveDelivered { .. } => ActionType::RetrieveDelivered,
            Self::Buy { .. } => ActionType::Buy,
            Self::Dump { .. } => ActionType::Dump,
            Self::Charge => ActionType::Charge,
            Self::Recharge => ActionType::Recharge,
            Self::Gather => ActionType::Gather,
            Self::Assemble { .. } => ActionType::Assemble,
            Self::AssistAssemble { .. } => ActionType::AssistAssemble,
            Self::PostJob { .. } => ActionType::PostJob,
            Self::DeliverJob { .. } => ActionType::DeliverJob,
            Self::BidForJob { .. } => ActionType::BidForJob,
        }
    }
}

/// Parse a strictly positive unit count.
fn parse_amount(raw: &str) -> Result<u32, ActionResultCode> {
    match raw.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ActionResultCode::FailedWrongParam),
    }
}

/// Parse a strictly positive amount of money.
fn parse_money(raw: &str) -> Result<i64, ActionResultCode> {
    match raw.trim().parse::<i64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ActionResultCode::FailedWrongParam),
    }
}

/// Parse a finite coordinate.
fn parse_coordinate(raw: &str) -> Result<f64, ActionResultCode> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ActionResultCode::FailedWrongParam),
    }
}

// ---------------------------------------------------------------------------
// Last action record
// ---------------------------------------------------------------------------

/// What an agent did last round and how it went, as shown in its percept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LastAction {
    /// The submitted verb, verbatim (may be an unknown verb).
    pub verb: String,
    /// The submitted parameters, verbatim.
    pub params: Vec<String>,
    /// The outcome.
    pub result: ActionResultCode,
}

impl LastAction {
    /// Record `action` with its `result`.
    pub fn new(action: &Action, result: ActionResultCode) -> Self {
        Self {
            verb: action.verb.clone(),
            params: action.params.clone(),
            result,
        }
    }
}

impl Default for LastAction {
    fn default() -> Self {
        Self {
            verb: ActionType::Skip.as_verb().to_owned(),
            params: Vec::new(),
            result: ActionResultCode::Successful,
        }
    }
}

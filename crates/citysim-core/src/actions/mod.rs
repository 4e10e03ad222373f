//! Action handlers: one function per verb, applied against the world state.
//!
//! Handlers run inside a [`Resolution`], the per-round context that holds the
//! parsed plans of every agent and the results decided so far. A handler
//! either returns an [`ActionOutcome`] after applying its effect in full, or
//! an [`ActionResultCode`] after changing nothing.
//!
//! # Modules
//!
//! - [`handlers`] -- single-agent verbs: movement, facilities, battery
//! - [`coordination`] -- two-sided verbs: give/receive, assemble/assist
//! - [`economy`] -- job posting, delivery, and bidding

pub mod coordination;
pub mod economy;
pub mod handlers;

use std::collections::{BTreeMap, BTreeSet};

use citysim_types::{
    ActionParameters, ActionResultCode, AgentName, FacilityKind, FacilityName, JobName,
};
use tracing::{debug, warn};

use crate::rng::SimRng;
use crate::world_state::WorldState;

/// How an applied action went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Applied in full.
    Done,
    /// Applied, but a job delivery left the job incomplete.
    Partial,
}

impl ActionOutcome {
    /// The result code reported to the agent.
    pub const fn code(self) -> ActionResultCode {
        match self {
            Self::Done => ActionResultCode::Successful,
            Self::Partial => ActionResultCode::SuccessfulPartial,
        }
    }
}

/// Return type of every handler.
pub type HandlerResult = Result<ActionOutcome, ActionResultCode>;

/// Mutable context of one resolution pass.
pub struct Resolution<'w> {
    /// The world being mutated.
    pub world: &'w mut WorldState,
    /// The match random source.
    pub rng: &'w mut SimRng,
    /// The round being resolved.
    pub round: u64,
    /// Parsed actions of agents whose action will be applied.
    pub plans: BTreeMap<AgentName, ActionParameters>,
    /// Agents whose action was dropped before applying (random failure).
    pub blocked: BTreeSet<AgentName>,
    /// Results decided so far.
    pub results: BTreeMap<AgentName, ActionResultCode>,
    /// Jobs completed during the pass.
    pub completed_jobs: Vec<JobName>,
}

impl<'w> Resolution<'w> {
    /// Start a pass over `world` for `round`.
    pub fn new(world: &'w mut WorldState, rng: &'w mut SimRng, round: u64) -> Self {
        Self {
            world,
            rng,
            round,
            plans: BTreeMap::new(),
            blocked: BTreeSet::new(),
            results: BTreeMap::new(),
            completed_jobs: Vec::new(),
        }
    }

    /// The plan `agent` will apply, unless it was dropped.
    pub fn live_plan(&self, agent: &str) -> Option<&ActionParameters> {
        if self.blocked.contains(agent) {
            return None;
        }
        self.plans.get(agent)
    }

    /// Apply `agent`'s plan and record the result.
    ///
    /// Agents that already have a result (parse failures, random failures,
    /// consumed passive actions) are left alone, as are passive plans that
    /// nobody has consumed yet.
    pub fn apply(&mut self, agent: &AgentName) {
        if self.results.contains_key(agent) {
            return;
        }
        let Some(params) = self.plans.get(agent).cloned() else {
            return;
        };
        if params.action_type().is_passive() {
            return;
        }

        let result = dispatch(self, agent, &params).map_or_else(|code| code, ActionOutcome::code);
        debug!(
            round = self.round,
            agent = %agent,
            verb = %params.action_type(),
            result = %result,
            "action resolved"
        );
        self.results.insert(agent.clone(), result);
    }

    /// Fail every passive action nobody consumed.
    pub fn finalise_passive(&mut self) {
        for (agent, params) in &self.plans {
            if params.action_type().is_passive() {
                self.results
                    .entry(agent.clone())
                    .or_insert(ActionResultCode::FailedCounterpart);
            }
        }
    }
}

/// Route `params` to its handler.
fn dispatch(ctx: &mut Resolution<'_>, agent: &AgentName, params: &ActionParameters) -> HandlerResult {
    match params {
        ActionParameters::Skip => Ok(ActionOutcome::Done),
        ActionParameters::Abort => handlers::abort(ctx, agent),
        ActionParameters::Goto(target) => handlers::goto(ctx, agent, target),
        ActionParameters::Give {
            receiver,
            item,
            amount,
        } => coordination::give(ctx, agent, receiver, item, *amount),
        ActionParameters::Store { item, amount } => handlers::store(ctx, agent, item, *amount),
        ActionParameters::Retrieve { item, amount } => {
            handlers::retrieve(ctx, agent, item, *amount, handlers::Bucket::Stored)
        }
        ActionParameters::RetrieveDelivered { item, amount } => {
            handlers::retrieve(ctx, agent, item, *amount, handlers::Bucket::Delivered)
        }
        ActionParameters::Buy { item, amount } => handlers::buy(ctx, agent, item, *amount),
        ActionParameters::Dump { item, amount } => handlers::dump(ctx, agent, item, *amount),
        ActionParameters::Charge => handlers::charge(ctx, agent),
        ActionParameters::Recharge => handlers::recharge(ctx, agent),
        ActionParameters::Gather => handlers::gather(ctx, agent),
        ActionParameters::Assemble { item } => coordination::assemble(ctx, agent, item),
        ActionParameters::PostJob {
            reward,
            duration,
            storage,
            item,
            amount,
        } => economy::post_job(
            ctx,
            agent,
            &economy::PostJob {
                reward: *reward,
                duration: *duration,
                storage,
                item,
                amount: *amount,
            },
        ),
        ActionParameters::DeliverJob { job } => economy::deliver_job(ctx, agent, job),
        ActionParameters::BidForJob { job, amount } => economy::bid_for_job(ctx, agent, job, *amount),
        // Passive verbs are resolved by their counterpart.
        ActionParameters::Receive | ActionParameters::AssistAssemble { .. } => {
            Err(ActionResultCode::FailedCounterpart)
        }
    }
}

/// The facility of `kind` the agent stands on.
pub(crate) fn facility_under(
    world: &WorldState,
    agent: &str,
    kind: FacilityKind,
) -> Result<FacilityName, ActionResultCode> {
    world
        .facility_of_kind_under(agent, kind)
        .ok_or(ActionResultCode::FailedWrongFacility)
}

/// Report a bookkeeping error that aborted an otherwise valid action.
pub(crate) fn internal(agent: &AgentName, err: &dyn core::fmt::Display) -> ActionResultCode {
    warn!(agent = %agent, error = %err, "action aborted by internal error");
    ActionResultCode::Failed
}

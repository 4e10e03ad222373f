//! Job verbs: posting, delivering, and bidding.

use std::collections::BTreeMap;

use citysim_types::{ActionResultCode, AgentName, FacilityName, ItemName, JobName};
use tracing::{debug, info};

use super::{ActionOutcome, HandlerResult, Resolution, internal};
use crate::job::JobSpec;

/// Parameters of a `post_job` action.
#[derive(Debug, Clone, Copy)]
pub struct PostJob<'a> {
    /// Money paid on completion.
    pub reward: i64,
    /// Rounds the job stays open, counting from the next round.
    pub duration: u64,
    /// Storage the items go to.
    pub storage: &'a FacilityName,
    /// Requested item.
    pub item: &'a ItemName,
    /// Requested units.
    pub amount: u32,
}

/// Post a job on behalf of the agent's team. It opens next round.
pub fn post_job(ctx: &mut Resolution<'_>, agent: &AgentName, post: &PostJob<'_>) -> HandlerResult {
    let world = &mut *ctx.world;
    if world.storage(post.storage.as_str()).is_err() {
        return Err(ActionResultCode::FailedUnknownFacility);
    }
    if !world.catalog.contains(post.item.as_str()) {
        return Err(ActionResultCode::FailedUnknownItem);
    }
    let team = world
        .entities
        .get(agent)
        .ok_or(ActionResultCode::FailedUnknownAgent)?
        .team
        .clone();
    let spendable = world
        .spendable_money(team.as_str())
        .map_err(|err| internal(agent, &err))?;
    if post.reward > spendable {
        return Err(ActionResultCode::FailedItemAmount);
    }

    let spec = JobSpec {
        poster: Some(team.clone()),
        storage: post.storage.clone(),
        required: BTreeMap::from([(post.item.clone(), post.amount)]),
        reward: post.reward,
        start: ctx.round.saturating_add(1),
        end: ctx.round.saturating_add(post.duration),
        auction: None,
    };
    let name = world.add_job(spec).map_err(|err| internal(agent, &err))?;
    info!(round = ctx.round, job = %name, team = %team, reward = post.reward, "job posted");
    Ok(ActionOutcome::Done)
}

/// Deliver carried items towards a job at its storage.
pub fn deliver_job(ctx: &mut Resolution<'_>, agent: &AgentName, job_name: &JobName) -> HandlerResult {
    let round = ctx.round;
    let world = &mut *ctx.world;
    let job = world
        .jobs
        .get(job_name)
        .ok_or(ActionResultCode::FailedUnknownJob)?;
    let entity = world
        .entities
        .get(agent)
        .ok_or(ActionResultCode::FailedUnknownAgent)?;
    let team = entity.team.clone();
    job.check_deliverable(&team)?;

    let storage_location = world
        .facilities
        .get(job.storage.as_str())
        .map_err(|err| internal(agent, &err))?
        .location;
    if !entity.is_at(&storage_location) {
        return Err(ActionResultCode::FailedLocation);
    }

    let useful: BTreeMap<ItemName, u32> = job
        .required
        .keys()
        .filter_map(|item| {
            let n = entity
                .item_count(item.as_str())
                .min(job.outstanding(team.as_str(), item.as_str()));
            (n > 0).then(|| (item.clone(), n))
        })
        .collect();
    if useful.is_empty() {
        return Err(ActionResultCode::FailedItemAmount);
    }
    let poster = job.poster.clone();
    let storage = job.storage.clone();

    let entity = world
        .entities
        .get_mut(agent)
        .ok_or(ActionResultCode::FailedUnknownAgent)?;
    for (item, n) in &useful {
        entity
            .remove_item(item.as_str(), *n)
            .map_err(|err| internal(agent, &err))?;
    }
    if let Some(poster) = &poster {
        let bucket = world
            .storage_mut(storage.as_str())
            .map_err(|err| internal(agent, &err))?;
        for (item, n) in &useful {
            bucket
                .add_delivered(poster, item, *n)
                .map_err(|err| internal(agent, &err))?;
        }
    }

    let job = world
        .jobs
        .get_mut(job_name)
        .ok_or(ActionResultCode::FailedUnknownJob)?;
    if !job.record_delivery(&team, &useful) {
        return Ok(ActionOutcome::Partial);
    }

    let payout = job.payout();
    world
        .pay_job_reward(round, job_name, poster.as_ref(), &team, payout)
        .map_err(|err| internal(agent, &err))?;
    ctx.completed_jobs.push(job_name.clone());
    info!(round, job = %job_name, team = %team, payout, "job completed");
    Ok(ActionOutcome::Done)
}

/// Bid on an auction during its bidding window.
pub fn bid_for_job(
    ctx: &mut Resolution<'_>,
    agent: &AgentName,
    job_name: &JobName,
    amount: i64,
) -> HandlerResult {
    let world = &mut *ctx.world;
    let team = world
        .entities
        .get(agent)
        .ok_or(ActionResultCode::FailedUnknownAgent)?
        .team
        .clone();
    let job = world
        .jobs
        .get_mut(job_name)
        .ok_or(ActionResultCode::FailedUnknownJob)?;
    let lowest = job.place_bid(&team, amount)?;
    debug!(job = %job_name, team = %team, amount, lowest, "bid placed");
    Ok(ActionOutcome::Done)
}

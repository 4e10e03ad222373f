//! Single-agent verbs: movement, facility use, and battery.

use citysim_types::{
    ActionResultCode, AgentName, FacilityKind, GotoTarget, ItemName, Location,
};
use citysim_world::{FacilityPayload, WorldError, step_toward};

use super::{ActionOutcome, HandlerResult, Resolution, facility_under, internal};
use crate::world_state::WorldState;

/// Which storage bucket a retrieve draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    /// The team's own stored goods.
    Stored,
    /// Goods delivered to the team's jobs.
    Delivered,
}

/// Drop the current route target.
pub fn abort(ctx: &mut Resolution<'_>, agent: &AgentName) -> HandlerResult {
    let entity = ctx
        .world
        .entities
        .get_mut(agent)
        .ok_or(ActionResultCode::FailedUnknownAgent)?;
    entity.destination = None;
    Ok(ActionOutcome::Done)
}

/// Advance towards coordinates, a facility, another entity, or the current
/// route target.
pub fn goto(ctx: &mut Resolution<'_>, agent: &AgentName, target: &GotoTarget) -> HandlerResult {
    let world = &mut *ctx.world;
    let current = world
        .entities
        .get(agent)
        .ok_or(ActionResultCode::FailedUnknownAgent)?;
    let target = match target {
        GotoTarget::Coordinates(location) if world.rules.map.contains(location) => *location,
        GotoTarget::Coordinates(_) => return Err(ActionResultCode::FailedNoRoute),
        GotoTarget::Named(name) => resolve_named(world, name)?,
        GotoTarget::Continue => current.destination.ok_or(ActionResultCode::FailedNoRoute)?,
    };

    let rules = world.rules;
    let entity = world
        .entities
        .get_mut(agent)
        .ok_or(ActionResultCode::FailedUnknownAgent)?;
    if entity.is_at(&target) {
        entity.destination = None;
        return Ok(ActionOutcome::Done);
    }
    if !entity.discharge(rules.goto_cost) {
        return Err(ActionResultCode::Failed);
    }

    let reach = entity.role.speed as f64 * rules.cell_size;
    let step = step_toward(&entity.location, &target, reach);
    entity.destination = Some(target);
    entity.set_location(step.location);
    Ok(ActionOutcome::Done)
}

/// Facilities (except resource nodes, which are hidden) win over entities.
fn resolve_named(world: &WorldState, name: &str) -> Result<Location, ActionResultCode> {
    if let Ok(facility) = world.facilities.get(name) {
        if facility.kind() != FacilityKind::ResourceNode {
            return Ok(facility.location);
        }
    }
    world
        .entities
        .get(name)
        .map(|e| e.location)
        .ok_or(ActionResultCode::FailedUnknownFacility)
}

/// Move items from the inventory into the team's stored bucket.
pub fn store(ctx: &mut Resolution<'_>, agent: &AgentName, item: &ItemName, amount: u32) -> HandlerResult {
    let storage_name = facility_under(ctx.world, agent.as_str(), FacilityKind::Storage)?;
    known_item(ctx.world, item)?;
    let world = &mut *ctx.world;
    let entity = world
        .entities
        .get_mut(agent)
        .ok_or(ActionResultCode::FailedUnknownAgent)?;
    if entity.item_count(item.as_str()) < amount {
        return Err(ActionResultCode::FailedItemAmount);
    }

    let storage = world
        .facilities
        .get_mut(storage_name.as_str())
        .ok()
        .and_then(|f| f.as_storage_mut())
        .ok_or(ActionResultCode::FailedWrongFacility)?;
    storage
        .store(&world.catalog, &entity.team, item, amount)
        .map_err(|err| match err {
            WorldError::StorageFull { .. } => ActionResultCode::FailedCapacity,
            other => internal(agent, &other),
        })?;
    entity
        .remove_item(item.as_str(), amount)
        .map_err(|err| internal(agent, &err))?;
    Ok(ActionOutcome::Done)
}

/// Move items from a storage bucket into the inventory.
pub fn retrieve(
    ctx: &mut Resolution<'_>,
    agent: &AgentName,
    item: &ItemName,
    amount: u32,
    bucket: Bucket,
) -> HandlerResult {
    let storage_name = facility_under(ctx.world, agent.as_str(), FacilityKind::Storage)?;
    known_item(ctx.world, item)?;
    let world = &mut *ctx.world;
    let entity = world
        .entities
        .get_mut(agent)
        .ok_or(ActionResultCode::FailedUnknownAgent)?;
    let storage = world
        .facilities
        .get_mut(storage_name.as_str())
        .ok()
        .and_then(|f| f.as_storage_mut())
        .ok_or(ActionResultCode::FailedWrongFacility)?;

    let team = entity.team.as_str();
    let available = match bucket {
        Bucket::Stored => storage.stored(team, item.as_str()),
        Bucket::Delivered => storage.delivered(team, item.as_str()),
    };
    if available < amount {
        return Err(ActionResultCode::FailedItemAmount);
    }
    let volume = world
        .catalog
        .volume_of(item.as_str(), amount)
        .map_err(|err| internal(agent, &err))?;
    if !entity
        .can_carry(&world.catalog, volume)
        .map_err(|err| internal(agent, &err))?
    {
        return Err(ActionResultCode::FailedCapacity);
    }

    match bucket {
        Bucket::Stored => storage.remove_stored(team, item.as_str(), amount),
        Bucket::Delivered => storage.remove_delivered(team, item.as_str(), amount),
    }
    .map_err(|err| internal(agent, &err))?;
    entity
        .add_item(&world.catalog, item, amount)
        .map_err(|err| internal(agent, &err))?;
    Ok(ActionOutcome::Done)
}

/// Buy items at the shop the agent stands on.
pub fn buy(ctx: &mut Resolution<'_>, agent: &AgentName, item: &ItemName, amount: u32) -> HandlerResult {
    let shop_name = facility_under(ctx.world, agent.as_str(), FacilityKind::Shop)?;
    known_item(ctx.world, item)?;
    let round = ctx.round;
    let world = &mut *ctx.world;

    let price = match world.facilities.get(shop_name.as_str()).map(|f| &f.payload) {
        Ok(FacilityPayload::Shop(shop)) => {
            shop.quote(item.as_str(), amount).map_err(|err| match err {
                WorldError::NotOffered(_) => ActionResultCode::FailedUnknownItem,
                WorldError::InsufficientStock { .. } => ActionResultCode::FailedItemAmount,
                other => internal(agent, &other),
            })?
        }
        _ => return Err(ActionResultCode::FailedWrongFacility),
    };

    let entity = world
        .entities
        .get(agent)
        .ok_or(ActionResultCode::FailedUnknownAgent)?;
    let team = entity.team.clone();
    let affordable = world
        .spendable_money(team.as_str())
        .is_ok_and(|money| money >= price);
    if !affordable {
        return Err(ActionResultCode::FailedItemAmount);
    }
    let volume = world
        .catalog
        .volume_of(item.as_str(), amount)
        .map_err(|err| internal(agent, &err))?;
    if !entity
        .can_carry(&world.catalog, volume)
        .map_err(|err| internal(agent, &err))?
    {
        return Err(ActionResultCode::FailedCapacity);
    }

    world
        .facilities
        .get_mut(shop_name.as_str())
        .ok()
        .and_then(|f| f.as_shop_mut())
        .ok_or(ActionResultCode::FailedWrongFacility)?
        .take(item.as_str(), amount)
        .map_err(|err| internal(agent, &err))?;
    world
        .charge_purchase(round, &team, &shop_name, price)
        .map_err(|err| internal(agent, &err))?;
    world
        .entities
        .get_mut(agent)
        .ok_or(ActionResultCode::FailedUnknownAgent)?
        .add_item(&world.catalog, item, amount)
        .map_err(|err| internal(agent, &err))?;
    Ok(ActionOutcome::Done)
}

/// Destroy up to `amount` units at a dump.
pub fn dump(ctx: &mut Resolution<'_>, agent: &AgentName, item: &ItemName, amount: u32) -> HandlerResult {
    facility_under(ctx.world, agent.as_str(), FacilityKind::Dump)?;
    known_item(ctx.world, item)?;
    let entity = ctx
        .world
        .entities
        .get_mut(agent)
        .ok_or(ActionResultCode::FailedUnknownAgent)?;
    let held = entity.item_count(item.as_str());
    if held == 0 {
        return Err(ActionResultCode::FailedItemAmount);
    }
    entity
        .remove_item(item.as_str(), amount.min(held))
        .map_err(|err| internal(agent, &err))?;
    Ok(ActionOutcome::Done)
}

/// Charge at a charging station.
pub fn charge(ctx: &mut Resolution<'_>, agent: &AgentName) -> HandlerResult {
    let station = facility_under(ctx.world, agent.as_str(), FacilityKind::ChargingStation)?;
    let rate = match ctx.world.facilities.get(station.as_str()).map(|f| &f.payload) {
        Ok(FacilityPayload::ChargingStation(station)) => station.rate,
        _ => return Err(ActionResultCode::FailedWrongFacility),
    };
    let entity = ctx
        .world
        .entities
        .get_mut(agent)
        .ok_or(ActionResultCode::FailedUnknownAgent)?;
    entity.charge(rate);
    Ok(ActionOutcome::Done)
}

/// Recharge a small random amount, anywhere.
pub fn recharge(ctx: &mut Resolution<'_>, agent: &AgentName) -> HandlerResult {
    let rules = ctx.world.rules;
    let amount = ctx
        .rng
        .range_inclusive(rules.recharge_min.max(1), rules.recharge_max.max(1));
    let entity = ctx
        .world
        .entities
        .get_mut(agent)
        .ok_or(ActionResultCode::FailedUnknownAgent)?;
    entity.charge(amount);
    Ok(ActionOutcome::Done)
}

/// Try to gather one unit at a resource node.
pub fn gather(ctx: &mut Resolution<'_>, agent: &AgentName) -> HandlerResult {
    let node_name = facility_under(ctx.world, agent.as_str(), FacilityKind::ResourceNode)?;
    let world = &mut *ctx.world;
    let (resource, probability) = match world.facilities.get(node_name.as_str()).map(|f| &f.payload) {
        Ok(FacilityPayload::ResourceNode(node)) => (node.resource.clone(), node.gather_probability),
        _ => return Err(ActionResultCode::FailedWrongFacility),
    };
    let entity = world
        .entities
        .get_mut(agent)
        .ok_or(ActionResultCode::FailedUnknownAgent)?;
    let volume = world
        .catalog
        .volume_of(resource.as_str(), 1)
        .map_err(|err| internal(agent, &err))?;
    if !entity
        .can_carry(&world.catalog, volume)
        .map_err(|err| internal(agent, &err))?
    {
        return Err(ActionResultCode::FailedCapacity);
    }
    if !ctx.rng.chance(probability) {
        return Err(ActionResultCode::FailedRandom);
    }
    entity
        .add_item(&world.catalog, &resource, 1)
        .map_err(|err| internal(agent, &err))?;
    Ok(ActionOutcome::Done)
}

fn known_item(world: &WorldState, item: &ItemName) -> Result<(), ActionResultCode> {
    world
        .catalog
        .get(item.as_str())
        .map(|_| ())
        .map_err(|_err| ActionResultCode::FailedUnknownItem)
}

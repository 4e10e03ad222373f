//! Two-sided verbs.
//!
//! `give` succeeds only against a co-located `receive` submitted in the same
//! round. `assemble` pulls in every co-located agent whose `assist_assemble`
//! names the assembler; their inventories and tools are pooled, items are
//! consumed from the assembler first and then from assistants in canonical
//! order, and every participant gets the assembler's result.

use std::collections::BTreeMap;

use citysim_types::{ActionParameters, ActionResultCode, AgentName, FacilityKind, ItemName};
use tracing::debug;

use super::{ActionOutcome, HandlerResult, Resolution, facility_under, internal};

/// Hand items to a co-located agent that is receiving this round.
pub fn give(
    ctx: &mut Resolution<'_>,
    agent: &AgentName,
    receiver: &AgentName,
    item: &ItemName,
    amount: u32,
) -> HandlerResult {
    let receiving = matches!(ctx.live_plan(receiver.as_str()), Some(ActionParameters::Receive));
    let world = &mut *ctx.world;

    let giver = world
        .entities
        .get(agent)
        .ok_or(ActionResultCode::FailedUnknownAgent)?;
    let taker = world
        .entities
        .get(receiver)
        .ok_or(ActionResultCode::FailedUnknownAgent)?;
    if !giver.is_at(&taker.location) {
        return Err(ActionResultCode::FailedLocation);
    }
    if !receiving {
        return Err(ActionResultCode::FailedCounterpart);
    }
    if !world.catalog.contains(item.as_str()) {
        return Err(ActionResultCode::FailedUnknownItem);
    }
    if giver.item_count(item.as_str()) < amount {
        return Err(ActionResultCode::FailedItemAmount);
    }
    let volume = world
        .catalog
        .volume_of(item.as_str(), amount)
        .map_err(|err| internal(agent, &err))?;
    if !taker
        .can_carry(&world.catalog, volume)
        .map_err(|err| internal(agent, &err))?
    {
        ctx.results
            .entry(receiver.clone())
            .or_insert(ActionResultCode::FailedCapacity);
        return Err(ActionResultCode::FailedCapacity);
    }

    world
        .entities
        .get_mut(agent)
        .ok_or(ActionResultCode::FailedUnknownAgent)?
        .remove_item(item.as_str(), amount)
        .map_err(|err| internal(agent, &err))?;
    world
        .entities
        .get_mut(receiver)
        .ok_or(ActionResultCode::FailedUnknownAgent)?
        .add_item(&world.catalog, item, amount)
        .map_err(|err| internal(agent, &err))?;
    ctx.results
        .insert(receiver.clone(), ActionResultCode::Successful);
    Ok(ActionOutcome::Done)
}

/// Assemble `item` at a workshop, with help from co-located assistants.
pub fn assemble(ctx: &mut Resolution<'_>, agent: &AgentName, item: &ItemName) -> HandlerResult {
    let assistants = assistants_of(ctx, agent);
    let result = try_assemble(ctx, agent, &assistants, item);
    let code = result.map_or_else(|code| code, ActionOutcome::code);
    for assistant in assistants {
        ctx.results.insert(assistant, code);
    }
    result
}

/// Co-located agents whose live plan assists `assembler`, in canonical order.
fn assistants_of(ctx: &Resolution<'_>, assembler: &AgentName) -> Vec<AgentName> {
    let Some(location) = ctx.world.entities.get(assembler).map(|e| e.location) else {
        return Vec::new();
    };
    ctx.plans
        .iter()
        .filter(|(name, params)| {
            matches!(params, ActionParameters::AssistAssemble { assembler: target } if target == assembler)
                && *name != assembler
                && !ctx.blocked.contains(*name)
                && !ctx.results.contains_key(*name)
                && ctx
                    .world
                    .entities
                    .get(*name)
                    .is_some_and(|e| e.is_at(&location))
        })
        .map(|(name, _)| name.clone())
        .collect()
}

fn try_assemble(
    ctx: &mut Resolution<'_>,
    agent: &AgentName,
    assistants: &[AgentName],
    item: &ItemName,
) -> HandlerResult {
    facility_under(ctx.world, agent.as_str(), FacilityKind::Workshop)?;
    let world = &mut *ctx.world;
    let recipe = world
        .catalog
        .get(item.as_str())
        .map_err(|_err| ActionResultCode::FailedUnknownItem)?
        .clone();
    if recipe.is_base() {
        return Err(ActionResultCode::FailedWrongParam);
    }

    let participants: Vec<&AgentName> = core::iter::once(agent).chain(assistants).collect();
    let held = |who: &AgentName, what: &str| {
        world
            .entities
            .get(who)
            .map_or(0, |e| e.item_count(what))
    };

    for tool in &recipe.required_tools {
        if !participants.iter().any(|p| held(*p, tool.as_str()) > 0) {
            return Err(ActionResultCode::FailedTools);
        }
    }

    // Plan every removal before touching any inventory.
    let mut removals: Vec<(&AgentName, &ItemName, u32)> = Vec::new();
    for (needed, count) in &recipe.required_items {
        let mut remaining = *count;
        for participant in &participants {
            if remaining == 0 {
                break;
            }
            let take = held(*participant, needed.as_str()).min(remaining);
            if take > 0 {
                removals.push((*participant, needed, take));
                remaining = remaining.saturating_sub(take);
            }
        }
        if remaining > 0 {
            return Err(ActionResultCode::FailedItemAmount);
        }
    }

    let assembler = world
        .entities
        .get(agent)
        .ok_or(ActionResultCode::FailedUnknownAgent)?;
    let mut own_consumed: BTreeMap<ItemName, u32> = BTreeMap::new();
    for (who, what, n) in &removals {
        if *who == agent {
            own_consumed.insert((*what).clone(), *n);
        }
    }
    let freed = world
        .catalog
        .volume_of_all(&own_consumed)
        .map_err(|err| internal(agent, &err))?;
    let load = assembler
        .load(&world.catalog)
        .map_err(|err| internal(agent, &err))?;
    let fits = load
        .saturating_sub(freed)
        .checked_add(recipe.volume)
        .is_some_and(|total| total <= assembler.role.load);
    if !fits {
        return Err(ActionResultCode::FailedCapacity);
    }

    for (who, what, n) in removals {
        world
            .entities
            .get_mut(who)
            .ok_or(ActionResultCode::FailedUnknownAgent)?
            .remove_item(what.as_str(), n)
            .map_err(|err| internal(agent, &err))?;
    }
    world
        .entities
        .get_mut(agent)
        .ok_or(ActionResultCode::FailedUnknownAgent)?
        .add_item(&world.catalog, item, 1)
        .map_err(|err| internal(agent, &err))?;
    debug!(agent = %agent, item = %item, assistants = assistants.len(), "item assembled");
    Ok(ActionOutcome::Done)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use citysim_types::{Action, ActionResultCode as Code};

    use crate::test_support::{Fixture, at};

    #[test]
    fn give_and_receive_move_items() {
        let mut fx = Fixture::new();
        fx.give_items("agentA1", "item0", 3);
        let report = fx.round(vec![
            ("agentA1", Action::new("give", ["agentA2", "item0", "2"])),
            ("agentA2", Action::new("receive", Vec::<String>::new())),
        ]);
        assert_eq!(report.result("agentA1"), Some(Code::Successful));
        assert_eq!(report.result("agentA2"), Some(Code::Successful));
        assert_eq!(fx.world.entity("agentA1").unwrap().item_count("item0"), 1);
        assert_eq!(fx.world.entity("agentA2").unwrap().item_count("item0"), 2);
    }

    #[test]
    fn give_without_receive_keeps_items() {
        let mut fx = Fixture::new();
        fx.give_items("agentA1", "item0", 1);
        let report = fx.round(vec![("agentA1", Action::new("give", ["agentA2", "item0", "1"]))]);
        assert_eq!(report.result("agentA1"), Some(Code::FailedCounterpart));
        assert_eq!(report.result("agentA2"), Some(Code::Successful));
        assert_eq!(fx.world.entity("agentA1").unwrap().item_count("item0"), 1);
        assert_eq!(fx.world.entity("agentA2").unwrap().item_count("item0"), 0);
    }

    #[test]
    fn receive_without_give_fails() {
        let mut fx = Fixture::new();
        let report = fx.round(vec![("agentA2", Action::new("receive", Vec::<String>::new()))]);
        assert_eq!(report.result("agentA2"), Some(Code::FailedCounterpart));
    }

    #[test]
    fn give_needs_co_location_and_a_known_receiver() {
        let mut fx = Fixture::new();
        fx.give_items("agentA1", "item0", 1);
        fx.place("agentA2", at::SHOP);
        let report = fx.round(vec![
            ("agentA1", Action::new("give", ["agentA2", "item0", "1"])),
            ("agentA2", Action::new("receive", Vec::<String>::new())),
        ]);
        assert_eq!(report.result("agentA1"), Some(Code::FailedLocation));
        assert_eq!(report.result("agentA2"), Some(Code::FailedCounterpart));
        assert_eq!(
            fx.act("agentA1", Action::new("give", ["nobody", "item0", "1"])),
            Code::FailedUnknownAgent
        );
    }

    #[test]
    fn receiver_over_capacity_fails_both_sides() {
        let mut fx = Fixture::new();
        fx.give_items("agentA1", "item0", 2);
        fx.world.entity_mut("agentA2").unwrap().role.load = 5;
        let report = fx.round(vec![
            ("agentA1", Action::new("give", ["agentA2", "item0", "2"])),
            ("agentA2", Action::new("receive", Vec::<String>::new())),
        ]);
        assert_eq!(report.result("agentA1"), Some(Code::FailedCapacity));
        assert_eq!(report.result("agentA2"), Some(Code::FailedCapacity));
        assert_eq!(fx.world.entity("agentA1").unwrap().item_count("item0"), 2);
    }

    #[test]
    fn assemble_pools_inventories_and_keeps_tools() {
        let mut fx = Fixture::new();
        fx.place("agentA1", at::WORKSHOP);
        fx.place("agentA2", at::WORKSHOP);
        fx.give_items("agentA1", "item0", 1);
        fx.give_items("agentA2", "item1", 1);
        fx.give_items("agentA2", "tool0", 1);
        let report = fx.round(vec![
            ("agentA1", Action::new("assemble", ["gadget"])),
            ("agentA2", Action::new("assist_assemble", ["agentA1"])),
        ]);
        assert_eq!(report.result("agentA1"), Some(Code::Successful));
        assert_eq!(report.result("agentA2"), Some(Code::Successful));
        let a1 = fx.world.entity("agentA1").unwrap();
        let a2 = fx.world.entity("agentA2").unwrap();
        assert_eq!(a1.item_count("gadget"), 1);
        assert_eq!(a1.item_count("item0"), 0);
        assert_eq!(a2.item_count("item1"), 0);
        assert_eq!(a2.item_count("tool0"), 1);
    }

    #[test]
    fn missing_tools_fail_everyone_and_consume_nothing() {
        let mut fx = Fixture::new();
        fx.place("agentA1", at::WORKSHOP);
        fx.place("agentA2", at::WORKSHOP);
        fx.give_items("agentA1", "item0", 1);
        fx.give_items("agentA2", "item1", 1);
        let report = fx.round(vec![
            ("agentA1", Action::new("assemble", ["gadget"])),
            ("agentA2", Action::new("assist_assemble", ["agentA1"])),
        ]);
        assert_eq!(report.result("agentA1"), Some(Code::FailedTools));
        assert_eq!(report.result("agentA2"), Some(Code::FailedTools));
        assert_eq!(fx.world.entity("agentA1").unwrap().item_count("item0"), 1);
        assert_eq!(fx.world.entity("agentA2").unwrap().item_count("item1"), 1);
    }

    #[test]
    fn base_items_cannot_be_assembled() {
        let mut fx = Fixture::new();
        fx.place("agentA1", at::WORKSHOP);
        assert_eq!(fx.act("agentA1", Action::new("assemble", ["item0"])), Code::FailedWrongParam);
        assert_eq!(fx.act("agentA1", Action::new("assemble", ["gold"])), Code::FailedUnknownItem);
    }

    #[test]
    fn assistant_elsewhere_is_not_pulled_in() {
        let mut fx = Fixture::new();
        fx.place("agentA1", at::WORKSHOP);
        fx.give_items("agentA1", "item0", 1);
        fx.give_items("agentA1", "tool0", 1);
        fx.give_items("agentA2", "item1", 1);
        let report = fx.round(vec![
            ("agentA1", Action::new("assemble", ["gadget"])),
            ("agentA2", Action::new("assist_assemble", ["agentA1"])),
        ]);
        assert_eq!(report.result("agentA1"), Some(Code::FailedItemAmount));
        assert_eq!(report.result("agentA2"), Some(Code::FailedCounterpart));
    }
}

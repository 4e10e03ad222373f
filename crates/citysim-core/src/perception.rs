//! Percept assembly.
//!
//! Percepts are read from the world state and never mutate it. Each agent
//! sees every entity and every facility except resource nodes, which are
//! only visible while standing on them. Storages show the viewing team's
//! buckets only, and auctions never reveal the lowest bid.

use std::collections::BTreeMap;

use citysim_types::{
    AgentName, FacilityKind, ItemInfo, SimEndPercept, SimStartPercept, StepPercept, TeamName,
    VisibleEntity, VisibleFacility, VisibleJob,
};

use crate::world_state::{StateError, WorldState};

/// The match-start percept of every agent.
pub fn sim_start_percepts(world: &WorldState, total_rounds: u64) -> BTreeMap<AgentName, SimStartPercept> {
    let items: Vec<ItemInfo> = world.catalog().iter().map(citysim_world::Item::info).collect();
    world
        .entities()
        .map(|entity| {
            (
                entity.name.clone(),
                SimStartPercept {
                    match_id: world.match_id(),
                    agent: entity.name.clone(),
                    team: entity.team.clone(),
                    role: entity.role.clone(),
                    total_rounds,
                    items: items.clone(),
                },
            )
        })
        .collect()
}

/// The round-start percept of every agent.
pub fn step_percepts(world: &WorldState, round: u64) -> Result<BTreeMap<AgentName, StepPercept>, StateError> {
    let entities: Vec<VisibleEntity> = world
        .entities()
        .map(|e| VisibleEntity {
            name: e.name.clone(),
            team: e.team.clone(),
            role: e.role.name.clone(),
            location: e.location,
        })
        .collect();

    // Facility and job views depend only on the team, so build them once per team.
    let mut team_views: BTreeMap<TeamName, (Vec<VisibleFacility>, Vec<VisibleJob>)> = BTreeMap::new();
    for team in world.teams() {
        let mut facilities = Vec::new();
        for facility in world.facilities().iter() {
            if facility.kind() != FacilityKind::ResourceNode {
                facilities.push(facility.view_for(team.name.as_str(), world.catalog())?);
            }
        }
        let jobs = world
            .jobs()
            .filter(|job| job.is_visible())
            .map(|job| job.view_for(&team.name))
            .collect();
        team_views.insert(team.name.clone(), (facilities, jobs));
    }

    let mut percepts = BTreeMap::new();
    for entity in world.entities() {
        let (facilities, jobs) = team_views
            .get(&entity.team)
            .ok_or_else(|| StateError::UnknownTeam(entity.team.clone()))?;
        let mut facilities = facilities.clone();
        if let Some(node) = world.facilities().iter().find(|f| {
            f.kind() == FacilityKind::ResourceNode && entity.is_at(&f.location)
        }) {
            facilities.push(node.view_for(entity.team.as_str(), world.catalog())?);
        }

        percepts.insert(
            entity.name.clone(),
            StepPercept {
                round,
                team_money: world.team_money(entity.team.as_str())?,
                self_state: entity.self_percept(world.catalog())?,
                entities: entities.clone(),
                facilities,
                jobs: jobs.clone(),
            },
        );
    }
    Ok(percepts)
}

/// 1-based rank of every team by money, highest first. Equal money shares
/// a rank and the next rank skips accordingly.
pub fn ranking(world: &WorldState) -> BTreeMap<TeamName, u32> {
    let mut by_money: Vec<(&TeamName, i64)> = world.teams().map(|t| (&t.name, t.money)).collect();
    by_money.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let mut ranks = BTreeMap::new();
    let mut rank = 1_u32;
    let mut previous: Option<i64> = None;
    for (position, (team, money)) in by_money.into_iter().enumerate() {
        if previous != Some(money) {
            rank = u32::try_from(position).unwrap_or(u32::MAX).saturating_add(1);
            previous = Some(money);
        }
        ranks.insert(team.clone(), rank);
    }
    ranks
}

/// The match-end percept of every agent.
pub fn sim_end_percepts(world: &WorldState) -> BTreeMap<AgentName, SimEndPercept> {
    let ranks = ranking(world);
    world
        .entities()
        .map(|entity| {
            let score = world.team_money(entity.team.as_str()).unwrap_or_default();
            (
                entity.name.clone(),
                SimEndPercept {
                    match_id: world.match_id(),
                    ranking: ranks.get(&entity.team).copied().unwrap_or(0),
                    score,
                },
            )
        })
        .collect()
}

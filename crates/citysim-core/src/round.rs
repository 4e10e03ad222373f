//! Round resolution: the pipeline that turns one batch of actions into the
//! next world state.
//!
//! Each call to [`resolve_round`] runs these phases in order:
//!
//! 1. **Job activation** -- posted jobs whose start round arrived open;
//!    auctions whose bidding window closed are assigned or expire.
//!
//! 2. **Parse** -- every entity's action is parsed into typed parameters.
//!    Agents missing from the batch skip. Unparseable actions fail with
//!    `failed_wrong_param` and change nothing.
//!
//! 3. **Random failure** -- with `random_fail_pct` percent chance, an
//!    agent's action is dropped with `failed_random` before it applies.
//!
//! 4. **Apply** -- actions apply one agent at a time in ascending agent name
//!    order, each observing the effects of those before it. Passive verbs
//!    (`receive`, `assist_assemble`) are resolved by their counterpart.
//!
//! 5. **Finalise** -- unconsumed passive actions fail with
//!    `failed_counterpart`; every entity records its last action.
//!
//! 6. **Job expiry** -- open jobs at their end round expire; assigned
//!    auctions charge their fine.
//!
//! 7. **Restock** -- shops restock on their interval.
//!
//! 8. **Reconcile** -- every team wallet is checked against the ledger.
//!
//! Resolution is deterministic given the world state, the action batch,
//! and the state of the random source.

use std::collections::BTreeMap;

use citysim_ledger::{ReconcileResult, reconcile};
use citysim_types::{
    Action, ActionParameters, ActionResultCode, AgentName, JobName, JobStatus, LastAction,
};
use citysim_world::FacilityPayload;
use tracing::{debug, info, warn};

use crate::actions::Resolution;
use crate::job::Expiry;
use crate::rng::SimRng;
use crate::world_state::{StateError, WorldState};

/// What happened in one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundReport {
    /// The round that was resolved.
    pub round: u64,
    /// Result of every entity's action.
    pub results: BTreeMap<AgentName, ActionResultCode>,
    /// Jobs that opened for deliveries or bids.
    pub activated: Vec<JobName>,
    /// Jobs completed by a delivery.
    pub completed: Vec<JobName>,
    /// Jobs that expired.
    pub expired: Vec<JobName>,
    /// Total fines charged.
    pub fines: i64,
    /// Shop offers that gained stock.
    pub restocked: u32,
    /// Whether every wallet matched the ledger afterwards.
    pub ledger_balanced: bool,
}

impl RoundReport {
    /// The result of one agent's action.
    pub fn result(&self, agent: &str) -> Option<ActionResultCode> {
        self.results.get(agent).copied()
    }
}

/// Resolve one round.
///
/// # Errors
///
/// Returns [`StateError`] only if charging a fine fails, which signals an
/// arithmetic limit in the money bookkeeping. Action failures are reported
/// through [`RoundReport::results`], never as errors.
pub fn resolve_round(
    world: &mut WorldState,
    rng: &mut SimRng,
    round: u64,
    actions: &BTreeMap<AgentName, Action>,
) -> Result<RoundReport, StateError> {
    // --- Phase 1: Job activation ---
    let (activated, unbid) = activate_jobs(world, round);

    // --- Phase 2: Parse ---
    let agents: Vec<AgentName> = world.agents().cloned().collect();
    let submitted: BTreeMap<AgentName, Action> = agents
        .iter()
        .map(|agent| {
            let action = actions.get(agent).cloned().unwrap_or_else(Action::skip);
            (agent.clone(), action)
        })
        .collect();
    for unknown in actions.keys().filter(|a| !submitted.contains_key(*a)) {
        warn!(round, agent = %unknown, "action submitted for unknown agent ignored");
    }

    let random_fail_pct = world.rules.random_fail_pct;
    let mut ctx = Resolution::new(world, rng, round);
    for (agent, action) in &submitted {
        match ActionParameters::parse(action) {
            Ok(params) => {
                ctx.plans.insert(agent.clone(), params);
            }
            Err(code) => {
                debug!(round, agent = %agent, verb = %action.verb, "unparseable action");
                ctx.results.insert(agent.clone(), code);
            }
        }
    }

    // --- Phase 3: Random failure ---
    for agent in &agents {
        if ctx.plans.contains_key(agent) && ctx.rng.percent(random_fail_pct) {
            ctx.blocked.insert(agent.clone());
            ctx.results
                .insert(agent.clone(), ActionResultCode::FailedRandom);
        }
    }

    // --- Phase 4: Apply in canonical order ---
    for agent in &agents {
        ctx.apply(agent);
    }

    // --- Phase 5: Finalise ---
    ctx.finalise_passive();
    let results = core::mem::take(&mut ctx.results);
    let completed = core::mem::take(&mut ctx.completed_jobs);
    drop(ctx);

    for (agent, action) in &submitted {
        let code = results
            .get(agent)
            .copied()
            .unwrap_or(ActionResultCode::Failed);
        if let Ok(entity) = world.entity_mut(agent.as_str()) {
            entity.last_action = LastAction::new(action, code);
        }
    }

    // --- Phase 6: Job expiry ---
    let (mut expired, fines) = expire_jobs(world, round)?;
    expired.splice(0..0, unbid);

    // --- Phase 7: Restock ---
    let restocked = restock_shops(world, round);

    // --- Phase 8: Reconcile ---
    let ledger_balanced = match reconcile(round, world.ledger(), &world.wallets()) {
        ReconcileResult::Balanced => true,
        ReconcileResult::Mismatch(mismatch) => {
            warn!(round, teams = ?mismatch.teams, "{mismatch}");
            false
        }
    };

    let successes = results.values().filter(|c| c.is_success()).count();
    info!(
        round,
        actions = results.len(),
        successes,
        completed = completed.len(),
        expired = expired.len(),
        "round resolved"
    );

    Ok(RoundReport {
        round,
        results,
        activated,
        completed,
        expired,
        fines,
        restocked,
        ledger_balanced,
    })
}

/// Returns the jobs that opened and the auctions that closed without a bid.
fn activate_jobs(world: &mut WorldState, round: u64) -> (Vec<JobName>, Vec<JobName>) {
    let mut activated = Vec::new();
    let mut unbid = Vec::new();
    for job in world.jobs.values_mut() {
        match job.activate(round) {
            Some(JobStatus::Active | JobStatus::Auctioning) => {
                debug!(round, job = %job.name, status = ?job.status(), "job status changed");
                activated.push(job.name.clone());
            }
            Some(JobStatus::Expired) => {
                info!(round, job = %job.name, "job expired, auction closed without bids");
                unbid.push(job.name.clone());
            }
            Some(status) => debug!(round, job = %job.name, ?status, "job status changed"),
            None => {}
        }
    }
    (activated, unbid)
}

fn expire_jobs(world: &mut WorldState, round: u64) -> Result<(Vec<JobName>, i64), StateError> {
    let mut expired = Vec::new();
    let mut fines: Vec<(JobName, Expiry)> = Vec::new();
    for job in world.jobs.values_mut() {
        if let Some(expiry) = job.expire(round) {
            expired.push(job.name.clone());
            fines.push((job.name.clone(), expiry));
        }
    }

    let mut total = 0_i64;
    for (job, expiry) in fines {
        match expiry {
            Expiry::Plain => info!(round, job = %job, "job expired"),
            Expiry::Fined { team, fine } => {
                world.charge_fine(round, &job, &team, fine)?;
                total = total.saturating_add(fine);
                info!(round, job = %job, team = %team, fine, "auction expired undelivered, fine charged");
            }
        }
    }
    Ok((expired, total))
}

fn restock_shops(world: &mut WorldState, round: u64) -> u32 {
    world
        .facilities_mut()
        .iter_mut()
        .filter_map(|f| match &mut f.payload {
            FacilityPayload::Shop(shop) => Some(shop.restock(round)),
            _ => None,
        })
        .fold(0_u32, u32::saturating_add)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use std::collections::BTreeMap;

    use citysim_types::{Action, ActionResultCode as Code, FacilityName, ItemName, JobName, JobStatus};

    use crate::job::{AuctionSpec, JobSpec};
    use crate::test_support::{Fixture, at};

    #[test]
    fn missing_agents_skip() {
        let mut fx = Fixture::new();
        let report = fx.round(Vec::new());
        assert_eq!(report.results.len(), 3);
        assert!(report.results.values().all(|c| *c == Code::Successful));
        assert_eq!(fx.world.entity("agentA1").unwrap().last_action.verb, "skip");
    }

    #[test]
    fn malformed_actions_fail_without_effect() {
        let mut fx = Fixture::new();
        let report = fx.round(vec![
            ("agentA1", Action::new("teleport", ["x"])),
            ("agentA2", Action::new("buy", ["item0"])),
        ]);
        assert_eq!(report.result("agentA1"), Some(Code::FailedWrongParam));
        assert_eq!(report.result("agentA2"), Some(Code::FailedWrongParam));
        let last = &fx.world.entity("agentA1").unwrap().last_action;
        assert_eq!(last.verb, "teleport");
        assert_eq!(last.params, vec!["x"]);
    }

    #[test]
    fn canonical_order_decides_contention() {
        let mut fx = Fixture::new();
        fx.place("agentA1", at::SHOP);
        fx.place("agentA2", at::SHOP);
        fx.place("agentB1", at::SHOP);
        let report = fx.round(vec![
            ("agentB1", Action::new("buy", ["item0", "3"])),
            ("agentA2", Action::new("buy", ["item0", "3"])),
            ("agentA1", Action::new("buy", ["item0", "1"])),
        ]);
        assert_eq!(report.result("agentA1"), Some(Code::Successful));
        assert_eq!(report.result("agentA2"), Some(Code::Successful));
        assert_eq!(report.result("agentB1"), Some(Code::FailedItemAmount));
        assert_eq!(fx.shop_stock("item0"), 1);
    }

    #[test]
    fn every_action_fails_at_full_random_failure() {
        let mut fx = Fixture::with_random_fail(100);
        fx.give_items("agentA1", "item0", 1);
        fx.place("agentA1", at::DUMP);
        let report = fx.round(vec![("agentA1", Action::new("dump", ["item0", "1"]))]);
        assert!(report.results.values().all(|c| *c == Code::FailedRandom));
        assert_eq!(fx.world.entity("agentA1").unwrap().item_count("item0"), 1);
    }

    #[test]
    fn unconsumed_receive_fails_and_is_recorded() {
        let mut fx = Fixture::new();
        let report = fx.round(vec![("agentA2", Action::new("receive", Vec::<String>::new()))]);
        assert_eq!(report.result("agentA2"), Some(Code::FailedCounterpart));
        let last = &fx.world.entity("agentA2").unwrap().last_action;
        assert_eq!(last.verb, "receive");
        assert_eq!(last.result, Code::FailedCounterpart);
    }

    #[test]
    fn auction_fine_is_charged_at_end() {
        let mut fx = Fixture::new();
        let round = fx.round;
        fx.world
            .add_job(JobSpec {
                poster: None,
                storage: FacilityName::from("storage0"),
                required: BTreeMap::from([(ItemName::from("item0"), 1)]),
                reward: 100,
                start: round,
                end: round + 2,
                auction: Some(AuctionSpec {
                    auction_time: 1,
                    fine: 40,
                    max_bid: 100,
                }),
            })
            .unwrap();
        let report = fx.round(vec![("agentA1", Action::new("bid_for_job", ["auction0", "60"]))]);
        assert_eq!(report.activated.len(), 1);
        let report = fx.round(Vec::new());
        assert_eq!(report.activated.len(), 1);
        let report = fx.round(Vec::new());
        assert_eq!(report.expired.len(), 1);
        assert_eq!(report.fines, 40);
        assert!(report.ledger_balanced);
        assert_eq!(fx.world.team_money("A").unwrap(), 960);
        assert_eq!(fx.world.team_money("B").unwrap(), 1_000);
    }

    #[test]
    fn auction_without_bids_expires_without_money_moving() {
        let mut fx = Fixture::new();
        let round = fx.round;
        fx.world
            .add_job(JobSpec {
                poster: None,
                storage: FacilityName::from("storage0"),
                required: BTreeMap::from([(ItemName::from("item0"), 1)]),
                reward: 100,
                start: round,
                end: round + 5,
                auction: Some(AuctionSpec {
                    auction_time: 1,
                    fine: 40,
                    max_bid: 100,
                }),
            })
            .unwrap();

        let report = fx.round(Vec::new());
        assert_eq!(report.activated.len(), 1);
        assert!(report.expired.is_empty());

        let report = fx.round(Vec::new());
        assert!(report.activated.is_empty());
        assert_eq!(report.expired, vec![JobName::from("auction0")]);
        assert_eq!(report.fines, 0);
        assert!(report.ledger_balanced);
        assert_eq!(fx.world.job("auction0").unwrap().status(), JobStatus::Expired);
        assert_eq!(fx.world.team_money("A").unwrap(), 1_000);
        assert_eq!(fx.world.team_money("B").unwrap(), 1_000);

        // Already expired: later rounds neither report nor charge it again.
        let report = fx.round(Vec::new());
        assert!(report.expired.is_empty());
        assert_eq!(report.fines, 0);
    }

    #[test]
    fn auction_must_close_bidding_by_its_end() {
        let mut fx = Fixture::new();
        let round = fx.round;
        let mut spec = JobSpec {
            poster: None,
            storage: FacilityName::from("storage0"),
            required: BTreeMap::from([(ItemName::from("item0"), 1)]),
            reward: 100,
            start: round,
            end: round + 1,
            auction: Some(AuctionSpec {
                auction_time: 5,
                fine: 40,
                max_bid: 100,
            }),
        };
        assert!(fx.world.add_job(spec.clone()).is_err());

        spec.end = round + 5;
        fx.world.add_job(spec).unwrap();
        fx.round(vec![("agentA1", Action::new("bid_for_job", ["auction0", "60"]))]);
        fx.place("agentA1", at::STORAGE);
        fx.give_items("agentA1", "item0", 1);
        let code = fx.act("agentA1", Action::new("deliver_job", ["auction0"]));
        assert_eq!(code, Code::FailedJobStatus);
        assert_eq!(fx.world.team_money("A").unwrap(), 1_000);
    }
}

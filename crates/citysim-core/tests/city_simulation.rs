//! Integration tests for the city scenario.
//!
//! Every test builds a match from `fixtures/quick_test.yaml`, moves agents
//! into position through the public world-state API, and plays whole
//! rounds through `pre_step` and `step`.

#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

use std::collections::BTreeMap;

use citysim_core::job::{AuctionSpec, JobSpec};
use citysim_core::{CitySimConfig, CitySimulation, RoundReport};
use citysim_types::{Action, ActionResultCode, AgentName, FacilityName, ItemName, Location};

const QUICK_TEST: &str = include_str!("fixtures/quick_test.yaml");

/// A running match plus its round counter.
struct Match {
    sim: CitySimulation,
    round: u64,
}

impl Match {
    fn new() -> Self {
        let config = CitySimConfig::parse(QUICK_TEST).unwrap();
        let (sim, percepts) = CitySimulation::init(
            config.server.rounds,
            &config.match_config,
            &config.server.teams,
        )
        .unwrap();
        assert_eq!(percepts.len(), 12);
        Self { sim, round: 1 }
    }

    /// Play one round; agents not listed skip.
    fn play(&mut self, actions: &[(&str, Action)]) -> RoundReport {
        self.sim.pre_step(self.round).unwrap();
        let batch: BTreeMap<AgentName, Action> = actions
            .iter()
            .map(|(agent, action)| (AgentName::from(*agent), action.clone()))
            .collect();
        let report = self.sim.step(self.round, &batch).unwrap();
        self.round += 1;
        assert!(report.ledger_balanced);
        report
    }

    fn location_of(&self, facility: &str) -> Location {
        self.sim.world_state().facilities().get(facility).unwrap().location
    }

    fn place(&mut self, agent: &str, location: Location) {
        self.sim.world_state_mut().entity_mut(agent).unwrap().location = location;
    }

    fn clear(&mut self, agent: &str) {
        self.sim.world_state_mut().entity_mut(agent).unwrap().clear_inventory();
    }

    fn give(&mut self, agent: &str, item: &str, amount: u32) {
        self.sim
            .world_state_mut()
            .add_to_inventory(agent, &ItemName::from(item), amount)
            .unwrap();
    }

    fn count(&self, agent: &str, item: &str) -> u32 {
        self.sim.world_state().entity(agent).unwrap().item_count(item)
    }

    fn result(&self, agent: &str) -> ActionResultCode {
        self.sim.world_state().entity(agent).unwrap().last_action.result
    }

    fn money(&self, team: &str) -> i64 {
        self.sim.world_state().team_money(team).unwrap()
    }
}

fn no_params(verb: &str) -> Action {
    Action::new(verb, Vec::<String>::new())
}

#[test]
fn action_is_perceived() {
    let mut m = Match::new();
    let a2 = m.sim.world_state().entity("agentA2").unwrap().location;
    m.place("agentA1", a2);
    m.give("agentA1", "item0", 1);

    m.play(&[("agentA1", Action::new("give", ["agentA2", "item0", "1"]))]);

    let percepts = m.sim.pre_step(m.round).unwrap();
    let last = &percepts.get("agentA1").unwrap().self_state.last_action;
    assert_eq!(last.verb, "give");
    assert_eq!(last.params, vec!["agentA2", "item0", "1"]);
    assert_eq!(last.result, ActionResultCode::FailedCounterpart);
    assert_eq!(m.count("agentA1", "item0"), 1);
}

#[test]
fn goto_works() {
    let mut m = Match::new();
    let shop = m.location_of("shop0");

    m.play(&[
        ("agentA1", Action::new("goto", [shop.lat.to_string(), shop.lon.to_string()])),
        ("agentA2", Action::new("goto", ["resourceNode1"])),
        ("agentA3", Action::new("goto", ["shop0"])),
    ]);

    let world = m.sim.world_state();
    assert!(world.entity("agentA1").unwrap().is_at(&shop));
    assert_eq!(m.result("agentA2"), ActionResultCode::FailedUnknownFacility);
    assert!(world.entity("agentA3").unwrap().is_at(&shop));
}

#[test]
fn give_receive_works() {
    let mut m = Match::new();
    let a5 = m.sim.world_state().entity("agentA5").unwrap().location;
    m.place("agentA4", a5);
    m.clear("agentA4");
    m.clear("agentA5");
    m.give("agentA4", "item0", 1);

    m.play(&[
        ("agentA4", Action::new("give", ["agentA5", "item0", "1"])),
        ("agentA5", no_params("receive")),
    ]);

    assert_eq!(m.count("agentA4", "item0"), 0);
    assert_eq!(m.count("agentA5", "item0"), 1);
    assert_eq!(m.result("agentA4"), ActionResultCode::Successful);
    assert_eq!(m.result("agentA5"), ActionResultCode::Successful);
}

#[test]
fn store_retrieve_works() {
    let mut m = Match::new();
    let storage = m.location_of("storage0");
    m.place("agentA2", storage);
    m.give("agentA2", "item0", 2);

    m.play(&[("agentA2", Action::new("store", ["item0", "1"]))]);
    let stored = |m: &Match| m.sim.world_state().storage("storage0").unwrap().stored("A", "item0");
    assert_eq!(stored(&m), 1);
    assert_eq!(m.count("agentA2", "item0"), 1);

    m.play(&[("agentA2", Action::new("retrieve", ["item0", "1"]))]);
    assert_eq!(stored(&m), 0);
    assert_eq!(m.count("agentA2", "item0"), 2);

    // Retrieving more than stored changes nothing.
    m.play(&[("agentA2", Action::new("retrieve", ["item0", "1"]))]);
    assert_eq!(stored(&m), 0);
    assert_eq!(m.count("agentA2", "item0"), 2);
    assert_eq!(m.result("agentA2"), ActionResultCode::FailedItemAmount);

    // Storing into a full storage changes nothing.
    let catalog = m.sim.world_state().catalog().clone();
    let fill = 1000 / 5;
    m.sim
        .world_state_mut()
        .storage_mut("storage0")
        .unwrap()
        .store(&catalog, &"A".into(), &"item0".into(), fill)
        .unwrap();
    m.play(&[("agentA2", Action::new("store", ["item0", "1"]))]);
    assert_eq!(stored(&m), fill);
    assert_eq!(m.count("agentA2", "item0"), 2);
    assert_eq!(m.result("agentA2"), ActionResultCode::FailedCapacity);
}

#[test]
fn assemble_works() {
    let mut m = Match::new();
    let workshop = m.location_of("workshop0");
    m.place("agentA1", workshop);
    m.place("agentA2", workshop);
    m.give("agentA1", "item0", 2);
    m.give("agentA2", "item1", 1);

    let actions = [
        ("agentA1", Action::new("assemble", ["item3"])),
        ("agentA2", Action::new("assist_assemble", ["agentA1"])),
    ];

    m.play(&actions);
    assert_eq!(m.result("agentA1"), ActionResultCode::FailedTools);
    assert_eq!(m.result("agentA2"), ActionResultCode::FailedTools);
    assert_eq!(m.count("agentA1", "item0"), 2);

    m.give("agentA1", "item2", 1);
    m.play(&actions);
    assert_eq!(m.result("agentA1"), ActionResultCode::Successful);
    assert_eq!(m.result("agentA2"), ActionResultCode::Successful);
    assert_eq!(m.count("agentA1", "item3"), 1);
    for item in ["item0", "item1"] {
        assert_eq!(m.count("agentA1", item), 0);
        assert_eq!(m.count("agentA2", item), 0);
    }
    assert_eq!(m.count("agentA1", "item2"), 1);
}

#[test]
fn buy_works() {
    let mut m = Match::new();
    let money = m.money("A");
    let shop = m.location_of("shop0");
    m.place("agentA3", shop);

    m.play(&[("agentA3", Action::new("buy", ["item0", "1"]))]);
    assert_eq!(m.count("agentA3", "item0"), 1);
    assert_eq!(m.money("A"), money - 50);

    m.play(&[("agentA3", Action::new("buy", ["item0", "100"]))]);
    assert_eq!(m.count("agentA3", "item0"), 1);
    assert_eq!(m.result("agentA3"), ActionResultCode::FailedItemAmount);
    assert_eq!(m.money("A"), money - 50);
}

#[test]
fn dump_works() {
    let mut m = Match::new();
    let dump = m.location_of("dump0");
    m.place("agentA1", dump);
    m.give("agentA1", "item0", 7);

    m.play(&[("agentA1", Action::new("dump", ["item0", "4"]))]);
    assert_eq!(m.count("agentA1", "item0"), 3);
}

#[test]
fn charge_works() {
    let mut m = Match::new();
    let station = m.location_of("charge0");
    m.place("agentA1", station);
    m.sim.world_state_mut().entity_mut("agentA1").unwrap().battery = 0;

    m.play(&[("agentA1", no_params("charge"))]);
    assert_eq!(m.sim.world_state().entity("agentA1").unwrap().battery, 100);
}

#[test]
fn recharge_works() {
    let mut m = Match::new();
    let shop = m.location_of("shop0");
    m.place("agentA2", shop);
    m.sim.world_state_mut().entity_mut("agentA2").unwrap().battery = 0;

    m.play(&[("agentA2", no_params("recharge"))]);
    assert!(m.sim.world_state().entity("agentA2").unwrap().battery > 0);
}

#[test]
fn gather_works() {
    let mut m = Match::new();
    let node = m.location_of("resourceNode1");
    m.place("agentA1", node);

    for _ in 0..10 {
        m.play(&[("agentA1", no_params("gather"))]);
    }
    assert!(m.count("agentA1", "item1") > 0);
}

#[test]
fn job_actions_work() {
    let mut m = Match::new();
    let storage = m.location_of("storage0");
    m.place("agentA1", storage);
    m.place("agentB1", storage);
    m.give("agentA1", "item0", 3);
    let (money_a, money_b) = (m.money("A"), m.money("B"));
    let reward = 77_777;

    m.play(&[(
        "agentB1",
        Action::new("post_job", [reward.to_string().as_str(), "20", "storage0", "item0", "5"]),
    )]);
    let job = m
        .sim
        .world_state()
        .jobs()
        .find(|j| j.poster.as_ref().is_some_and(|p| p.as_str() == "B"))
        .unwrap()
        .name
        .clone();

    // Partial delivery.
    let deliver = [("agentA1", Action::new("deliver_job", [job.as_str()]))];
    m.play(&deliver);
    assert_eq!(m.count("agentA1", "item0"), 0);
    assert_eq!(m.result("agentA1"), ActionResultCode::SuccessfulPartial);
    assert_eq!(m.money("A"), money_a);

    // Completion.
    m.give("agentA1", "item0", 3);
    let report = m.play(&deliver);
    assert_eq!(report.completed, vec![job.clone()]);
    assert_eq!(m.count("agentA1", "item0"), 1);
    assert_eq!(m.result("agentA1"), ActionResultCode::Successful);
    assert_eq!(m.money("A"), money_a + reward);
    assert_eq!(m.money("B"), money_b - reward);
    assert_eq!(
        m.sim.world_state().storage("storage0").unwrap().delivered("B", "item0"),
        5
    );

    // The poster collects the goods.
    m.play(&[("agentB1", Action::new("retrieve_delivered", ["item0", "5"]))]);
    assert_eq!(m.count("agentB1", "item0"), 5);
}

#[test]
fn bid_works() {
    let mut m = Match::new();
    let step = m.round;
    let auction = || JobSpec {
        poster: None,
        storage: FacilityName::from("storage0"),
        required: BTreeMap::from([(ItemName::from("item0"), 1)]),
        reward: 999,
        start: step + 1,
        end: step + 4,
        auction: Some(AuctionSpec {
            auction_time: 2,
            fine: 888,
            max_bid: 999,
        }),
    };
    let first = m.sim.world_state_mut().add_job(auction()).unwrap();
    let second = m.sim.world_state_mut().add_job(auction()).unwrap();
    let (money_a, money_b) = (m.money("A"), m.money("B"));
    let lowest = |m: &Match, job: &str| {
        m.sim.world_state().job(job).unwrap().auction().unwrap().lowest_bid()
    };

    m.play(&[]);

    m.play(&[
        ("agentA1", Action::new("bid_for_job", [first.as_str(), "1000"])),
        ("agentB1", Action::new("bid_for_job", [second.as_str(), "998"])),
    ]);
    assert_eq!(lowest(&m, first.as_str()), None);
    assert_eq!(lowest(&m, second.as_str()), Some(998));

    m.play(&[("agentA1", Action::new("bid_for_job", [first.as_str(), "778"]))]);
    assert_eq!(lowest(&m, first.as_str()), Some(778));

    // Team B completes its auction.
    let storage = m.location_of("storage0");
    m.place("agentB1", storage);
    m.give("agentB1", "item0", 1);
    m.play(&[("agentB1", Action::new("deliver_job", [second.as_str()]))]);
    assert_eq!(m.result("agentB1"), ActionResultCode::Successful);

    // Team A pays the fine, team B got its bid.
    let report = m.play(&[]);
    assert_eq!(report.expired, vec![first]);
    assert_eq!(report.fines, 888);
    assert_eq!(m.money("A"), money_a - 888);
    assert_eq!(m.money("B"), money_b + 998);
}

#[test]
fn identical_inputs_give_identical_matches() {
    let script = |m: &mut Match| {
        let shop = m.location_of("shop0");
        for agent in ["agentA1", "agentB1"] {
            m.place(agent, shop);
        }
        m.play(&[
            ("agentB1", Action::new("buy", ["item1", "2"])),
            ("agentA1", Action::new("buy", ["item1", "2"])),
            ("agentA2", no_params("recharge")),
            ("agentB2", Action::new("goto", ["resourceNode1"])),
        ]);
        m.sim.pre_step(m.round).unwrap()
    };
    let mut a = Match::new();
    let mut b = Match::new();
    let pa = script(&mut a);
    let pb = script(&mut b);
    assert_eq!(pa, pb);

    // agentA1 sorts first, so it takes two of the three units.
    assert_eq!(a.result("agentA1"), ActionResultCode::Successful);
    assert_eq!(a.result("agentB1"), ActionResultCode::FailedItemAmount);
}

#[test]
fn load_never_exceeds_capacity() {
    let mut m = Match::new();
    let shop = m.location_of("shop0");
    m.place("agentA1", shop);
    m.sim.world_state_mut().entity_mut("agentA1").unwrap().role.load = 12;

    m.play(&[("agentA1", Action::new("buy", ["item0", "2"]))]);
    m.play(&[("agentA1", Action::new("buy", ["item0", "1"]))]);
    assert_eq!(m.result("agentA1"), ActionResultCode::FailedCapacity);

    let world = m.sim.world_state();
    for entity in world.entities() {
        assert!(entity.load(world.catalog()).unwrap() <= entity.role.load);
    }
}

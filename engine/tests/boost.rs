//! Confidence, escalation and quiet-ending scenarios.

mod common;

use common::{addr, Harness};
use gov_engine::{EngineConfig, Event, GovernanceError, ProposalState};

#[test]
fn confidence_tracks_stake_mutations() {
    let mut h = Harness::new();
    h.mint_vote("voter1", 200);
    h.mint_stake("staker", 100_000);
    let id = h.create("voter1");

    h.engine.upstake(&addr("staker"), id, 3000).unwrap();
    h.engine.downstake(&addr("staker"), id, 1000).unwrap();

    // 3000/1000 in fixed point, short of the 4x threshold.
    assert_eq!(h.engine.confidence(id).unwrap(), 3_000_000);
    assert!(!h.engine.has_confidence(id).unwrap());
    assert_eq!(h.engine.state(id).unwrap(), ProposalState::Queued);
    assert_eq!(h.engine.proposal(id).unwrap().pended_date, 0);

    // Crossing the threshold pends the proposal within the stake call.
    h.engine.upstake(&addr("staker"), id, 1000).unwrap();
    assert_eq!(h.engine.confidence(id).unwrap(), 4_000_000);
    assert!(h.engine.has_confidence(id).unwrap());
    assert_eq!(h.engine.state(id).unwrap(), ProposalState::Pended);
    let pended_date = h.engine.proposal(id).unwrap().pended_date;
    assert_eq!(pended_date, common::START_TIME);

    // Dropping below reverts to Queued and resets the pended date.
    h.engine.withdraw_upstake(&addr("staker"), id, 1000).unwrap();
    assert_eq!(h.engine.state(id).unwrap(), ProposalState::Queued);
    assert_eq!(h.engine.proposal(id).unwrap().pended_date, 0);

    // Regaining confidence restarts the maintenance clock from now.
    h.clock.advance(500);
    h.engine.upstake(&addr("staker"), id, 1000).unwrap();
    assert_eq!(h.engine.state(id).unwrap(), ProposalState::Pended);
    assert_eq!(h.engine.proposal(id).unwrap().pended_date, common::START_TIME + 500);
}

#[test]
fn boost_requires_maintained_confidence() {
    let mut h = Harness::new();
    h.mint_vote("voter1", 200);
    h.mint_stake("staker", 100_000);
    let id = h.create("voter1");

    // Queued, never pended: not boostable at all.
    assert_eq!(
        h.engine.boost(&addr("keeper"), id).unwrap_err(),
        GovernanceError::NotPended(id)
    );

    h.engine.upstake(&addr("staker"), id, 4000).unwrap();
    h.engine.downstake(&addr("staker"), id, 1000).unwrap();
    assert_eq!(h.engine.state(id).unwrap(), ProposalState::Pended);
    let pended_date = h.engine.proposal(id).unwrap().pended_date;

    // Half the pended period is not enough.
    h.clock.set_time(pended_date + h.engine.config().pended_period / 2);
    assert!(!h.engine.has_maintained_confidence(id).unwrap());
    assert_eq!(
        h.engine.boost(&addr("keeper"), id).unwrap_err(),
        GovernanceError::ConfidenceNotMaintained(id)
    );

    // Losing and regaining confidence restarts the wait.
    h.engine.withdraw_upstake(&addr("staker"), id, 1000).unwrap();
    h.engine.upstake(&addr("staker"), id, 1000).unwrap();
    h.clock.advance(h.engine.config().pended_period / 2 + 1);
    // A full pended period since the original pend, but not since re-pend.
    assert!(!h.engine.has_maintained_confidence(id).unwrap());
    assert_eq!(
        h.engine.boost(&addr("keeper"), id).unwrap_err(),
        GovernanceError::ConfidenceNotMaintained(id)
    );
}

#[test]
fn boost_succeeds_after_the_pended_period() {
    let mut h = Harness::new();
    h.mint_vote("voter1", 200);
    h.mint_stake("staker", 100_000);
    let id = h.create("voter1");
    h.engine.upstake(&addr("staker"), id, 4000).unwrap();
    h.engine.downstake(&addr("staker"), id, 1000).unwrap();
    let pended_date = h.engine.proposal(id).unwrap().pended_date;
    h.engine.drain_events();

    h.clock.set_time(pended_date + h.engine.config().pended_period);
    assert!(h.engine.has_maintained_confidence(id).unwrap());
    h.engine.boost(&addr("keeper"), id).unwrap();

    let p = h.engine.proposal(id).unwrap();
    assert_eq!(p.state, ProposalState::Boosted);
    assert_eq!(p.close_date, pended_date + h.engine.config().boost_period);
    assert_eq!(h.engine.num_boosted(), 1);
    assert_eq!(
        h.engine.drain_events(),
        vec![Event::ProposalBoosted { proposal_id: id }]
    );

    // Boosting twice fails; collateral is locked while boosted.
    assert_eq!(
        h.engine.boost(&addr("keeper"), id).unwrap_err(),
        GovernanceError::ProposalBoosted(id)
    );
    assert_eq!(
        h.engine.upstake(&addr("staker"), id, 1).unwrap_err(),
        GovernanceError::ProposalBoosted(id)
    );
    assert_eq!(
        h.engine.withdraw_upstake(&addr("staker"), id, 1).unwrap_err(),
        GovernanceError::ProposalBoosted(id)
    );
    assert_eq!(
        h.engine.expire(&addr("keeper"), id).unwrap_err(),
        GovernanceError::ProposalBoosted(id)
    );
}

#[test]
fn pended_proposal_past_its_queue_deadline_is_not_boostable() {
    let mut h = Harness::new();
    h.mint_vote("voter1", 200);
    h.mint_stake("staker", 100_000);
    let id = h.create("voter1");
    h.engine.upstake(&addr("staker"), id, 4000).unwrap();
    assert_eq!(h.engine.state(id).unwrap(), ProposalState::Pended);

    h.clock
        .set_time(h.engine.proposal(id).unwrap().close_date + 1);
    assert_eq!(h.engine.state(id).unwrap(), ProposalState::Closed);
    assert_eq!(
        h.engine.boost(&addr("keeper"), id).unwrap_err(),
        GovernanceError::ProposalClosed(id)
    );
}

#[test]
fn boosted_resolution_waits_for_the_deadline() {
    let mut h = Harness::new();
    h.mint_vote("voter1", 50);
    h.mint_vote("voter2", 50);
    h.mint_vote("voter3", 100);
    h.mint_stake("staker", 100_000);
    let id = h.create("voter1");
    h.quick_boost("staker", id, 4000);
    let close_date = h.engine.proposal(id).unwrap().close_date;

    // Votes that reach relative but not absolute majority.
    h.engine.vote(&addr("voter1"), id, true).unwrap();
    assert_eq!(h.engine.state(id).unwrap(), ProposalState::Boosted);

    assert_eq!(
        h.engine.resolve(&addr("keeper"), id).unwrap_err(),
        GovernanceError::OnBoostPeriod(id)
    );

    h.clock.set_time(close_date);
    h.engine.drain_events();
    h.engine.resolve(&addr("keeper"), id).unwrap();

    let p = h.engine.proposal(id).unwrap();
    assert_eq!(p.state, ProposalState::Resolved);
    assert!(p.executed);
    assert_eq!(h.engine.num_boosted(), 0);
    let events = h.engine.drain_events();
    assert_eq!(events[0], Event::ProposalResolved { proposal_id: id });
    assert_eq!(events[1], Event::ProposalExecuted { proposal_id: id });

    assert_eq!(
        h.engine.resolve(&addr("keeper"), id).unwrap_err(),
        GovernanceError::ProposalResolved(id)
    );
}

#[test]
fn boosted_resolution_with_no_votes_has_no_consensus() {
    let mut h = Harness::new();
    h.mint_vote("voter1", 200);
    h.mint_stake("staker", 100_000);
    let id = h.create("voter1");
    h.quick_boost("staker", id, 4000);

    h.clock
        .set_time(h.engine.proposal(id).unwrap().close_date);
    assert_eq!(
        h.engine.resolve(&addr("keeper"), id).unwrap_err(),
        GovernanceError::NoConsensus
    );

    // Queued proposals short of absolute majority are equally unresolvable.
    let id2 = h.create("voter1");
    assert_eq!(
        h.engine.resolve(&addr("keeper"), id2).unwrap_err(),
        GovernanceError::NoConsensus
    );
}

#[test]
fn each_boosted_slot_raises_the_confidence_bar() {
    let mut h = Harness::new();
    h.mint_vote("voter", 1);
    h.mint_stake("staker", 100_000);

    // With downstake 1, the minimum upstake to pend is 4^(n+1).
    for (n, minimum) in [(0u64, 4u64), (1, 16), (2, 64), (3, 256)] {
        let id = h.create("voter");
        h.engine.downstake(&addr("staker"), id, 1).unwrap();
        h.engine.upstake(&addr("staker"), id, minimum - 1).unwrap();
        assert_eq!(h.engine.state(id).unwrap(), ProposalState::Queued, "n={}", n);

        h.engine.upstake(&addr("staker"), id, 1).unwrap();
        assert_eq!(h.engine.state(id).unwrap(), ProposalState::Pended, "n={}", n);

        let pended_date = h.engine.proposal(id).unwrap().pended_date;
        h.clock
            .set_time(pended_date + h.engine.config().pended_period);
        h.engine.boost(&addr("keeper"), id).unwrap();
        assert_eq!(h.engine.num_boosted(), n + 1);
    }
    assert_eq!(h.engine.num_proposals(), 4);

    // Resolving a boosted proposal frees its slot.
    let last = 3;
    h.engine.vote(&addr("voter"), last, true).unwrap();
    assert_eq!(h.engine.state(last).unwrap(), ProposalState::Resolved);
    assert_eq!(h.engine.num_boosted(), 3);
}

#[test]
fn quiet_ending_extends_only_on_consensus_flips() {
    let mut config = EngineConfig::default();
    config.required_support = 900_000;
    let mut h = Harness::with_config(config);
    h.mint_vote("voter1", 50);
    h.mint_vote("voter2", 50);
    h.mint_vote("voter3", 459);
    h.mint_vote("voter4", 1);
    h.mint_vote("whale", 2000);
    h.mint_stake("staker", 100_000);

    let id = h.create("voter1");
    h.engine.vote(&addr("voter1"), id, true).unwrap();
    h.quick_boost("staker", id, 4000);
    let ending_period = h.engine.config().ending_period;
    let close_0 = h.engine.proposal(id).unwrap().close_date;

    // A vote before the quiet-ending window never extends, flip or not.
    h.clock.set_time(close_0 - ending_period - 10);
    h.engine.vote(&addr("voter2"), id, false).unwrap();
    assert_eq!(h.engine.proposal(id).unwrap().close_date, close_0);
    // Undo the early vote's effect for the window scenarios below:
    // voter2's one change moves the weight back.
    h.engine.vote(&addr("voter2"), id, true).unwrap();

    // Inside the window, a vote that keeps the leading side does nothing.
    h.clock.set_time(close_0 - ending_period + 1);
    h.engine.drain_events();
    h.engine.vote(&addr("voter4"), id, true).unwrap();
    assert_eq!(h.engine.proposal(id).unwrap().close_date, close_0);

    // A flip (Yea leading -> no side leading) extends by exactly one
    // ending period, measured from the current deadline.
    h.engine.vote(&addr("voter1"), id, false).unwrap();
    let close_1 = h.engine.proposal(id).unwrap().close_date;
    assert_eq!(close_1, close_0 + ending_period);
    let events = h.engine.drain_events();
    assert!(events.contains(&Event::ProposalLifetimeExtended {
        proposal_id: id,
        new_lifetime: close_1,
    }));

    // Chainable: a later flip inside the shrunk window extends again.
    h.clock.set_time(close_1 - 1);
    h.engine.vote(&addr("voter3"), id, false).unwrap();
    let close_2 = h.engine.proposal(id).unwrap().close_date;
    assert_eq!(close_2, close_1 + ending_period);

    // The proposal is still boosted and resolves by relative majority
    // once the extended deadline finally passes.
    h.clock.set_time(close_2);
    h.engine.resolve(&addr("keeper"), id).unwrap();
    let p = h.engine.proposal(id).unwrap();
    assert_eq!(p.state, ProposalState::Resolved);
    assert!(!p.executed);
}

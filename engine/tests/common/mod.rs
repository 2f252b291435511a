#![allow(dead_code)]

//! Shared scenario harness: an engine wired to mock collaborators.

use std::sync::Arc;

use gov_core::{
    Address, Amount, CheckpointToken, Clock, LedgerToken, MockClock, ProposalId, RecordingExecutor,
    StakeToken,
};
use gov_engine::{DecisionEngine, EngineConfig};

/// Engine's stake-token account name.
pub const ENGINE: &str = "engine";

/// Scenario start time (seconds) and block.
pub const START_TIME: u64 = 1_000_000;
pub const START_BLOCK: u64 = 100;

pub fn addr(s: &str) -> Address {
    s.to_string()
}

pub struct Harness {
    pub clock: Arc<MockClock>,
    pub vote_token: Arc<CheckpointToken>,
    pub stake_token: Arc<LedgerToken>,
    pub executor: Arc<RecordingExecutor>,
    pub engine: DecisionEngine,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let clock = Arc::new(MockClock::new(START_TIME, START_BLOCK));
        let vote_token = Arc::new(CheckpointToken::new());
        let stake_token = Arc::new(LedgerToken::new());
        let executor = Arc::new(RecordingExecutor::new());
        let engine = DecisionEngine::new(
            config,
            addr(ENGINE),
            clock.clone(),
            vote_token.clone(),
            stake_token.clone(),
            executor.clone(),
        )
        .unwrap();
        Self {
            clock,
            vote_token,
            stake_token,
            executor,
            engine,
        }
    }

    /// Mint vote tokens effective at the current block.
    pub fn mint_vote(&self, holder: &str, amount: Amount) {
        self.vote_token
            .mint(&addr(holder), amount, self.clock.block_number());
    }

    /// Mint stake tokens and approve the engine to pull them.
    pub fn mint_stake(&self, holder: &str, amount: Amount) {
        self.stake_token.mint(&addr(holder), amount);
        self.stake_token
            .approve(&addr(holder), &addr(ENGINE), Amount::MAX);
    }

    pub fn create(&mut self, creator: &str) -> ProposalId {
        self.engine
            .create(&addr(creator), Vec::new(), "Proposal metadata".to_string())
            .unwrap()
    }

    /// Stake enough upstake to pend the proposal, wait out the pended
    /// period, and boost it.
    pub fn quick_boost(&mut self, staker: &str, id: ProposalId, amount: Amount) {
        self.engine.upstake(&addr(staker), id, amount).unwrap();
        let pended_date = self.engine.proposal(id).unwrap().pended_date;
        assert_ne!(pended_date, 0, "proposal {} did not pend", id);
        self.clock
            .set_time(pended_date + self.engine.config().pended_period);
        self.engine.boost(&addr("keeper"), id).unwrap();
    }
}

//! The decision engine
//!
//! Owns the proposal ledger and orchestrates voting, staking, escalation
//! and settlement against the external collaborators. Every public call
//! executes to completion as one atomic unit: validations run first,
//! internal state and external transfers are ordered so a failure leaves
//! nothing half-applied.

use std::sync::Arc;

use log::{debug, info};

use gov_core::{
    Address, Amount, Clock, ProposalId, ScriptExecutor, StakeToken, Timestamp, VoteToken,
};

use crate::config::EngineConfig;
use crate::confidence;
use crate::error::{GovernanceError, Result};
use crate::events::Event;
use crate::proposal::{Proposal, ProposalState, VoteChoice};
use crate::staking::{ProposalStakes, StakeRecord};
use crate::storage::EngineSnapshot;

pub struct DecisionEngine {
    config: EngineConfig,
    /// The engine's own stake-token account; holds all collateral and the
    /// compensation fee pool.
    account: Address,
    clock: Arc<dyn Clock>,
    vote_token: Arc<dyn VoteToken>,
    stake_token: Arc<dyn StakeToken>,
    executor: Arc<dyn ScriptExecutor>,
    proposals: Vec<Proposal>,
    /// Count of proposals currently Boosted, kept in lock-step with the
    /// transitions that enter/exit that state.
    num_boosted: u64,
    /// Stake tokens held for compensation fees, separate from collateral.
    fee_pool: Amount,
    events: Vec<Event>,
}

impl DecisionEngine {
    pub fn new(
        config: EngineConfig,
        account: Address,
        clock: Arc<dyn Clock>,
        vote_token: Arc<dyn VoteToken>,
        stake_token: Arc<dyn StakeToken>,
        executor: Arc<dyn ScriptExecutor>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            account,
            clock,
            vote_token,
            stake_token,
            executor,
            proposals: Vec::new(),
            num_boosted: 0,
            fee_pool: 0,
            events: Vec::new(),
        })
    }

    /// Rebuild an engine from a persisted snapshot and live collaborators.
    pub fn from_snapshot(
        snapshot: EngineSnapshot,
        clock: Arc<dyn Clock>,
        vote_token: Arc<dyn VoteToken>,
        stake_token: Arc<dyn StakeToken>,
        executor: Arc<dyn ScriptExecutor>,
    ) -> Result<Self> {
        snapshot.config.validate()?;
        Ok(Self {
            config: snapshot.config,
            account: snapshot.account,
            clock,
            vote_token,
            stake_token,
            executor,
            proposals: snapshot.proposals,
            num_boosted: snapshot.num_boosted,
            fee_pool: snapshot.fee_pool,
            events: Vec::new(),
        })
    }

    /// Serializable state for persistence. The undrained event log is a
    /// per-call channel, not durable state, and is not included.
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            config: self.config.clone(),
            account: self.account.clone(),
            proposals: self.proposals.clone(),
            num_boosted: self.num_boosted,
            fee_pool: self.fee_pool,
        }
    }

    // ---- creation ----

    /// Create a proposal. The creator must currently hold voting power;
    /// the total supply at the creation block becomes the fixed
    /// denominator for absolute support.
    pub fn create(
        &mut self,
        creator: &Address,
        script: Vec<u8>,
        metadata: String,
    ) -> Result<ProposalId> {
        let block = self.clock.block_number();
        if self.vote_token.balance_of_at(creator, block) == 0 {
            return Err(GovernanceError::NoVotingPower);
        }
        let snapshot = self.vote_token.total_supply_at(block);
        let now = self.clock.now();
        let id = self.proposals.len() as ProposalId;
        self.proposals.push(Proposal::new(
            id,
            creator.clone(),
            script,
            metadata.clone(),
            block,
            now,
            snapshot,
            self.config.queue_period,
        ));
        info!("proposal {} created by {}", id, creator);
        self.events.push(Event::ProposalCreated {
            proposal_id: id,
            creator: creator.clone(),
            metadata,
        });
        Ok(id)
    }

    /// Forwarding convenience: create a proposal for `sender` with the
    /// given script and default metadata.
    pub fn forward(&mut self, sender: &Address, script: Vec<u8>) -> Result<ProposalId> {
        self.create(sender, script, String::new())
    }

    // ---- voting ----

    pub fn vote(&mut self, voter: &Address, id: ProposalId, supports: bool) -> Result<()> {
        let now = self.clock.now();
        let idx = self.index(id)?;
        match self.proposals[idx].effective_state(now) {
            ProposalState::Resolved => return Err(GovernanceError::ProposalResolved(id)),
            ProposalState::Closed => return Err(GovernanceError::ProposalClosed(id)),
            _ => {}
        }
        let weight = self
            .vote_token
            .balance_of_at(voter, self.proposals[idx].creation_block);
        if weight == 0 {
            return Err(GovernanceError::NoVotingPower);
        }

        let required = self.config.required_support;
        let ending_period = self.config.ending_period;
        let events_mark = self.events.len();
        let backup = self.proposals[idx].clone();

        let relative_before = self.proposals[idx].consensus(true, required);
        self.proposals[idx].cast_vote(voter, supports, weight)?;
        self.events.push(Event::VoteCasted {
            proposal_id: id,
            voter: voter.clone(),
            supports,
        });

        // Quiet ending: a relative-consensus flip inside the trailing
        // window of a boosted proposal pushes the deadline out by one
        // ending period, measured from the current deadline.
        let p = &mut self.proposals[idx];
        if p.state == ProposalState::Boosted
            && now >= p.close_date.saturating_sub(ending_period)
            && p.consensus(true, required) != relative_before
        {
            p.close_date += ending_period;
            let new_lifetime = p.close_date;
            debug!("proposal {} lifetime extended to {}", id, new_lifetime);
            self.events.push(Event::ProposalLifetimeExtended {
                proposal_id: id,
                new_lifetime,
            });
        }

        // Absolute majority resolves immediately, whatever the phase.
        let verdict = self.proposals[idx].consensus(false, required);
        if verdict != VoteChoice::Absent {
            if let Err(err) = self.commit_resolution(id, verdict) {
                // The whole call aborts: undo the vote and its events.
                self.proposals[idx] = backup;
                self.events.truncate(events_mark);
                return Err(err);
            }
        }
        Ok(())
    }

    // ---- staking ----

    pub fn upstake(&mut self, staker: &Address, id: ProposalId, amount: Amount) -> Result<()> {
        self.stake(staker, id, amount, true)
    }

    pub fn downstake(&mut self, staker: &Address, id: ProposalId, amount: Amount) -> Result<()> {
        self.stake(staker, id, amount, false)
    }

    pub fn withdraw_upstake(
        &mut self,
        staker: &Address,
        id: ProposalId,
        amount: Amount,
    ) -> Result<()> {
        self.unstake(staker, id, amount, true)
    }

    pub fn withdraw_downstake(
        &mut self,
        staker: &Address,
        id: ProposalId,
        amount: Amount,
    ) -> Result<()> {
        self.unstake(staker, id, amount, false)
    }

    fn stake(&mut self, staker: &Address, id: ProposalId, amount: Amount, up: bool) -> Result<()> {
        let now = self.clock.now();
        let idx = self.index(id)?;
        match self.proposals[idx].effective_state(now) {
            ProposalState::Resolved => return Err(GovernanceError::ProposalResolved(id)),
            ProposalState::Closed => return Err(GovernanceError::ProposalClosed(id)),
            ProposalState::Boosted => return Err(GovernanceError::ProposalBoosted(id)),
            ProposalState::Queued | ProposalState::Pended => {}
        }

        // Collateral moves first; the ledger is credited only once the
        // transfer has succeeded.
        self.stake_token
            .transfer_from(&self.account, staker, &self.account, amount)?;
        self.proposals[idx].stakes.credit(staker, amount, up);
        self.events.push(if up {
            Event::ProposalUpstaked {
                proposal_id: id,
                staker: staker.clone(),
                amount,
            }
        } else {
            Event::ProposalDownstaked {
                proposal_id: id,
                staker: staker.clone(),
                amount,
            }
        });
        self.refresh_pended(idx, now);
        Ok(())
    }

    fn unstake(&mut self, staker: &Address, id: ProposalId, amount: Amount, up: bool) -> Result<()> {
        let now = self.clock.now();
        let idx = self.index(id)?;
        let state = self.proposals[idx].effective_state(now);
        match state {
            ProposalState::Resolved => return Err(GovernanceError::ProposalResolved(id)),
            ProposalState::Boosted => return Err(GovernanceError::ProposalBoosted(id)),
            // Queued/Pended, and Closed where collateral is reclaimed at
            // face value.
            ProposalState::Queued | ProposalState::Pended | ProposalState::Closed => {}
        }

        self.proposals[idx].stakes.debit(staker, amount, up)?;
        if let Err(err) = self.stake_token.transfer(&self.account, staker, amount) {
            // Roll the debit back; nothing may stay half-applied.
            self.proposals[idx].stakes.credit(staker, amount, up);
            return Err(err.into());
        }
        self.events.push(if up {
            Event::UpstakeWithdrawn {
                proposal_id: id,
                staker: staker.clone(),
                amount,
            }
        } else {
            Event::DownstakeWithdrawn {
                proposal_id: id,
                staker: staker.clone(),
                amount,
            }
        });
        if state != ProposalState::Closed {
            self.refresh_pended(idx, now);
        }
        Ok(())
    }

    /// Re-evaluate confidence after a stake mutation and perform the
    /// Queued↔Pended transition synchronously.
    fn refresh_pended(&mut self, idx: usize, now: Timestamp) {
        let base = self.config.confidence_threshold_base;
        let num_boosted = self.num_boosted;
        let p = &mut self.proposals[idx];
        let confident = confidence::has_confidence(
            p.stakes.total_upstake(),
            p.stakes.total_downstake(),
            base,
            num_boosted,
        );
        match (p.state, confident) {
            (ProposalState::Queued, true) => {
                p.state = ProposalState::Pended;
                p.pended_date = now;
                debug!("proposal {} pended at {}", p.id, now);
            }
            (ProposalState::Pended, false) => {
                p.state = ProposalState::Queued;
                p.pended_date = 0;
                debug!("proposal {} lost confidence, back to queue", p.id);
            }
            _ => {}
        }
    }

    // ---- escalation ----

    /// Boost a pended proposal that has maintained confidence for the
    /// whole pended period. Permissionless; a late caller earns a
    /// compensation fee.
    pub fn boost(&mut self, caller: &Address, id: ProposalId) -> Result<()> {
        let now = self.clock.now();
        let idx = self.index(id)?;
        match self.proposals[idx].effective_state(now) {
            ProposalState::Resolved => return Err(GovernanceError::ProposalResolved(id)),
            ProposalState::Closed => return Err(GovernanceError::ProposalClosed(id)),
            ProposalState::Boosted => return Err(GovernanceError::ProposalBoosted(id)),
            ProposalState::Queued => return Err(GovernanceError::NotPended(id)),
            ProposalState::Pended => {}
        }
        if !self.has_maintained_confidence(id)? {
            return Err(GovernanceError::ConfidenceNotMaintained(id));
        }

        let due = self.proposals[idx].pended_date + self.config.pended_period;
        self.pay_compensation(caller, due, now)?;

        let boost_period = self.config.boost_period;
        let p = &mut self.proposals[idx];
        p.state = ProposalState::Boosted;
        p.close_date = p.pended_date + boost_period;
        self.num_boosted += 1;
        info!("proposal {} boosted, closes at {}", id, self.proposals[idx].close_date);
        self.events.push(Event::ProposalBoosted { proposal_id: id });
        Ok(())
    }

    // ---- resolution ----

    /// Resolve a proposal: by absolute majority at any time while open, or
    /// by relative majority once a boosted proposal's deadline has passed.
    pub fn resolve(&mut self, caller: &Address, id: ProposalId) -> Result<()> {
        let now = self.clock.now();
        let idx = self.index(id)?;
        let state = self.proposals[idx].effective_state(now);
        match state {
            ProposalState::Resolved => return Err(GovernanceError::ProposalResolved(id)),
            ProposalState::Closed => return Err(GovernanceError::ProposalClosed(id)),
            _ => {}
        }

        let required = self.config.required_support;
        let absolute = self.proposals[idx].consensus(false, required);
        if absolute != VoteChoice::Absent {
            return self.commit_resolution(id, absolute);
        }

        if state != ProposalState::Boosted {
            return Err(GovernanceError::NoConsensus);
        }
        let close_date = self.proposals[idx].close_date;
        if now < close_date {
            return Err(GovernanceError::OnBoostPeriod(id));
        }
        let relative = self.proposals[idx].consensus(true, required);
        if relative == VoteChoice::Absent {
            return Err(GovernanceError::NoConsensus);
        }
        self.commit_resolution(id, relative)?;
        self.pay_compensation(caller, close_date, now)?;
        Ok(())
    }

    /// Commit a resolution with the given verdict. The script runs before
    /// any state is touched so an execution failure aborts cleanly.
    fn commit_resolution(&mut self, id: ProposalId, verdict: VoteChoice) -> Result<()> {
        let idx = id as usize;
        if verdict == VoteChoice::Yea {
            let script = self.proposals[idx].script.clone();
            self.executor.execute(id, &script)?;
        }

        let was_boosted = self.proposals[idx].state == ProposalState::Boosted;
        let p = &mut self.proposals[idx];
        p.state = ProposalState::Resolved;
        p.executed = verdict == VoteChoice::Yea;
        if was_boosted {
            self.num_boosted -= 1;
        }
        info!("proposal {} resolved {:?}", id, verdict);
        self.events.push(Event::ProposalResolved { proposal_id: id });
        if verdict == VoteChoice::Yea {
            self.events.push(Event::ProposalExecuted { proposal_id: id });
        }
        Ok(())
    }

    /// Commit the time-out of a queued/pended proposal whose deadline has
    /// passed. Permissionless; a late caller earns a compensation fee.
    pub fn expire(&mut self, caller: &Address, id: ProposalId) -> Result<()> {
        let now = self.clock.now();
        let idx = self.index(id)?;
        match self.proposals[idx].state {
            ProposalState::Resolved => return Err(GovernanceError::ProposalResolved(id)),
            ProposalState::Closed => return Err(GovernanceError::ProposalClosed(id)),
            ProposalState::Boosted => return Err(GovernanceError::ProposalBoosted(id)),
            ProposalState::Queued | ProposalState::Pended => {}
        }
        let close_date = self.proposals[idx].close_date;
        if now < close_date {
            return Err(GovernanceError::OnQueuePeriod(id));
        }

        self.pay_compensation(caller, close_date, now)?;

        let p = &mut self.proposals[idx];
        p.state = ProposalState::Closed;
        p.pended_date = 0;
        info!("proposal {} expired", id);
        self.events.push(Event::ProposalExpired { proposal_id: id });
        Ok(())
    }

    // ---- settlement ----

    /// Claim a winning staker's reward on a resolved proposal: the
    /// original stake plus a floor pro-rata share of the losing pool.
    /// One-shot per staker.
    pub fn claim_reward(&mut self, staker: &Address, id: ProposalId) -> Result<Amount> {
        let now = self.clock.now();
        let idx = self.index(id)?;
        match self.proposals[idx].effective_state(now) {
            ProposalState::Resolved => {}
            ProposalState::Closed => return Err(GovernanceError::ProposalClosed(id)),
            _ => return Err(GovernanceError::NotResolved(id)),
        }

        let p = &self.proposals[idx];
        let winner_is_up = p.executed;
        let (winning_total, losing_total) = if winner_is_up {
            (p.stakes.total_upstake(), p.stakes.total_downstake())
        } else {
            (p.stakes.total_downstake(), p.stakes.total_upstake())
        };
        let winning_stake = if winner_is_up {
            p.stakes.record(staker).upstake
        } else {
            p.stakes.record(staker).downstake
        };
        if winning_stake == 0 {
            return Err(GovernanceError::NoWinningStake);
        }

        let payout = ProposalStakes::reward(winning_stake, winning_total, losing_total);
        self.stake_token.transfer(&self.account, staker, payout)?;
        // Zeroing the record is the double-claim guard; the frozen totals
        // keep later claims' pro-rata shares intact.
        self.proposals[idx].stakes.take_winning_stake(staker, winner_is_up);
        debug!("proposal {}: {} claimed {}", id, staker, payout);
        Ok(payout)
    }

    // ---- compensation fees ----

    /// Put stake tokens into the fee pool that compensates permissionless
    /// upkeep calls.
    pub fn fund_fee_pool(&mut self, from: &Address, amount: Amount) -> Result<()> {
        self.stake_token
            .transfer_from(&self.account, from, &self.account, amount)?;
        self.fee_pool += amount;
        debug!("fee pool funded with {} by {}", amount, from);
        Ok(())
    }

    /// Pay the caller of a time-gated operation a fee proportional to how
    /// far past `due` the call landed, capped by the pool.
    fn pay_compensation(&mut self, caller: &Address, due: Timestamp, now: Timestamp) -> Result<()> {
        if self.config.compensation_fee_pct == 0 || self.fee_pool == 0 {
            return Ok(());
        }
        let late = now.saturating_sub(due);
        let fee = (late as u128 * self.config.compensation_fee_pct as u128 / 100)
            .min(self.fee_pool as u128) as Amount;
        if fee == 0 {
            return Ok(());
        }
        self.stake_token.transfer(&self.account, caller, fee)?;
        self.fee_pool -= fee;
        debug!("paid {} compensation to {}", fee, caller);
        Ok(())
    }

    // ---- accessors ----

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn account(&self) -> &Address {
        &self.account
    }

    pub fn num_proposals(&self) -> u64 {
        self.proposals.len() as u64
    }

    pub fn num_boosted(&self) -> u64 {
        self.num_boosted
    }

    pub fn fee_pool(&self) -> Amount {
        self.fee_pool
    }

    pub fn proposal(&self, id: ProposalId) -> Result<&Proposal> {
        self.proposals
            .get(id as usize)
            .ok_or(GovernanceError::ProposalNotFound(id))
    }

    pub fn proposals(&self) -> &[Proposal] {
        &self.proposals
    }

    /// State as observed right now.
    pub fn state(&self, id: ProposalId) -> Result<ProposalState> {
        let now = self.clock.now();
        Ok(self.proposal(id)?.effective_state(now))
    }

    pub fn confidence(&self, id: ProposalId) -> Result<u128> {
        let p = self.proposal(id)?;
        Ok(confidence::confidence_ratio(
            p.stakes.total_upstake(),
            p.stakes.total_downstake(),
        ))
    }

    pub fn has_confidence(&self, id: ProposalId) -> Result<bool> {
        let p = self.proposal(id)?;
        Ok(confidence::has_confidence(
            p.stakes.total_upstake(),
            p.stakes.total_downstake(),
            self.config.confidence_threshold_base,
            self.num_boosted,
        ))
    }

    /// Confidence has been held continuously for a whole pended period.
    /// Any mutation that would have dropped it already reset the pended
    /// date, so holding now plus an old enough pended date is sufficient.
    pub fn has_maintained_confidence(&self, id: ProposalId) -> Result<bool> {
        let p = self.proposal(id)?;
        let now = self.clock.now();
        Ok(self.has_confidence(id)?
            && p.pended_date != 0
            && now >= p.pended_date + self.config.pended_period)
    }

    pub fn vote_of(&self, id: ProposalId, voter: &Address) -> Result<VoteChoice> {
        Ok(self.proposal(id)?.vote_of(voter))
    }

    pub fn stake_of(&self, id: ProposalId, staker: &Address) -> Result<StakeRecord> {
        Ok(self.proposal(id)?.stakes.record(staker))
    }

    /// Drain the ordered event log accumulated since the last drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    fn index(&self, id: ProposalId) -> Result<usize> {
        let idx = id as usize;
        if idx < self.proposals.len() {
            Ok(idx)
        } else {
            Err(GovernanceError::ProposalNotFound(id))
        }
    }
}

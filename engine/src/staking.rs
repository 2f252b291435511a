//! Per-proposal staking ledger
//!
//! Two independent pools per proposal: upstake backs escalation, downstake
//! opposes it. Totals are kept in lock-step with the per-staker records;
//! after resolution the totals freeze and become the pro-rata denominators
//! for reward claims.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use gov_core::{Address, Amount};

use crate::error::{GovernanceError, Result};

/// One staker's balances on a proposal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeRecord {
    pub upstake: Amount,
    pub downstake: Amount,
}

impl StakeRecord {
    fn pool(&self, upstake: bool) -> Amount {
        if upstake {
            self.upstake
        } else {
            self.downstake
        }
    }

    fn pool_mut(&mut self, upstake: bool) -> &mut Amount {
        if upstake {
            &mut self.upstake
        } else {
            &mut self.downstake
        }
    }
}

/// The two stake pools of a single proposal
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProposalStakes {
    total_upstake: Amount,
    total_downstake: Amount,
    records: HashMap<Address, StakeRecord>,
}

impl ProposalStakes {
    pub fn total_upstake(&self) -> Amount {
        self.total_upstake
    }

    pub fn total_downstake(&self) -> Amount {
        self.total_downstake
    }

    pub fn record(&self, staker: &Address) -> StakeRecord {
        self.records.get(staker.as_str()).copied().unwrap_or_default()
    }

    /// Add `amount` to one of `staker`'s pools.
    pub fn credit(&mut self, staker: &Address, amount: Amount, upstake: bool) {
        *self.records.entry(staker.clone()).or_default().pool_mut(upstake) += amount;
        if upstake {
            self.total_upstake += amount;
        } else {
            self.total_downstake += amount;
        }
    }

    /// Remove `amount` from one of `staker`'s pools.
    pub fn debit(&mut self, staker: &Address, amount: Amount, upstake: bool) -> Result<()> {
        let staked = self.record(staker).pool(upstake);
        if staked < amount {
            return Err(GovernanceError::InsufficientStake {
                requested: amount,
                staked,
            });
        }
        if let Some(record) = self.records.get_mut(staker.as_str()) {
            *record.pool_mut(upstake) -= amount;
        }
        if upstake {
            self.total_upstake -= amount;
        } else {
            self.total_downstake -= amount;
        }
        Ok(())
    }

    /// Zero out and return `staker`'s stake on the winning side.
    ///
    /// Totals are left untouched: they are the frozen pro-rata
    /// denominators, and the zeroed record is the double-claim guard.
    pub fn take_winning_stake(&mut self, staker: &Address, winner_is_up: bool) -> Amount {
        match self.records.get_mut(staker.as_str()) {
            Some(record) => std::mem::take(record.pool_mut(winner_is_up)),
            None => 0,
        }
    }

    /// Winner payout: original stake plus a floor pro-rata share of the
    /// losing pool.
    pub fn reward(winning_stake: Amount, winning_total: Amount, losing_total: Amount) -> Amount {
        if winning_total == 0 {
            return 0;
        }
        let share = losing_total as u128 * winning_stake as u128 / winning_total as u128;
        winning_stake + share as Amount
    }

    /// Totals match the per-staker records; used by tests to pin the
    /// ledger-consistency property.
    pub fn is_consistent(&self) -> bool {
        let up: Amount = self.records.values().map(|r| r.upstake).sum();
        let down: Amount = self.records.values().map(|r| r.downstake).sum();
        up == self.total_upstake && down == self.total_downstake
    }
}

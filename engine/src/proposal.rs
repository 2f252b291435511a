//! Proposal record and state machine data

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use gov_core::{Address, Amount, BlockNumber, ProposalId, Timestamp};

use crate::error::{GovernanceError, Result};
use crate::staking::ProposalStakes;
use crate::support;

/// Lifecycle state of a proposal
///
/// Queued, Pended and Boosted are open; Resolved and Closed are final and
/// accept no further operation of any kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalState {
    Queued,
    Pended,
    Boosted,
    Resolved,
    Closed,
}

/// A vote side, or the absence of one
///
/// Doubles as a consensus verdict: Absent means neither side reaches the
/// required support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteChoice {
    Absent,
    Yea,
    Nay,
}

/// One voter's recorded vote
///
/// A vote may be changed to the other side exactly once; a change moves
/// the voter's full snapshot weight between the tallies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub choice: VoteChoice,
    pub changed: bool,
}

/// A governance proposal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub creator: Address,
    pub metadata: String,
    /// Opaque action payload, forwarded verbatim to the executor on a
    /// Yea resolution.
    pub script: Vec<u8>,
    pub creation_block: BlockNumber,
    pub creation_date: Timestamp,
    /// Total vote-token supply at `creation_block`. Fixed for the
    /// proposal's lifetime; the denominator for absolute support.
    pub voting_power_snapshot: Amount,
    /// Current deadline. Starts at creation + queue period, replaced on
    /// boost, extended during the quiet-ending window.
    pub close_date: Timestamp,
    /// When confidence was last reached; 0 while not Pended.
    pub pended_date: Timestamp,
    pub total_yea: Amount,
    pub total_nay: Amount,
    pub state: ProposalState,
    /// True iff the proposal resolved with a Yea consensus (and the
    /// script was forwarded).
    pub executed: bool,
    pub votes: HashMap<Address, VoteRecord>,
    pub stakes: ProposalStakes,
}

impl Proposal {
    pub fn new(
        id: ProposalId,
        creator: Address,
        script: Vec<u8>,
        metadata: String,
        creation_block: BlockNumber,
        creation_date: Timestamp,
        voting_power_snapshot: Amount,
        queue_period: u64,
    ) -> Self {
        Self {
            id,
            creator,
            metadata,
            script,
            creation_block,
            creation_date,
            voting_power_snapshot,
            close_date: creation_date + queue_period,
            pended_date: 0,
            total_yea: 0,
            total_nay: 0,
            state: ProposalState::Queued,
            executed: false,
            votes: HashMap::new(),
            stakes: ProposalStakes::default(),
        }
    }

    /// State as observed at `now`.
    ///
    /// A stored Queued/Pended proposal whose deadline has passed reports
    /// Closed even before an explicit expire call commits it. Boosted
    /// proposals never time out this way; they stay resolvable by
    /// relative majority.
    pub fn effective_state(&self, now: Timestamp) -> ProposalState {
        match self.state {
            ProposalState::Queued | ProposalState::Pended if now >= self.close_date => {
                ProposalState::Closed
            }
            state => state,
        }
    }

    pub fn vote_of(&self, voter: &Address) -> VoteChoice {
        self.votes
            .get(voter.as_str())
            .map(|record| record.choice)
            .unwrap_or(VoteChoice::Absent)
    }

    /// Record a vote of `weight` for `voter`, moving the weight between
    /// tallies when this is the voter's one allowed change.
    pub fn cast_vote(&mut self, voter: &Address, supports: bool, weight: Amount) -> Result<()> {
        let choice = if supports {
            VoteChoice::Yea
        } else {
            VoteChoice::Nay
        };
        match self.votes.get_mut(voter.as_str()) {
            None => {
                self.votes.insert(
                    voter.clone(),
                    VoteRecord {
                        choice,
                        changed: false,
                    },
                );
                if supports {
                    self.total_yea += weight;
                } else {
                    self.total_nay += weight;
                }
            }
            Some(record) if record.choice == choice => {
                return Err(GovernanceError::RedundantVote);
            }
            Some(record) if record.changed => {
                return Err(GovernanceError::VoteAlreadyChanged);
            }
            Some(record) => {
                record.choice = choice;
                record.changed = true;
                if supports {
                    self.total_nay -= weight;
                    self.total_yea += weight;
                } else {
                    self.total_yea -= weight;
                    self.total_nay += weight;
                }
            }
        }
        Ok(())
    }

    /// Support for one side as a PPM ratio.
    ///
    /// Absolute support divides by the creation snapshot; relative support
    /// divides by the votes cast so far.
    pub fn support(&self, positive: bool, relative: bool) -> u64 {
        let tally = if positive { self.total_yea } else { self.total_nay };
        let denominator = if relative {
            self.total_yea + self.total_nay
        } else {
            self.voting_power_snapshot
        };
        support::support_ppm(tally, denominator)
    }

    /// Consensus verdict of the chosen support measure.
    pub fn consensus(&self, relative: bool, required_support: u64) -> VoteChoice {
        let denominator = if relative {
            self.total_yea + self.total_nay
        } else {
            self.voting_power_snapshot
        };
        support::consensus(self.total_yea, self.total_nay, denominator, required_support)
    }
}

//! Domain events
//!
//! Every mutating engine call appends the events it produced, in order, to
//! an in-engine log the caller drains. Events are observations of what
//! happened; they never feed back into state.

use serde::{Deserialize, Serialize};

use gov_core::{Address, Amount, ProposalId, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    ProposalCreated {
        proposal_id: ProposalId,
        creator: Address,
        metadata: String,
    },
    VoteCasted {
        proposal_id: ProposalId,
        voter: Address,
        supports: bool,
    },
    ProposalUpstaked {
        proposal_id: ProposalId,
        staker: Address,
        amount: Amount,
    },
    ProposalDownstaked {
        proposal_id: ProposalId,
        staker: Address,
        amount: Amount,
    },
    UpstakeWithdrawn {
        proposal_id: ProposalId,
        staker: Address,
        amount: Amount,
    },
    DownstakeWithdrawn {
        proposal_id: ProposalId,
        staker: Address,
        amount: Amount,
    },
    ProposalBoosted {
        proposal_id: ProposalId,
    },
    ProposalLifetimeExtended {
        proposal_id: ProposalId,
        new_lifetime: Timestamp,
    },
    ProposalResolved {
        proposal_id: ProposalId,
    },
    ProposalExecuted {
        proposal_id: ProposalId,
    },
    ProposalExpired {
        proposal_id: ProposalId,
    },
}

//! Engine error types

use gov_core::{ExecutionError, ProposalId, TokenError};
use thiserror::Error;

/// Governance engine errors
///
/// Every failure aborts the whole call; no partial state is ever left
/// behind. Configuration problems get one variant per parameter so callers
/// can tell exactly which knob is out of range.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GovernanceError {
    #[error("proposal {0} does not exist")]
    ProposalNotFound(ProposalId),

    #[error("account has no voting power")]
    NoVotingPower,

    #[error("vote is redundant with the existing vote")]
    RedundantVote,

    #[error("vote has already been changed once")]
    VoteAlreadyChanged,

    #[error("proposal {0} is closed")]
    ProposalClosed(ProposalId),

    #[error("proposal {0} is resolved")]
    ProposalResolved(ProposalId),

    #[error("proposal {0} is boosted")]
    ProposalBoosted(ProposalId),

    #[error("proposal {0} is not pended")]
    NotPended(ProposalId),

    #[error("proposal {0} has not maintained confidence")]
    ConfidenceNotMaintained(ProposalId),

    #[error("proposal {0} is still on its boost period")]
    OnBoostPeriod(ProposalId),

    #[error("proposal {0} is still on its queue period")]
    OnQueuePeriod(ProposalId),

    #[error("proposal {0} is not resolved")]
    NotResolved(ProposalId),

    #[error("proposal has no consensus")]
    NoConsensus,

    #[error("token transfer failed: {0}")]
    TransferFailed(#[from] TokenError),

    #[error("insufficient stake: requested {requested}, staked {staked}")]
    InsufficientStake { requested: u64, staked: u64 },

    #[error("no winning stake to claim")]
    NoWinningStake,

    #[error(transparent)]
    ExecutionFailed(#[from] ExecutionError),

    #[error("required support must be within (0, 1000000]")]
    BadRequiredSupport,

    #[error("queue period cannot be zero")]
    BadQueuePeriod,

    #[error("pended period cannot be zero")]
    BadPendedPeriod,

    #[error("boost period cannot be zero")]
    BadBoostPeriod,

    #[error("ending period must be within (0, boost period]")]
    BadEndingPeriod,

    #[error("confidence threshold base must be greater than one")]
    BadConfidenceBase,

    #[error("compensation fee percent must be at most 100")]
    BadFeePct,
}

pub type Result<T> = std::result::Result<T, GovernanceError>;

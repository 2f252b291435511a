//! Governance Engine Core Library
//!
//! Shared types and external-collaborator seams for the decision engine:
//! the clock abstraction, the vote/stake token interfaces with in-memory
//! reference ledgers, and the action-script executor seam.

pub mod clock;
pub mod executor;
pub mod token;
pub mod types;

pub use clock::{Clock, MockClock, SystemClock};
pub use executor::{ExecutionError, RecordingExecutor, ScriptExecutor};
pub use token::{
    CheckpointToken, CheckpointTokenState, LedgerToken, LedgerTokenState, StakeToken, TokenError,
    VoteToken,
};
pub use types::{Address, Amount, BlockNumber, ProposalId, Timestamp, PPM};

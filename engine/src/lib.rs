//! Governance Decision Engine
//!
//! Decides, for a stream of proposals, whether each is approved or
//! rejected: token-weighted voting with absolute-majority early finality,
//! stake-weighted confidence that escalates proposals into a fast-tracked
//! boosted state, quiet-ending deadline extensions, and zero-sum reward
//! settlement among stakers.

pub mod config;
pub mod confidence;
pub mod engine;
pub mod error;
pub mod events;
pub mod proposal;
pub mod staking;
pub mod storage;
pub mod support;

pub use config::EngineConfig;
pub use engine::DecisionEngine;
pub use error::{GovernanceError, Result};
pub use events::Event;
pub use proposal::{Proposal, ProposalState, VoteChoice, VoteRecord};
pub use staking::{ProposalStakes, StakeRecord};
pub use storage::EngineSnapshot;

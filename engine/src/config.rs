//! Engine configuration
//!
//! All parameters are fixed at engine construction and validated
//! individually; there is no post-initialization mutation surface.

use serde::{Deserialize, Serialize};

use gov_core::PPM;

use crate::error::{GovernanceError, Result};

/// Reference parameter set
pub mod defaults {
    /// Required support: 51% in PPM
    pub const REQUIRED_SUPPORT: u64 = 510_000;

    /// Queue period (24 hours)
    pub const QUEUE_PERIOD: u64 = 24 * 3600;

    /// Pended period (1 hour)
    pub const PENDED_PERIOD: u64 = 3600;

    /// Boost period (6 hours)
    pub const BOOST_PERIOD: u64 = 6 * 3600;

    /// Quiet-ending period (1 hour)
    pub const ENDING_PERIOD: u64 = 3600;

    /// Confidence threshold base
    pub const CONFIDENCE_THRESHOLD_BASE: u64 = 4;

    /// Compensation fee percent
    pub const COMPENSATION_FEE_PCT: u64 = 10;
}

/// Immutable engine parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Support ratio (PPM) required for consensus, in (0, 1000000]
    pub required_support: u64,

    /// Seconds a queued proposal stays open
    pub queue_period: u64,

    /// Seconds of continuously maintained confidence required to boost
    pub pended_period: u64,

    /// Seconds a boosted proposal stays open, counted from its pended date
    pub boost_period: u64,

    /// Trailing window (seconds) in which a consensus flip extends a
    /// boosted proposal; at most `boost_period`
    pub ending_period: u64,

    /// Base of the per-boosted-proposal confidence threshold, > 1
    pub confidence_threshold_base: u64,

    /// Compensation fee, percent of one token per second of lateness
    pub compensation_fee_pct: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            required_support: defaults::REQUIRED_SUPPORT,
            queue_period: defaults::QUEUE_PERIOD,
            pended_period: defaults::PENDED_PERIOD,
            boost_period: defaults::BOOST_PERIOD,
            ending_period: defaults::ENDING_PERIOD,
            confidence_threshold_base: defaults::CONFIDENCE_THRESHOLD_BASE,
            compensation_fee_pct: defaults::COMPENSATION_FEE_PCT,
        }
    }
}

impl EngineConfig {
    /// Check every parameter against its documented range.
    pub fn validate(&self) -> Result<()> {
        if self.required_support == 0 || self.required_support > PPM {
            return Err(GovernanceError::BadRequiredSupport);
        }
        if self.queue_period == 0 {
            return Err(GovernanceError::BadQueuePeriod);
        }
        if self.pended_period == 0 {
            return Err(GovernanceError::BadPendedPeriod);
        }
        if self.boost_period == 0 {
            return Err(GovernanceError::BadBoostPeriod);
        }
        if self.ending_period == 0 || self.ending_period > self.boost_period {
            return Err(GovernanceError::BadEndingPeriod);
        }
        if self.confidence_threshold_base <= 1 {
            return Err(GovernanceError::BadConfidenceBase);
        }
        if self.compensation_fee_pct > 100 {
            return Err(GovernanceError::BadFeePct);
        }
        Ok(())
    }
}

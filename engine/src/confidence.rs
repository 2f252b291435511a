//! Confidence ratio and escalation threshold
//!
//! Confidence is the upstake/downstake ratio in fixed point. The threshold
//! it must clear grows exponentially with the number of proposals already
//! boosted, which rate-limits how many proposals can be fast-tracked at
//! once.

use gov_core::{Amount, PPM};

/// Fixed-point multiplier for confidence ratios (shared PPM scale).
pub const CONFIDENCE_MULTIPLIER: u128 = PPM as u128;

/// `upstake * M / downstake`.
///
/// Zero downstake with any upstake counts as maximal confidence; an
/// entirely unstaked proposal has none.
pub fn confidence_ratio(upstake: Amount, downstake: Amount) -> u128 {
    if downstake == 0 {
        return if upstake == 0 { 0 } else { u128::MAX };
    }
    upstake as u128 * CONFIDENCE_MULTIPLIER / downstake as u128
}

/// Threshold for the next escalation: `base^(num_boosted + 1) * M`.
pub fn confidence_threshold(base: u64, num_boosted: u64) -> u128 {
    let exponent = (num_boosted + 1).min(u32::MAX as u64) as u32;
    (base as u128)
        .checked_pow(exponent)
        .and_then(|t| t.checked_mul(CONFIDENCE_MULTIPLIER))
        .unwrap_or(u128::MAX)
}

/// Whether the pools clear the current escalation threshold.
pub fn has_confidence(upstake: Amount, downstake: Amount, base: u64, num_boosted: u64) -> bool {
    confidence_ratio(upstake, downstake) >= confidence_threshold(base, num_boosted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_in_fixed_point() {
        assert_eq!(confidence_ratio(3000, 1000), 3_000_000);
        assert_eq!(confidence_ratio(4000, 1000), 4_000_000);
        assert_eq!(confidence_ratio(1, 3), 333_333);
    }

    #[test]
    fn test_ratio_edge_cases() {
        assert_eq!(confidence_ratio(0, 0), 0);
        assert_eq!(confidence_ratio(1, 0), u128::MAX);
        assert_eq!(confidence_ratio(0, 1000), 0);
    }

    #[test]
    fn test_ratio_monotonicity() {
        assert!(confidence_ratio(4001, 1000) > confidence_ratio(4000, 1000));
        assert!(confidence_ratio(4000, 1001) < confidence_ratio(4000, 1000));
    }

    #[test]
    fn test_threshold_escalates_per_boosted_proposal() {
        assert_eq!(confidence_threshold(4, 0), 4_000_000);
        assert_eq!(confidence_threshold(4, 1), 16_000_000);
        assert_eq!(confidence_threshold(4, 2), 64_000_000);
        assert_eq!(confidence_threshold(4, 3), 256_000_000);
    }

    #[test]
    fn test_threshold_saturates_instead_of_overflowing() {
        assert_eq!(confidence_threshold(4, 1000), u128::MAX);
        // Only infinite confidence clears a saturated threshold.
        assert!(has_confidence(1, 0, 4, 1000));
        assert!(!has_confidence(u64::MAX, 1, 4, 1000));
    }

    #[test]
    fn test_has_confidence_at_boundary() {
        assert!(has_confidence(4000, 1000, 4, 0));
        assert!(!has_confidence(3999, 1000, 4, 0));
        assert!(has_confidence(16, 1, 4, 1));
        assert!(!has_confidence(15, 1, 4, 1));
    }
}

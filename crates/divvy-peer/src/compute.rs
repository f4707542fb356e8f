//! Reference aggregates computed over an assigned interval.
//!
//! These are the workload a peer reports back to the coordinator: two parity
//! sums and a Leibniz-series π estimate, all over the inclusive interval.
//! The coordinator treats the reported lines as opaque text; the exact
//! arithmetic matters only to whoever reads the logs.

use divvy_core::WorkInterval;

/// Sum of the even integers in the interval, inclusive on both ends.
pub fn sum_of_evens(interval: WorkInterval) -> u128 {
    (interval.lo()..=interval.hi())
        .filter(|n| n % 2 == 0)
        .map(u128::from)
        .sum()
}

/// Sum of the odd integers in the interval, inclusive on both ends.
pub fn sum_of_odds(interval: WorkInterval) -> u128 {
    (interval.lo()..=interval.hi())
        .filter(|n| n % 2 != 0)
        .map(u128::from)
        .sum()
}

/// Leibniz-series π estimate over the interval's term indices:
/// `4 * Σ (-1)^i / (2i + 1)` for `i` in `[lo, hi]`.
///
/// Starting from `lo = 0` this converges (slowly) to π; a partial tail is
/// whatever the series happens to sum to, which is fine — the value is a
/// demo payload, not a numerical claim.
pub fn leibniz_pi(interval: WorkInterval) -> f64 {
    let mut pi = 0.0;
    for i in interval.lo()..=interval.hi() {
        let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
        pi += sign / (2.0 * i as f64 + 1.0);
    }
    pi * 4.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parity_sums_over_a_small_interval() {
        let interval = WorkInterval::new(0, 10);
        // 2 + 4 + 6 + 8 + 10
        assert_eq!(sum_of_evens(interval), 30);
        // 1 + 3 + 5 + 7 + 9
        assert_eq!(sum_of_odds(interval), 25);
    }

    #[test]
    fn parity_sums_respect_the_lower_bound() {
        let interval = WorkInterval::new(5, 9);
        assert_eq!(sum_of_evens(interval), 6 + 8);
        assert_eq!(sum_of_odds(interval), 5 + 7 + 9);
    }

    #[test]
    fn parity_sums_cover_the_whole_interval() {
        let interval = WorkInterval::new(0, 1_000_000);
        let total = sum_of_evens(interval) + sum_of_odds(interval);
        // Gauss: 0 + 1 + ... + n = n(n+1)/2
        assert_eq!(total, 1_000_000u128 * 1_000_001 / 2);
    }

    #[test]
    fn leibniz_estimate_converges_toward_pi() {
        let estimate = leibniz_pi(WorkInterval::new(0, 200_000));
        assert!(
            (estimate - core::f64::consts::PI).abs() < 1e-4,
            "estimate {estimate} too far from pi"
        );
    }

    #[test]
    fn leibniz_partial_tail_is_finite() {
        let tail = leibniz_pi(WorkInterval::new(1_000, 2_000));
        assert!(tail.is_finite());
        assert!(tail.abs() < 1.0);
    }
}

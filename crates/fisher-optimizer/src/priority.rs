//! Priority scoring for pending operations.
//!
//! ```text
//! score(op) = isqrt(age_secs) + bit_length(amount)
//! ```
//!
//! The age term grows without bound, so any waiting operation eventually
//! outranks a fresh one of any size. Scores are integers: the same
//! operations scored at the same instant always rank the same.

use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use fisher_types::{Operation, SignedOperation};
use rust_decimal::Decimal;

use crate::chunk_sizer::isqrt;

/// Score of one operation at `now`. Operations stamped in the future
/// count as zero age.
#[must_use]
pub fn priority_score(operation: &Operation, now: DateTime<Utc>) -> u64 {
    let age = u64::try_from((now - operation.submitted_at).num_seconds()).unwrap_or(0);
    let age_term = isqrt(usize::try_from(age).unwrap_or(usize::MAX)) as u64;
    let amount_term = operation.amount.checked_ilog2().map_or(0, |b| u64::from(b) + 1);
    age_term.saturating_add(amount_term)
}

/// Highest score first. Equal scores keep their current relative order.
pub fn priority_sort(operations: &mut [SignedOperation], now: DateTime<Utc>) {
    operations.sort_by_cached_key(|s| Reverse(priority_score(&s.operation, now)));
}

/// Indices of the `max` best-scored operations, in rank order. Ties go to
/// the earlier index.
#[must_use]
pub fn top_by_priority<'a, I>(operations: I, max: usize, now: DateTime<Utc>) -> Vec<usize>
where
    I: IntoIterator<Item = &'a SignedOperation>,
{
    let mut ranked: Vec<(Reverse<u64>, usize)> = operations
        .into_iter()
        .enumerate()
        .map(|(i, s)| (Reverse(priority_score(&s.operation, now)), i))
        .collect();
    ranked.sort_unstable();
    ranked.into_iter().take(max).map(|(_, i)| i).collect()
}

/// Mean score of a batch, two decimal places. Zero for an empty batch.
#[must_use]
pub fn batch_score(operations: &[SignedOperation], now: DateTime<Utc>) -> Decimal {
    if operations.is_empty() {
        return Decimal::ZERO;
    }
    let total: u128 = operations
        .iter()
        .map(|s| u128::from(priority_score(&s.operation, now)))
        .sum();
    (Decimal::from(total) / Decimal::from(operations.len() as u64)).round_dp(2)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn aged(amount: u128, age_secs: i64, now: DateTime<Utc>) -> SignedOperation {
        let mut s = SignedOperation::dummy(amount, false);
        s.operation.submitted_at = now - Duration::seconds(age_secs);
        s
    }

    #[test]
    fn score_combines_age_and_amount_magnitude() {
        let now = Utc::now();
        // isqrt(100) + bit_length(1_000)
        assert_eq!(priority_score(&aged(1_000, 100, now).operation, now), 10 + 10);
        assert_eq!(priority_score(&aged(0, 0, now).operation, now), 0);
        assert_eq!(priority_score(&aged(1, 0, now).operation, now), 1);
        assert_eq!(priority_score(&aged(u128::MAX, 0, now).operation, now), 128);
    }

    #[test]
    fn future_timestamps_have_no_age() {
        let now = Utc::now();
        let early = aged(8, -3_600, now);
        assert_eq!(priority_score(&early.operation, now), 4);
    }

    #[test]
    fn old_operations_overtake_large_fresh_ones() {
        let now = Utc::now();
        let mut ops = vec![
            aged(1 << 40, 0, now),
            aged(5, 3_600, now),
            aged(5, 0, now),
        ];
        let ids: Vec<_> = ops.iter().map(|s| s.operation.id).collect();
        priority_sort(&mut ops, now);
        let sorted: Vec<_> = ops.iter().map(|s| s.operation.id).collect();
        // 41 vs 60 + 3 vs 3
        assert_eq!(sorted, vec![ids[1], ids[0], ids[2]]);
    }

    #[test]
    fn ties_keep_arrival_order() {
        let now = Utc::now();
        let mut ops: Vec<_> = (0..6).map(|_| aged(100, 0, now)).collect();
        let ids: Vec<_> = ops.iter().map(|s| s.operation.id).collect();
        priority_sort(&mut ops, now);
        assert_eq!(ops.iter().map(|s| s.operation.id).collect::<Vec<_>>(), ids);
        assert_eq!(top_by_priority(&ops, 3, now), vec![0, 1, 2]);
    }

    #[test]
    fn top_selection_is_bounded_and_ranked() {
        let now = Utc::now();
        let ops = vec![aged(2, 0, now), aged(1 << 20, 0, now), aged(1 << 10, 0, now)];
        assert_eq!(top_by_priority(&ops, 2, now), vec![1, 2]);
        assert_eq!(top_by_priority(&ops, 10, now), vec![1, 2, 0]);
        assert!(top_by_priority(&ops, 0, now).is_empty());
    }

    #[test]
    fn batch_score_is_the_mean() {
        let now = Utc::now();
        let ops = vec![aged(1, 0, now), aged(2, 0, now), aged(4, 0, now)];
        // (1 + 2 + 3) / 3
        assert_eq!(batch_score(&ops, now), Decimal::new(2, 0));
        let pair = vec![aged(1, 0, now), aged(2, 0, now)];
        assert_eq!(batch_score(&pair, now), Decimal::new(15, 1));
        assert_eq!(batch_score(&[], now), Decimal::ZERO);
    }
}

//! Budget allocation rebalancing.
//!
//! When the filmmaker drags one budget stage to a new percentage, the
//! difference is taken from (or given to) the remaining stages in proportion
//! to their current shares so the whole set keeps summing to 100.

use shared::{AllocationSet, AllocationSetError, ALLOCATION_TOLERANCE, ALLOCATION_TOTAL};
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AllocationError {
    #[error("Unknown allocation category: {0}")]
    UnknownCategory(String),
    #[error("Allocation value for '{0}' is not a number")]
    InvalidShare(String),
    #[error("Invalid allocation: {0}")]
    InvalidSet(#[from] AllocationSetError),
}

/// Set `changed_key` to `new_value` and redistribute the difference.
///
/// `new_value` is clamped to `[0, 100]`. Every other category absorbs the
/// negated delta weighted by its share of the other categories' sum, or an
/// even split when those are all zero. Values never drop below zero. Any
/// residual left by floating-point drift is spread evenly over the other
/// categories in key order; a residual that still exceeds the tolerance
/// after that is absorbed by the changed category itself.
pub fn rebalance(
    current: &AllocationSet,
    changed_key: &str,
    new_value: f64,
) -> Result<AllocationSet, AllocationError> {
    let old_value = current
        .get(changed_key)
        .ok_or_else(|| AllocationError::UnknownCategory(changed_key.to_string()))?;
    if new_value.is_nan() {
        return Err(AllocationError::InvalidShare(changed_key.to_string()));
    }

    let new_value = new_value.clamp(0.0, ALLOCATION_TOTAL);
    let delta = new_value - old_value;

    let mut shares: BTreeMap<String, f64> = current
        .iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect();
    let others: Vec<String> = current
        .keys()
        .filter(|key| *key != changed_key)
        .map(str::to_string)
        .collect();
    let sum_others: f64 = others.iter().map(|key| shares[key]).sum();

    for key in &others {
        let share = shares[key];
        let weight = if sum_others > 0.0 {
            share / sum_others
        } else {
            1.0 / others.len() as f64
        };
        shares.insert(key.clone(), (share - delta * weight).max(0.0));
    }
    shares.insert(changed_key.to_string(), new_value);

    let residual = ALLOCATION_TOTAL - shares.values().sum::<f64>();
    if residual != 0.0 && !others.is_empty() {
        let adjustment = residual / others.len() as f64;
        for key in &others {
            if let Some(value) = shares.get_mut(key) {
                *value = (*value + adjustment).max(0.0);
            }
        }
    }

    let residual = ALLOCATION_TOTAL - shares.values().sum::<f64>();
    if residual.abs() > ALLOCATION_TOLERANCE {
        warn!(
            "Other categories cannot absorb {:.6}, adjusting '{}' instead",
            residual, changed_key
        );
        if let Some(value) = shares.get_mut(changed_key) {
            *value = (*value + residual).clamp(0.0, ALLOCATION_TOTAL);
        }
    }

    debug!("Rebalanced '{}' from {:.2} to {:.2}", changed_key, old_value, new_value);
    Ok(AllocationSet::new(shares)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn film_budget() -> AllocationSet {
        AllocationSet::new([("pre-production", 30.0), ("production", 50.0), ("post-production", 20.0)])
            .unwrap()
    }

    fn assert_sums_to_hundred(set: &AllocationSet) {
        assert!((set.total() - 100.0).abs() < ALLOCATION_TOLERANCE, "total {}", set.total());
    }

    #[test]
    fn test_increase_takes_proportionally_from_others() {
        let result = rebalance(&film_budget(), "pre-production", 60.0).unwrap();

        assert_eq!(result.get("pre-production"), Some(60.0));
        assert!((result.get("production").unwrap() - 28.57).abs() < 0.01);
        assert!((result.get("post-production").unwrap() - 11.43).abs() < 0.01);
        assert_sums_to_hundred(&result);
    }

    #[test]
    fn test_decrease_gives_proportionally_to_others() {
        let result = rebalance(&film_budget(), "production", 30.0).unwrap();

        assert_eq!(result.get("production"), Some(30.0));
        // 20 points split 30:20 between pre and post
        assert!((result.get("pre-production").unwrap() - 42.0).abs() < 1e-9);
        assert!((result.get("post-production").unwrap() - 28.0).abs() < 1e-9);
        assert_sums_to_hundred(&result);
    }

    #[test]
    fn test_all_zero_others_split_evenly() {
        let set = AllocationSet::new([("a", 0.0), ("b", 0.0), ("c", 100.0)]).unwrap();
        let result = rebalance(&set, "c", 50.0).unwrap();

        assert_eq!(result.get("a"), Some(25.0));
        assert_eq!(result.get("b"), Some(25.0));
        assert_eq!(result.get("c"), Some(50.0));
    }

    #[test]
    fn test_new_value_is_clamped() {
        let high = rebalance(&film_budget(), "production", 140.0).unwrap();
        assert_eq!(high.get("production"), Some(100.0));
        assert!(high.get("pre-production").unwrap() < 1e-9);
        assert!(high.get("post-production").unwrap() < 1e-9);

        let low = rebalance(&film_budget(), "production", -10.0).unwrap();
        assert_eq!(low.get("production"), Some(0.0));
        assert!((low.get("pre-production").unwrap() - 60.0).abs() < 1e-9);
        assert!((low.get("post-production").unwrap() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let result = rebalance(&film_budget(), "marketing", 10.0);
        assert_eq!(result, Err(AllocationError::UnknownCategory("marketing".to_string())));
    }

    #[test]
    fn test_nan_value_is_rejected() {
        let result = rebalance(&film_budget(), "production", f64::NAN);
        assert_eq!(result, Err(AllocationError::InvalidShare("production".to_string())));
    }

    #[test]
    fn test_single_category_stays_at_hundred() {
        let set = AllocationSet::new([("everything", 100.0)]).unwrap();
        let result = rebalance(&set, "everything", 40.0).unwrap();
        assert_eq!(result.get("everything"), Some(100.0));
    }

    #[test]
    fn test_input_is_not_mutated() {
        let set = film_budget();
        let _ = rebalance(&set, "production", 10.0).unwrap();
        assert_eq!(set, film_budget());
    }

    fn allocation_strategy() -> impl Strategy<Value = AllocationSet> {
        proptest::collection::vec(0.0f64..100.0, 1..6)
            .prop_filter("needs a positive total", |weights| weights.iter().sum::<f64>() > 1e-3)
            .prop_map(|weights| {
                let sum: f64 = weights.iter().sum();
                let mut shares: Vec<(String, f64)> = weights
                    .iter()
                    .enumerate()
                    .map(|(i, w)| (format!("stage-{}", i), w / sum * 100.0))
                    .collect();
                // fold rounding drift into the last share so construction succeeds
                let drift = 100.0 - shares.iter().map(|(_, v)| v).sum::<f64>();
                if let Some(last) = shares.last_mut() {
                    last.1 = (last.1 + drift).max(0.0);
                }
                AllocationSet::new(shares).unwrap()
            })
    }

    proptest! {
        #[test]
        fn prop_rebalance_keeps_invariant(
            set in allocation_strategy(),
            index in 0usize..6,
            new_value in -50.0f64..150.0,
        ) {
            let keys: Vec<String> = set.keys().map(str::to_string).collect();
            let key = &keys[index % keys.len()];
            let result = rebalance(&set, key, new_value).unwrap();

            prop_assert!((result.total() - 100.0).abs() < ALLOCATION_TOLERANCE);
            prop_assert!(result.iter().all(|(_, v)| v >= 0.0));
            prop_assert_eq!(result.keys().collect::<Vec<_>>(), set.keys().collect::<Vec<_>>());
            if keys.len() > 1 {
                prop_assert_eq!(result.get(key), Some(new_value.clamp(0.0, 100.0)));
            }
        }

        #[test]
        fn prop_rebalance_is_deterministic(
            set in allocation_strategy(),
            new_value in 0.0f64..100.0,
        ) {
            let key = set.keys().next().unwrap().to_string();
            prop_assert_eq!(rebalance(&set, &key, new_value), rebalance(&set, &key, new_value));
        }
    }
}

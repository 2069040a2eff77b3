//! Value operations applied to a sample before it is written into an event.
//!
//! Every operation is total: inputs that would make an operation fail
//! (a zero divisor, say) pass the value through unchanged.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// `value * factor`, e.g. seconds to milliseconds with `1000`.
    MultiplyBy(f64),
    /// `value / divisor`; a zero or non-finite divisor is a no-op.
    DivideBy(f64),
    /// Round half away from zero to the given number of decimals, at most
    /// [`MAX_ROUND_DECIMALS`]. Mappings with more are rejected at build time.
    Round(u32),
    /// Change the unit of a histogram: bucket bounds are scaled by `factor`
    /// and the bucket counts are left alone. Histogram buckets mapped with
    /// this operation are written one field per bound under
    /// `<target>.bucket`. On a sample without a bucket bound it scales the
    /// value like [`Operation::MultiplyBy`].
    MultiplyBuckets(f64),
}

/// Largest decimal count `Round` accepts.
pub const MAX_ROUND_DECIMALS: u32 = 15;

impl Operation {
    pub fn apply(&self, value: f64) -> f64 {
        match *self {
            Operation::MultiplyBy(factor) | Operation::MultiplyBuckets(factor) => value * factor,
            Operation::DivideBy(divisor) => {
                if divisor == 0.0 || !divisor.is_finite() {
                    value
                } else {
                    value / divisor
                }
            }
            Operation::Round(decimals) => {
                if !value.is_finite() {
                    return value;
                }
                let scale = 10f64.powi(decimals.min(MAX_ROUND_DECIMALS) as i32);
                let scaled = value * scale;
                if scaled.is_finite() {
                    scaled.round() / scale
                } else {
                    value
                }
            }
        }
    }

    /// Apply `ops` left to right.
    pub fn apply_all(ops: &[Operation], value: f64) -> f64 {
        ops.iter().fold(value, |v, op| op.apply(v))
    }

    /// Apply `ops` to one histogram bucket. `MultiplyBuckets` scales the
    /// bound; every other operation transforms the count.
    pub fn apply_bucket(ops: &[Operation], bound: f64, count: f64) -> (f64, f64) {
        ops.iter().fold((bound, count), |(bound, count), op| match *op {
            Operation::MultiplyBuckets(factor) => (bound * factor, count),
            _ => (bound, op.apply(count)),
        })
    }

    pub fn splits_buckets(&self) -> bool {
        matches!(self, Operation::MultiplyBuckets(_))
    }

    /// The configured constant is usable; checked once when a mapping is built.
    pub(crate) fn validate(&self) -> Result<(), String> {
        match *self {
            Operation::MultiplyBy(f) if !f.is_finite() => {
                Err(format!("multiply_by factor must be finite, got {f}"))
            }
            Operation::MultiplyBuckets(f) if !f.is_finite() => {
                Err(format!("multiply_buckets factor must be finite, got {f}"))
            }
            Operation::DivideBy(d) if !d.is_finite() => {
                Err(format!("divide_by divisor must be finite, got {d}"))
            }
            Operation::Round(decimals) if decimals > MAX_ROUND_DECIMALS => Err(format!(
                "round supports at most {MAX_ROUND_DECIMALS} decimals, got {decimals}"
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiply_scales_value() {
        assert_eq!(Operation::MultiplyBy(1000.0).apply(2.5), 2500.0);
        assert_eq!(Operation::MultiplyBy(100.0).apply(0.25), 25.0);
    }

    #[test]
    fn multiplications_compose() {
        let ops = [Operation::MultiplyBy(2.0), Operation::MultiplyBy(3.0)];
        for v in [0.0, 1.5, -4.0, 1e6] {
            assert_eq!(Operation::apply_all(&ops, v), v * 2.0 * 3.0);
        }
    }

    #[test]
    fn divide_by_zero_passes_through() {
        assert_eq!(Operation::DivideBy(0.0).apply(7.0), 7.0);
        assert_eq!(Operation::DivideBy(f64::NAN).apply(7.0), 7.0);
        assert_eq!(Operation::DivideBy(4.0).apply(7.0), 1.75);
    }

    #[test]
    fn round_to_decimals() {
        assert_eq!(Operation::Round(0).apply(2.5), 3.0);
        assert_eq!(Operation::Round(0).apply(-2.5), -3.0);
        assert_eq!(Operation::Round(2).apply(1.23456), 1.23);
    }

    #[test]
    fn round_leaves_non_finite_alone() {
        assert!(Operation::Round(1).apply(f64::NAN).is_nan());
        assert_eq!(Operation::Round(1).apply(f64::INFINITY), f64::INFINITY);
    }

    #[test]
    fn non_finite_values_flow_through_multiply() {
        assert!(Operation::MultiplyBy(10.0).apply(f64::NAN).is_nan());
        assert_eq!(
            Operation::MultiplyBy(10.0).apply(f64::INFINITY),
            f64::INFINITY
        );
    }

    #[test]
    fn empty_chain_is_identity() {
        assert_eq!(Operation::apply_all(&[], 42.0), 42.0);
    }

    #[test]
    fn validate_rejects_non_finite_constants() {
        assert!(Operation::MultiplyBy(f64::INFINITY).validate().is_err());
        assert!(Operation::DivideBy(f64::NAN).validate().is_err());
        assert!(Operation::DivideBy(0.0).validate().is_ok());
        assert!(Operation::Round(3).validate().is_ok());
        assert!(Operation::MultiplyBuckets(f64::NAN).validate().is_err());
    }

    #[test]
    fn validate_rejects_excess_round_decimals() {
        assert!(Operation::Round(MAX_ROUND_DECIMALS).validate().is_ok());
        assert!(Operation::Round(MAX_ROUND_DECIMALS + 1).validate().is_err());
        assert!(Operation::Round(400).validate().is_err());
    }

    #[test]
    fn multiply_buckets_scales_bound_not_count() {
        let ops = [Operation::MultiplyBuckets(1000.0)];
        assert_eq!(Operation::apply_bucket(&ops, 0.5, 3.0), (500.0, 3.0));
        assert_eq!(
            Operation::apply_bucket(&ops, f64::INFINITY, 3.0),
            (f64::INFINITY, 3.0)
        );
    }

    #[test]
    fn other_ops_transform_bucket_counts() {
        let ops = [Operation::MultiplyBuckets(10.0), Operation::DivideBy(2.0)];
        assert_eq!(Operation::apply_bucket(&ops, 1.0, 8.0), (10.0, 4.0));
    }

    #[test]
    fn multiply_buckets_scales_plain_values() {
        assert_eq!(Operation::MultiplyBuckets(1000.0).apply(2.5), 2500.0);
    }
}

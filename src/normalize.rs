//! Axis normalization
//!
//! Min-max scales an axis into [0, 1], then nudges exact zeros up to 0.001
//! so that logarithmic and power models stay defined everywhere on the axis.
//! A degenerate axis (all values equal) maps to all 0.5 rather than dividing
//! by zero.

/// Smallest value a normalized axis can hold.
pub const ZERO_NUDGE: f64 = 0.001;

/// Min-max normalizes `values` in place.
///
/// After the call every value lies in `[0.001, 1.0]`, or is exactly `0.5`
/// when the input was constant.
pub fn normalize(values: &mut [f64]) {
    let Some((min, max)) = min_max(values) else {
        return;
    };

    if max == min {
        values.fill(0.5);
        return;
    }

    let range = max - min;
    for value in values.iter_mut() {
        *value = (*value - min) / range;
        if *value == 0.0 {
            *value = ZERO_NUDGE;
        }
    }
}

/// Returns the (min, max) of a slice, or `None` if it is empty.
fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    let mut min = first;
    let mut max = first;
    for &value in &values[1..] {
        min = min.min(value);
        max = max.max(value);
    }
    Some((min, max))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn scales_into_unit_interval() {
        let mut values = vec![5.0, 10.0, 15.0];
        normalize(&mut values);
        assert_eq!(values, vec![ZERO_NUDGE, 0.5, 1.0]);
    }

    #[test]
    fn constant_axis_becomes_halves() {
        let mut values = vec![10.0, 10.0, 10.0];
        normalize(&mut values);
        assert_eq!(values, vec![0.5, 0.5, 0.5]);
    }

    #[test]
    fn output_never_contains_zero() {
        let mut values = vec![0.0, 1.0, 2.0, 3.0];
        normalize(&mut values);
        assert!(values.iter().all(|&v| v >= ZERO_NUDGE && v <= 1.0));
    }

    #[test]
    fn empty_slice_is_a_noop() {
        let mut values: Vec<f64> = Vec::new();
        normalize(&mut values);
        assert!(values.is_empty());
    }
}

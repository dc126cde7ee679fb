//! Statistical helpers shared by the fitters.

/// Calculates the mean of a slice of values, or `None` if it is empty.
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Coefficient of determination for a set of predictions.
///
/// Returns `None` when the observations are constant, in which case the
/// total sum of squares is zero and R² is undefined.
#[must_use]
pub fn r_squared(observed: &[f64], predicted: &[f64]) -> Option<f64> {
    let mean = mean(observed)?;

    let ss_res: f64 = observed
        .iter()
        .zip(predicted)
        .map(|(y, f)| (y - f).powi(2))
        .sum();
    let ss_tot: f64 = observed.iter().map(|y| (y - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        None
    } else {
        Some(1.0 - ss_res / ss_tot)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn mean_of_empty_is_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
    }

    #[test]
    fn perfect_prediction_scores_one() {
        let observed = [2.0, 4.0, 6.0];
        assert_eq!(r_squared(&observed, &observed), Some(1.0));
    }

    #[test]
    fn constant_observations_have_no_r_squared() {
        assert_eq!(r_squared(&[3.0, 3.0, 3.0], &[3.0, 3.0, 3.0]), None);
    }

    #[test]
    fn mean_prediction_scores_zero() {
        let observed = [1.0, 2.0, 3.0];
        let predicted = [2.0, 2.0, 2.0];
        assert_eq!(r_squared(&observed, &predicted), Some(0.0));
    }
}

//! Moments of a return series.

use crate::{Error, Result};

/// Minimum sample size for any return-based statistic.
pub const MIN_OBSERVATIONS: usize = 2;

/// Standard deviations below this are treated as zero.
pub(crate) const ZERO_VARIANCE_TOLERANCE: f64 = 1e-12;

/// Reject series that are too short or contain non-finite values.
pub(crate) fn validate_series(name: &str, values: &[f64], min_len: usize) -> Result<()> {
    if values.len() < min_len {
        return Err(Error::InsufficientData(format!(
            "{} needs at least {} observations, got {}",
            name,
            min_len,
            values.len()
        )));
    }
    if let Some(idx) = values.iter().position(|v| !v.is_finite()) {
        return Err(Error::InvalidParameter(format!(
            "{} contains a non-finite value at index {}",
            name, idx
        )));
    }
    Ok(())
}

/// Arithmetic mean. `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation. `None` for an empty slice.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let avg = mean(values)?;
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Population covariance of two equal-length series.
pub fn covariance(left: &[f64], right: &[f64]) -> Result<f64> {
    if left.len() != right.len() {
        return Err(Error::DimensionMismatch {
            left: left.len(),
            right: right.len(),
        });
    }
    let (Some(left_mean), Some(right_mean)) = (mean(left), mean(right)) else {
        return Err(Error::InsufficientData(
            "covariance needs at least one observation".to_string(),
        ));
    };

    let sum: f64 = left
        .iter()
        .zip(right)
        .map(|(l, r)| (l - left_mean) * (r - right_mean))
        .sum();
    Ok(sum / left.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[10.0, 20.0, 30.0, 40.0]), Some(25.0));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_std_dev_population() {
        // variance = (225 + 25 + 25 + 225) / 4 = 125
        let std = std_dev(&[10.0, 20.0, 30.0, 40.0]).unwrap();
        assert_abs_diff_eq!(std, 125.0_f64.sqrt(), epsilon = 1e-12);
        assert_eq!(std_dev(&[5.0]), Some(0.0));
    }

    #[test]
    fn test_covariance() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        // cov = 2 * var(x) = 2 * 1.25
        assert_abs_diff_eq!(covariance(&x, &y).unwrap(), 2.5, epsilon = 1e-12);
    }

    #[test]
    fn test_covariance_dimension_mismatch() {
        let result = covariance(&[1.0, 2.0], &[1.0]);
        assert!(matches!(
            result,
            Err(Error::DimensionMismatch { left: 2, right: 1 })
        ));
    }

    #[test]
    fn test_validate_series() {
        assert!(validate_series("returns", &[0.1, 0.2], 2).is_ok());
        assert!(matches!(
            validate_series("returns", &[0.1], 2),
            Err(Error::InsufficientData(_))
        ));
        assert!(matches!(
            validate_series("returns", &[0.1, f64::NAN], 2),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            validate_series("returns", &[f64::INFINITY, 0.1], 2),
            Err(Error::InvalidParameter(_))
        ));
    }
}

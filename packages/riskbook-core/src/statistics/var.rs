//! Value at Risk and expected shortfall.

use super::descriptive::{mean, std_dev, validate_series, MIN_OBSERVATIONS};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

// Absorbs float error in `(1 - c) * n`, e.g. (1 - 0.8) * 10 = 1.9999999999999996.
const RANK_EPSILON: f64 = 1e-9;

/// How the VaR threshold return is estimated.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VarMethod {
    /// Empirical quantile of the observed returns
    #[default]
    Historical,
    /// Normal approximation from mean and standard deviation
    Parametric,
}

/// Calculate Value at Risk as a non-negative loss in currency units.
///
/// # Arguments
///
/// * `returns` - Simple period returns (e.g., 0.01 for 1%)
/// * `confidence_level` - Confidence level in (0, 1), typically 0.95 or 0.99
/// * `portfolio_value` - Value the loss fraction is scaled to
/// * `method` - Historical or parametric estimate
///
/// A threshold return above zero means no loss at that confidence and yields 0.
pub fn calculate_var(
    returns: &[f64],
    confidence_level: f64,
    portfolio_value: f64,
    method: VarMethod,
) -> Result<f64> {
    check_confidence(confidence_level)?;
    check_portfolio_value(portfolio_value)?;
    validate_series("returns", returns, MIN_OBSERVATIONS)?;

    let loss_fraction = match method {
        VarMethod::Historical => -historical_threshold(returns, confidence_level)?,
        VarMethod::Parametric => {
            let mu = mean(returns).unwrap_or(0.0);
            let sigma = std_dev(returns).unwrap_or(0.0);
            norm_ppf(confidence_level) * sigma - mu
        }
    };

    Ok(loss_fraction.max(0.0) * portfolio_value)
}

/// Return at the `1 - confidence_level` rank of the sorted series.
///
/// The rank is `floor((1 - c) * n)`, clamped to the last index, so the
/// selected value is always an observed return.
pub fn historical_threshold(returns: &[f64], confidence_level: f64) -> Result<f64> {
    check_confidence(confidence_level)?;
    validate_series("returns", returns, MIN_OBSERVATIONS)?;

    let mut sorted = returns.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = ((1.0 - confidence_level) * sorted.len() as f64 + RANK_EPSILON).floor() as usize;
    Ok(sorted[rank.min(sorted.len() - 1)])
}

/// Calculate expected shortfall (CVaR) as a non-negative loss in currency units.
///
/// Averages every return at or below the historical VaR threshold.
pub fn calculate_expected_shortfall(
    returns: &[f64],
    confidence_level: f64,
    portfolio_value: f64,
) -> Result<f64> {
    check_portfolio_value(portfolio_value)?;
    let threshold = historical_threshold(returns, confidence_level)?;

    // Never empty: the threshold is itself one of the returns.
    let tail: Vec<f64> = returns.iter().copied().filter(|r| *r <= threshold).collect();
    let tail_mean = mean(&tail).ok_or_else(|| {
        Error::InsufficientData(format!(
            "no returns at or below the {:.4} threshold",
            threshold
        ))
    })?;

    Ok((-tail_mean).max(0.0) * portfolio_value)
}

fn check_confidence(confidence_level: f64) -> Result<()> {
    if confidence_level > 0.0 && confidence_level < 1.0 {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!(
            "confidence level must lie in (0, 1), got {}",
            confidence_level
        )))
    }
}

fn check_portfolio_value(portfolio_value: f64) -> Result<()> {
    if portfolio_value.is_finite() && portfolio_value >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!(
            "portfolio value must be finite and non-negative, got {}",
            portfolio_value
        )))
    }
}

/// Inverse cumulative distribution function for standard normal distribution.
///
/// Uses Acklam's algorithm (relative error below 1.15e-9).
pub fn norm_ppf(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];

    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];

    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];

    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];

    const P_LOW: f64 = 0.02425;
    const P_HIGH: f64 = 1.0 - P_LOW;

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p <= P_HIGH {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const SAMPLE: [f64; 10] = [
        -0.05, -0.03, 0.01, 0.02, -0.08, 0.04, -0.02, 0.03, -0.01, 0.05,
    ];

    #[test]
    fn test_norm_ppf() {
        assert!(norm_ppf(0.5).abs() < 1e-9);
        assert_abs_diff_eq!(norm_ppf(0.95), 1.6449, epsilon = 1e-4);
        assert_abs_diff_eq!(norm_ppf(0.975), 1.96, epsilon = 1e-3);
        assert_abs_diff_eq!(norm_ppf(0.99), 2.3263, epsilon = 1e-4);
        assert_abs_diff_eq!(norm_ppf(0.05), -1.6449, epsilon = 1e-4);
        assert_abs_diff_eq!(norm_ppf(0.001), -3.0902, epsilon = 1e-4);
        assert_eq!(norm_ppf(0.0), f64::NEG_INFINITY);
        assert_eq!(norm_ppf(1.0), f64::INFINITY);
    }

    #[test]
    fn test_historical_var_rank_and_sign() {
        // Sorted ascending the worst return is -0.08; floor(0.05 * 10) = 0 selects it.
        let threshold = historical_threshold(&SAMPLE, 0.95).unwrap();
        assert_eq!(threshold, -0.08);

        let var = calculate_var(&SAMPLE, 0.95, 100_000.0, VarMethod::Historical).unwrap();
        assert_abs_diff_eq!(var, 8_000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_historical_var_lower_confidence_rank() {
        // floor(0.2 * 10) = 2 selects the third-worst return, -0.03.
        let threshold = historical_threshold(&SAMPLE, 0.8).unwrap();
        assert_eq!(threshold, -0.03);

        let var = calculate_var(&SAMPLE, 0.8, 1.0, VarMethod::Historical).unwrap();
        assert_abs_diff_eq!(var, 0.03, epsilon = 1e-12);
    }

    #[test]
    fn test_var_non_decreasing_in_confidence() {
        for method in [VarMethod::Historical, VarMethod::Parametric] {
            let mut previous = 0.0;
            for step in 1..100 {
                let confidence = step as f64 / 100.0;
                let var = calculate_var(&SAMPLE, confidence, 50_000.0, method).unwrap();
                assert!(var >= 0.0);
                assert!(
                    var >= previous,
                    "{:?} VaR dropped at confidence {}",
                    method,
                    confidence
                );
                previous = var;
            }
        }
    }

    #[test]
    fn test_var_all_gains_is_zero() {
        let returns = [0.01, 0.02, 0.03, 0.015];
        let var = calculate_var(&returns, 0.95, 10_000.0, VarMethod::Historical).unwrap();
        assert_eq!(var, 0.0);
    }

    #[test]
    fn test_parametric_var() {
        let returns = [0.01, -0.01, 0.01, -0.01];
        // mean 0, population std 0.01
        let var = calculate_var(&returns, 0.95, 100_000.0, VarMethod::Parametric).unwrap();
        assert_abs_diff_eq!(var, norm_ppf(0.95) * 0.01 * 100_000.0, epsilon = 1e-6);
        assert_abs_diff_eq!(var, 1644.85, epsilon = 0.1);
    }

    #[test]
    fn test_var_invalid_confidence() {
        for confidence in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            let result = calculate_var(&SAMPLE, confidence, 1.0, VarMethod::Historical);
            assert!(matches!(result, Err(Error::InvalidParameter(_))));
        }
    }

    #[test]
    fn test_var_insufficient_data() {
        let result = calculate_var(&[0.01], 0.95, 1.0, VarMethod::Historical);
        assert!(matches!(result, Err(Error::InsufficientData(_))));

        let result = calculate_var(&[], 0.95, 1.0, VarMethod::Parametric);
        assert!(matches!(result, Err(Error::InsufficientData(_))));
    }

    #[test]
    fn test_var_rejects_bad_portfolio_value() {
        let result = calculate_var(&SAMPLE, 0.95, -1.0, VarMethod::Historical);
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_expected_shortfall() {
        // At 80% the threshold is -0.03; tail = [-0.05, -0.03, -0.08], mean = -0.05333...
        let es = calculate_expected_shortfall(&SAMPLE, 0.8, 30_000.0).unwrap();
        assert_abs_diff_eq!(es, 1_600.0, epsilon = 1e-6);

        let var = calculate_var(&SAMPLE, 0.8, 30_000.0, VarMethod::Historical).unwrap();
        assert!(es >= var);
    }

    #[test]
    fn test_expected_shortfall_single_tail_point() {
        let es = calculate_expected_shortfall(&SAMPLE, 0.95, 100_000.0).unwrap();
        assert_abs_diff_eq!(es, 8_000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_expected_shortfall_short_series() {
        let result = calculate_expected_shortfall(&[-0.02], 0.95, 1.0);
        assert!(matches!(result, Err(Error::InsufficientData(_))));
    }
}

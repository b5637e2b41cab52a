//! Drawdown, Sharpe ratio, volatility and beta.

use super::descriptive::{
    covariance, mean, std_dev, validate_series, MIN_OBSERVATIONS, ZERO_VARIANCE_TOLERANCE,
};
use crate::{Error, Result};

/// Calculate maximum drawdown from an equity curve.
///
/// Returns the maximum peak-to-trough decline as a fraction in [0, 1]
/// (e.g., 0.15 for 15% drawdown). Empty and single-point curves yield 0.
/// While the running peak is not positive no drawdown is recorded.
pub fn calculate_max_drawdown(equity_curve: &[f64]) -> Result<f64> {
    validate_series("equity curve", equity_curve, 0)?;

    let Some(&first) = equity_curve.first() else {
        return Ok(0.0);
    };

    let mut peak = first;
    let mut max_drawdown: f64 = 0.0;

    for &value in equity_curve {
        if value > peak {
            peak = value;
        }
        if peak > 0.0 {
            let drawdown = (peak - value) / peak;
            max_drawdown = max_drawdown.max(drawdown);
        }
    }

    Ok(max_drawdown.min(1.0))
}

/// Calculate the annualized Sharpe ratio.
///
/// # Arguments
///
/// * `returns` - Simple period returns
/// * `risk_free_rate` - Annual risk-free rate, de-annualized per period
/// * `periods_per_year` - Annualization factor (252 for daily data)
///
/// A zero-variance series returns 0.0 instead of dividing by zero.
pub fn calculate_sharpe_ratio(
    returns: &[f64],
    risk_free_rate: f64,
    periods_per_year: u32,
) -> Result<f64> {
    validate_series("returns", returns, MIN_OBSERVATIONS)?;
    check_periods(periods_per_year)?;
    if !risk_free_rate.is_finite() {
        return Err(Error::InvalidParameter(format!(
            "risk-free rate must be finite, got {}",
            risk_free_rate
        )));
    }

    let periods = f64::from(periods_per_year);
    let mean_return = mean(returns).unwrap_or(0.0);
    let std_return = std_dev(returns).unwrap_or(0.0);

    if std_return < ZERO_VARIANCE_TOLERANCE {
        return Ok(0.0);
    }

    let excess_return = mean_return - risk_free_rate / periods;
    Ok(excess_return / std_return * periods.sqrt())
}

/// Calculate annualized volatility (standard deviation of returns, not a percentage).
pub fn calculate_volatility(returns: &[f64], periods_per_year: u32) -> Result<f64> {
    validate_series("returns", returns, MIN_OBSERVATIONS)?;
    check_periods(periods_per_year)?;

    let std_return = std_dev(returns).unwrap_or(0.0);
    Ok(std_return * f64::from(periods_per_year).sqrt())
}

/// Calculate beta of an asset against a benchmark.
///
/// Both series must cover the same periods in the same order. A benchmark
/// without variance returns 0.0.
pub fn calculate_beta(asset_returns: &[f64], benchmark_returns: &[f64]) -> Result<f64> {
    if asset_returns.len() != benchmark_returns.len() {
        return Err(Error::DimensionMismatch {
            left: asset_returns.len(),
            right: benchmark_returns.len(),
        });
    }
    validate_series("asset returns", asset_returns, MIN_OBSERVATIONS)?;
    validate_series("benchmark returns", benchmark_returns, MIN_OBSERVATIONS)?;

    let benchmark_std = std_dev(benchmark_returns).unwrap_or(0.0);
    if benchmark_std < ZERO_VARIANCE_TOLERANCE {
        return Ok(0.0);
    }

    Ok(covariance(asset_returns, benchmark_returns)? / benchmark_std.powi(2))
}

fn check_periods(periods_per_year: u32) -> Result<()> {
    if periods_per_year == 0 {
        return Err(Error::InvalidParameter(
            "periods per year must be at least 1".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statistics::TRADING_DAYS_PER_YEAR;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_max_drawdown() {
        let curve = [100.0, 110.0, 120.0, 90.0, 100.0, 130.0, 117.0];
        // Worst decline is 120 -> 90
        let mdd = calculate_max_drawdown(&curve).unwrap();
        assert_abs_diff_eq!(mdd, 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_max_drawdown_degenerate_curves() {
        assert_eq!(calculate_max_drawdown(&[]).unwrap(), 0.0);
        assert_eq!(calculate_max_drawdown(&[100.0]).unwrap(), 0.0);
        assert_eq!(
            calculate_max_drawdown(&[100.0, 101.0, 102.0, 110.0]).unwrap(),
            0.0
        );
    }

    #[test]
    fn test_max_drawdown_ignores_suffix_above_peak() {
        let curve = vec![100.0, 120.0, 96.0, 110.0];
        let base = calculate_max_drawdown(&curve).unwrap();

        let mut extended = curve.clone();
        extended.extend([125.0, 130.0, 140.0]);
        assert_eq!(calculate_max_drawdown(&extended).unwrap(), base);

        // A new, deeper trough raises it
        extended.push(98.0);
        assert!(calculate_max_drawdown(&extended).unwrap() > base);
    }

    #[test]
    fn test_max_drawdown_bounded() {
        let curve = [100.0, 50.0, -20.0, 10.0];
        let mdd = calculate_max_drawdown(&curve).unwrap();
        assert_eq!(mdd, 1.0);
    }

    #[test]
    fn test_max_drawdown_rejects_nan() {
        let result = calculate_max_drawdown(&[100.0, f64::NAN]);
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_sharpe_ratio() {
        let returns = [0.01, 0.02, -0.01, 0.03, 0.0];
        // mean 0.01, population std sqrt(0.0002)
        let expected = (0.01 - 0.02 / 252.0) / 0.0002_f64.sqrt() * 252.0_f64.sqrt();
        let sharpe = calculate_sharpe_ratio(&returns, 0.02, TRADING_DAYS_PER_YEAR).unwrap();
        assert_relative_eq!(sharpe, expected, max_relative = 1e-9);

        let losing = [-0.01, -0.02, 0.005, -0.03];
        assert!(calculate_sharpe_ratio(&losing, 0.02, 252).unwrap() < 0.0);
    }

    #[test]
    fn test_sharpe_ratio_zero_variance_sentinel() {
        let constant: Vec<f64> = (0..100).map(|_| 0.001).collect();
        assert_eq!(calculate_sharpe_ratio(&constant, 0.04, 252).unwrap(), 0.0);

        let flat = [0.0, 0.0, 0.0];
        assert_eq!(calculate_sharpe_ratio(&flat, 0.0, 252).unwrap(), 0.0);
    }

    #[test]
    fn test_sharpe_ratio_errors() {
        assert!(matches!(
            calculate_sharpe_ratio(&[0.01], 0.02, 252),
            Err(Error::InsufficientData(_))
        ));
        assert!(matches!(
            calculate_sharpe_ratio(&[0.01, 0.02], 0.02, 0),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            calculate_sharpe_ratio(&[0.01, 0.02], f64::NAN, 252),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_volatility() {
        let returns = [0.01, -0.01, 0.01, -0.01];
        let vol = calculate_volatility(&returns, 252).unwrap();
        assert_relative_eq!(vol, 0.01 * 252.0_f64.sqrt(), max_relative = 1e-9);

        let monthly = calculate_volatility(&returns, 12).unwrap();
        assert!(monthly < vol);
    }

    #[test]
    fn test_volatility_insufficient_data() {
        assert!(matches!(
            calculate_volatility(&[], 252),
            Err(Error::InsufficientData(_))
        ));
    }

    #[test]
    fn test_beta() {
        let benchmark = [0.01, -0.02, 0.015, 0.005, -0.01];
        let asset: Vec<f64> = benchmark.iter().map(|r| 1.5 * r).collect();
        assert_relative_eq!(
            calculate_beta(&asset, &benchmark).unwrap(),
            1.5,
            max_relative = 1e-9
        );

        let inverse: Vec<f64> = benchmark.iter().map(|r| -0.5 * r).collect();
        assert_relative_eq!(
            calculate_beta(&inverse, &benchmark).unwrap(),
            -0.5,
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_beta_dimension_mismatch() {
        let result = calculate_beta(&[0.01, 0.02, 0.03], &[0.01, 0.02]);
        assert!(matches!(
            result,
            Err(Error::DimensionMismatch { left: 3, right: 2 })
        ));
    }

    #[test]
    fn test_beta_flat_benchmark() {
        let beta = calculate_beta(&[0.01, -0.02, 0.03], &[0.0, 0.0, 0.0]).unwrap();
        assert_eq!(beta, 0.0);
    }
}

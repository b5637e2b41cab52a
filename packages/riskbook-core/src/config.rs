//! Risk parameters and their loading.

use crate::statistics::TRADING_DAYS_PER_YEAR;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Capital used when no configuration file exists.
pub const DEFAULT_INITIAL_CAPITAL: f64 = 100_000.0;

/// Risk configuration, immutable once handed to a `RiskManager`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RiskParameters {
    /// Starting capital
    pub initial_capital: f64,
    /// Maximum position value as a fraction of capital, in (0, 1]
    pub max_position_size: f64,
    /// Capital fraction risked per trade, in (0, 1]
    pub max_portfolio_risk: f64,
    /// Distance below entry (above for shorts) that triggers a stop, in (0, 1)
    pub stop_loss_percent: f64,
    /// Annual risk-free rate used by the Sharpe ratio
    pub risk_free_rate: f64,
    /// Annualization factor for Sharpe and volatility
    pub periods_per_year: u32,
    /// Annualized volatility above which the per-trade risk budget is scaled down
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_volatility: Option<f64>,
}

impl Default for RiskParameters {
    fn default() -> Self {
        Self {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            max_position_size: 0.10,
            max_portfolio_risk: 0.02,
            stop_loss_percent: 0.05,
            risk_free_rate: 0.02,
            periods_per_year: TRADING_DAYS_PER_YEAR,
            target_volatility: None,
        }
    }
}

impl RiskParameters {
    /// Default parameters with the given starting capital.
    pub fn new(initial_capital: f64) -> Self {
        Self {
            initial_capital,
            ..Default::default()
        }
    }

    pub fn with_max_position_size(mut self, fraction: f64) -> Self {
        self.max_position_size = fraction;
        self
    }

    pub fn with_max_portfolio_risk(mut self, fraction: f64) -> Self {
        self.max_portfolio_risk = fraction;
        self
    }

    pub fn with_stop_loss_percent(mut self, fraction: f64) -> Self {
        self.stop_loss_percent = fraction;
        self
    }

    pub fn with_risk_free_rate(mut self, rate: f64) -> Self {
        self.risk_free_rate = rate;
        self
    }

    pub fn with_periods_per_year(mut self, periods: u32) -> Self {
        self.periods_per_year = periods;
        self
    }

    pub fn with_target_volatility(mut self, volatility: f64) -> Self {
        self.target_volatility = Some(volatility);
        self
    }

    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<()> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "initial_capital must be positive, got {}",
                self.initial_capital
            )));
        }
        check_fraction("max_position_size", self.max_position_size, true)?;
        check_fraction("max_portfolio_risk", self.max_portfolio_risk, true)?;
        check_fraction("stop_loss_percent", self.stop_loss_percent, false)?;

        if !self.risk_free_rate.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "risk_free_rate must be finite, got {}",
                self.risk_free_rate
            )));
        }
        if self.periods_per_year == 0 {
            return Err(Error::InvalidParameter(
                "periods_per_year must be at least 1".to_string(),
            ));
        }
        if let Some(target) = self.target_volatility {
            if !target.is_finite() || target <= 0.0 {
                return Err(Error::InvalidParameter(format!(
                    "target_volatility must be positive, got {}",
                    target
                )));
            }
        }
        Ok(())
    }

    /// Get the default configuration file path.
    ///
    /// Default path: `~/.riskbook/risk.json`
    /// Can be overridden with `RISKBOOK_CONFIG_FILE` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("RISKBOOK_CONFIG_FILE") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".riskbook/risk.json"))
            .unwrap_or_else(|| PathBuf::from("risk.json"))
    }

    /// Load from the default path, or defaults if no file exists there.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from_path(&path)
    }

    /// Load and validate parameters from a JSON file.
    ///
    /// Missing fields take their default values.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let params: Self = serde_json::from_str(&content)?;
        params.validate()?;
        tracing::debug!(path = %path.display(), "loaded risk parameters");
        Ok(params)
    }
}

fn check_fraction(name: &str, value: f64, inclusive_upper: bool) -> Result<()> {
    let upper_ok = if inclusive_upper {
        value <= 1.0
    } else {
        value < 1.0
    };
    if value.is_finite() && value > 0.0 && upper_ok {
        Ok(())
    } else {
        let bound = if inclusive_upper { "(0, 1]" } else { "(0, 1)" };
        Err(Error::InvalidParameter(format!(
            "{} must lie in {}, got {}",
            name, bound, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_are_valid() {
        let params = RiskParameters::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.periods_per_year, 252);
        assert_eq!(params.max_position_size, 0.10);
    }

    #[test]
    fn test_builder() {
        let params = RiskParameters::new(50_000.0)
            .with_max_position_size(0.2)
            .with_max_portfolio_risk(0.01)
            .with_stop_loss_percent(0.08)
            .with_target_volatility(0.2);

        assert_eq!(params.initial_capital, 50_000.0);
        assert_eq!(params.max_position_size, 0.2);
        assert_eq!(params.max_portfolio_risk, 0.01);
        assert_eq!(params.stop_loss_percent, 0.08);
        assert_eq!(params.target_volatility, Some(0.2));
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let cases = [
            RiskParameters::new(0.0),
            RiskParameters::new(-10.0),
            RiskParameters::new(f64::NAN),
            RiskParameters::default().with_max_position_size(0.0),
            RiskParameters::default().with_max_position_size(1.5),
            RiskParameters::default().with_max_portfolio_risk(-0.1),
            RiskParameters::default().with_stop_loss_percent(1.0),
            RiskParameters::default().with_periods_per_year(0),
            RiskParameters::default().with_target_volatility(0.0),
        ];

        for params in cases {
            assert!(
                matches!(params.validate(), Err(Error::InvalidParameter(_))),
                "{:?} should be rejected",
                params
            );
        }
    }

    #[test]
    fn test_full_position_size_allowed() {
        let params = RiskParameters::default()
            .with_max_position_size(1.0)
            .with_max_portfolio_risk(1.0);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_load_from_path_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("risk.json");
        fs::write(
            &path,
            r#"{ "initial_capital": 250000.0, "stop_loss_percent": 0.03 }"#,
        )
        .unwrap();

        let params = RiskParameters::load_from_path(&path).unwrap();
        assert_eq!(params.initial_capital, 250_000.0);
        assert_eq!(params.stop_loss_percent, 0.03);
        assert_eq!(params.max_position_size, 0.10);
        assert_eq!(params.target_volatility, None);
    }

    #[test]
    fn test_load_from_path_rejects_invalid_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("risk.json");
        fs::write(&path, r#"{ "max_portfolio_risk": 2.0 }"#).unwrap();

        let result = RiskParameters::load_from_path(&path);
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_load_from_path_errors() {
        let dir = tempdir().unwrap();

        let missing = RiskParameters::load_from_path(&dir.path().join("missing.json"));
        assert!(matches!(missing, Err(Error::Io(_))));

        let path = dir.path().join("broken.json");
        fs::write(&path, "not json").unwrap();
        let broken = RiskParameters::load_from_path(&path);
        assert!(matches!(broken, Err(Error::Json(_))));
    }

    #[test]
    fn test_round_trip_through_json() {
        let params = RiskParameters::new(75_000.0).with_target_volatility(0.25);
        let json = serde_json::to_string(&params).unwrap();
        let parsed: RiskParameters = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, params);
    }
}

//! Risk-level classification table.

use crate::types::RiskLevel;

/// Lower bounds (exclusive) a metric must exceed to fall into a band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskBand {
    pub level: RiskLevel,
    pub max_drawdown_above: f64,
    pub var_fraction_above: f64,
}

/// Bands ordered from most to least severe. The first match wins.
pub const RISK_BANDS: [RiskBand; 3] = [
    RiskBand {
        level: RiskLevel::Critical,
        max_drawdown_above: 0.25,
        var_fraction_above: 0.10,
    },
    RiskBand {
        level: RiskLevel::High,
        max_drawdown_above: 0.15,
        var_fraction_above: 0.05,
    },
    RiskBand {
        level: RiskLevel::Medium,
        max_drawdown_above: 0.08,
        var_fraction_above: 0.03,
    },
];

/// Classify a portfolio by the most severe band either metric falls into.
///
/// `var_fraction` is VaR95 divided by portfolio value. Anything below every
/// band is `Low`.
pub fn classify_risk_level(max_drawdown: f64, var_fraction: f64) -> RiskLevel {
    RISK_BANDS
        .iter()
        .find(|band| {
            max_drawdown > band.max_drawdown_above || var_fraction.abs() > band.var_fraction_above
        })
        .map(|band| band.level)
        .unwrap_or(RiskLevel::Low)
}

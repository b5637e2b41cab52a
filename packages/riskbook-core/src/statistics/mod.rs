//! Risk statistics over return and equity series.
//!
//! Every function is pure and works on simple period returns
//! (`E_t / E_{t-1} - 1`, not log returns) with population standard deviation.
//! Inputs are validated up front: non-finite values are rejected and
//! return-based statistics need at least [`MIN_OBSERVATIONS`] points.

mod descriptive;
mod performance;
mod var;

pub use descriptive::{covariance, mean, std_dev, MIN_OBSERVATIONS};
pub use performance::{
    calculate_beta, calculate_max_drawdown, calculate_sharpe_ratio, calculate_volatility,
};
pub use var::{
    calculate_expected_shortfall, calculate_var, historical_threshold, norm_ppf, VarMethod,
};

/// Default annualization factor.
pub const TRADING_DAYS_PER_YEAR: u32 = 252;

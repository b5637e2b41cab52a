//! Riskbook Core - Portfolio ledger and risk statistics engine.
//!
//! This crate provides the core functionality for tracking open positions and
//! deriving quantitative risk statistics from them:
//!
//! - **Statistics**: VaR (historical and parametric), expected shortfall,
//!   Sharpe ratio, volatility, max drawdown, beta
//! - **Portfolio ledger**: Positions with cost averaging, realized P&L records,
//!   equity curve and derived return series
//! - **Risk manager**: Position sizing, stop-loss monitoring and risk-level
//!   classification into a metrics snapshot
//!
//! All statistics use simple period returns (`E_t / E_{t-1} - 1`), population
//! standard deviation and, unless configured otherwise, 252 periods per year.
//!
//! # Example
//!
//! ```rust
//! use riskbook_core::{RiskManager, RiskParameters};
//!
//! let params = RiskParameters::new(100_000.0);
//! let mut manager = RiskManager::new(params).unwrap();
//!
//! manager.add_position("AAPL", 100.0, 150.0).unwrap();
//! manager.update_position_price("AAPL", 165.0).unwrap();
//!
//! let summary = manager.get_portfolio_summary();
//! assert_eq!(summary.total_unrealized_pnl, 1500.0);
//!
//! let closed = manager.close_position("AAPL").unwrap();
//! assert_eq!(closed.realized_pnl, 1500.0);
//! ```

pub mod config;
pub mod portfolio;
pub mod risk;
pub mod statistics;
pub mod types;

// Re-export commonly used types
pub use config::RiskParameters;
pub use types::{
    ApiResponse, ClosedPosition, PortfolioMetrics, PortfolioSummary, Position, PositionSummary,
    RiskLevel, StopLossBreach,
};

// Re-export main functionality
pub use portfolio::PortfolioLedger;
pub use risk::{classify_risk_level, RiskManager};
pub use statistics::{
    calculate_beta, calculate_expected_shortfall, calculate_max_drawdown,
    calculate_sharpe_ratio, calculate_var, calculate_volatility, norm_ppf, VarMethod,
    TRADING_DAYS_PER_YEAR,
};

/// Error types for riskbook-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Unknown position: {0}")]
    UnknownPosition(String),

    #[error("Position already exists: {0}")]
    PositionExists(String),

    #[error("Dimension mismatch: {left} vs {right} observations")]
    DimensionMismatch { left: usize, right: usize },
}

/// Result type for riskbook-core operations.
pub type Result<T> = std::result::Result<T, Error>;

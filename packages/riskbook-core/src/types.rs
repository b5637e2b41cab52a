//! Core data types for the riskbook engine.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An open position. Positive quantity is long, negative is short.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    /// Ticker symbol (uppercase)
    pub symbol: String,
    /// Signed quantity, never zero while open
    pub quantity: f64,
    /// Quantity-weighted average entry price
    pub entry_price: f64,
    /// Last known market price
    pub current_price: f64,
    /// When the position was opened
    pub opened_at: DateTime<Utc>,
}

impl Position {
    /// Create a new position marked at its entry price.
    pub fn new(symbol: &str, quantity: f64, entry_price: f64) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            quantity,
            entry_price,
            current_price: entry_price,
            opened_at: Utc::now(),
        }
    }

    /// Current market value (signed, negative for shorts).
    pub fn market_value(&self) -> f64 {
        self.current_price * self.quantity
    }

    /// Absolute market value.
    pub fn notional_exposure(&self) -> f64 {
        self.market_value().abs()
    }

    /// Unrealized P&L in currency units.
    pub fn unrealized_pnl(&self) -> f64 {
        (self.current_price - self.entry_price) * self.quantity
    }

    /// Price change since entry, in percent.
    pub fn pnl_percent(&self) -> f64 {
        (self.current_price / self.entry_price - 1.0) * 100.0
    }

    pub fn is_long(&self) -> bool {
        self.quantity > 0.0
    }
}

/// A position that has been closed and its P&L realized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClosedPosition {
    pub symbol: String,
    pub quantity: f64,
    pub entry_price: f64,
    pub exit_price: f64,
    /// (exit_price - entry_price) * quantity
    pub realized_pnl: f64,
    pub opened_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
}

impl ClosedPosition {
    /// Close a position at its current price.
    pub fn from_position(position: Position, closed_at: DateTime<Utc>) -> Self {
        let realized_pnl = position.unrealized_pnl();
        Self {
            symbol: position.symbol,
            quantity: position.quantity,
            entry_price: position.entry_price,
            exit_price: position.current_price,
            realized_pnl,
            opened_at: position.opened_at,
            closed_at,
        }
    }

    /// How long the position was held.
    pub fn holding_duration(&self) -> Duration {
        self.closed_at - self.opened_at
    }

    pub fn is_win(&self) -> bool {
        self.realized_pnl > 0.0
    }
}

/// Portfolio risk classification, ordered by severity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk metrics snapshot for a portfolio.
///
/// Monetary figures are scaled by `portfolio_value` (current equity).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioMetrics {
    /// Equity the monetary figures are scaled to
    pub portfolio_value: f64,
    /// Sum of absolute position market values
    pub total_exposure: f64,
    /// Historical VaR at 95% in currency units
    pub var_95: f64,
    /// Historical VaR at 99% in currency units
    pub var_99: f64,
    /// VaR95 as a fraction of portfolio value
    pub var_95_fraction: f64,
    /// Expected shortfall at 95% in currency units
    pub expected_shortfall: f64,
    /// Annualized Sharpe ratio
    pub sharpe_ratio: f64,
    /// Maximum drawdown of the equity curve, in [0, 1]
    pub max_drawdown: f64,
    /// Annualized volatility of period returns
    pub volatility: f64,
    /// Beta against a benchmark, when one was supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
    pub risk_level: RiskLevel,
    /// Number of period returns the statistics were computed from
    pub observations: usize,
}

/// Stop-loss status of a single open position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StopLossBreach {
    pub symbol: String,
    /// Whether the stop level has been reached
    pub breached: bool,
    pub stop_price: f64,
    pub current_price: f64,
    /// Adverse move since entry as a fraction of entry price (negative when in profit)
    pub adverse_move: f64,
}

/// Per-position line in a portfolio summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PositionSummary {
    pub symbol: String,
    pub quantity: f64,
    pub entry_price: f64,
    pub current_price: f64,
    pub market_value: f64,
    pub unrealized_pnl: f64,
    pub pnl_percent: f64,
}

impl From<&Position> for PositionSummary {
    fn from(position: &Position) -> Self {
        Self {
            symbol: position.symbol.clone(),
            quantity: position.quantity,
            entry_price: position.entry_price,
            current_price: position.current_price,
            market_value: position.market_value(),
            unrealized_pnl: position.unrealized_pnl(),
            pnl_percent: position.pnl_percent(),
        }
    }
}

/// Aggregate view of the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioSummary {
    pub initial_capital: f64,
    /// initial_capital + total_pnl
    pub equity: f64,
    /// initial_capital - open cost basis + total_realized_pnl
    pub cash: f64,
    pub total_market_value: f64,
    pub total_exposure: f64,
    pub total_unrealized_pnl: f64,
    pub total_realized_pnl: f64,
    pub total_pnl: f64,
    pub position_count: usize,
    pub closed_trades: usize,
    /// Percent of closed trades with positive realized P&L
    pub win_rate_percent: f64,
    /// Sorted by symbol
    pub positions: Vec<PositionSummary>,
}

/// JSON envelope printed by the CLI: `data` on success, `error` otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T, E: fmt::Display> From<std::result::Result<T, E>> for ApiResponse<T> {
    fn from(result: std::result::Result<T, E>) -> Self {
        match result {
            Ok(data) => Self {
                ok: true,
                data: Some(data),
                error: None,
            },
            Err(e) => Self {
                ok: false,
                data: None,
                error: Some(e.to_string()),
            },
        }
    }
}

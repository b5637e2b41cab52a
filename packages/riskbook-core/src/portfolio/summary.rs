//! Read-only aggregate view of a ledger.

use super::PortfolioLedger;
use crate::types::{PortfolioSummary, PositionSummary};

impl PortfolioLedger {
    /// Aggregate P&L and a per-position breakdown.
    pub fn get_portfolio_summary(&self) -> PortfolioSummary {
        let total_unrealized_pnl = self.total_unrealized_pnl();
        let total_realized_pnl = self.total_realized_pnl();
        let total_pnl = total_realized_pnl + total_unrealized_pnl;

        let closed = self.closed_positions();
        let wins = closed.iter().filter(|c| c.is_win()).count();
        let win_rate_percent = if closed.is_empty() {
            0.0
        } else {
            (wins as f64 / closed.len() as f64) * 100.0
        };

        PortfolioSummary {
            initial_capital: self.initial_capital(),
            equity: self.initial_capital() + total_pnl,
            cash: self.cash(),
            total_market_value: self.total_market_value(),
            total_exposure: self.total_exposure(),
            total_unrealized_pnl,
            total_realized_pnl,
            total_pnl,
            position_count: self.position_count(),
            closed_trades: closed.len(),
            win_rate_percent,
            positions: self.positions().map(PositionSummary::from).collect(),
        }
    }

    /// Weight of each open position in gross exposure.
    pub fn position_weights(&self) -> Vec<(String, f64)> {
        let total_exposure = self.total_exposure();
        if total_exposure <= 0.0 {
            return Vec::new();
        }

        self.positions()
            .map(|p| (p.symbol.clone(), p.notional_exposure() / total_exposure))
            .collect()
    }
}

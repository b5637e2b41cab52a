//! Open positions, realized P&L and the equity curve.

use crate::types::{ClosedPosition, Position};
use crate::{Error, Result};
use chrono::Utc;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Mutable portfolio state owned by a single `RiskManager`.
///
/// Equity is always recomputed from `initial_capital`, realized P&L and the
/// unrealized P&L of open positions. The equity curve records that value after
/// every price update, and after any merge that moves it, and is the source of
/// the return series.
#[derive(Debug, Clone)]
pub struct PortfolioLedger {
    initial_capital: f64,
    positions: BTreeMap<String, Position>,
    closed: Vec<ClosedPosition>,
    equity_curve: Vec<f64>,
}

impl PortfolioLedger {
    /// Create an empty ledger. The equity curve starts at `initial_capital`.
    pub fn new(initial_capital: f64) -> Result<Self> {
        if !initial_capital.is_finite() || initial_capital <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "initial capital must be positive, got {}",
                initial_capital
            )));
        }

        Ok(Self {
            initial_capital,
            positions: BTreeMap::new(),
            closed: Vec::new(),
            equity_curve: vec![initial_capital],
        })
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    /// Open positions, ordered by symbol.
    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    /// Find an open position by symbol (case insensitive).
    pub fn find_position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(&normalize_symbol(symbol))
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    /// Closed positions in the order they were closed.
    pub fn closed_positions(&self) -> &[ClosedPosition] {
        &self.closed
    }

    /// Realized P&L events in the order they were realized.
    pub fn realized_pnl_events(&self) -> impl Iterator<Item = f64> + '_ {
        self.closed.iter().map(|c| c.realized_pnl)
    }

    /// Recorded equity snapshots, oldest first.
    pub fn equity_curve(&self) -> &[f64] {
        &self.equity_curve
    }

    /// Open a long position or add to an existing long.
    ///
    /// Adding to an open symbol merges the lots: quantities are summed and the
    /// entry price becomes the quantity-weighted average. The merged position
    /// keeps its original open time and is marked at `price`. If re-marking the
    /// existing lot changes equity, an equity snapshot is recorded.
    /// Adding a long onto an open short fails with `PositionExists`.
    pub fn add_position(&mut self, symbol: &str, quantity: f64, price: f64) -> Result<&Position> {
        self.open(symbol, quantity, price, 1.0)
    }

    /// Open a short position or add to an existing short.
    ///
    /// `quantity` is given as a positive amount and stored negated.
    pub fn add_short_position(
        &mut self,
        symbol: &str,
        quantity: f64,
        price: f64,
    ) -> Result<&Position> {
        self.open(symbol, quantity, price, -1.0)
    }

    fn open(&mut self, symbol: &str, quantity: f64, price: f64, direction: f64) -> Result<&Position> {
        let symbol = checked_symbol(symbol)?;
        check_positive("quantity", quantity)?;
        check_positive("price", price)?;

        let signed_quantity = quantity * direction;

        let merged = match self.positions.entry(symbol.clone()) {
            Entry::Occupied(entry) => {
                let existing = entry.into_mut();
                if existing.quantity.signum() != direction {
                    return Err(Error::PositionExists(format!(
                        "{} is open with quantity {}; close it before reversing",
                        existing.symbol, existing.quantity
                    )));
                }

                let total_quantity = existing.quantity + signed_quantity;
                existing.entry_price = (existing.quantity * existing.entry_price
                    + signed_quantity * price)
                    / total_quantity;
                existing.quantity = total_quantity;
                existing.current_price = price;
                tracing::debug!(
                    symbol = %existing.symbol,
                    quantity = existing.quantity,
                    entry_price = existing.entry_price,
                    "merged into open position"
                );
                true
            }
            Entry::Vacant(entry) => {
                let position = Position::new(entry.key(), signed_quantity, price);
                tracing::debug!(
                    symbol = %position.symbol,
                    quantity = position.quantity,
                    price,
                    "opened position"
                );
                entry.insert(position);
                false
            }
        };

        // Re-marking the existing lot at the trade price moves equity.
        if merged && self.equity_curve.last() != Some(&self.current_equity()) {
            self.record_equity();
        }

        self.positions
            .get(&symbol)
            .ok_or(Error::UnknownPosition(symbol))
    }

    /// Mark a position at a new price and record an equity snapshot.
    pub fn update_position_price(&mut self, symbol: &str, new_price: f64) -> Result<&Position> {
        let symbol = normalize_symbol(symbol);
        check_positive("price", new_price)?;

        let position = self
            .positions
            .get_mut(&symbol)
            .ok_or_else(|| Error::UnknownPosition(symbol.clone()))?;
        position.current_price = new_price;

        self.record_equity();
        self.positions
            .get(&symbol)
            .ok_or(Error::UnknownPosition(symbol))
    }

    /// Mark several positions at once and record a single equity snapshot.
    ///
    /// Every symbol and price is checked before anything is changed.
    pub fn update_prices(&mut self, prices: &[(String, f64)]) -> Result<()> {
        let mut updates = Vec::with_capacity(prices.len());
        for (symbol, price) in prices {
            let symbol = normalize_symbol(symbol);
            check_positive("price", *price)?;
            if !self.positions.contains_key(&symbol) {
                return Err(Error::UnknownPosition(symbol));
            }
            updates.push((symbol, *price));
        }

        for (symbol, price) in updates {
            if let Some(position) = self.positions.get_mut(&symbol) {
                position.current_price = price;
            }
        }
        self.record_equity();
        Ok(())
    }

    /// Close a position at its current price and realize its P&L.
    pub fn close_position(&mut self, symbol: &str) -> Result<ClosedPosition> {
        let symbol = normalize_symbol(symbol);
        let position = self
            .positions
            .remove(&symbol)
            .ok_or(Error::UnknownPosition(symbol))?;

        let closed = ClosedPosition::from_position(position, Utc::now());
        tracing::info!(
            symbol = %closed.symbol,
            realized_pnl = closed.realized_pnl,
            exit_price = closed.exit_price,
            "closed position"
        );
        self.closed.push(closed.clone());
        Ok(closed)
    }

    /// Sum of realized P&L over all closed positions.
    pub fn total_realized_pnl(&self) -> f64 {
        self.realized_pnl_events().sum()
    }

    /// Sum of unrealized P&L over all open positions.
    pub fn total_unrealized_pnl(&self) -> f64 {
        self.positions.values().map(Position::unrealized_pnl).sum()
    }

    /// Net market value of open positions.
    pub fn total_market_value(&self) -> f64 {
        self.positions.values().map(Position::market_value).sum()
    }

    /// Gross exposure of open positions.
    pub fn total_exposure(&self) -> f64 {
        self.positions.values().map(Position::notional_exposure).sum()
    }

    /// Cash not tied up in open positions.
    ///
    /// initial_capital - cost basis of open positions + realized P&L. Shorts
    /// have a negative cost basis, so their proceeds count as cash.
    pub fn cash(&self) -> f64 {
        let cost_basis: f64 = self
            .positions
            .values()
            .map(|p| p.quantity * p.entry_price)
            .sum();
        self.initial_capital - cost_basis + self.total_realized_pnl()
    }

    /// initial_capital + realized + unrealized P&L.
    pub fn current_equity(&self) -> f64 {
        self.initial_capital + self.total_realized_pnl() + self.total_unrealized_pnl()
    }

    /// Period-over-period simple returns of the equity curve.
    ///
    /// Computed lazily from the stored snapshots, so it can be iterated any
    /// number of times. Periods starting from non-positive equity are skipped.
    pub fn derive_return_series(&self) -> impl Iterator<Item = f64> + '_ {
        self.equity_curve
            .windows(2)
            .filter(|pair| pair[0] > 0.0)
            .map(|pair| pair[1] / pair[0] - 1.0)
    }

    fn record_equity(&mut self) {
        let equity = self.current_equity();
        self.equity_curve.push(equity);
        tracing::debug!(equity, snapshots = self.equity_curve.len(), "recorded equity");
    }
}

/// Uppercase, trimmed symbol key.
pub(crate) fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

fn checked_symbol(symbol: &str) -> Result<String> {
    let symbol = normalize_symbol(symbol);
    if symbol.is_empty() {
        return Err(Error::InvalidParameter("symbol must not be empty".to_string()));
    }
    Ok(symbol)
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!(
            "{} must be positive, got {}",
            name, value
        )))
    }
}

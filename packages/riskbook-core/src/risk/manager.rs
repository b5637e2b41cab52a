//! Risk manager tying the ledger to the statistics library.

use super::level::classify_risk_level;
use crate::config::RiskParameters;
use crate::portfolio::{normalize_symbol, PortfolioLedger};
use crate::statistics::{
    calculate_beta, calculate_expected_shortfall, calculate_max_drawdown,
    calculate_sharpe_ratio, calculate_var, calculate_volatility, VarMethod,
};
use crate::types::{
    ClosedPosition, PortfolioMetrics, PortfolioSummary, Position, RiskLevel, StopLossBreach,
};
use crate::{Error, Result};

/// Owns one portfolio ledger and the risk parameters applied to it.
///
/// All operations are synchronous. Hosts sharing a manager across threads
/// should wrap it in a single `RwLock`: metric computation only needs `&self`,
/// so a read guard gives a consistent snapshot for its whole duration.
#[derive(Debug, Clone)]
pub struct RiskManager {
    params: RiskParameters,
    ledger: PortfolioLedger,
}

impl RiskManager {
    /// Validate the parameters and start an empty ledger at `initial_capital`.
    pub fn new(params: RiskParameters) -> Result<Self> {
        params.validate()?;
        let ledger = PortfolioLedger::new(params.initial_capital)?;
        Ok(Self { params, ledger })
    }

    pub fn params(&self) -> &RiskParameters {
        &self.params
    }

    pub fn ledger(&self) -> &PortfolioLedger {
        &self.ledger
    }

    /// Owned copy of the ledger for readers that must not hold a lock.
    pub fn ledger_snapshot(&self) -> PortfolioLedger {
        self.ledger.clone()
    }

    pub fn add_position(&mut self, symbol: &str, quantity: f64, price: f64) -> Result<&Position> {
        self.ledger.add_position(symbol, quantity, price)
    }

    pub fn add_short_position(
        &mut self,
        symbol: &str,
        quantity: f64,
        price: f64,
    ) -> Result<&Position> {
        self.ledger.add_short_position(symbol, quantity, price)
    }

    pub fn update_position_price(&mut self, symbol: &str, new_price: f64) -> Result<&Position> {
        self.ledger.update_position_price(symbol, new_price)
    }

    pub fn update_prices(&mut self, prices: &[(String, f64)]) -> Result<()> {
        self.ledger.update_prices(prices)
    }

    pub fn close_position(&mut self, symbol: &str) -> Result<ClosedPosition> {
        self.ledger.close_position(symbol)
    }

    pub fn get_portfolio_summary(&self) -> PortfolioSummary {
        self.ledger.get_portfolio_summary()
    }

    /// Recommend a whole-unit quantity to buy at `price`.
    ///
    /// Takes the smaller of the exposure cap (`max_position_size` of equity)
    /// and the risk cap (`max_portfolio_risk` of equity lost if the stop at
    /// `stop_loss_percent` is hit). When `target_volatility` is configured and
    /// `volatility` exceeds it, the risk budget shrinks by
    /// `target_volatility / volatility`. Non-positive equity yields 0.
    pub fn calculate_position_size(&self, price: f64, volatility: f64) -> Result<f64> {
        self.calculate_position_size_with_risk(price, volatility, self.params.max_portfolio_risk)
    }

    /// Same as `calculate_position_size` with `risk_per_trade` in place of
    /// `max_portfolio_risk`.
    pub fn calculate_position_size_with_risk(
        &self,
        price: f64,
        volatility: f64,
        risk_per_trade: f64,
    ) -> Result<f64> {
        if !risk_per_trade.is_finite() || risk_per_trade <= 0.0 || risk_per_trade > 1.0 {
            return Err(Error::InvalidParameter(format!(
                "risk per trade must lie in (0, 1], got {}",
                risk_per_trade
            )));
        }
        if !price.is_finite() || price <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "price must be positive, got {}",
                price
            )));
        }
        if !volatility.is_finite() || volatility < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "volatility must be non-negative, got {}",
                volatility
            )));
        }

        let capital = self.ledger.current_equity();
        if capital <= 0.0 {
            return Ok(0.0);
        }

        let volatility_scale = match self.params.target_volatility {
            Some(target) if volatility > target => target / volatility,
            _ => 1.0,
        };

        let max_position_value = capital * self.params.max_position_size;
        let risk_amount = capital * risk_per_trade * volatility_scale;
        let stop_distance = price * self.params.stop_loss_percent;

        let exposure_shares = max_position_value / price;
        let risk_shares = risk_amount / stop_distance;
        let shares = exposure_shares.min(risk_shares).floor().max(0.0);

        tracing::debug!(
            price,
            volatility,
            exposure_shares,
            risk_shares,
            shares,
            "calculated position size"
        );
        Ok(shares)
    }

    /// Price at which a position's stop triggers.
    pub fn stop_loss_price(&self, position: &Position) -> f64 {
        if position.is_long() {
            position.entry_price * (1.0 - self.params.stop_loss_percent)
        } else {
            position.entry_price * (1.0 + self.params.stop_loss_percent)
        }
    }

    /// Stop-loss status of one open position. Breaches are reported, never executed.
    pub fn check_stop_loss(&self, symbol: &str) -> Result<StopLossBreach> {
        let position = self
            .ledger
            .find_position(symbol)
            .ok_or_else(|| Error::UnknownPosition(normalize_symbol(symbol)))?;
        Ok(self.stop_loss_status(position))
    }

    /// Stop-loss status of every open position, ordered by symbol.
    pub fn check_stop_losses(&self) -> Vec<StopLossBreach> {
        self.ledger
            .positions()
            .map(|position| self.stop_loss_status(position))
            .collect()
    }

    fn stop_loss_status(&self, position: &Position) -> StopLossBreach {
        let stop_price = self.stop_loss_price(position);
        let (breached, adverse_move) = if position.is_long() {
            (
                position.current_price <= stop_price,
                (position.entry_price - position.current_price) / position.entry_price,
            )
        } else {
            (
                position.current_price >= stop_price,
                (position.current_price - position.entry_price) / position.entry_price,
            )
        };

        if breached {
            tracing::warn!(
                symbol = %position.symbol,
                current_price = position.current_price,
                stop_price,
                "stop-loss breached"
            );
        }

        StopLossBreach {
            symbol: position.symbol.clone(),
            breached,
            stop_price,
            current_price: position.current_price,
            adverse_move,
        }
    }

    /// Compute a metrics snapshot from the ledger's equity curve.
    ///
    /// Needs at least two period returns, i.e. three equity snapshots.
    pub fn calculate_portfolio_metrics(&self) -> Result<PortfolioMetrics> {
        self.compute_metrics(None)
    }

    /// Like `calculate_portfolio_metrics`, also filling `beta`.
    ///
    /// `benchmark_returns` must cover the same periods as the ledger's return series.
    pub fn calculate_portfolio_metrics_with_benchmark(
        &self,
        benchmark_returns: &[f64],
    ) -> Result<PortfolioMetrics> {
        self.compute_metrics(Some(benchmark_returns))
    }

    fn compute_metrics(&self, benchmark_returns: Option<&[f64]>) -> Result<PortfolioMetrics> {
        let returns: Vec<f64> = self.ledger.derive_return_series().collect();
        let portfolio_value = self.ledger.current_equity().max(0.0);
        let periods = self.params.periods_per_year;

        let var_95_fraction = calculate_var(&returns, 0.95, 1.0, VarMethod::Historical)?;
        let var_99 = calculate_var(&returns, 0.99, portfolio_value, VarMethod::Historical)?;
        let expected_shortfall = calculate_expected_shortfall(&returns, 0.95, portfolio_value)?;
        let sharpe_ratio = calculate_sharpe_ratio(&returns, self.params.risk_free_rate, periods)?;
        let volatility = calculate_volatility(&returns, periods)?;
        let max_drawdown = calculate_max_drawdown(self.ledger.equity_curve())?;
        let beta = benchmark_returns
            .map(|benchmark| calculate_beta(&returns, benchmark))
            .transpose()?;

        let risk_level = classify_risk_level(max_drawdown, var_95_fraction);
        if risk_level == RiskLevel::Critical {
            tracing::warn!(max_drawdown, var_95_fraction, "portfolio risk is CRITICAL");
        }
        tracing::debug!(
            observations = returns.len(),
            %risk_level,
            "calculated portfolio metrics"
        );

        Ok(PortfolioMetrics {
            portfolio_value,
            total_exposure: self.ledger.total_exposure(),
            var_95: var_95_fraction * portfolio_value,
            var_99,
            var_95_fraction,
            expected_shortfall,
            sharpe_ratio,
            max_drawdown,
            volatility,
            beta,
            risk_level,
            observations: returns.len(),
        })
    }
}

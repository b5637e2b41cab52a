//! Portfolio ledger module.
//!
//! Provides position tracking, realized P&L records, the equity curve and the
//! aggregate summary derived from them.

mod ledger;
mod summary;

pub(crate) use ledger::normalize_symbol;
pub use ledger::PortfolioLedger;

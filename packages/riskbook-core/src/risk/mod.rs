//! Risk orchestration: sizing, stop-loss monitoring and classification.

mod level;
mod manager;

pub use level::{classify_risk_level, RiskBand, RISK_BANDS};
pub use manager::RiskManager;

//! Riskbook CLI - Command line access to the risk engine.
//!
//! Every command prints an `ApiResponse` JSON document on stdout. Logs go to
//! stderr and are filtered with `RUST_LOG` (default `warn`).

use clap::{Parser, Subcommand, ValueEnum};
use riskbook_core::{
    calculate_expected_shortfall, calculate_var, ApiResponse, RiskManager, RiskParameters,
    VarMethod,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "riskbook")]
#[command(about = "Riskbook CLI - portfolio risk metrics and position sizing")]
#[command(version)]
struct Cli {
    /// Risk parameter file (defaults to ~/.riskbook/risk.json or $RISKBOOK_CONFIG_FILE)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a sample portfolio and report summary, metrics and stop-losses
    Demo,
    /// Value at Risk and expected shortfall for a return series
    Var {
        /// Comma-separated simple returns (e.g. "-0.02,0.01,0.03")
        #[arg(short, long, allow_hyphen_values = true)]
        returns: String,
        /// Confidence level (0.95 = 95%)
        #[arg(short, long, default_value = "0.95")]
        confidence: f64,
        /// Portfolio value the loss is scaled to
        #[arg(short, long, default_value = "100000")]
        value: f64,
        /// Estimation method
        #[arg(short, long, value_enum, default_value_t = Method::Historical)]
        method: Method,
    },
    /// Recommended position size for a new trade
    Size {
        /// Price per unit
        #[arg(short, long)]
        price: f64,
        /// Annualized volatility of the asset
        #[arg(short = 'o', long, default_value = "0.0")]
        volatility: f64,
        /// Capital fraction risked on this trade, overriding max_portfolio_risk
        #[arg(short, long)]
        risk: Option<f64>,
    },
    /// Print the effective risk parameters
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum Method {
    Historical,
    Parametric,
}

impl From<Method> for VarMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Historical => VarMethod::Historical,
            Method::Parametric => VarMethod::Parametric,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = load_params(cli.config.as_ref()).and_then(|params| match cli.command {
        Commands::Demo => handle_demo(params),
        Commands::Var {
            returns,
            confidence,
            value,
            method,
        } => handle_var(&returns, confidence, value, method.into()),
        Commands::Size {
            price,
            volatility,
            risk,
        } => handle_size(params, price, volatility, risk),
        Commands::Config => Ok(json!({ "parameters": params })),
    });

    println!("{}", render(&ApiResponse::from(result)));
}

fn render<T: Serialize>(response: &ApiResponse<T>) -> String {
    serde_json::to_string_pretty(response)
        .unwrap_or_else(|e| json!({ "ok": false, "error": e.to_string() }).to_string())
}

fn load_params(path: Option<&PathBuf>) -> Result<RiskParameters, String> {
    match path {
        Some(path) => RiskParameters::load_from_path(path),
        None => RiskParameters::load(),
    }
    .map_err(|e| e.to_string())
}

fn handle_demo(params: RiskParameters) -> Result<Value, String> {
    let mut manager = RiskManager::new(params).map_err(|e| e.to_string())?;

    let positions = [
        ("AAPL", 100.0, 150.0),
        ("GOOGL", 50.0, 2800.0),
        ("MSFT", 150.0, 350.0),
        ("TSLA", 75.0, 250.0),
        ("NVDA", 80.0, 450.0),
    ];
    for (symbol, quantity, price) in positions {
        manager
            .add_position(symbol, quantity, price)
            .map_err(|e| e.to_string())?;
    }

    let recommended_size = manager
        .calculate_position_size(180.0, 0.28)
        .map_err(|e| e.to_string())?;

    for (symbol, price) in [("TSLA", 235.0), ("NVDA", 440.0)] {
        manager
            .update_position_price(symbol, price)
            .map_err(|e| e.to_string())?;
    }

    let metrics = match manager.calculate_portfolio_metrics() {
        Ok(metrics) => json!(metrics),
        Err(e) => json!({ "error": e.to_string() }),
    };

    Ok(json!({
        "parameters": manager.params(),
        "summary": manager.get_portfolio_summary(),
        "cash_available": manager.ledger().cash(),
        "metrics": metrics,
        "stop_losses": manager.check_stop_losses(),
        "position_size": {
            "symbol": "AMZN",
            "price": 180.0,
            "volatility": 0.28,
            "shares": recommended_size,
            "value": recommended_size * 180.0,
        },
    }))
}

fn handle_var(
    returns: &str,
    confidence: f64,
    value: f64,
    method: VarMethod,
) -> Result<Value, String> {
    let returns = parse_returns(returns)?;
    let var = calculate_var(&returns, confidence, value, method).map_err(|e| e.to_string())?;
    let expected_shortfall =
        calculate_expected_shortfall(&returns, confidence, value).map_err(|e| e.to_string())?;

    Ok(json!({
        "method": method,
        "confidence": confidence,
        "portfolio_value": value,
        "observations": returns.len(),
        "var": var,
        "expected_shortfall": expected_shortfall,
    }))
}

fn handle_size(
    params: RiskParameters,
    price: f64,
    volatility: f64,
    risk: Option<f64>,
) -> Result<Value, String> {
    let manager = RiskManager::new(params).map_err(|e| e.to_string())?;
    let risk_per_trade = risk.unwrap_or(manager.params().max_portfolio_risk);
    let shares = manager
        .calculate_position_size_with_risk(price, volatility, risk_per_trade)
        .map_err(|e| e.to_string())?;

    Ok(json!({
        "price": price,
        "volatility": volatility,
        "risk_per_trade": risk_per_trade,
        "shares": shares,
        "value": shares * price,
        "capital": manager.ledger().current_equity(),
    }))
}

fn parse_returns(input: &str) -> Result<Vec<f64>, String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .map_err(|e| format!("Invalid return '{}': {}", s, e))
        })
        .collect()
}

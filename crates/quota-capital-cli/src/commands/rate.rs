use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use quota_capital_core::rate::solve;

use crate::input;

/// Arguments for the effective-rate solver
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct RateArgs {
    /// Path to a JSON/YAML file holding the cash-flow array
    #[arg(long)]
    pub input: Option<String>,

    /// Comma-separated cash flows, period 0 first (e.g. "425000,-5000,-5000")
    #[arg(long)]
    pub cash_flows: Option<String>,
}

pub fn run_rate(args: RateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let flows: Vec<Decimal> = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else if let Some(ref list) = args.cash_flows {
        list.split(',')
            .map(|s| Decimal::from_str(s.trim()).map_err(|e| format!("bad cash flow '{s}': {e}")))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        return Err("--cash-flows is required (or provide --input)".into());
    };

    let solution = solve(&flows);
    Ok(serde_json::to_value(solution)?)
}

use clap::Args;
use serde_json::Value;

use quota_capital_core::engine::{compute_all, EngineInput};

use crate::input;

/// Arguments for the full analysis
#[derive(Args)]
pub struct ComputeArgs {
    /// Path to a JSON/YAML engine request (deal, assets, selection)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_compute(args: ComputeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: EngineInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input is required (or pipe a request on stdin)".into());
    };

    // Surface a diagnostic instead of the engine's silent None.
    request.deal.validate()?;

    let output = compute_all(&request)
        .ok_or("deal is not configured: credit and term must be positive")?;
    Ok(serde_json::to_value(output)?)
}

use clap::{Args, ValueEnum};
use serde_json::Value;

use quota_capital_core::allocation::{CoverStrategy, MaximalFitInput, MinimalCoverInput};

use crate::input;

#[derive(Debug, Clone, ValueEnum)]
pub enum CoverStrategyArg {
    LargestFirst,
    SmallestFirst,
}

impl From<CoverStrategyArg> for CoverStrategy {
    fn from(arg: CoverStrategyArg) -> Self {
        match arg {
            CoverStrategyArg::LargestFirst => CoverStrategy::LargestFirst,
            CoverStrategyArg::SmallestFirst => CoverStrategy::SmallestFirst,
        }
    }
}

/// Arguments for minimal-cover selection
#[derive(Args)]
pub struct CoverArgs {
    /// Path to a JSON/YAML minimal-cover request (assets, peak, LTV)
    #[arg(long)]
    pub input: Option<String>,

    /// Override the greedy ordering from the request file
    #[arg(long)]
    pub strategy: Option<CoverStrategyArg>,
}

/// Arguments for maximal-fit selection
#[derive(Args)]
pub struct FitArgs {
    /// Path to a JSON/YAML maximal-fit request (quotas, peak, ceiling)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_cover(args: CoverArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request: MinimalCoverInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input is required (or pipe a request on stdin)".into());
    };

    if let Some(strategy) = args.strategy {
        request.strategy = strategy.into();
    }

    Ok(serde_json::to_value(request.run())?)
}

pub fn run_fit(args: FitArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: MaximalFitInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input is required (or pipe a request on stdin)".into());
    };

    Ok(serde_json::to_value(request.run())?)
}

use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use quota_capital_core::cashflow;
use quota_capital_core::deal::{AdminFeeMode, DealStructure, OneTimeCosts};
use quota_capital_core::schedule::{build_schedule, find_peak_balance, suggested_installment};

use crate::input;

#[derive(Debug, Clone, ValueEnum)]
pub enum AdminFeeModeArg {
    /// Annual effective rate
    Annual,
    /// Flat total over the whole term
    Flat,
}

impl From<AdminFeeModeArg> for AdminFeeMode {
    fn from(arg: AdminFeeModeArg) -> Self {
        match arg {
            AdminFeeModeArg::Annual => AdminFeeMode::AnnualRate,
            AdminFeeModeArg::Flat => AdminFeeMode::FlatTotal,
        }
    }
}

/// Deal fields as individual flags, for quick one-off runs without a file.
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct DealFlags {
    /// Consortium credit amount
    #[arg(long)]
    pub credit: Option<Decimal>,

    /// Entry payment deducted upfront from the credit
    #[arg(long)]
    pub entry: Option<Decimal>,

    /// Administration fee rate (decimal fraction, e.g. 0.012)
    #[arg(long)]
    pub admin_rate: Option<Decimal>,

    /// How the administration fee rate is expressed
    #[arg(long, default_value = "annual")]
    pub admin_mode: AdminFeeModeArg,

    /// Reserve fund rate over the credit
    #[arg(long)]
    pub reserve_rate: Option<Decimal>,

    /// Monthly insurance rate over the credit
    #[arg(long)]
    pub insurance_rate: Option<Decimal>,

    /// Total term in months
    #[arg(long)]
    pub term: Option<u32>,

    /// Fixed monthly installment
    #[arg(long)]
    pub installment: Option<Decimal>,

    /// First month an installment is charged (enables deferred start)
    #[arg(long)]
    pub start_month: Option<u32>,

    /// Resale discount ("deságio") rate over the credit
    #[arg(long, alias = "desagio")]
    pub discount_rate: Option<Decimal>,

    /// Intermediation fee rate over the credit
    #[arg(long)]
    pub intermediation_rate: Option<Decimal>,

    /// Sum of one-time costs (documentation, registration, taxes, ...)
    #[arg(long)]
    pub costs: Option<Decimal>,
}

impl DealFlags {
    fn into_deal(self) -> Result<DealStructure, Box<dyn std::error::Error>> {
        Ok(DealStructure {
            credit: self.credit.ok_or("--credit is required (or provide --input)")?,
            entry_payment: self.entry.unwrap_or(Decimal::ZERO),
            admin_fee_rate: self.admin_rate.unwrap_or(Decimal::ZERO),
            admin_fee_mode: self.admin_mode.into(),
            reserve_fund_rate: self.reserve_rate.unwrap_or(Decimal::ZERO),
            insurance_rate: self.insurance_rate.unwrap_or(Decimal::ZERO),
            term_months: self.term.ok_or("--term is required (or provide --input)")?,
            monthly_installment: self.installment.unwrap_or(Decimal::ZERO),
            deferred_start: self.start_month.is_some(),
            payment_start_month: self.start_month.unwrap_or(0),
            resale_discount_rate: self.discount_rate.unwrap_or(Decimal::ZERO),
            intermediation_rate: self.intermediation_rate.unwrap_or(Decimal::ZERO),
            costs: OneTimeCosts {
                other: self.costs.unwrap_or(Decimal::ZERO),
                ..OneTimeCosts::default()
            },
        })
    }
}

/// Arguments for the amortization schedule
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to a JSON/YAML deal file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub deal: DealFlags,
}

/// Arguments for the net-proceeds figure
#[derive(Args)]
pub struct ProceedsArgs {
    /// Path to a JSON/YAML deal file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub deal: DealFlags,
}

fn resolve_deal(
    input_path: Option<&str>,
    flags: DealFlags,
) -> Result<DealStructure, Box<dyn std::error::Error>> {
    let deal: DealStructure = if let Some(path) = input_path {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        flags.into_deal()?
    };
    deal.validate()?;
    Ok(deal)
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let deal = resolve_deal(args.input.as_deref(), args.deal)?;
    let schedule = build_schedule(&deal);
    let peak = find_peak_balance(&schedule);

    Ok(json!({
        "peak_balance": peak.value,
        "peak_month": peak.month,
        "suggested_installment": suggested_installment(&deal),
        "schedule": schedule,
    }))
}

pub fn run_proceeds(args: ProceedsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let deal = resolve_deal(args.input.as_deref(), args.deal)?;
    Ok(json!({ "net_proceeds": cashflow::net_proceeds(&deal) }))
}

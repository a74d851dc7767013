use std::time::Instant;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::allocation::{minimal_cover, CoverStrategy};
use crate::cashflow::{net_proceeds, project};
use crate::collateral::{
    coverage_ratio, valuate, within_limit, CollateralAsset, CollateralSelection,
};
use crate::deal::DealStructure;
use crate::rate::{solve, RateSolution};
use crate::schedule::{build_schedule, find_peak_balance, ScheduleRow};
use crate::types::{with_metadata, ComputationOutput, Money};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Everything a full analysis needs: the deal plus the collateral inventory
/// and the current pledge selection. Lots, vehicles and auto quotas all
/// travel in the one `assets` list; the sum type tells them apart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineInput {
    pub deal: DealStructure,
    #[serde(default)]
    pub assets: Vec<CollateralAsset>,
    pub selection: CollateralSelection,
}

/// The whole analysis, replaced wholesale on every recomputation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationResult {
    pub net_proceeds: Money,
    pub peak_balance: Money,
    pub peak_month: u32,
    pub guarantee_value: Money,
    pub ltv_ceiling: Money,
    /// Peak balance over ceiling, as a percentage (0 with no ceiling).
    pub coverage_ratio: Decimal,
    /// Assets a greedy minimal cover of the full inventory would pledge.
    pub min_assets_needed: usize,
    pub rate: RateSolution,
    pub within_limit: bool,
    pub schedule: Vec<ScheduleRow>,
    pub cash_flows: Vec<Money>,
    /// Advisory strings; never control flow.
    pub alerts: Vec<String>,
}

// ---------------------------------------------------------------------------
// Facade
// ---------------------------------------------------------------------------

/// Run the full analysis: schedule, cash flows, effective rate, collateral
/// sufficiency and the informational minimal cover, with alerts assembled at
/// the end.
///
/// Returns `None` when credit or term is non-positive: the "not configured
/// yet" state the UI shows before a deal is filled in. All other outcomes,
/// including unsolvable rates and insufficient collateral, come back as
/// tagged fields and alerts on a complete result.
pub fn compute_all(input: &EngineInput) -> Option<ComputationOutput<ComputationResult>> {
    let start = Instant::now();
    let deal = &input.deal;

    if deal.credit <= Decimal::ZERO || deal.term_months == 0 {
        return None;
    }

    let schedule = build_schedule(deal);
    let cash_flows = project(deal, &schedule);
    let proceeds = net_proceeds(deal);
    let rate = solve(&cash_flows);
    let peak = find_peak_balance(&schedule);

    let valuation = valuate(&input.assets, &input.selection);
    let within = within_limit(peak.value, valuation.ceiling);
    let cover = minimal_cover(
        &input.assets,
        peak.value,
        input.selection.ltv_max_percent,
        input.selection.criterion,
        CoverStrategy::default(),
    );

    let mut alerts = Vec::new();
    if !within {
        if cover.exhausted {
            alerts.push(format!(
                "Peak balance {} exceeds the guarantee ceiling {}; even the full inventory of {} asset(s) does not cover it (shortfall in slack: {})",
                peak.value,
                valuation.ceiling,
                cover.asset_ids.len(),
                cover.slack,
            ));
        } else {
            alerts.push(format!(
                "Peak balance {} exceeds the guarantee ceiling {}; a minimal cover needs {} asset(s) from the inventory",
                peak.value,
                valuation.ceiling,
                cover.asset_ids.len(),
            ));
        }
    }
    if proceeds <= Decimal::ZERO {
        alerts.push(format!(
            "Net proceeds {proceeds} are not positive; the operation raises no cash"
        ));
    }
    if !rate.converged {
        alerts.push(format!(
            "Effective rate did not converge ({}); rate figures are indicative only",
            rate.error.as_deref().unwrap_or("no detail"),
        ));
    }

    let result = ComputationResult {
        net_proceeds: proceeds,
        peak_balance: peak.value,
        peak_month: peak.month,
        guarantee_value: valuation.guarantee_value,
        ltv_ceiling: valuation.ceiling,
        coverage_ratio: coverage_ratio(peak.value, valuation.ceiling),
        min_assets_needed: cover.asset_ids.len(),
        rate,
        within_limit: within,
        schedule,
        cash_flows,
        alerts: alerts.clone(),
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Some(with_metadata(
        "Consortium Quota Capital-Raising Analysis",
        input,
        alerts,
        elapsed,
        result,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collateral::{Lot, ValuationCriterion, VehicleCollateral};
    use crate::deal::{AdminFeeMode, OneTimeCosts};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use std::collections::BTreeSet;

    fn deal() -> DealStructure {
        DealStructure {
            credit: dec!(500000),
            entry_payment: dec!(50000),
            admin_fee_rate: dec!(0.012),
            admin_fee_mode: AdminFeeMode::AnnualRate,
            reserve_fund_rate: Decimal::ZERO,
            insurance_rate: Decimal::ZERO,
            term_months: 120,
            monthly_installment: dec!(5000),
            deferred_start: false,
            payment_start_month: 0,
            resale_discount_rate: dec!(0.03),
            intermediation_rate: dec!(0.02),
            costs: OneTimeCosts::default(),
        }
    }

    fn single_lot_pool() -> Vec<CollateralAsset> {
        vec![CollateralAsset::Lot(Lot {
            id: "lot-1".into(),
            description: Some("Block A, lot 1".into()),
            market_value: dec!(600000),
            forced_sale_value: dec!(420000),
        })]
    }

    fn select_all(assets: &[CollateralAsset], ltv: Decimal) -> CollateralSelection {
        CollateralSelection {
            selected_ids: assets
                .iter()
                .map(|a| a.id().to_string())
                .collect::<BTreeSet<_>>(),
            criterion: ValuationCriterion::Market,
            ltv_max_percent: ltv,
        }
    }

    fn input() -> EngineInput {
        let assets = single_lot_pool();
        let selection = select_all(&assets, dec!(70));
        EngineInput {
            deal: deal(),
            assets,
            selection,
        }
    }

    #[test]
    fn test_reference_deal_end_to_end() {
        let output = compute_all(&input()).unwrap();
        let result = &output.result;

        assert_eq!(result.net_proceeds, dec!(425000));
        assert_eq!(result.peak_balance, dec!(450000));
        assert_eq!(result.peak_month, 0);
        assert_eq!(result.guarantee_value, dec!(600000));
        assert_eq!(result.ltv_ceiling, dec!(420000));
        assert!(!result.within_limit);
        assert_eq!(result.schedule.len(), 121);
        assert_eq!(result.cash_flows.len(), 121);
        assert!(result.rate.converged);
    }

    #[test]
    fn test_guard_returns_none() {
        let mut bad = input();
        bad.deal.credit = Decimal::ZERO;
        assert!(compute_all(&bad).is_none());

        let mut bad = input();
        bad.deal.term_months = 0;
        assert!(compute_all(&bad).is_none());
    }

    #[test]
    fn test_insufficient_collateral_scenario() {
        // Peak forced to 1000000 against a single 600000 lot at 70% LTV.
        let mut inp = input();
        inp.deal.credit = dec!(1050000);
        inp.deal.entry_payment = dec!(50000);
        inp.deal.monthly_installment = dec!(11000);

        let output = compute_all(&inp).unwrap();
        let result = &output.result;

        assert_eq!(result.peak_balance, dec!(1000000));
        assert_eq!(result.ltv_ceiling, dec!(420000));
        assert!(!result.within_limit);
        // The one-lot pool is exhausted without reaching the target.
        assert_eq!(result.min_assets_needed, 1);
        assert!(result
            .alerts
            .iter()
            .any(|a| a.contains("exceeds the guarantee ceiling")));
    }

    #[test]
    fn test_within_limit_has_no_cover_alert() {
        let mut inp = input();
        inp.deal.credit = dec!(300000);
        inp.deal.entry_payment = dec!(50000);
        inp.deal.monthly_installment = dec!(3000);

        let output = compute_all(&inp).unwrap();
        let result = &output.result;
        assert!(result.within_limit);
        assert!(!result
            .alerts
            .iter()
            .any(|a| a.contains("exceeds the guarantee ceiling")));
    }

    #[test]
    fn test_negative_proceeds_alert() {
        let mut inp = input();
        inp.deal.entry_payment = dec!(490000);
        let output = compute_all(&inp).unwrap();
        assert!(output
            .result
            .alerts
            .iter()
            .any(|a| a.contains("raises no cash")));
    }

    #[test]
    fn test_alerts_mirrored_into_envelope_warnings() {
        let mut inp = input();
        inp.deal.entry_payment = dec!(490000);
        let output = compute_all(&inp).unwrap();
        assert_eq!(output.warnings, output.result.alerts);
        assert_eq!(
            output.methodology,
            "Consortium Quota Capital-Raising Analysis"
        );
    }

    #[test]
    fn test_vehicle_collateral_counts() {
        let mut assets = single_lot_pool();
        assets.push(CollateralAsset::Vehicle(VehicleCollateral {
            id: "veh-1".into(),
            description: None,
            current_price: Some(dec!(75000)),
            base_price: None,
            manual_value: None,
            multiplier: dec!(1.3),
        }));
        let selection = select_all(&assets, dec!(70));
        let inp = EngineInput {
            deal: deal(),
            assets,
            selection,
        };
        let output = compute_all(&inp).unwrap();
        assert_eq!(output.result.guarantee_value, dec!(697500));
    }

    #[test]
    fn test_idempotent_recomputation() {
        let inp = input();
        let a = compute_all(&inp).unwrap();
        let b = compute_all(&inp).unwrap();
        assert_eq!(a.result.rate.rate, b.result.rate.rate);
        assert_eq!(a.result.rate.iterations, b.result.rate.iterations);
        assert_eq!(a.result.schedule, b.result.schedule);
        assert_eq!(a.result.alerts, b.result.alerts);
    }
}

use crate::deal::DealStructure;
use crate::schedule::ScheduleRow;
use crate::types::Money;

/// Cash the developer actually receives at disbursement: credit minus the
/// entry payment, one-time costs, resale discount and intermediation fee.
/// Can be negative; that is a flagged outcome, not an error.
pub fn net_proceeds(deal: &DealStructure) -> Money {
    deal.credit
        - deal.entry_payment
        - deal.costs.total()
        - deal.credit * deal.resale_discount_rate
        - deal.credit * deal.intermediation_rate
}

/// Signed cash-flow vector for the rate solver: net proceeds at period 0,
/// then the negative of each month's installment actually charged.
/// One-time costs landing in later months are not modeled.
pub fn project(deal: &DealStructure, schedule: &[ScheduleRow]) -> Vec<Money> {
    let mut flows = Vec::with_capacity(schedule.len());
    flows.push(net_proceeds(deal));
    for row in schedule.iter().filter(|r| r.month > 0) {
        flows.push(-row.installment);
    }
    flows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deal::{AdminFeeMode, OneTimeCosts};
    use crate::schedule::build_schedule;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

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

    #[test]
    fn test_net_proceeds_reference_deal() {
        // 500000 - 50000 - 0 - 15000 - 10000
        assert_eq!(net_proceeds(&deal()), dec!(425000));
    }

    #[test]
    fn test_net_proceeds_with_costs() {
        let mut d = deal();
        d.costs.documentation = dec!(2000);
        d.costs.commissions = dec!(8000);
        assert_eq!(net_proceeds(&d), dec!(415000));
    }

    #[test]
    fn test_net_proceeds_can_go_negative() {
        let mut d = deal();
        d.entry_payment = dec!(480000);
        assert!(net_proceeds(&d) < Decimal::ZERO);
    }

    #[test]
    fn test_projection_shape() {
        let d = deal();
        let schedule = build_schedule(&d);
        let flows = project(&d, &schedule);

        assert_eq!(flows.len(), 121);
        assert_eq!(flows[0], dec!(425000));
        for cf in &flows[1..] {
            assert_eq!(*cf, dec!(-5000));
        }
    }

    #[test]
    fn test_projection_respects_deferred_start() {
        let mut d = deal();
        d.deferred_start = true;
        d.payment_start_month = 7;
        let schedule = build_schedule(&d);
        let flows = project(&d, &schedule);

        for cf in &flows[1..7] {
            assert_eq!(*cf, Decimal::ZERO);
        }
        assert_eq!(flows[7], dec!(-5000));
    }
}

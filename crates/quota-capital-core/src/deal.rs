use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::types::{Money, Rate};
use crate::EngineResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How the administration fee rate is expressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminFeeMode {
    /// Annual effective rate, converted to monthly by `(1+a)^(1/12) - 1`.
    #[default]
    AnnualRate,
    /// Flat total over the whole term, spread linearly: `total / term`.
    FlatTotal,
}

/// One-time costs deducted from the credit at disbursement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OneTimeCosts {
    pub documentation: Money,
    pub registration: Money,
    pub transfer_tax: Money,
    pub commissions: Money,
    pub other: Money,
}

impl OneTimeCosts {
    pub fn total(&self) -> Money {
        self.documentation + self.registration + self.transfer_tax + self.commissions + self.other
    }
}

/// The structure of a quota monetization deal as configured by the developer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealStructure {
    /// Consortium credit amount being monetized.
    pub credit: Money,
    /// Entry payment deducted upfront from the credit (not an extra expense).
    #[serde(default)]
    pub entry_payment: Money,
    /// Administration fee, interpreted per `admin_fee_mode`.
    #[serde(default)]
    pub admin_fee_rate: Rate,
    #[serde(default)]
    pub admin_fee_mode: AdminFeeMode,
    /// Reserve fund contribution over the credit.
    #[serde(default)]
    pub reserve_fund_rate: Rate,
    /// Insurance charged monthly over the credit.
    #[serde(default)]
    pub insurance_rate: Rate,
    /// Total term in months.
    pub term_months: u32,
    /// Fixed monthly installment agreed with the administrator.
    #[serde(default)]
    pub monthly_installment: Money,
    /// When true, installments are only charged from `payment_start_month` on.
    #[serde(default)]
    pub deferred_start: bool,
    /// First month an installment is charged when `deferred_start` is set.
    #[serde(default)]
    pub payment_start_month: u32,
    /// Discount conceded when reselling the credit ("deságio").
    #[serde(default)]
    pub resale_discount_rate: Rate,
    /// Intermediation fee over the credit.
    #[serde(default)]
    pub intermediation_rate: Rate,
    /// Itemized one-time cost buckets.
    #[serde(default)]
    pub costs: OneTimeCosts,
}

// ---------------------------------------------------------------------------
// Validation and derived rates
// ---------------------------------------------------------------------------

impl DealStructure {
    /// Shape validation for callers that want a diagnostic instead of the
    /// engine's silent "not configured" degenerate results.
    pub fn validate(&self) -> EngineResult<()> {
        if self.credit <= Decimal::ZERO {
            return Err(EngineError::InvalidInput {
                field: "credit".into(),
                reason: "Credit amount must be positive".into(),
            });
        }

        if self.term_months == 0 {
            return Err(EngineError::InvalidInput {
                field: "term_months".into(),
                reason: "Term must be at least 1 month".into(),
            });
        }

        let rate_fields = [
            ("admin_fee_rate", self.admin_fee_rate),
            ("reserve_fund_rate", self.reserve_fund_rate),
            ("insurance_rate", self.insurance_rate),
            ("resale_discount_rate", self.resale_discount_rate),
            ("intermediation_rate", self.intermediation_rate),
        ];
        for (field, rate) in rate_fields {
            if rate < Decimal::ZERO {
                return Err(EngineError::InvalidInput {
                    field: field.into(),
                    reason: "Rate fields must be non-negative".into(),
                });
            }
        }

        if self.deferred_start && self.payment_start_month == 0 {
            return Err(EngineError::InvalidInput {
                field: "payment_start_month".into(),
                reason: "Deferred start requires a payment start month of at least 1".into(),
            });
        }

        Ok(())
    }

    /// Monthly administration rate implied by the fee mode.
    pub fn monthly_admin_rate(&self) -> Rate {
        match self.admin_fee_mode {
            AdminFeeMode::AnnualRate => {
                (Decimal::ONE + self.admin_fee_rate).powd(Decimal::ONE / dec!(12)) - Decimal::ONE
            }
            AdminFeeMode::FlatTotal => {
                if self.term_months == 0 {
                    Decimal::ZERO
                } else {
                    self.admin_fee_rate / Decimal::from(self.term_months)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn base_deal() -> DealStructure {
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
    fn test_validate_ok() {
        assert!(base_deal().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_credit() {
        let mut deal = base_deal();
        deal.credit = Decimal::ZERO;
        match deal.validate().unwrap_err() {
            EngineError::InvalidInput { field, .. } => assert_eq!(field, "credit"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_negative_rate() {
        let mut deal = base_deal();
        deal.intermediation_rate = dec!(-0.01);
        assert!(deal.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_deferred_without_start() {
        let mut deal = base_deal();
        deal.deferred_start = true;
        deal.payment_start_month = 0;
        assert!(deal.validate().is_err());
    }

    #[test]
    fn test_flat_total_monthly_rate() {
        let mut deal = base_deal();
        deal.admin_fee_mode = AdminFeeMode::FlatTotal;
        deal.admin_fee_rate = dec!(0.24);
        deal.term_months = 120;
        assert_eq!(deal.monthly_admin_rate(), dec!(0.002));
    }

    #[test]
    fn test_annual_monthly_rate_compounds_back() {
        let deal = base_deal();
        let monthly = deal.monthly_admin_rate();
        // (1 + monthly)^12 should recover the annual rate
        let annual = (Decimal::ONE + monthly).powd(dec!(12)) - Decimal::ONE;
        assert!((annual - dec!(0.012)).abs() < dec!(0.00001));
    }

    #[test]
    fn test_one_time_costs_total() {
        let costs = OneTimeCosts {
            documentation: dec!(1000),
            registration: dec!(2000),
            transfer_tax: dec!(3000),
            commissions: dec!(4000),
            other: dec!(500),
        };
        assert_eq!(costs.total(), dec!(10500));
    }
}

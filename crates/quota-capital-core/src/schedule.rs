use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::deal::{AdminFeeMode, DealStructure};
use crate::types::Money;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One month of the amortization table. Month 0 is the disbursement row:
/// the opening balance with no interest or installment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub month: u32,
    pub opening_balance: Money,
    pub interest: Money,
    /// Installment actually charged (zero before the start month on
    /// deferred-start deals).
    pub installment: Money,
    /// `installment - interest`; negative while the balance is accruing.
    pub amortization: Money,
    /// Clamped at zero: a paid-off balance stays paid off.
    pub closing_balance: Money,
}

impl ScheduleRow {
    fn zero() -> Self {
        ScheduleRow {
            month: 0,
            opening_balance: Decimal::ZERO,
            interest: Decimal::ZERO,
            installment: Decimal::ZERO,
            amortization: Decimal::ZERO,
            closing_balance: Decimal::ZERO,
        }
    }
}

/// Maximum outstanding balance across the schedule and the month it occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakBalance {
    pub value: Money,
    pub month: u32,
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// Build the month-by-month outstanding-balance table for a deal.
///
/// A non-positive term or credit yields a single degenerate zero row: the
/// deal simply has not been configured yet, which is not an error.
pub fn build_schedule(deal: &DealStructure) -> Vec<ScheduleRow> {
    if deal.term_months == 0 || deal.credit <= Decimal::ZERO {
        return vec![ScheduleRow::zero()];
    }

    let monthly_rate = deal.monthly_admin_rate();
    let opening = (deal.credit - deal.entry_payment).max(Decimal::ZERO);

    let mut rows = Vec::with_capacity(deal.term_months as usize + 1);
    rows.push(ScheduleRow {
        month: 0,
        opening_balance: opening,
        interest: Decimal::ZERO,
        installment: Decimal::ZERO,
        amortization: Decimal::ZERO,
        closing_balance: opening,
    });

    let mut balance = opening;
    for month in 1..=deal.term_months {
        let interest = balance * monthly_rate;
        let installment = if deal.deferred_start && month < deal.payment_start_month {
            Decimal::ZERO
        } else {
            deal.monthly_installment
        };
        let amortization = installment - interest;
        let closing = (balance - amortization).max(Decimal::ZERO);

        rows.push(ScheduleRow {
            month,
            opening_balance: balance,
            interest,
            installment,
            amortization,
            closing_balance: closing,
        });
        balance = closing;
    }

    rows
}

/// Linear max-scan over closing balances; first occurrence wins on ties.
pub fn find_peak_balance(schedule: &[ScheduleRow]) -> PeakBalance {
    let mut peak = PeakBalance {
        value: Decimal::ZERO,
        month: 0,
    };
    for row in schedule {
        if row.closing_balance > peak.value {
            peak = PeakBalance {
                value: row.closing_balance,
                month: row.month,
            };
        }
    }
    peak
}

/// Installment the consortium administrator would quote for the deal:
/// credit plus the administration and reserve-fund loads spread over the
/// term, plus the monthly insurance charge.
pub fn suggested_installment(deal: &DealStructure) -> Money {
    if deal.term_months == 0 || deal.credit <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let term = Decimal::from(deal.term_months);
    let admin_load = match deal.admin_fee_mode {
        AdminFeeMode::FlatTotal => deal.admin_fee_rate,
        AdminFeeMode::AnnualRate => deal.admin_fee_rate * term / dec!(12),
    };
    let funded = deal.credit * (Decimal::ONE + admin_load + deal.reserve_fund_rate);

    funded / term + deal.credit * deal.insurance_rate
}

use rust_decimal::prelude::Signed;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::types::{Money, Rate};

// ---------------------------------------------------------------------------
// Tolerances
// ---------------------------------------------------------------------------

/// Absolute NPV below which a candidate rate counts as a root.
pub const CONVERGENCE_TOLERANCE: Decimal = dec!(0.0000000001); // 1e-10
/// Looser residual accepted when bisection exhausts its iteration budget.
pub const RESIDUAL_TOLERANCE: Decimal = dec!(0.01);
pub const MAX_ITERATIONS: u32 = 100;
/// Admissible monthly-rate band, calibrated for consumer-credit deals.
pub const RATE_LOWER_BOUND: Decimal = dec!(-0.99);
pub const RATE_UPPER_BOUND: Decimal = dec!(2.00);

const NEWTON_INITIAL_GUESS: Decimal = dec!(0.01);
/// Step used when probing the band for a sign change.
const PROBE_STEP: Decimal = dec!(0.1);
/// Lower-bound extensions tried first when the band does not bracket a root.
const LOWER_EXTENSIONS: [Decimal; 2] = [dec!(-0.999), dec!(-0.9999)];
/// Upper-bound extensions tried when extending the lower side fails.
const UPPER_EXTENSIONS: [Decimal; 2] = [dec!(5.0), dec!(10.0)];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which procedure produced the reported rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolverMethod {
    NewtonRaphson,
    Bisection,
    /// No procedure ran (unsolvable input).
    None,
}

/// Result of an effective-rate solve. Always returned, never an `Err`:
/// unsolvable inputs come back with `converged = false` and an `error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateSolution {
    /// Per-period (monthly) effective rate.
    pub rate: Rate,
    /// `(1 + rate)^12 - 1`, monthly compounding convention.
    pub annual_rate: Rate,
    pub converged: bool,
    pub iterations: u32,
    pub method: SolverMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// NPV
// ---------------------------------------------------------------------------

/// Net Present Value of a cash-flow series at a per-period rate.
/// `None` when the rate is at or below -100% or an intermediate overflows.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> Option<Money> {
    let value = eval_npv(rate, cash_flows)?;
    if is_saturated(value) {
        return None;
    }
    Some(value)
}

/// NPV with overflow saturated to `Decimal::MAX`/`MIN` so bisection keeps a
/// usable sign where IEEE arithmetic would have produced a signed infinity.
fn eval_npv(rate: Rate, cash_flows: &[Money]) -> Option<Money> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }

    let mut total = Decimal::ZERO;
    let mut discount = Decimal::ONE; // 1/(1+r)^t
    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = match discount.checked_div(one_plus_r) {
                Some(d) => d,
                None => return Some(saturate(*cf)),
            };
        }
        let term = match cf.checked_mul(discount) {
            Some(v) => v,
            None => return Some(saturate(*cf)),
        };
        total = match total.checked_add(term) {
            Some(v) => v,
            None => return Some(saturate(term)),
        };
    }

    Some(total)
}

/// NPV and its derivative `d(NPV)/dr = Σ -t·cf[t]/(1+r)^(t+1)`.
/// `None` on any overflow: Newton-Raphson must then hand off to bisection.
fn eval_npv_derivative(rate: Rate, cash_flows: &[Money]) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }

    let mut npv_val = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;
    let mut discount = Decimal::ONE;
    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount.checked_div(one_plus_r)?;
        }
        npv_val = npv_val.checked_add(cf.checked_mul(discount)?)?;
        if t > 0 {
            let t_dec = Decimal::from(t as i64);
            let term = t_dec
                .checked_mul(*cf)?
                .checked_mul(discount)?
                .checked_div(one_plus_r)?;
            dnpv = dnpv.checked_sub(term)?;
        }
    }

    Some((npv_val, dnpv))
}

fn saturate(sign_source: Decimal) -> Decimal {
    if sign_source < Decimal::ZERO {
        Decimal::MIN
    } else {
        Decimal::MAX
    }
}

fn is_saturated(value: Decimal) -> bool {
    value == Decimal::MAX || value == Decimal::MIN
}

// ---------------------------------------------------------------------------
// Solver
// ---------------------------------------------------------------------------

/// Solve for the per-period rate making `NPV(cash_flows, r) = 0`.
///
/// Newton-Raphson from a fixed starting point is the primary method; any
/// numeric trouble (vanishing derivative, overflow, leaving the admissible
/// band, stalled progress) hands off to bisection over the band.
pub fn solve(cash_flows: &[Money]) -> RateSolution {
    if cash_flows.len() < 2 {
        return unsolvable("at least two cash flows are required");
    }

    let has_inflow = cash_flows.iter().any(|cf| *cf > Decimal::ZERO);
    let has_outflow = cash_flows.iter().any(|cf| *cf < Decimal::ZERO);
    if !has_inflow || !has_outflow {
        return unsolvable("cash flows must contain at least one inflow and one outflow");
    }

    let mut rate = NEWTON_INITIAL_GUESS;
    for i in 1..=MAX_ITERATIONS {
        let Some((npv_val, dnpv)) = eval_npv_derivative(rate, cash_flows) else {
            return bisect(cash_flows);
        };

        if npv_val.abs() < CONVERGENCE_TOLERANCE {
            return converged(rate, i, SolverMethod::NewtonRaphson);
        }

        if dnpv.abs() < CONVERGENCE_TOLERANCE {
            return bisect(cash_flows);
        }

        let Some(step) = npv_val.checked_div(dnpv) else {
            return bisect(cash_flows);
        };
        let Some(next) = rate.checked_sub(step) else {
            return bisect(cash_flows);
        };

        if next < RATE_LOWER_BOUND || next > RATE_UPPER_BOUND {
            return bisect(cash_flows);
        }

        // Stalled: the step no longer moves the rate but the residual is
        // still material.
        if step.abs() < CONVERGENCE_TOLERANCE && npv_val.abs() >= RESIDUAL_TOLERANCE {
            return bisect(cash_flows);
        }

        rate = next;
    }

    bisect(cash_flows)
}

fn bisect(cash_flows: &[Money]) -> RateSolution {
    let mut lo = RATE_LOWER_BOUND;
    let mut hi = RATE_UPPER_BOUND;
    let Some(mut f_lo) = eval_npv(lo, cash_flows) else {
        return unsolvable("NPV is not evaluable at the lower rate bound");
    };
    let Some(f_hi) = eval_npv(hi, cash_flows) else {
        return unsolvable("NPV is not evaluable at the upper rate bound");
    };

    if !brackets(f_lo, f_hi) {
        match widen_bracket(cash_flows, f_lo, f_hi) {
            Some((new_lo, new_hi, new_f_lo)) => {
                lo = new_lo;
                hi = new_hi;
                f_lo = new_f_lo;
            }
            None => {
                return unsolvable_via(
                    SolverMethod::Bisection,
                    "no sign change found within the admissible rate band",
                );
            }
        }
    }

    for i in 1..=MAX_ITERATIONS {
        let mid = (lo + hi) / dec!(2);
        let Some(f_mid) = eval_npv(mid, cash_flows) else {
            return unsolvable_via(SolverMethod::Bisection, "NPV is not evaluable at the midpoint");
        };

        if f_mid.abs() < CONVERGENCE_TOLERANCE || (hi - lo).abs() < CONVERGENCE_TOLERANCE {
            return converged(mid, i, SolverMethod::Bisection);
        }

        if brackets(f_lo, f_mid) {
            hi = mid;
        } else {
            lo = mid;
            f_lo = f_mid;
        }
    }

    // Budget exhausted: accept the midpoint if its residual is small enough.
    let mid = (lo + hi) / dec!(2);
    let residual = eval_npv(mid, cash_flows).unwrap_or(Decimal::MAX);
    if residual.abs() < RESIDUAL_TOLERANCE {
        return converged(mid, MAX_ITERATIONS, SolverMethod::Bisection);
    }

    RateSolution {
        rate: mid,
        annual_rate: annualize(mid),
        converged: false,
        iterations: MAX_ITERATIONS,
        method: SolverMethod::Bisection,
        error: Some(
            EngineError::ConvergenceFailure {
                method: "bisection".into(),
                iterations: MAX_ITERATIONS,
                residual,
            }
            .to_string(),
        ),
    }
}

/// True when `a` and `b` have opposite signs (or either is a root).
fn brackets(a: Decimal, b: Decimal) -> bool {
    a.signum() * b.signum() <= Decimal::ZERO
}

/// Extend the band until it brackets a sign change: lower side first, then
/// the upper side, then a coarse probe across the original band.
fn widen_bracket(
    cash_flows: &[Money],
    f_lo: Decimal,
    f_hi: Decimal,
) -> Option<(Decimal, Decimal, Decimal)> {
    for cand in LOWER_EXTENSIONS {
        if let Some(f_cand) = eval_npv(cand, cash_flows) {
            if brackets(f_cand, f_hi) {
                return Some((cand, RATE_UPPER_BOUND, f_cand));
            }
        }
    }

    for cand in UPPER_EXTENSIONS {
        if let Some(f_cand) = eval_npv(cand, cash_flows) {
            if brackets(f_lo, f_cand) {
                return Some((RATE_LOWER_BOUND, cand, f_lo));
            }
        }
    }

    // Coarse scan for a sign change between adjacent probes.
    let mut prev_rate = RATE_LOWER_BOUND;
    let mut prev_val = f_lo;
    let mut r = RATE_LOWER_BOUND + PROBE_STEP;
    while r <= RATE_UPPER_BOUND {
        if let Some(val) = eval_npv(r, cash_flows) {
            if brackets(prev_val, val) {
                return Some((prev_rate, r, prev_val));
            }
            prev_rate = r;
            prev_val = val;
        }
        r += PROBE_STEP;
    }

    None
}

fn annualize(monthly: Rate) -> Rate {
    (Decimal::ONE + monthly).powd(dec!(12)) - Decimal::ONE
}

fn converged(rate: Rate, iterations: u32, method: SolverMethod) -> RateSolution {
    RateSolution {
        rate,
        annual_rate: annualize(rate),
        converged: true,
        iterations,
        method,
        error: None,
    }
}

fn unsolvable(reason: &str) -> RateSolution {
    unsolvable_via(SolverMethod::None, reason)
}

fn unsolvable_via(method: SolverMethod, reason: &str) -> RateSolution {
    RateSolution {
        rate: Decimal::ZERO,
        annual_rate: Decimal::ZERO,
        converged: false,
        iterations: 0,
        method,
        error: Some(EngineError::UnsolvableCashFlow(reason.into()).to_string()),
    }
}

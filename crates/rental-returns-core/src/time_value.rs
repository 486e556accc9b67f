use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::RentalReturnsError;
use crate::types::{with_metadata, ComputationOutput, Money, Multiple, Rate};
use crate::RentalReturnsResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const MAX_IRR_ITERATIONS: u32 = 50;
const DEFAULT_IRR_GUESS: Decimal = dec!(0.10);

// ---------------------------------------------------------------------------
// Compounding helpers
// ---------------------------------------------------------------------------

/// Compute (1 + r)^n via iterative multiplication, `None` on overflow.
pub fn checked_compound(rate: Rate, n: u32) -> Option<Decimal> {
    let factor = Decimal::ONE.checked_add(rate)?;
    let mut result = Decimal::ONE;
    for _ in 0..n {
        result = result.checked_mul(factor)?;
    }
    Some(result)
}

/// Compute (1 + r)^n via iterative multiplication (avoids Decimal::powd drift).
///
/// Saturates at `Decimal::MAX` for growth factors too large to represent.
pub fn compound(rate: Rate, n: u32) -> Decimal {
    checked_compound(rate, n).unwrap_or(Decimal::MAX)
}

/// Level annual payment retiring `principal` over `periods` at `rate`:
/// `A = P·r / (1 − (1+r)^−n)`, or `P / n` when the rate is zero.
///
/// Returns zero for an empty term. When `(1+r)^n` overflows the discount
/// term vanishes and the payment converges to the interest coupon `P·r`.
pub fn annuity_payment(principal: Money, rate: Rate, periods: u32) -> Money {
    if periods == 0 {
        return Decimal::ZERO;
    }
    if rate.is_zero() {
        return principal / Decimal::from(periods);
    }

    let discount = checked_compound(rate, periods)
        .and_then(|growth| Decimal::ONE.checked_div(growth))
        .unwrap_or(Decimal::ZERO);
    let annuity_factor = Decimal::ONE - discount;

    (principal * rate)
        .checked_div(annuity_factor)
        .unwrap_or(principal * rate)
}

// ---------------------------------------------------------------------------
// NPV / IRR
// ---------------------------------------------------------------------------

/// Net Present Value of a series of annual cash flows (index 0 undiscounted).
pub fn npv(rate: Rate, cash_flows: &[Money]) -> RentalReturnsResult<Money> {
    if rate <= dec!(-1) {
        return Err(RentalReturnsError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let one_plus_r = Decimal::ONE + rate;
    let mut result = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount.checked_mul(one_plus_r).ok_or_else(|| {
                RentalReturnsError::DivisionByZero {
                    context: format!("NPV discount factor overflow at period {t}"),
                }
            })?;
        }
        result = cf
            .checked_div(discount)
            .and_then(|pv| result.checked_add(pv))
            .ok_or_else(|| RentalReturnsError::DivisionByZero {
                context: format!("NPV term overflow at period {t}"),
            })?;
    }

    Ok(result)
}

/// Internal Rate of Return with the standard 10% starting guess.
///
/// Returns `None` when the rate is not computable: the solver stalls on a
/// zero derivative, a step overflows, or 50 iterations pass without the step
/// shrinking below 1e-7.
pub fn irr(cash_flows: &[Money]) -> Option<Rate> {
    irr_with_guess(cash_flows, DEFAULT_IRR_GUESS)
}

/// Newton-Raphson IRR from an explicit starting guess.
///
/// Convergence is judged on the step size `|x₁ − x₀|`, not on the residual
/// NPV, and the converged value is the post-step rate.
pub fn irr_with_guess(cash_flows: &[Money], guess: Rate) -> Option<Rate> {
    let mut rate = guess;

    for i in 0..MAX_IRR_ITERATIONS {
        let next = npv_and_derivative(cash_flows, rate).and_then(|(f, df)| {
            let step = f.checked_div(df)?;
            rate.checked_sub(step)
        });

        let Some(next) = next else {
            warn!(iteration = i, %rate, "IRR step not finite; rate not computable");
            return None;
        };

        let delta = next.checked_sub(rate)?.abs();
        if delta < CONVERGENCE_THRESHOLD {
            debug!(iterations = i + 1, irr = %next, "IRR converged");
            return Some(next);
        }

        rate = next;
    }

    warn!(
        iterations = MAX_IRR_ITERATIONS,
        last_rate = %rate,
        "IRR did not converge; rate not computable"
    );
    None
}

/// NPV(r) = Σ CF_t / (1+r)^t and its derivative Σ −t·CF_t / (1+r)^(t+1).
///
/// `None` when a discount factor reaches zero or any term overflows.
fn npv_and_derivative(cash_flows: &[Money], rate: Rate) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE.checked_add(rate)?;
    let mut f = Decimal::ZERO;
    let mut df = Decimal::ZERO;
    let mut discount = Decimal::ONE; // (1+r)^0

    for (t, cf) in cash_flows.iter().enumerate() {
        f = f.checked_add(cf.checked_div(discount)?)?;
        if t > 0 {
            let t_dec = Decimal::from(t as u64);
            let term = (-t_dec)
                .checked_mul(*cf)?
                .checked_div(discount.checked_mul(one_plus_r)?)?;
            df = df.checked_add(term)?;
        }
        discount = discount.checked_mul(one_plus_r)?;
    }

    Some((f, df))
}

/// Sum of positive entries over the magnitude of the initial outlay.
///
/// `None` unless `cash_flows[0]` is a strictly negative investment, or when
/// the distributions overflow.
pub fn equity_multiple(cash_flows: &[Money]) -> Option<Multiple> {
    let first = *cash_flows.first()?;
    if first >= Decimal::ZERO {
        return None;
    }
    let distributions = cash_flows
        .iter()
        .filter(|cf| **cf > Decimal::ZERO)
        .try_fold(Decimal::ZERO, |acc, cf| acc.checked_add(*cf))?;
    distributions.checked_div(-first)
}

// ---------------------------------------------------------------------------
// Standalone IRR analysis
// ---------------------------------------------------------------------------

/// Input for a standalone IRR analysis over annual cash flows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrInput {
    /// Annual cash flows, index 0 = initial investment (negative)
    pub cash_flows: Vec<Money>,
    /// Starting guess for Newton-Raphson (defaults to 10%)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guess: Option<Rate>,
}

/// Output of a standalone IRR analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrOutput {
    /// Internal rate of return, `null` when not computable
    pub irr: Option<Rate>,
    /// NPV re-evaluated at the solved IRR (residual, ideally ~0)
    pub npv_at_irr: Option<Money>,
    /// Positive distributions / initial outlay
    pub equity_multiple: Option<Multiple>,
    /// Sum of negative flows (absolute)
    pub total_invested: Money,
    /// Sum of positive flows
    pub total_returned: Money,
    /// Number of annual periods after t=0
    pub periods: u32,
}

/// Solve the IRR of an arbitrary annual series and report supporting metrics.
pub fn irr_series(input: &IrrInput) -> RentalReturnsResult<ComputationOutput<IrrOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.cash_flows.len() < 2 {
        return Err(RentalReturnsError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }
    if let Some(guess) = input.guess {
        if guess <= dec!(-1) {
            return Err(RentalReturnsError::InvalidInput {
                field: "guess".into(),
                reason: "IRR guess must be greater than -100%".into(),
            });
        }
    }

    let has_outflow = input.cash_flows.iter().any(|cf| *cf < Decimal::ZERO);
    let has_inflow = input.cash_flows.iter().any(|cf| *cf > Decimal::ZERO);
    if !(has_outflow && has_inflow) {
        warnings.push("Cash flows do not change sign; IRR is undefined".into());
    }

    let irr = irr_with_guess(&input.cash_flows, input.guess.unwrap_or(DEFAULT_IRR_GUESS));
    if irr.is_none() {
        warnings.push("IRR not computable: solver did not converge".into());
    }

    let npv_at_irr = irr
        .filter(|r| *r > dec!(-1))
        .and_then(|r| npv(r, &input.cash_flows).ok());

    let total_invested = checked_total(
        input
            .cash_flows
            .iter()
            .filter(|cf| cf.is_sign_negative())
            .map(|cf| cf.abs()),
    )?;
    let total_returned = checked_total(
        input
            .cash_flows
            .iter()
            .filter(|cf| **cf > Decimal::ZERO)
            .copied(),
    )?;

    let output = IrrOutput {
        irr,
        npv_at_irr,
        equity_multiple: equity_multiple(&input.cash_flows),
        total_invested,
        total_returned,
        periods: (input.cash_flows.len() - 1) as u32,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Newton-Raphson IRR (annual periods)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

fn checked_total(flows: impl Iterator<Item = Money>) -> RentalReturnsResult<Money> {
    let mut total = Decimal::ZERO;
    for cf in flows {
        total = total
            .checked_add(cf)
            .ok_or_else(|| RentalReturnsError::InvalidInput {
                field: "cash_flows".into(),
                reason: "Cash-flow totals exceed the representable range".into(),
            })?;
    }
    Ok(total)
}

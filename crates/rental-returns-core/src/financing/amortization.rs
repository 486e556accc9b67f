use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::RentalReturnsError;
use crate::time_value::{annuity_payment, checked_compound};
use crate::types::*;
use crate::RentalReturnsResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Terms of a single annually-amortizing loan.
///
/// `interest_only_years` never exceeds `amort_years`; [`LoanTerms::new`]
/// clamps it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    /// Amount borrowed
    pub principal: Money,
    /// Annual interest rate (0.065 = 6.5%)
    pub annual_rate: Rate,
    /// Full term in years, including any interest-only years
    pub amort_years: u32,
    /// Leading years during which only interest is paid
    pub interest_only_years: u32,
}

impl LoanTerms {
    pub fn new(principal: Money, annual_rate: Rate, amort_years: u32, interest_only_years: u32) -> Self {
        Self {
            principal,
            annual_rate,
            amort_years,
            interest_only_years: interest_only_years.min(amort_years),
        }
    }

    /// Years over which principal is actually retired.
    pub fn amortizing_years(&self) -> u32 {
        self.amort_years.saturating_sub(self.interest_only_years)
    }
}

/// Annual amortization engine for one loan.
///
/// A pure function of its terms: every query is answered from the closed-form
/// annuity balance, so years may be asked for in any order. A loan with a
/// non-positive principal answers zero everywhere.
#[derive(Debug, Clone)]
pub struct Loan {
    terms: LoanTerms,
    payment: Money,
}

impl Loan {
    pub fn new(terms: LoanTerms) -> Self {
        let payment = if terms.principal > Decimal::ZERO {
            annuity_payment(terms.principal, terms.annual_rate, terms.amortizing_years())
        } else {
            Decimal::ZERO
        };
        Self { terms, payment }
    }

    /// Build a loan only when something was actually borrowed.
    pub fn optional(terms: LoanTerms) -> Option<Self> {
        if terms.principal > Decimal::ZERO {
            Some(Self::new(terms))
        } else {
            None
        }
    }

    pub fn terms(&self) -> &LoanTerms {
        &self.terms
    }

    /// Level payment charged once the interest-only phase ends.
    pub fn amortizing_payment(&self) -> Money {
        self.payment
    }

    /// Coupon charged during the interest-only phase.
    pub fn interest_only_payment(&self) -> Money {
        if self.terms.principal > Decimal::ZERO {
            self.terms.principal * self.terms.annual_rate
        } else {
            Decimal::ZERO
        }
    }

    fn is_interest_only(&self, year: u32) -> bool {
        year <= self.terms.interest_only_years
    }

    /// Total payment (principal + interest) due in `year` (1-based).
    ///
    /// The amortizing payment stays constant for every post-IO year, including
    /// years past the end of the term.
    pub fn annual_debt_service(&self, year: u32) -> Money {
        let p = self.terms.principal;
        if p <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        if self.is_interest_only(year) {
            return self.interest_only_payment();
        }
        self.payment
    }

    /// Outstanding balance at the end of `year`; year 0 is the funding date.
    pub fn balance_end_of_year(&self, year: u32) -> Money {
        let p = self.terms.principal;
        if p <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        if self.is_interest_only(year) {
            return p;
        }

        let remaining = self.terms.amortizing_years();
        if remaining == 0 {
            // Interest-only for the whole term: the balloon stays outstanding.
            return p;
        }

        let j = year - self.terms.interest_only_years;
        if j >= remaining {
            return Decimal::ZERO;
        }

        let r = self.terms.annual_rate;
        if r.is_zero() {
            let balance = p - (p / Decimal::from(remaining)) * Decimal::from(j);
            return balance.max(Decimal::ZERO);
        }

        // B_j = P(1+r)^j − A((1+r)^j − 1)/r
        let balance = checked_compound(r, j).and_then(|growth| {
            let accrued = p.checked_mul(growth)?;
            let paid = self
                .payment
                .checked_mul(growth - Decimal::ONE)?
                .checked_div(r)?;
            accrued.checked_sub(paid)
        });

        // Growth beyond Decimal range means A ≈ P·r, which leaves P untouched.
        balance.unwrap_or(p).max(Decimal::ZERO)
    }

    /// Principal retired during `year`; zero throughout the interest-only phase.
    pub fn principal_paid_year(&self, year: u32) -> Money {
        if self.terms.principal <= Decimal::ZERO || self.is_interest_only(year) {
            return Decimal::ZERO;
        }
        let opening = self.balance_end_of_year(year - 1);
        let closing = self.balance_end_of_year(year);
        (opening - closing).max(Decimal::ZERO)
    }

    /// Interest component of `year`'s debt service.
    pub fn interest_paid_year(&self, year: u32) -> Money {
        self.annual_debt_service(year) - self.principal_paid_year(year)
    }
}

// ---------------------------------------------------------------------------
// Schedule builder
// ---------------------------------------------------------------------------

/// Input for a standalone loan amortization schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationScheduleInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub principal: Money,
    pub annual_rate: Rate,
    pub amort_years: u32,
    #[serde(default)]
    pub interest_only_years: u32,
    /// Number of years to tabulate (defaults to the full term)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years: Option<u32>,
}

/// A single year in the amortization schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationPeriod {
    pub year: u32,
    pub opening_balance: Money,
    pub debt_service: Money,
    pub interest: Money,
    pub principal_paid: Money,
    pub closing_balance: Money,
    pub is_interest_only: bool,
}

/// Output for a single loan amortization schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationScheduleOutput {
    pub loan_name: String,
    pub terms: LoanTerms,
    pub interest_only_payment: Money,
    pub amortizing_payment: Money,
    pub periods: Vec<AmortizationPeriod>,
    pub total_debt_service: Money,
    pub total_interest_paid: Money,
    pub total_principal_paid: Money,
}

/// Build a year-by-year amortization schedule for a single loan.
pub fn build_amortization_schedule(
    input: &AmortizationScheduleInput,
) -> RentalReturnsResult<ComputationOutput<AmortizationScheduleOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.principal <= Decimal::ZERO {
        return Err(RentalReturnsError::InvalidInput {
            field: "principal".into(),
            reason: "Loan principal must be positive".into(),
        });
    }
    if input.principal > MAX_MONEY_MAGNITUDE {
        return Err(RentalReturnsError::InvalidInput {
            field: "principal".into(),
            reason: format!("Loan principal must not exceed {MAX_MONEY_MAGNITUDE}"),
        });
    }
    if input.annual_rate < Decimal::ZERO || input.annual_rate > Decimal::ONE {
        return Err(RentalReturnsError::InvalidInput {
            field: "annual_rate".into(),
            reason: "Annual rate must be between 0 and 1".into(),
        });
    }
    if input.amort_years == 0 {
        return Err(RentalReturnsError::InvalidInput {
            field: "amort_years".into(),
            reason: "Amortization term must be at least 1 year".into(),
        });
    }

    if input.interest_only_years > input.amort_years {
        warnings.push(format!(
            "Interest-only period of {} years clamped to the {}-year term",
            input.interest_only_years, input.amort_years
        ));
    }

    let terms = LoanTerms::new(
        input.principal,
        input.annual_rate,
        input.amort_years,
        input.interest_only_years,
    );
    let loan = Loan::new(terms.clone());

    let years = input.years.unwrap_or(input.amort_years);
    if years > input.amort_years {
        warnings.push(format!(
            "Schedule runs {} years past the term; payments continue at the level amount",
            years - input.amort_years
        ));
    }

    let mut periods = Vec::with_capacity(years as usize);
    let mut total_debt_service = Decimal::ZERO;
    let mut total_interest_paid = Decimal::ZERO;
    let mut total_principal_paid = Decimal::ZERO;

    for year in 1..=years {
        let debt_service = loan.annual_debt_service(year);
        let principal_paid = loan.principal_paid_year(year);
        let interest = debt_service - principal_paid;

        total_debt_service += debt_service;
        total_interest_paid += interest;
        total_principal_paid += principal_paid;

        periods.push(AmortizationPeriod {
            year,
            opening_balance: loan.balance_end_of_year(year - 1),
            debt_service,
            interest,
            principal_paid,
            closing_balance: loan.balance_end_of_year(year),
            is_interest_only: year <= terms.interest_only_years,
        });
    }

    let output = AmortizationScheduleOutput {
        loan_name: input.name.clone().unwrap_or_else(|| "Loan".into()),
        interest_only_payment: loan.interest_only_payment(),
        amortizing_payment: loan.amortizing_payment(),
        terms,
        periods,
        total_debt_service,
        total_interest_paid,
        total_principal_paid,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Annual Annuity Amortization with Interest-Only Phase",
        input,
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn loan(principal: Decimal, rate: Decimal, years: u32, io: u32) -> Loan {
        Loan::new(LoanTerms::new(principal, rate, years, io))
    }

    #[test]
    fn test_io_clamped_to_term() {
        let terms = LoanTerms::new(dec!(1000), dec!(0.05), 5, 9);
        assert_eq!(terms.interest_only_years, 5);
        assert_eq!(terms.amortizing_years(), 0);
    }

    #[test]
    fn test_interest_only_phase() {
        // 800k at 5%, 30-year term, 3 years interest-only
        let l = loan(dec!(800000), dec!(0.05), 30, 3);
        for year in 1..=3 {
            assert_eq!(l.annual_debt_service(year), dec!(40000));
            assert_eq!(l.balance_end_of_year(year), dec!(800000));
            assert_eq!(l.principal_paid_year(year), Decimal::ZERO);
        }
        assert!(l.balance_end_of_year(4) < l.balance_end_of_year(3));
        assert!(l.annual_debt_service(4) > dec!(40000));
    }

    #[test]
    fn test_fully_amortizes_at_term() {
        let l = loan(dec!(500000), dec!(0.065), 25, 0);
        assert_eq!(l.balance_end_of_year(25), Decimal::ZERO);
        assert!(l.balance_end_of_year(24) > Decimal::ZERO);
    }

    #[test]
    fn test_first_year_principal_matches_payment_split() {
        // Year 1: interest = P·r, principal = A − P·r
        let l = loan(dec!(100000), dec!(0.05), 30, 0);
        let expected = l.amortizing_payment() - dec!(5000);
        assert!((l.principal_paid_year(1) - expected).abs() < dec!(0.0001));
        assert!((l.interest_paid_year(1) - dec!(5000)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_zero_rate_straight_line() {
        let l = loan(dec!(120000), Decimal::ZERO, 12, 2);
        assert_eq!(l.annual_debt_service(1), Decimal::ZERO);
        assert_eq!(l.annual_debt_service(3), dec!(12000));
        assert_eq!(l.balance_end_of_year(3), dec!(108000));
        assert_eq!(l.balance_end_of_year(7), dec!(60000));
        assert_eq!(l.principal_paid_year(7), dec!(12000));
        assert_eq!(l.balance_end_of_year(12), Decimal::ZERO);
    }

    #[test]
    fn test_zero_principal_is_noop() {
        let l = loan(Decimal::ZERO, dec!(0.05), 30, 2);
        for year in [1, 2, 3, 30] {
            assert_eq!(l.annual_debt_service(year), Decimal::ZERO);
            assert_eq!(l.balance_end_of_year(year), Decimal::ZERO);
            assert_eq!(l.principal_paid_year(year), Decimal::ZERO);
        }
        assert!(Loan::optional(LoanTerms::new(Decimal::ZERO, dec!(0.05), 30, 0)).is_none());
        assert!(Loan::optional(LoanTerms::new(dec!(-5), dec!(0.05), 30, 0)).is_none());
    }

    #[test]
    fn test_past_term_payments_continue_balance_zero() {
        let l = loan(dec!(10000), dec!(0.05), 5, 0);
        assert_eq!(l.annual_debt_service(8), l.amortizing_payment());
        assert_eq!(l.balance_end_of_year(8), Decimal::ZERO);
        assert_eq!(l.principal_paid_year(8), Decimal::ZERO);
    }

    #[test]
    fn test_full_term_interest_only_keeps_balloon() {
        let l = loan(dec!(10000), dec!(0.05), 5, 5);
        assert_eq!(l.annual_debt_service(5), dec!(500));
        assert_eq!(l.balance_end_of_year(5), dec!(10000));
        assert_eq!(l.annual_debt_service(6), Decimal::ZERO);
        assert_eq!(l.balance_end_of_year(6), dec!(10000));
    }

    #[test]
    fn test_schedule_totals() {
        let input = AmortizationScheduleInput {
            name: Some("First Mortgage".into()),
            principal: dec!(200000),
            annual_rate: dec!(0.06),
            amort_years: 20,
            interest_only_years: 2,
            years: None,
        };
        let result = build_amortization_schedule(&input).unwrap();
        let sched = &result.result;

        assert_eq!(sched.loan_name, "First Mortgage");
        assert_eq!(sched.periods.len(), 20);
        assert!(sched.periods[0].is_interest_only);
        assert!(!sched.periods[2].is_interest_only);
        assert_eq!(sched.periods[0].interest, dec!(12000));
        assert_eq!(sched.periods[19].closing_balance, Decimal::ZERO);
        assert!((sched.total_principal_paid - dec!(200000)).abs() < dec!(0.01));
        let split = sched.total_interest_paid + sched.total_principal_paid;
        assert!((sched.total_debt_service - split).abs() < dec!(0.000001));
        for w in sched.periods.windows(2) {
            assert_eq!(w[0].closing_balance, w[1].opening_balance);
        }
    }

    #[test]
    fn test_schedule_rejects_bad_terms() {
        let mut input = AmortizationScheduleInput {
            name: None,
            principal: dec!(1000),
            annual_rate: dec!(0.05),
            amort_years: 0,
            interest_only_years: 0,
            years: None,
        };
        assert!(build_amortization_schedule(&input).is_err());

        input.amort_years = 10;
        input.principal = Decimal::ZERO;
        assert!(build_amortization_schedule(&input).is_err());

        input.principal = dec!(1000);
        input.annual_rate = dec!(-0.01);
        assert!(build_amortization_schedule(&input).is_err());

        input.annual_rate = dec!(1.5);
        assert!(build_amortization_schedule(&input).is_err());

        input.annual_rate = dec!(0.05);
        input.principal = MAX_MONEY_MAGNITUDE + Decimal::ONE;
        assert!(build_amortization_schedule(&input).is_err());
    }

    #[test]
    fn test_schedule_at_money_ceiling_completes() {
        let input = AmortizationScheduleInput {
            name: None,
            principal: MAX_MONEY_MAGNITUDE,
            annual_rate: Decimal::ONE,
            amort_years: 60,
            interest_only_years: 10,
            years: Some(80),
        };
        let out = build_amortization_schedule(&input).unwrap();
        assert_eq!(out.result.periods.len(), 80);
        assert_eq!(out.result.periods[79].closing_balance, Decimal::ZERO);
    }

    #[test]
    fn test_schedule_warns_on_clamp_and_overrun() {
        let input = AmortizationScheduleInput {
            name: None,
            principal: dec!(1000),
            annual_rate: dec!(0.05),
            amort_years: 5,
            interest_only_years: 7,
            years: Some(8),
        };
        let result = build_amortization_schedule(&input).unwrap();
        assert_eq!(result.result.periods.len(), 8);
        assert!(result.warnings.iter().any(|w| w.contains("clamped")));
        assert!(result.warnings.iter().any(|w| w.contains("past the term")));
    }

    // --- Properties ---

    fn principal_strategy() -> impl Strategy<Value = Decimal> {
        (1_000u64..5_000_000u64).prop_map(Decimal::from)
    }

    fn rate_strategy() -> impl Strategy<Value = Decimal> {
        // 0.01% .. 15.00% in basis points
        (1u32..1500u32).prop_map(|bp| Decimal::from(bp) / Decimal::from(10_000))
    }

    proptest! {
        #[test]
        fn prop_balance_zero_at_term(p in principal_strategy(), r in rate_strategy(), n in 1u32..40) {
            let l = loan(p, r, n, 0);
            prop_assert_eq!(l.balance_end_of_year(n), Decimal::ZERO);
        }

        #[test]
        fn prop_io_years_hold_principal(p in principal_strategy(), r in rate_strategy(), n in 2u32..40, k in 0u32..40) {
            let l = loan(p, r, n, k);
            let k = k.min(n);
            for year in 1..=k {
                prop_assert_eq!(l.balance_end_of_year(year), p);
                prop_assert_eq!(l.principal_paid_year(year), Decimal::ZERO);
            }
        }

        #[test]
        fn prop_zero_rate_equal_increments(p in principal_strategy(), n in 1u32..40, k in 0u32..10) {
            let l = loan(p, Decimal::ZERO, n, k);
            let k = k.min(n);
            let remaining = n - k;
            prop_assume!(remaining > 1);
            let step = p / Decimal::from(remaining);
            for year in (k + 1)..n {
                let drop = l.balance_end_of_year(year - 1) - l.balance_end_of_year(year);
                prop_assert!((drop - step).abs() < dec!(0.000001));
            }
        }

        #[test]
        fn prop_principal_sums_to_loan(p in principal_strategy(), r in rate_strategy(), n in 1u32..40, k in 0u32..10) {
            let l = loan(p, r, n, k);
            let k = k.min(n);
            prop_assume!(k < n);
            let total: Decimal = ((k + 1)..=n).map(|y| l.principal_paid_year(y)).sum();
            prop_assert!((total - p).abs() < dec!(0.0001), "sum {} vs {}", total, p);
        }
    }
}

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use super::input::CashflowInput;
use super::normalize::{normalize, NormalizedInput};
use super::projection::{project, YearRow};
use super::returns::cash_series;
use super::year_one::{year_one_kpis, YearOneKpis};
use crate::error::RentalReturnsError;
use crate::financing::amortization::LoanTerms;
use crate::financing::debt_stack::DebtStack;
use crate::time_value::{equity_multiple, irr};
use crate::types::{with_metadata, ComputationOutput, Money, Multiple, Rate, MAX_MONEY_MAGNITUDE};
use crate::RentalReturnsResult;

/// Longest supported hold period, in years.
pub const MAX_HOLD_YEARS: u32 = 50;

const DSCR_WARNING_THRESHOLD: Decimal = dec!(1.20);
const LTV_WARNING_THRESHOLD: Decimal = dec!(0.80);
const VACANCY_WARNING_THRESHOLD: Decimal = dec!(0.15);

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Year-1 KPIs plus whole-hold returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashflowSummary {
    #[serde(flatten)]
    pub year_one: YearOneKpis,
    /// Internal rate of return on the equity cash series
    pub irr: Option<Rate>,
    pub equity_multiple: Option<Multiple>,
    pub sale_proceeds_net: Money,
    pub sale_costs: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashflowOutput {
    pub summary: CashflowSummary,
    /// One row per held year, in order
    pub projection: Vec<YearRow>,
    /// `hold_years + 1` signed flows; index 0 is the closing outlay
    pub cash_series: Vec<Money>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run a full buy-hold-sell analysis of a rental property.
///
/// Absent fields take their defaults, year-1 KPIs are derived from the
/// operating statement and debt stack, the hold is projected year by year
/// with a sale in the final year, and the IRR is solved over the resulting
/// equity cash series.
pub fn analyze_cashflow(
    input: &CashflowInput,
) -> RentalReturnsResult<ComputationOutput<CashflowOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;
    let n = normalize(input);
    check_loan_terms(input, &n, &mut warnings);

    let debt = DebtStack::new(
        n.first_loan.clone(),
        n.second_loan.clone(),
        n.other_financing_annual(),
    );
    debug!(
        hold_years = n.hold_years,
        loans = debt.loan_count(),
        "starting cash-flow analysis"
    );

    // --- Year 1 ---
    let year_one = year_one_kpis(&n, &debt);
    check_year_one(&n, &year_one, &mut warnings);

    // --- Hold period & exit ---
    let projection = project(&n, &debt);
    let series = cash_series(year_one.cash_to_close, &projection);

    // --- Returns ---
    let irr = irr(&series);
    if irr.is_none() {
        warnings.push(
            "IRR not computable: solver did not converge or hit a zero derivative".into(),
        );
    }
    let multiple = equity_multiple(&series);

    debug!(
        irr = ?irr,
        equity_multiple = ?multiple,
        net_sale = %projection.exit.net_sale_proceeds,
        "cash-flow analysis complete"
    );

    let output = CashflowOutput {
        summary: CashflowSummary {
            year_one,
            irr,
            equity_multiple: multiple,
            sale_proceeds_net: projection.exit.net_sale_proceeds,
            sale_costs: projection.exit.sale_costs,
        },
        projection: projection.rows,
        cash_series: series,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Rental Cash-Flow Projection with Newton-Raphson IRR",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_input(input: &CashflowInput) -> RentalReturnsResult<()> {
    if let Some(hold) = input.hold_years {
        if hold == 0 || hold > MAX_HOLD_YEARS {
            return Err(RentalReturnsError::InvalidInput {
                field: "hold_years".into(),
                reason: format!("Hold period must be between 1 and {MAX_HOLD_YEARS} years"),
            });
        }
    }

    for (field, value) in input.money_fields() {
        require_money(field, value)?;
    }

    for (field, value) in [
        ("vacancy_rate", input.vacancy_rate),
        ("management_rate", input.management_rate),
        ("repairs_rate", input.repairs_rate),
        ("exit_cost_rate", input.exit_cost_rate),
        ("first_rate_annual", input.first_rate_annual),
        ("second_rate_annual", input.second_rate_annual),
    ] {
        require_fraction(field, value)?;
    }

    for (field, value) in [
        ("rent_growth", input.rent_growth),
        ("expense_growth", input.expense_growth),
        ("annual_appreciation", input.annual_appreciation),
    ] {
        require_growth_rate(field, value)?;
    }

    require_loan("first", input.first_principal, input.first_amort_years)?;
    require_loan("second", input.second_principal, input.second_amort_years)?;

    Ok(())
}

fn require_money(field: &str, value: Option<Money>) -> RentalReturnsResult<()> {
    match value {
        Some(v) if v.abs() > MAX_MONEY_MAGNITUDE => Err(RentalReturnsError::InvalidInput {
            field: field.into(),
            reason: format!("Amount must not exceed {MAX_MONEY_MAGNITUDE} in magnitude"),
        }),
        _ => Ok(()),
    }
}

fn require_fraction(field: &str, value: Option<Rate>) -> RentalReturnsResult<()> {
    match value {
        Some(v) if v < Decimal::ZERO || v > Decimal::ONE => Err(RentalReturnsError::InvalidInput {
            field: field.into(),
            reason: "Rate must be between 0 and 1".into(),
        }),
        _ => Ok(()),
    }
}

fn require_growth_rate(field: &str, value: Option<Rate>) -> RentalReturnsResult<()> {
    match value {
        Some(v) if v <= dec!(-1) || v > Decimal::ONE => Err(RentalReturnsError::InvalidInput {
            field: field.into(),
            reason: "Growth rate must be greater than -100% and at most 100%".into(),
        }),
        _ => Ok(()),
    }
}

fn require_loan(
    which: &str,
    principal: Option<Money>,
    amort_years: Option<u32>,
) -> RentalReturnsResult<()> {
    let principal = principal.unwrap_or(Decimal::ZERO);
    if principal < Decimal::ZERO {
        return Err(RentalReturnsError::InvalidInput {
            field: format!("{which}_principal"),
            reason: "Loan principal cannot be negative".into(),
        });
    }
    if principal > Decimal::ZERO && amort_years == Some(0) {
        return Err(RentalReturnsError::InvalidInput {
            field: format!("{which}_amort_years"),
            reason: "Amortization term must be at least 1 year".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Advisory warnings
// ---------------------------------------------------------------------------

fn check_loan_terms(input: &CashflowInput, n: &NormalizedInput, warnings: &mut Vec<String>) {
    let loans = [
        ("First", input.first_interest_only_years, &n.first_loan),
        ("Second", input.second_interest_only_years, &n.second_loan),
    ];
    for (label, requested_io, terms) in loans {
        if terms.principal <= Decimal::ZERO {
            continue;
        }
        if requested_io.is_some_and(|io| io > terms.amort_years) {
            warnings.push(format!(
                "{label} loan interest-only period clamped to its {}-year term",
                terms.amort_years
            ));
        }
        if n.hold_years > terms.amort_years {
            warnings.push(hold_past_term_warning(label, terms));
        }
    }
}

fn hold_past_term_warning(label: &str, terms: &LoanTerms) -> String {
    format!(
        "{label} loan: hold period exceeds the {}-year amortization term; \
         payments continue at the annuity amount with a zero balance",
        terms.amort_years
    )
}

fn check_year_one(n: &NormalizedInput, kpis: &YearOneKpis, warnings: &mut Vec<String>) {
    if let Some(dscr) = kpis.dscr_y1 {
        if dscr < DSCR_WARNING_THRESHOLD {
            warnings.push(format!(
                "Year-1 DSCR of {:.2}x is below the {DSCR_WARNING_THRESHOLD}x lender threshold",
                dscr
            ));
        }
    }
    if let Some(ltv) = kpis.ltv_fmv {
        if ltv > LTV_WARNING_THRESHOLD {
            warnings.push(format!(
                "Loan-to-value of {:.1}% exceeds 80%",
                ltv * dec!(100)
            ));
        }
    }
    if n.vacancy_rate > VACANCY_WARNING_THRESHOLD {
        warnings.push(format!(
            "Vacancy rate of {:.1}% is above 15%",
            n.vacancy_rate * dec!(100)
        ));
    }
    if kpis.cash_to_close <= Decimal::ZERO {
        warnings.push(
            "Cash to close is zero or negative: cash-on-cash, ROI and equity multiple are not computable"
                .into(),
        );
    }
    if kpis.noi_y1 < Decimal::ZERO {
        warnings.push(format!("Year-1 NOI is negative ({})", kpis.noi_y1.round_dp(2)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cashflow::input::ManagementBase;

    fn levered_input() -> CashflowInput {
        CashflowInput {
            fmv: Some(dec!(1200000)),
            offer_price: Some(dec!(1000000)),
            annual_appreciation: Some(dec!(0.03)),
            gross_rents_annual: Some(dec!(120000)),
            number_of_units: Some(10),
            vacancy_rate: Some(dec!(0.05)),
            management_rate: Some(dec!(0.08)),
            property_taxes: Some(dec!(14000)),
            insurance: Some(dec!(3000)),
            first_principal: Some(dec!(750000)),
            first_rate_annual: Some(dec!(0.05)),
            lender_fee: Some(dec!(7500)),
            hold_years: Some(7),
            rent_growth: Some(dec!(0.02)),
            expense_growth: Some(dec!(0.02)),
            exit_cost_rate: Some(dec!(0.05)),
            ..Default::default()
        }
    }

    #[test]
    fn test_end_to_end_shape() {
        let out = analyze_cashflow(&levered_input()).unwrap();
        let r = &out.result;
        assert_eq!(r.projection.len(), 7);
        assert_eq!(r.cash_series.len(), 8);
        assert_eq!(r.cash_series[0], -r.summary.year_one.cash_to_close);
        assert_eq!(r.summary.year_one.cash_to_close, dec!(257500));
        assert!(r.summary.irr.is_some());
        assert!(r.summary.equity_multiple.unwrap() > Decimal::ONE);
        assert_eq!(out.methodology, "Rental Cash-Flow Projection with Newton-Raphson IRR");
    }

    #[test]
    fn test_final_flow_includes_sale() {
        let out = analyze_cashflow(&levered_input()).unwrap();
        let r = &out.result;
        let last = r.projection.last().unwrap();
        assert_eq!(
            *r.cash_series.last().unwrap(),
            last.cash_flow_before_tax + r.summary.sale_proceeds_net
        );
        assert_eq!(r.summary.sale_costs, last.property_value * dec!(0.05));
    }

    #[test]
    fn test_empty_input_runs_with_defaults() {
        let out = analyze_cashflow(&CashflowInput::default()).unwrap();
        let r = &out.result;
        assert_eq!(r.projection.len(), 10);
        assert_eq!(r.summary.irr, None);
        assert_eq!(r.summary.equity_multiple, None);
        assert_eq!(r.summary.year_one.dscr_y1, None);
        assert!(out.warnings.iter().any(|w| w.contains("Cash to close")));
        assert!(out.warnings.iter().any(|w| w.contains("IRR not computable")));
    }

    #[test]
    fn test_rejects_zero_hold() {
        let mut input = levered_input();
        input.hold_years = Some(0);
        let err = analyze_cashflow(&input).unwrap_err();
        assert!(err.to_string().contains("hold_years"));
    }

    #[test]
    fn test_rejects_out_of_range_rates() {
        let mut input = levered_input();
        input.vacancy_rate = Some(dec!(1.2));
        assert!(analyze_cashflow(&input).is_err());

        let mut input = levered_input();
        input.rent_growth = Some(dec!(-1));
        assert!(analyze_cashflow(&input).is_err());

        let mut input = levered_input();
        input.first_rate_annual = Some(dec!(-0.01));
        assert!(analyze_cashflow(&input).is_err());
    }

    #[test]
    fn test_rejects_negative_principal_and_zero_term() {
        let mut input = levered_input();
        input.second_principal = Some(dec!(-1));
        assert!(analyze_cashflow(&input).is_err());

        let mut input = levered_input();
        input.first_amort_years = Some(0);
        assert!(analyze_cashflow(&input).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_amounts() {
        let mut input = levered_input();
        input.property_taxes = Some("50000000000000000000000000000".parse().unwrap());
        input.insurance = Some("50000000000000000000000000000".parse().unwrap());
        let err = analyze_cashflow(&input).unwrap_err();
        assert!(err.to_string().contains("property_taxes"));

        let mut input = levered_input();
        input.other_income_annual = Some(-(MAX_MONEY_MAGNITUDE + Decimal::ONE));
        assert!(analyze_cashflow(&input).is_err());
    }

    #[test]
    fn test_extreme_growth_at_money_ceiling_completes() {
        let input = CashflowInput {
            offer_price: Some(MAX_MONEY_MAGNITUDE),
            fmv: Some(MAX_MONEY_MAGNITUDE),
            annual_appreciation: Some(Decimal::ONE),
            gross_rents_annual: Some(MAX_MONEY_MAGNITUDE),
            parking_annual: Some(MAX_MONEY_MAGNITUDE),
            storage_annual: Some(MAX_MONEY_MAGNITUDE),
            laundry_vending_annual: Some(MAX_MONEY_MAGNITUDE),
            other_income_annual: Some(MAX_MONEY_MAGNITUDE),
            management_rate: Some(Decimal::ONE),
            repairs_rate: Some(Decimal::ONE),
            property_taxes: Some(MAX_MONEY_MAGNITUDE),
            insurance: Some(MAX_MONEY_MAGNITUDE),
            other_expenses: Some(MAX_MONEY_MAGNITUDE),
            first_principal: Some(MAX_MONEY_MAGNITUDE),
            first_rate_annual: Some(Decimal::ONE),
            second_principal: Some(MAX_MONEY_MAGNITUDE),
            second_rate_annual: Some(Decimal::ONE),
            other_monthly_financing_costs: Some(MAX_MONEY_MAGNITUDE),
            hold_years: Some(MAX_HOLD_YEARS),
            rent_growth: Some(Decimal::ONE),
            expense_growth: Some(Decimal::ONE),
            exit_cost_rate: Some(Decimal::ONE),
            ..Default::default()
        };
        let out = analyze_cashflow(&input).unwrap();
        assert_eq!(out.result.projection.len(), 50);
        assert_eq!(out.result.cash_series.len(), 51);

        let mut appreciating = CashflowInput {
            offer_price: Some(MAX_MONEY_MAGNITUDE),
            annual_appreciation: Some(Decimal::ONE),
            hold_years: Some(MAX_HOLD_YEARS),
            ..Default::default()
        };
        let out = analyze_cashflow(&appreciating).unwrap();
        assert!(out.result.summary.sale_proceeds_net > MAX_MONEY_MAGNITUDE);

        appreciating.offer_price = Some(dec!(100000000000000));
        assert!(analyze_cashflow(&appreciating).is_err());
    }

    #[test]
    fn test_risk_warnings() {
        let mut input = levered_input();
        input.first_principal = Some(dec!(1000000));
        input.vacancy_rate = Some(dec!(0.20));
        let out = analyze_cashflow(&input).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("DSCR")));
        assert!(out.warnings.iter().any(|w| w.contains("Loan-to-value")));
        assert!(out.warnings.iter().any(|w| w.contains("Vacancy rate")));
    }

    #[test]
    fn test_loan_term_warnings() {
        let mut input = levered_input();
        input.first_amort_years = Some(5);
        input.first_interest_only_years = Some(8);
        let out = analyze_cashflow(&input).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("clamped")));
        assert!(out.warnings.iter().any(|w| w.contains("exceeds the 5-year")));
    }

    #[test]
    fn test_negative_noi_warning() {
        let mut input = levered_input();
        input.property_taxes = Some(dec!(200000));
        let out = analyze_cashflow(&input).unwrap();
        assert!(out.result.summary.year_one.noi_y1 < Decimal::ZERO);
        assert!(out.warnings.iter().any(|w| w.contains("NOI is negative")));
    }

    #[test]
    fn test_management_base_changes_noi() {
        let egi = analyze_cashflow(&levered_input()).unwrap();
        let mut input = levered_input();
        input.management_base = Some(ManagementBase::GrossRents);
        let gross = analyze_cashflow(&input).unwrap();
        // gross rents exceed EGI, so the fee is larger
        assert!(gross.result.summary.year_one.noi_y1 < egi.result.summary.year_one.noi_y1);
    }

    #[test]
    fn test_summary_serializes_flat_with_nulls() {
        let out = analyze_cashflow(&CashflowInput::default()).unwrap();
        let json = serde_json::to_value(&out.result.summary).unwrap();
        assert!(json.get("noi_y1").is_some());
        assert!(json.get("year_one").is_none());
        assert!(json["dscr_y1"].is_null());
        assert!(json["irr"].is_null());
    }
}

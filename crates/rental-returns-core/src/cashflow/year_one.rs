use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::input::ManagementBase;
use super::normalize::NormalizedInput;
use crate::financing::debt_stack::DebtStack;
use crate::time_value::compound;
use crate::types::{ratio, Money, Multiple, Rate};

// ---------------------------------------------------------------------------
// Operating statement
// ---------------------------------------------------------------------------

/// Income and operating-expense stack for a single year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatingStatement {
    pub total_income: Money,
    /// Always ≤ 0
    pub vacancy_loss: Money,
    pub egi: Money,
    pub management: Money,
    pub repairs_rate_based: Money,
    pub flat_opex: Money,
    pub total_expenses: Money,
    pub noi: Money,
}

impl OperatingStatement {
    /// Build the stack for `year` (1-based).
    ///
    /// Income streams grow at `rent_growth` and the flat expense block at
    /// `expense_growth`, both from year 1. Management and repairs are not
    /// grown directly: they are re-derived each year as rate × grown base.
    pub fn for_year(n: &NormalizedInput, year: u32) -> Self {
        let elapsed = year.saturating_sub(1);
        let income_growth = compound(n.rent_growth, elapsed);
        let expense_growth = compound(n.expense_growth, elapsed);

        let total_income = n.total_income() * income_growth;
        let vacancy_loss = -(total_income * n.vacancy_rate);
        let egi = total_income + vacancy_loss;

        let gross_rents = n.gross_rents * income_growth;
        let management_base = match n.management_base {
            ManagementBase::Egi => egi,
            ManagementBase::GrossRents => gross_rents,
        };
        let management = n.management_rate * management_base.max(Decimal::ZERO);
        let repairs_rate_based = n.repairs_rate * gross_rents;
        let flat_opex = n.flat_opex * expense_growth;

        let total_expenses = management + repairs_rate_based + flat_opex;
        let noi = egi - total_expenses;

        Self {
            total_income,
            vacancy_loss,
            egi,
            management,
            repairs_rate_based,
            flat_opex,
            total_expenses,
            noi,
        }
    }
}

// ---------------------------------------------------------------------------
// Year-1 KPIs
// ---------------------------------------------------------------------------

/// One-shot year-1 profitability, coverage and valuation ratios.
///
/// Every `Option` is `None` when its denominator is ≤ 0 or a required input
/// is missing; nothing is coerced to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearOneKpis {
    /// Real purchase price (offer + closing/rehab)
    pub rpp: Money,
    pub cash_to_close: Money,

    pub total_income_y1: Money,
    pub vacancy_loss_y1: Money,
    pub egi_y1: Money,
    pub management_y1: Money,
    pub repairs_rate_based_y1: Money,
    pub flat_opex_y1: Money,
    pub total_expenses_y1: Money,
    pub noi_y1: Money,

    pub annual_debt_service_y1: Money,
    pub dscr_y1: Option<Multiple>,

    pub cap_rate_pp_y1: Option<Rate>,
    pub cap_rate_fmv_y1: Option<Rate>,
    pub grm_y1: Option<Multiple>,
    pub avg_rent_per_unit_y1: Option<Money>,
    pub monthly_profit_y1: Money,
    pub cashflow_per_unit_per_month_y1: Option<Money>,

    pub ltv_fmv: Option<Rate>,
    pub ltpp_pp: Option<Rate>,
    pub cash_on_cash_y1: Option<Rate>,
    pub equity_roi_y1: Option<Rate>,
    pub appreciation_roi_y1: Option<Rate>,
    pub total_roi_y1: Option<Rate>,
    pub forced_appreciation_roi_y1: Option<Rate>,
}

/// Compute the year-1 income stack and every year-1 KPI.
pub fn year_one_kpis(n: &NormalizedInput, debt: &DebtStack) -> YearOneKpis {
    let stmt = OperatingStatement::for_year(n, 1);
    let debt_service = debt.debt_service(1);
    let rpp = n.real_purchase_price();
    let cash_to_close = n.cash_to_close();
    let units = Decimal::from(n.number_of_units);
    let twelve = Decimal::from(12);

    let cash_flow = stmt.noi - debt_service;
    let monthly_profit = cash_flow / twelve;

    let avg_rent_per_unit = if n.gross_rents > Decimal::ZERO {
        ratio(n.gross_rents / twelve, units)
    } else {
        None
    };

    let cash_on_cash = ratio(cash_flow, cash_to_close);
    let equity_roi = ratio(debt.principal_paid(1), cash_to_close);
    let appreciation_roi = if n.fmv > Decimal::ZERO {
        ratio(n.fmv * n.annual_appreciation, cash_to_close)
    } else {
        None
    };
    let total_roi = sum_present(&[cash_on_cash, equity_roi, appreciation_roi]);

    YearOneKpis {
        rpp,
        cash_to_close,
        total_income_y1: stmt.total_income,
        vacancy_loss_y1: stmt.vacancy_loss,
        egi_y1: stmt.egi,
        management_y1: stmt.management,
        repairs_rate_based_y1: stmt.repairs_rate_based,
        flat_opex_y1: stmt.flat_opex,
        total_expenses_y1: stmt.total_expenses,
        noi_y1: stmt.noi,
        annual_debt_service_y1: debt_service,
        dscr_y1: ratio(stmt.noi, debt_service),
        cap_rate_pp_y1: ratio(stmt.noi, n.offer_price),
        cap_rate_fmv_y1: ratio(stmt.noi, n.fmv),
        grm_y1: ratio(n.offer_price, n.gross_rents),
        avg_rent_per_unit_y1: avg_rent_per_unit,
        monthly_profit_y1: monthly_profit,
        cashflow_per_unit_per_month_y1: ratio(monthly_profit, units),
        ltv_fmv: ratio(n.first_loan.principal, n.fmv),
        ltpp_pp: ratio(n.first_loan.principal, n.offer_price),
        cash_on_cash_y1: cash_on_cash,
        equity_roi_y1: equity_roi,
        appreciation_roi_y1: appreciation_roi,
        total_roi_y1: total_roi,
        forced_appreciation_roi_y1: ratio(n.fmv - rpp, cash_to_close),
    }
}

/// Sum the present terms; `None` when every term is absent or the sum
/// overflows.
fn sum_present(terms: &[Option<Decimal>]) -> Option<Decimal> {
    let mut present = terms.iter().flatten().copied();
    let first = present.next()?;
    present.try_fold(first, |acc, v| acc.checked_add(v))
}

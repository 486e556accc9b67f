use serde::{Deserialize, Serialize};

use super::exit::ExitSale;
use super::normalize::NormalizedInput;
use super::year_one::OperatingStatement;
use crate::financing::debt_stack::DebtStack;
use crate::time_value::compound;
use crate::types::Money;

/// One held year of the projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearRow {
    /// 1-based
    pub year: u32,
    pub total_income: Money,
    pub vacancy_loss: Money,
    pub egi: Money,
    pub management: Money,
    pub repairs_rate_based: Money,
    pub flat_opex: Money,
    pub total_expenses: Money,
    pub noi: Money,
    pub debt_service: Money,
    pub cash_flow_before_tax: Money,
    pub ending_balance_first: Money,
    pub ending_balance_second: Money,
    pub principal_paid: Money,
    pub property_value: Money,
}

/// Year rows for the whole hold plus the terminal-year sale.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub rows: Vec<YearRow>,
    pub exit: ExitSale,
}

/// Project years `1..=hold_years`, selling at the end of the last one.
///
/// Property value compounds from the purchase date (`^y`) while income and
/// expenses compound from the year-1 baseline (`^(y-1)`).
pub fn project(n: &NormalizedInput, debt: &DebtStack) -> Projection {
    let mut rows = Vec::with_capacity(n.hold_years as usize);
    let mut exit = ExitSale::at(n.offer_price, n.exit_cost_rate, Money::ZERO);

    for year in 1..=n.hold_years {
        let stmt = OperatingStatement::for_year(n, year);
        let debt_service = debt.debt_service(year);
        let (ending_balance_first, ending_balance_second) = debt.balances(year);
        let property_value = n.offer_price * compound(n.annual_appreciation, year);

        if year == n.hold_years {
            exit = ExitSale::at(
                property_value,
                n.exit_cost_rate,
                ending_balance_first + ending_balance_second,
            );
        }

        rows.push(YearRow {
            year,
            total_income: stmt.total_income,
            vacancy_loss: stmt.vacancy_loss,
            egi: stmt.egi,
            management: stmt.management,
            repairs_rate_based: stmt.repairs_rate_based,
            flat_opex: stmt.flat_opex,
            total_expenses: stmt.total_expenses,
            noi: stmt.noi,
            debt_service,
            cash_flow_before_tax: stmt.noi - debt_service,
            ending_balance_first,
            ending_balance_second,
            principal_paid: debt.principal_paid(year),
            property_value,
        });
    }

    Projection { rows, exit }
}

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::input::{CashflowInput, ManagementBase};
use crate::financing::amortization::LoanTerms;
use crate::types::{Money, Rate};

pub const DEFAULT_HOLD_YEARS: u32 = 10;
pub const DEFAULT_FIRST_AMORT_YEARS: u32 = 30;
pub const DEFAULT_SECOND_AMORT_YEARS: u32 = 20;
pub const DEFAULT_INTEREST_ONLY_YEARS: u32 = 0;

/// Fully-populated analysis assumptions.
///
/// Built once from a [`CashflowInput`]; every downstream calculation reads
/// from here instead of re-applying defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedInput {
    pub fmv: Money,
    pub offer_price: Money,
    pub annual_appreciation: Rate,

    pub gross_rents: Money,
    pub number_of_units: u32,
    pub parking: Money,
    pub storage: Money,
    pub laundry_vending: Money,
    pub other_income: Money,

    pub vacancy_rate: Rate,
    pub management_rate: Rate,
    pub repairs_rate: Rate,
    pub management_base: ManagementBase,

    /// Sum of every flat annual operating expense
    pub flat_opex: Money,

    pub first_loan: LoanTerms,
    pub second_loan: LoanTerms,
    pub other_monthly_financing: Money,

    /// Sum of closing and rehab costs
    pub closing_costs: Money,

    pub hold_years: u32,
    pub rent_growth: Rate,
    pub expense_growth: Rate,
    pub exit_cost_rate: Rate,
}

impl NormalizedInput {
    /// Year-1 total income across all streams.
    pub fn total_income(&self) -> Money {
        self.gross_rents + self.parking + self.storage + self.laundry_vending + self.other_income
    }

    /// Real purchase price: offer price plus closing and rehab costs.
    pub fn real_purchase_price(&self) -> Money {
        self.offer_price + self.closing_costs
    }

    /// Equity required at closing after both loans fund.
    pub fn cash_to_close(&self) -> Money {
        self.real_purchase_price() - self.first_loan.principal - self.second_loan.principal
    }

    pub fn other_financing_annual(&self) -> Money {
        self.other_monthly_financing * Decimal::from(12)
    }
}

fn nz(value: Option<Money>) -> Money {
    value.unwrap_or(Decimal::ZERO)
}

fn sum(values: &[Option<Money>]) -> Money {
    values.iter().map(|v| nz(*v)).sum()
}

/// Substitute defaults for every absent field. Total: never fails.
pub fn normalize(input: &CashflowInput) -> NormalizedInput {
    let flat_opex = sum(&[
        input.property_taxes,
        input.insurance,
        input.electricity,
        input.gas,
        input.water_sewer,
        input.cable,
        input.caretaking,
        input.advertising,
        input.association_fees,
        input.pest,
        input.security,
        input.trash,
        input.misc,
        input.common_area_maintenance,
        input.capital_improvements,
        input.accounting,
        input.legal,
        input.bad_debts,
        input.evictions,
        input.other_expenses,
    ]);

    let closing_costs = sum(&[
        input.repairs,
        input.repairs_contingency,
        input.lender_fee,
        input.broker_fee,
        input.environmentals,
        input.inspections,
        input.appraisals,
        input.transfer_tax,
        input.legal_close,
        input.other_closing_costs,
    ]);

    let first_loan = LoanTerms::new(
        nz(input.first_principal),
        nz(input.first_rate_annual),
        input.first_amort_years.unwrap_or(DEFAULT_FIRST_AMORT_YEARS),
        input
            .first_interest_only_years
            .unwrap_or(DEFAULT_INTEREST_ONLY_YEARS),
    );
    let second_loan = LoanTerms::new(
        nz(input.second_principal),
        nz(input.second_rate_annual),
        input.second_amort_years.unwrap_or(DEFAULT_SECOND_AMORT_YEARS),
        input
            .second_interest_only_years
            .unwrap_or(DEFAULT_INTEREST_ONLY_YEARS),
    );

    NormalizedInput {
        fmv: nz(input.fmv),
        offer_price: nz(input.offer_price),
        annual_appreciation: nz(input.annual_appreciation),
        gross_rents: nz(input.gross_rents_annual),
        number_of_units: input.number_of_units.unwrap_or(0),
        parking: nz(input.parking_annual),
        storage: nz(input.storage_annual),
        laundry_vending: nz(input.laundry_vending_annual),
        other_income: nz(input.other_income_annual),
        vacancy_rate: nz(input.vacancy_rate),
        management_rate: nz(input.management_rate),
        repairs_rate: nz(input.repairs_rate),
        management_base: input.management_base.unwrap_or_default(),
        flat_opex,
        first_loan,
        second_loan,
        other_monthly_financing: nz(input.other_monthly_financing_costs),
        closing_costs,
        hold_years: input.hold_years.unwrap_or(DEFAULT_HOLD_YEARS),
        rent_growth: nz(input.rent_growth),
        expense_growth: nz(input.expense_growth),
        exit_cost_rate: nz(input.exit_cost_rate),
    }
}

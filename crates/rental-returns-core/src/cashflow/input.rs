use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::{Money, Rate};
use crate::RentalReturnsResult;

/// Basis on which the property-management fee is charged.
///
/// Deserializes through [`FromStr`], so JSON requests accept the same
/// case-insensitive spellings as the CLI flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum ManagementBase {
    /// Effective gross income (total income less vacancy)
    #[default]
    #[serde(rename = "EGI")]
    Egi,
    /// Scheduled gross rents only, before vacancy and ancillary income
    #[serde(rename = "GROSS_RENTS")]
    GrossRents,
}

impl TryFrom<String> for ManagementBase {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for ManagementBase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "EGI" => Ok(ManagementBase::Egi),
            "GROSS_RENTS" | "GROSSRENTS" => Ok(ManagementBase::GrossRents),
            other => Err(format!(
                "unknown management base '{other}' (expected EGI or GROSS_RENTS)"
            )),
        }
    }
}

impl fmt::Display for ManagementBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManagementBase::Egi => write!(f, "EGI"),
            ManagementBase::GrossRents => write!(f, "GROSS_RENTS"),
        }
    }
}

/// Raw analysis request for a rental property.
///
/// Every numeric field is independently optional: `None` means "not
/// provided", which is distinct from an explicit zero. Monetary fields share
/// one implicit currency; rates are fractions (0.05 = 5%).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CashflowInput {
    // --- Identification (not used in any calculation) ---
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,

    // --- Valuation & pricing ---
    /// Fair market value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fmv: Option<Money>,
    /// Offer (purchase) price
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_price: Option<Money>,
    /// Annual property appreciation rate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_appreciation: Option<Rate>,

    // --- Income (annual) ---
    /// Total scheduled rent, all units
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gross_rents_annual: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_units: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parking_annual: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_annual: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub laundry_vending_annual: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_income_annual: Option<Money>,

    // --- Vacancy, management & repairs (rates) ---
    /// Vacancy as a fraction of total income
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vacancy_rate: Option<Rate>,
    /// Management fee as a fraction of the management base
    #[serde(skip_serializing_if = "Option::is_none")]
    pub management_rate: Option<Rate>,
    /// Repairs & maintenance as a fraction of gross rents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repairs_rate: Option<Rate>,

    // --- Operating expenses (annual flat amounts) ---
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_taxes: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insurance: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub electricity: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub water_sewer: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cable: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caretaking: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advertising: Option<Money>,
    /// HOA / association fees
    #[serde(skip_serializing_if = "Option::is_none")]
    pub association_fees: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pest: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trash: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub misc: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub common_area_maintenance: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capital_improvements: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accounting: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legal: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bad_debts: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evictions: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_expenses: Option<Money>,

    // --- First loan ---
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_principal: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_rate_annual: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_amort_years: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_interest_only_years: Option<u32>,

    // --- Second loan ---
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second_principal: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second_rate_annual: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second_amort_years: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second_interest_only_years: Option<u32>,

    /// Servicing and other recurring financing costs, per month
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_monthly_financing_costs: Option<Money>,

    // --- Closing costs & rehab (added to the offer price) ---
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repairs: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repairs_contingency: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lender_fee: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broker_fee: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environmentals: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inspections: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appraisals: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_tax: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legal_close: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_closing_costs: Option<Money>,

    // --- Hold period & growth ---
    /// Projection horizon in years
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hold_years: Option<u32>,
    /// Annual growth for every income stream
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rent_growth: Option<Rate>,
    /// Annual growth for the flat operating-expense block
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expense_growth: Option<Rate>,
    /// Selling costs at exit, as a fraction of sale price
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_cost_rate: Option<Rate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub management_base: Option<ManagementBase>,
}

impl CashflowInput {
    /// Parse a JSON request; absent or `null` fields stay `None`.
    pub fn from_json(json: &str) -> RentalReturnsResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Every monetary field with its wire name.
    pub fn money_fields(&self) -> Vec<(&'static str, Option<Money>)> {
        vec![
            ("fmv", self.fmv),
            ("offer_price", self.offer_price),
            ("gross_rents_annual", self.gross_rents_annual),
            ("parking_annual", self.parking_annual),
            ("storage_annual", self.storage_annual),
            ("laundry_vending_annual", self.laundry_vending_annual),
            ("other_income_annual", self.other_income_annual),
            ("property_taxes", self.property_taxes),
            ("insurance", self.insurance),
            ("electricity", self.electricity),
            ("gas", self.gas),
            ("water_sewer", self.water_sewer),
            ("cable", self.cable),
            ("caretaking", self.caretaking),
            ("advertising", self.advertising),
            ("association_fees", self.association_fees),
            ("pest", self.pest),
            ("security", self.security),
            ("trash", self.trash),
            ("misc", self.misc),
            ("common_area_maintenance", self.common_area_maintenance),
            ("capital_improvements", self.capital_improvements),
            ("accounting", self.accounting),
            ("legal", self.legal),
            ("bad_debts", self.bad_debts),
            ("evictions", self.evictions),
            ("other_expenses", self.other_expenses),
            ("first_principal", self.first_principal),
            ("second_principal", self.second_principal),
            ("other_monthly_financing_costs", self.other_monthly_financing_costs),
            ("repairs", self.repairs),
            ("repairs_contingency", self.repairs_contingency),
            ("lender_fee", self.lender_fee),
            ("broker_fee", self.broker_fee),
            ("environmentals", self.environmentals),
            ("inspections", self.inspections),
            ("appraisals", self.appraisals),
            ("transfer_tax", self.transfer_tax),
            ("legal_close", self.legal_close),
            ("other_closing_costs", self.other_closing_costs),
        ]
    }
}

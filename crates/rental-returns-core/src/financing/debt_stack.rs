use rust_decimal::Decimal;

use super::amortization::{Loan, LoanTerms};
use crate::types::Money;

/// Both acquisition loans plus recurring non-loan financing costs.
///
/// An absent second loan is `None`, not a zero-principal engine.
#[derive(Debug, Clone)]
pub struct DebtStack {
    pub first: Option<Loan>,
    pub second: Option<Loan>,
    /// Servicing and similar costs, charged every year at a flat amount
    pub other_financing_annual: Money,
}

impl DebtStack {
    pub fn new(first: LoanTerms, second: LoanTerms, other_financing_annual: Money) -> Self {
        Self {
            first: Loan::optional(first),
            second: Loan::optional(second),
            other_financing_annual,
        }
    }

    pub fn loan_count(&self) -> usize {
        self.first.iter().chain(self.second.iter()).count()
    }

    /// Combined debt service for `year`, including other financing costs.
    pub fn debt_service(&self, year: u32) -> Money {
        self.first.as_ref().map_or(Decimal::ZERO, |l| l.annual_debt_service(year))
            + self.second.as_ref().map_or(Decimal::ZERO, |l| l.annual_debt_service(year))
            + self.other_financing_annual
    }

    /// Principal retired across both loans during `year`.
    pub fn principal_paid(&self, year: u32) -> Money {
        self.first.as_ref().map_or(Decimal::ZERO, |l| l.principal_paid_year(year))
            + self.second.as_ref().map_or(Decimal::ZERO, |l| l.principal_paid_year(year))
    }

    /// Ending balances `(first, second)` after `year`.
    pub fn balances(&self, year: u32) -> (Money, Money) {
        (
            self.first.as_ref().map_or(Decimal::ZERO, |l| l.balance_end_of_year(year)),
            self.second.as_ref().map_or(Decimal::ZERO, |l| l.balance_end_of_year(year)),
        )
    }
}

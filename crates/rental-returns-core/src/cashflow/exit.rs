use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

/// Disposition of the property at the end of the hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitSale {
    pub sale_price: Money,
    pub sale_costs: Money,
    /// Outstanding balance of every loan at the sale date
    pub loan_payoff: Money,
    pub net_sale_proceeds: Money,
}

impl ExitSale {
    /// Sell at `property_value`, paying `exit_cost_rate` in selling costs and
    /// retiring `loan_payoff` out of the gross proceeds.
    ///
    /// Net proceeds may be negative when the debt exceeds the sale price.
    pub fn at(property_value: Money, exit_cost_rate: Rate, loan_payoff: Money) -> Self {
        let sale_costs = property_value * exit_cost_rate;
        Self {
            sale_price: property_value,
            sale_costs,
            loan_payoff,
            net_sale_proceeds: property_value - sale_costs - loan_payoff,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn test_net_proceeds() {
        let sale = ExitSale::at(dec!(1500000), dec!(0.06), dec!(700000));
        assert_eq!(sale.sale_costs, dec!(90000));
        assert_eq!(sale.net_sale_proceeds, dec!(710000));
    }

    #[test]
    fn test_unlevered_no_costs() {
        let sale = ExitSale::at(dec!(250000), Decimal::ZERO, Decimal::ZERO);
        assert_eq!(sale.net_sale_proceeds, dec!(250000));
    }

    #[test]
    fn test_underwater_sale_goes_negative() {
        let sale = ExitSale::at(dec!(100000), dec!(0.05), dec!(120000));
        assert_eq!(sale.net_sale_proceeds, dec!(-25000));
    }
}

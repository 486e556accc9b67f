pub mod amortization;
pub mod debt_stack;

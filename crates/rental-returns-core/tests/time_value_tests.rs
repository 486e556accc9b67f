use rental_returns_core::time_value::{
    equity_multiple, irr, irr_series, irr_with_guess, npv, IrrInput,
};
use rental_returns_core::RentalReturnsError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// NPV
// ===========================================================================

#[test]
fn test_npv_known_answer() {
    // -1000 + 1100/1.1 = 0
    let value = npv(dec!(0.10), &[dec!(-1000), dec!(1100)]).unwrap();
    assert!(value.abs() < dec!(0.0000001));
}

#[test]
fn test_npv_overflow_is_an_error() {
    assert!(matches!(
        npv(Decimal::ZERO, &[Decimal::MAX, Decimal::MAX]),
        Err(RentalReturnsError::DivisionByZero { .. })
    ));
}

#[test]
fn test_npv_invalid_rate() {
    assert!(matches!(
        npv(dec!(-1.5), &[dec!(-1), dec!(2)]),
        Err(RentalReturnsError::InvalidInput { .. })
    ));
}

// ===========================================================================
// IRR solver
// ===========================================================================

#[test]
fn test_irr_known_answer_even_cashflows() {
    // -1000, +400 x3 => IRR ~9.7%
    let rate = irr(&[dec!(-1000), dec!(400), dec!(400), dec!(400)]).unwrap();
    assert!((rate - dec!(0.0970)).abs() < dec!(0.0005), "got {rate}");
}

#[test]
fn test_irr_bullet_return() {
    // Doubling over 5 years => 2^(1/5) - 1 ≈ 14.87%
    let rate = irr(&[dec!(-500), dec!(0), dec!(0), dec!(0), dec!(0), dec!(1000)]).unwrap();
    assert!((rate - dec!(0.148698)).abs() < dec!(0.00001), "got {rate}");
}

#[test]
fn test_irr_custom_guess_same_root() {
    let flows = [dec!(-1000), dec!(300), dec!(400), dec!(500)];
    let a = irr(&flows).unwrap();
    let b = irr_with_guess(&flows, dec!(0.02)).unwrap();
    assert!((a - b).abs() < dec!(0.000001));
}

#[test]
fn test_irr_degenerate_series() {
    assert_eq!(irr(&[Decimal::ZERO, Decimal::ZERO, Decimal::ZERO]), None);
    assert_eq!(irr(&[dec!(-100), Decimal::ZERO]), None);
}

#[test]
fn test_equity_multiple_ignores_interim_outflows() {
    let flows = [dec!(-200), dec!(20), dec!(-50), dec!(30), dec!(250)];
    assert_eq!(equity_multiple(&flows), Some(dec!(1.5)));
}

#[test]
fn test_equity_multiple_overflowing_distributions() {
    let flows = [dec!(-1), Decimal::MAX, Decimal::MAX];
    assert_eq!(equity_multiple(&flows), None);
}

// ===========================================================================
// Standalone IRR analysis
// ===========================================================================

#[test]
fn test_irr_series_reports_npv_residual() {
    let input = IrrInput {
        cash_flows: vec![dec!(-250000), dec!(18000), dec!(19000), dec!(20000), dec!(330000)],
        guess: Some(dec!(0.08)),
    };
    let out = irr_series(&input).unwrap();
    let r = &out.result;
    assert!(r.irr.is_some());
    assert!(r.npv_at_irr.unwrap().abs() < dec!(0.01));
    assert_eq!(r.periods, 4);
    assert_eq!(out.methodology, "Newton-Raphson IRR (annual periods)");
}

#[test]
fn test_irr_series_rejects_bad_guess() {
    let input = IrrInput {
        cash_flows: vec![dec!(-100), dec!(110)],
        guess: Some(dec!(-1)),
    };
    assert!(irr_series(&input).is_err());
}

#[test]
fn test_irr_series_rejects_overflowing_totals() {
    let input = IrrInput {
        cash_flows: vec![Decimal::MIN, Decimal::MIN, Decimal::MAX],
        guess: None,
    };
    assert!(matches!(
        irr_series(&input),
        Err(RentalReturnsError::InvalidInput { .. })
    ));
}

#[test]
fn test_irr_series_from_json() {
    let input: IrrInput =
        serde_json::from_str(r#"{"cash_flows": ["-100", 60, 60]}"#).unwrap();
    let out = irr_series(&input).unwrap();
    let rate = out.result.irr.unwrap();
    // -100 + 60/(1+r) + 60/(1+r)^2 = 0 => r ≈ 13.07%
    assert!((rate - dec!(0.1307)).abs() < dec!(0.0001), "got {rate}");
}

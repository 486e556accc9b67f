use super::projection::Projection;
use crate::types::Money;

/// Signed equity cash flows: the closing outlay at t=0, each year's cash flow
/// before tax, and net sale proceeds folded into the final year.
///
/// Always `hold_years + 1` entries long.
pub fn cash_series(cash_to_close: Money, projection: &Projection) -> Vec<Money> {
    let mut series = Vec::with_capacity(projection.rows.len() + 1);
    series.push(-cash_to_close);
    series.extend(projection.rows.iter().map(|r| r.cash_flow_before_tax));
    if !projection.rows.is_empty() {
        if let Some(last) = series.last_mut() {
            *last += projection.exit.net_sale_proceeds;
        }
    }
    series
}

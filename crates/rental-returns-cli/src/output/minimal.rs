use serde_json::Value;

use super::scalar_text;

/// Headline fields, most important first.
const PRIORITY_KEYS: [&str; 5] = [
    "irr",
    "equity_multiple",
    "noi_y1",
    "amortizing_payment",
    "total_interest_paid",
];

/// Print just the key answer value from the output.
///
/// Looks for a headline field in the result, then in its `summary` record,
/// and falls back to the first scalar field. Only the IRR prints bare; any
/// other answer is labelled with its key.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_text(value));
}

fn minimal_text(value: &Value) -> String {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let Value::Object(map) = result else {
        return scalar_text(result, "null");
    };

    let scopes = [Some(map), map.get("summary").and_then(Value::as_object)];
    for scope in scopes.into_iter().flatten() {
        for key in PRIORITY_KEYS {
            if let Some(val) = scope.get(key).filter(|v| !v.is_null()) {
                return labelled(key, val);
            }
        }
    }

    match map.iter().find(|(_, v)| !v.is_object() && !v.is_array()) {
        Some((key, val)) => labelled(key, val),
        None => "null".to_string(),
    }
}

fn labelled(key: &str, val: &Value) -> String {
    if key == "irr" {
        scalar_text(val, "null")
    } else {
        format!("{}: {}", key, scalar_text(val, "null"))
    }
}

use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{is_row_set, scalar_text};

/// Format output as tables using the tabled crate.
///
/// Scalar fields (including those of nested records such as `summary`) go in
/// a Field/Value table; every row set (`projection`, `periods`) gets its own
/// table underneath.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => print_result(result, map),
            _ => print_fields(map),
        },
        Value::Array(arr) => print_rows(arr),
        _ => println!("{}", value),
    }
}

fn print_result(result: &Map<String, Value>, envelope: &Map<String, Value>) {
    print_fields(result);

    for (key, val) in result {
        if let Value::Array(rows) = val {
            if is_row_set(val) {
                println!("\n{}:", key);
                print_rows(rows);
            }
        }
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_fields(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    push_fields(&mut builder, map, "");
    println!("{}", Table::from(builder));
}

fn push_fields(builder: &mut Builder, map: &Map<String, Value>, prefix: &str) {
    for (key, val) in map {
        if is_row_set(val) {
            continue;
        }
        match val {
            Value::Object(inner) => push_fields(builder, inner, &format!("{prefix}{key}.")),
            _ => builder.push_record([format!("{prefix}{key}"), scalar_text(val, "n/a")]),
        }
    }
}

fn print_rows(arr: &[Value]) {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            println!("{}", scalar_text(item, "n/a"));
        }
        return;
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(headers.clone());
    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(h).map(|v| scalar_text(v, "n/a")).unwrap_or_default())
                .collect();
            builder.push_record(row);
        }
    }
    println!("{}", Table::from(builder));
}

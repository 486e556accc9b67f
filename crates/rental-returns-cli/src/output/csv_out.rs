use serde_json::{Map, Value};
use std::io::{self, Write};

use super::{is_row_set, scalar_text};

/// Write output as CSV to stdout.
///
/// A result carrying a row set (`projection`, `periods`) is written as one
/// CSV row per entry; otherwise the result becomes a two-column field/value
/// listing with nested records flattened to dotted keys.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let _ = write_csv(value, stdout.lock());
}

fn write_csv<W: Write>(value: &Value, writer: W) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Object(map) => {
            if let Some(Value::Array(rows)) = map.values().find(|v| is_row_set(v)) {
                write_rows(&mut wtr, rows)?;
            } else {
                wtr.write_record(["field", "value"])?;
                write_fields(&mut wtr, map, "")?;
            }
        }
        Value::Array(arr) => write_rows(&mut wtr, arr)?,
        _ => wtr.write_record([scalar_text(result, "")])?,
    }

    wtr.flush()?;
    Ok(())
}

fn write_fields<W: Write>(
    wtr: &mut csv::Writer<W>,
    map: &Map<String, Value>,
    prefix: &str,
) -> csv::Result<()> {
    for (key, val) in map {
        match val {
            Value::Object(inner) => write_fields(wtr, inner, &format!("{prefix}{key}."))?,
            _ => wtr.write_record([format!("{prefix}{key}"), scalar_text(val, "")])?,
        }
    }
    Ok(())
}

fn write_rows<W: Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) -> csv::Result<()> {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            wtr.write_record([scalar_text(item, "")])?;
        }
        return Ok(());
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    wtr.write_record(&headers)?;
    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(|v| scalar_text(v, "")).unwrap_or_default())
                .collect();
            wtr.write_record(&row)?;
        }
    }
    Ok(())
}

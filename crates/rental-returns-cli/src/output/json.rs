use serde_json::Value;
use std::io::{self, Write};

/// Pretty-print JSON to stdout.
pub fn print_json(value: &Value) {
    let stdout = io::stdout();
    if let Err(e) = write_json(value, stdout.lock()) {
        eprintln!("JSON serialization error: {}", e);
    }
}

fn write_json<W: Write>(value: &Value, mut writer: W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)
}

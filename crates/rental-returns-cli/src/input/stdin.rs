use serde_json::Value;
use std::io::{self, Read};

/// Read a JSON document from stdin when input is piped.
///
/// Returns `None` for an interactive terminal or an empty pipe.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    parse_piped(&buffer)
}

fn parse_piped(buffer: &str) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value: Value = serde_json::from_str(trimmed)
        .map_err(|e| format!("Failed to parse JSON from stdin: {e}"))?;
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_pipe_is_none() {
        assert!(parse_piped("  \n").unwrap().is_none());
    }

    #[test]
    fn test_parses_object() {
        let v = parse_piped(r#"{"cash_flows": [-100, 110]}"#).unwrap().unwrap();
        assert_eq!(v["cash_flows"][1], 110);
    }

    #[test]
    fn test_bad_json_errors() {
        assert!(parse_piped("{not json").is_err());
    }
}

//! Hook input: the `--mode` selector and the JSON payload on stdin

use std::io::Read;

use serde_json::{Map, Value};

use crate::hook::DEFAULT_MODE;

/// Parse one JSON value; anything unusable becomes an empty object
pub fn parse_payload(text: &str) -> Value {
    match serde_json::from_str::<Value>(text) {
        Ok(value @ Value::Object(_)) => value,
        Ok(other) => {
            log::debug!("Payload is not a JSON object ({}), treating as empty", kind(&other));
            Value::Object(Map::new())
        }
        Err(e) => {
            log::debug!("Payload is not valid JSON ({}), treating as empty", e);
            Value::Object(Map::new())
        }
    }
}

/// Read the whole payload from `reader`
pub fn read_payload<R: Read>(mut reader: R) -> Value {
    let mut buffer = String::new();
    if let Err(e) = reader.read_to_string(&mut buffer) {
        log::warn!("Failed to read payload: {}", e);
        return Value::Object(Map::new());
    }
    parse_payload(&buffer)
}

/// Value of the first `--mode=<value>` argument, if any
pub fn find_mode_arg<I, S>(args: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    args.into_iter()
        .find_map(|arg| {
            // `--mode=a=b` is mode `a`
            let value = arg.as_ref().strip_prefix("--mode=")?;
            Some(value.split('=').next().unwrap_or_default().to_string())
        })
}

/// Value of the first `--mode=<value>` argument, or the default mode
pub fn mode_from_args<I, S>(args: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    find_mode_arg(args).unwrap_or_else(|| DEFAULT_MODE.to_string())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

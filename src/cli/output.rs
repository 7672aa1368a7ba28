//! Rendering documents for terminals.

use std::fmt::Write as _;

use colored::Colorize;
use serde_json::{Map, Value};

const INDENT: &str = "    ";

/// Copy of `value` with every object's keys in sorted order.
pub fn sorted_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let sorted: Map<String, Value> = keys
                .into_iter()
                .map(|key| (key.clone(), sorted_keys(&map[key])))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted_keys).collect()),
        other => other.clone(),
    }
}

/// `cat` output: sorted keys, four-space indent, optionally colorized.
pub fn render_document(value: &Value, colorize: bool) -> String {
    let mut out = String::new();
    write_value(&mut out, &sorted_keys(value), 0, colorize);
    out
}

fn write_value(out: &mut String, value: &Value, depth: usize, colorize: bool) {
    match value {
        Value::Object(map) if map.is_empty() => out.push_str("{}"),
        Value::Array(items) if items.is_empty() => out.push_str("[]"),
        Value::Object(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                newline(out, depth + 1);
                let key = Value::String(key.clone()).to_string();
                if colorize {
                    let _ = write!(out, "{}", key.blue().bold());
                } else {
                    out.push_str(&key);
                }
                out.push_str(": ");
                write_value(out, item, depth + 1, colorize);
            }
            newline(out, depth);
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                newline(out, depth + 1);
                write_value(out, item, depth + 1, colorize);
            }
            newline(out, depth);
            out.push(']');
        }
        scalar => {
            let text = scalar.to_string();
            if !colorize {
                out.push_str(&text);
                return;
            }
            let _ = match scalar {
                Value::String(_) => write!(out, "{}", text.green()),
                Value::Number(_) => write!(out, "{}", text.cyan()),
                _ => write!(out, "{}", text.yellow()),
            };
        }
    }
}

fn newline(out: &mut String, depth: usize) {
    out.push('\n');
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

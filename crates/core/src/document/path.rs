//! Dotted JSON paths.
//!
//! Paths walk a [`serde_json::Value`] one segment at a time:
//!
//! | Segment   | Meaning                                               |
//! |-----------|-------------------------------------------------------|
//! | `key`     | object member                                         |
//! | `3`       | array element                                         |
//! | `#`       | array length, when it is the last segment             |
//! | `#.rest`  | `rest` evaluated against every element of an array    |
//! | `a\.b`    | literal dot inside a key                              |
//!
//! An empty path or `@this` selects the root.

use serde_json::Value;

/// Resolves `path` against `root`. `None` when any segment fails to resolve.
pub fn get(root: &Value, path: &str) -> Option<Value> {
    let path = path.trim();
    if path.is_empty() || path == "@this" {
        return Some(root.clone());
    }

    let segments = split_segments(path);
    resolve(root, &segments)
}

fn resolve(value: &Value, segments: &[String]) -> Option<Value> {
    let Some((head, rest)) = segments.split_first() else {
        return Some(value.clone());
    };

    match value {
        Value::Array(items) if head == "#" => {
            if rest.is_empty() {
                return Some(Value::from(items.len()));
            }
            Some(Value::Array(items.iter().filter_map(|item| resolve(item, rest)).collect()))
        }
        Value::Array(items) => {
            let index: usize = head.parse().ok()?;
            resolve(items.get(index)?, rest)
        }
        Value::Object(map) => resolve(map.get(head.as_str())?, rest),
        _ => None,
    }
}

fn split_segments(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            '.' => segments.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    segments.push(current);

    segments
}

/// String form of a resolved value.
///
/// Strings are returned raw and `null` is empty. Everything else is compact JSON text.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

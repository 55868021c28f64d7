//! Deep merge functionality for layered configuration values.
//!
//! Implements field-by-field merging where higher layer values override lower layer values.
//! Arrays are replaced entirely, not concatenated.

use serde_json::{Map, Number, Value};

/// How object keys and scalar overrides are matched while merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MergeMode {
    /// Match overlay keys to existing base keys ignoring ASCII case.
    ignore_case: bool,
    /// Convert string overrides to the base's boolean/number type when they parse.
    coerce_strings: bool,
    /// Read string overrides over a `null` base as a boolean/number when they parse.
    infer_over_null: bool,
}

const EXACT: MergeMode = MergeMode {
    ignore_case: false,
    coerce_strings: false,
    infer_over_null: false,
};

const IGNORE_CASE: MergeMode = MergeMode {
    ignore_case: true,
    coerce_strings: false,
    infer_over_null: false,
};

const BINDING: MergeMode = MergeMode {
    ignore_case: true,
    coerce_strings: true,
    infer_over_null: false,
};

const BINDING_INFERRED: MergeMode = MergeMode {
    ignore_case: true,
    coerce_strings: true,
    infer_over_null: true,
};

/// Deep merge two JSON values, with `overlay` taking precedence over `base`.
///
/// - Objects are merged recursively: keys in overlay override keys in base
/// - Arrays, strings, numbers, booleans, nulls are replaced entirely
/// - If overlay is null, the base value is preserved (null means "not specified")
///
/// # Example
/// ```
/// use serde_json::json;
/// use settings_substitution::config::deep_merge;
///
/// let base = json!({
///     "server": { "port": 8080, "host": "localhost" },
///     "features": ["a", "b"]
/// });
/// let overlay = json!({
///     "server": { "port": 9000 },
///     "features": ["c"]
/// });
/// let result = deep_merge(base, overlay);
/// assert_eq!(result, json!({ "server": { "port": 9000, "host": "localhost" }, "features": ["c"] }));
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    merge(base, overlay, EXACT)
}

/// Like [`deep_merge`], but an overlay key that differs from an existing base
/// key only in ASCII case overrides that key instead of adding a new one.
pub fn deep_merge_ignore_case(base: Value, overlay: Value) -> Value {
    merge(base, overlay, IGNORE_CASE)
}

/// Merge a bound section over the serialized defaults of a settings type.
///
/// Keys match ignoring ASCII case, and string overrides (as produced by
/// environment variables) are converted to the default's boolean or number
/// type when they parse as one.
pub fn deep_merge_binding(defaults: Value, section: Value) -> Value {
    merge(defaults, section, BINDING)
}

/// Like [`deep_merge_binding`], but a string override over a `null` default
/// (an unset `Option`) becomes a boolean or number when it parses as one.
///
/// Used as the fallback when the typed merge does not deserialize, since a
/// `null` default does not say whether the field holds text or a scalar.
pub fn deep_merge_binding_inferred(defaults: Value, section: Value) -> Value {
    merge(defaults, section, BINDING_INFERRED)
}

/// Merge multiple values in order, with later values taking precedence.
///
/// Equivalent to folding `deep_merge` over the list.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values.into_iter().fold(Value::Null, deep_merge)
}

/// Merge multiple values in order with case-insensitive key matching.
pub fn deep_merge_all_ignore_case(values: impl IntoIterator<Item = Value>) -> Value {
    values.into_iter().fold(Value::Null, deep_merge_ignore_case)
}

fn merge(base: Value, overlay: Value, mode: MergeMode) -> Value {
    match (base, overlay) {
        // Both are objects: merge recursively
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let key = if mode.ignore_case {
                    existing_key(&base_map, key)
                } else {
                    key
                };
                let base_value = base_map.remove(&key).unwrap_or(Value::Null);
                let merged_value = merge(base_value, overlay_value, mode);
                base_map.insert(key, merged_value);
            }
            Value::Object(base_map)
        }
        // Overlay is null: preserve base (null means "not specified")
        (base, Value::Null) => base,
        // String over a typed scalar: keep the scalar type when it parses
        (base, Value::String(text)) if mode.coerce_strings => {
            let coerced = match base {
                Value::Null if mode.infer_over_null => parse_scalar(&text),
                base => coerce_like(&base, &text),
            };
            coerced.unwrap_or(Value::String(text))
        }
        // Any other case: overlay replaces base entirely
        (_, overlay) => overlay,
    }
}

/// The base key matching `key`, preferring an exact match.
fn existing_key(map: &Map<String, Value>, key: String) -> String {
    if map.contains_key(&key) {
        return key;
    }
    map.keys()
        .find(|existing| existing.eq_ignore_ascii_case(&key))
        .cloned()
        .unwrap_or(key)
}

/// Parse `text` as the same scalar type as `like`.
///
/// Any number parses as any number: a signed field defaulting to `0`
/// serializes as unsigned, so the default's representation says nothing.
fn coerce_like(like: &Value, text: &str) -> Option<Value> {
    match like {
        Value::Bool(_) => parse_bool(text),
        Value::Number(_) => parse_number(text),
        _ => None,
    }
}

/// A boolean or number, whichever `text` parses as.
fn parse_scalar(text: &str) -> Option<Value> {
    parse_bool(text).or_else(|| parse_number(text))
}

fn parse_bool(text: &str) -> Option<Value> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") {
        Some(Value::Bool(true))
    } else if text.eq_ignore_ascii_case("false") {
        Some(Value::Bool(false))
    } else {
        None
    }
}

fn parse_number(text: &str) -> Option<Value> {
    let text = text.trim();
    if let Ok(number) = text.parse::<i64>() {
        return Some(Value::from(number));
    }
    if let Ok(number) = text.parse::<u64>() {
        return Some(Value::from(number));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

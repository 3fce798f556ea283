//! Cache key derivation.
//!
//! Params are serialized to JSON with object keys sorted at every level, so
//! `{a:1,b:2}` and `{b:2,a:1}` land on the same key.

use serde::Serialize;
use serde_json::Value;

use crate::cache::NAMESPACE_SEPARATOR;
use crate::similarity::fingerprint;

/// Key suffix used when params cannot be serialized.
pub const UNSERIALIZABLE_KEY: &str = "unserializable";

/// Builds `namespace:fingerprint` for `params`.
pub fn cache_key<P: Serialize + ?Sized>(namespace: &str, params: &P) -> String {
    match serde_json::to_value(params) {
        Ok(value) => format!(
            "{}{}{}",
            namespace,
            NAMESPACE_SEPARATOR,
            fingerprint(&canonical_json(&value))
        ),
        Err(_) => format!("{}{}{}", namespace, NAMESPACE_SEPARATOR, UNSERIALIZABLE_KEY),
    }
}

/// Serializes `value` with object keys in sorted order.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();

            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

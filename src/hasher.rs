//! Visitor identity hash.
//!
//! A 32-bit rolling hash (`h = h * 31 + unit`) over the UTF-16 code units
//! of the compact JSON array of stable values, printed as signed
//! lowercase hex. Not collision resistant; identifiers from distinct
//! stable subsets are expected to collide at scale.

use serde_json::{Number, Value};

/// Hashes an ordered list of values into a visitor identifier.
///
/// Deterministic across calls and processes. Order-sensitive.
pub fn hash_values(values: &[Value]) -> String {
    hash_str(&canonical_json(values))
}

/// Rolling hash over the UTF-16 code units of `input`.
///
/// Wraps to signed 32 bits at every step; a negative result keeps its
/// sign (`-1a2b`).
pub fn hash_str(input: &str) -> String {
    let h = input.encode_utf16().fold(0i32, |h, unit| {
        h.wrapping_shl(5).wrapping_sub(h).wrapping_add(i32::from(unit))
    });

    if h < 0 {
        format!("-{:x}", (h as i64).unsigned_abs())
    } else {
        format!("{h:x}")
    }
}

/// Compact JSON array of `values`, object keys sorted.
///
/// Floats holding an integral value below 2^64 print as integers
/// (`2.0` -> `2`, `1e16` -> `10000000000000000`). Larger magnitudes keep
/// serde_json's float form.
pub fn canonical_json(values: &[Value]) -> String {
    let normalized: Vec<Value> = values.iter().map(normalize_numbers).collect();
    // Serializing a Value tree cannot fail.
    serde_json::to_string(&normalized).unwrap_or_default()
}

/// 2^63 and 2^64: integral floats below these convert exactly.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;
const U64_BOUND: f64 = 18_446_744_073_709_551_616.0;

fn normalize_numbers(value: &Value) -> Value {
    match value {
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < I64_BOUND => {
                Value::Number(Number::from(f as i64))
            }
            Some(f) if f.fract() == 0.0 && (0.0..U64_BOUND).contains(&f) => {
                Value::Number(Number::from(f as u64))
            }
            _ => value.clone(),
        },
        Value::Array(items) => Value::Array(items.iter().map(normalize_numbers).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), normalize_numbers(v)))
                .collect(),
        ),
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn known_identifiers() {
        assert_eq!(hash_values(&[json!("UA-X"), json!("CANVAS-Y")]), "-10626487");
        assert_eq!(hash_values(&[json!("a"), json!("b")]), "-38066921");
        assert_eq!(hash_values(&[]), "b62");
        assert_eq!(hash_values(&[Value::Null, json!(8), json!("en-US")]), "-3011d9a7");
    }

    #[test]
    fn order_changes_the_identifier() {
        let ab = hash_values(&[json!("a"), json!("b")]);
        let ba = hash_values(&[json!("b"), json!("a")]);
        assert_eq!(ba, "-32031a1");
        assert_ne!(ab, ba);
    }

    #[test]
    fn deterministic_across_calls() {
        let values = vec![json!({ "vendor": "x", "renderer": "y" }), json!([1, 2, 3])];
        assert_eq!(hash_values(&values), hash_values(&values));
    }

    #[test]
    fn hashes_utf16_code_units() {
        assert_eq!(hash_values(&[json!("é")]), "5153e9d");
    }

    #[test]
    fn integral_floats_print_as_integers() {
        assert_eq!(canonical_json(&[json!(2.0), json!(1.5), json!(24)]), "[2,1.5,24]");
        assert_eq!(hash_values(&[json!(2.0)]), hash_values(&[json!(2)]));
    }

    #[test]
    fn large_integral_floats_print_as_integers() {
        assert_eq!(
            canonical_json(&[json!(1e16), json!(-3e18), json!(1e19)]),
            "[10000000000000000,-3000000000000000000,10000000000000000000]"
        );
    }

    #[test]
    fn object_keys_are_sorted() {
        assert_eq!(
            canonical_json(&[json!({ "b": 1, "a": 2 })]),
            r#"[{"a":2,"b":1}]"#
        );
    }
}

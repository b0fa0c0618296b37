use std::collections::HashSet;

use serde_json::Value;

use crate::schema::SignalResult;

/// Keys considered low-volatility enough to identify a visitor.
///
/// Constant for the process lifetime. Membership is all that matters:
/// the selected subset follows collection order, not this order.
pub const STABLE_KEYS: [&str; 10] = [
    "userAgent",
    "hardwareConcurrency",
    "deviceMemory",
    "language",
    "colorDepth",
    "pixelRatio",
    "videoCard",
    "canvas",
    "webgl",
    "fonts",
];

pub fn is_stable_key(key: &str) -> bool {
    STABLE_KEYS.contains(&key)
}

/// Filters collected results down to the stable subset.
///
/// - Order is the order of `results` (registration order)
/// - Stable keys missing from `results` are simply absent
/// - For duplicated keys the first result wins; later ones are skipped
///
pub fn select_stable(results: &[SignalResult]) -> Vec<&SignalResult> {
    let mut seen = HashSet::new();
    results
        .iter()
        .filter(|r| is_stable_key(&r.key) && seen.insert(r.key.as_str()))
        .collect()
}

/// Values of the stable subset, ready for hashing.
pub fn stable_values(results: &[SignalResult]) -> Vec<Value> {
    select_stable(results)
        .into_iter()
        .map(|r| r.value.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn r(key: &str, value: Value) -> SignalResult {
        SignalResult::new(key, value)
    }

    #[test]
    fn keeps_collection_order_not_allow_list_order() {
        let results = vec![
            r("canvas", json!("C")),
            r("timezone", json!("UTC")),
            r("userAgent", json!("UA")),
        ];
        let keys: Vec<_> = select_stable(&results).iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["canvas", "userAgent"]);
    }

    #[test]
    fn missing_stable_keys_are_not_an_error() {
        let results = vec![r("timezone", json!("UTC"))];
        assert!(select_stable(&results).is_empty());
    }

    #[test]
    fn first_registered_duplicate_wins() {
        let results = vec![
            r("fonts", json!(["Arial"])),
            r("fonts", json!(["Comic Sans"])),
        ];
        assert_eq!(stable_values(&results), vec![json!(["Arial"])]);
    }

    #[test]
    fn null_and_error_values_still_participate() {
        let results = vec![r("webgl", Value::Null), r("canvas", json!("error: blocked"))];
        assert_eq!(stable_values(&results), vec![Value::Null, json!("error: blocked")]);
    }
}

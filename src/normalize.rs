use serde_json::Value;

pub fn normalize_opt(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

pub fn normalize(value: Option<&Value>, default: f64) -> f64 {
    normalize_opt(value).unwrap_or(default)
}

/// A zero under an earlier key does not hide a non-zero value under a later one.
pub fn number_field(object: Option<&Value>, keys: &[&str], default: f64) -> f64 {
    number_field_opt(object, keys).unwrap_or(default)
}

pub fn number_field_opt(object: Option<&Value>, keys: &[&str]) -> Option<f64> {
    let mut numbers = keys
        .iter()
        .filter_map(|key| normalize_opt(lookup(object, key)));
    let first = numbers.next()?;
    if first != 0.0 {
        return Some(first);
    }
    Some(numbers.find(|n| *n != 0.0).unwrap_or(first))
}

pub fn text_field(object: Option<&Value>, keys: &[&str], default: &str) -> String {
    keys.iter()
        .find_map(|key| match lookup(object, key) {
            Some(Value::String(text)) if !text.is_empty() => Some(text.clone()),
            Some(Value::Number(number)) => Some(number.to_string()),
            _ => None,
        })
        .unwrap_or_else(|| default.to_string())
}

pub fn array_field<'a>(object: Option<&'a Value>, key: &str) -> &'a [Value] {
    match lookup(object, key) {
        Some(Value::Array(items)) => items.as_slice(),
        _ => &[],
    }
}

pub fn object_field<'a>(object: Option<&'a Value>, key: &str) -> Option<&'a Value> {
    lookup(object, key).filter(|value| value.is_object())
}

fn lookup<'a>(object: Option<&'a Value>, key: &str) -> Option<&'a Value> {
    object?.as_object()?.get(key)
}

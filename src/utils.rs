//! Coercion and fallback helpers shared by the normalizer and calculator.

use serde_json::Value;

use crate::types::RacerKey;

/// Convert a loosely-typed JSON value into a finite number, or `default`.
///
/// Numbers pass through, numeric strings are parsed (after trimming), booleans
/// map to 1/0, and everything else (absent, null, objects, junk strings,
/// non-finite results) resolves to `default`.
pub fn safe_number(value: Option<&Value>, default: f64) -> f64 {
    let parsed = match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(raw)) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        Some(Value::Bool(flag)) => Some(if *flag { 1.0 } else { 0.0 }),
        _ => None,
    };
    match parsed {
        Some(number) if number.is_finite() => number,
        _ => default,
    }
}

/// Coerce a loosely-typed JSON value into a string; absent and null become empty.
pub fn coerce_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(raw)) => raw.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Return the first candidate that is present and satisfies `accept`.
///
/// Candidates are listed in priority order (newer/richer sources first).
pub fn pick_first<T, I, F>(candidates: I, mut accept: F) -> Option<T>
where
    I: IntoIterator<Item = Option<T>>,
    F: FnMut(&T) -> bool,
{
    candidates
        .into_iter()
        .flatten()
        .find(|candidate| accept(candidate))
}

/// First non-blank string among the candidates.
pub fn first_non_empty<'a, I>(candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    pick_first(candidates, |value: &&str| !value.trim().is_empty())
}

/// Canonical pairing key for a racer identifier.
pub fn racer_key(username: &str) -> RacerKey {
    username.trim().to_lowercase()
}

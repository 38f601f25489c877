//! Cross-field validation over resolved candidates.
//!
//! Partial updates never validate raw payloads: a patch of optional fields
//! is first merged over the persisted snapshot into a fully resolved
//! candidate, and every check runs against that candidate. Checks needing
//! database facts (team projects, path membership) take them as plain
//! arguments so the rules stay pure and unit-testable.

pub mod assignment;
pub mod planning;
pub mod team;

use serde::{Deserialize, Deserializer};

/// Effective value of a patch field: the incoming value when the field was
/// present in the payload, the persisted one otherwise.
pub fn effective<T: Clone>(incoming: Option<&T>, existing: &T) -> T {
    incoming.cloned().unwrap_or_else(|| existing.clone())
}

/// Deserialize into `Some(None)` for an explicit JSON null, `Some(Some(v))`
/// for a value; a missing field stays `None` via `#[serde(default)]`.
/// Distinguishes "clear this nullable field" from "leave it alone".
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Payload {
        #[serde(default, deserialize_with = "double_option")]
        value: Option<Option<i32>>,
    }

    #[test]
    fn double_option_separates_null_from_missing() {
        let missing: Payload = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.value, None);

        let null: Payload = serde_json::from_str(r#"{"value": null}"#).unwrap();
        assert_eq!(null.value, Some(None));

        let set: Payload = serde_json::from_str(r#"{"value": 3}"#).unwrap();
        assert_eq!(set.value, Some(Some(3)));
    }

    #[test]
    fn effective_prefers_incoming() {
        assert_eq!(effective(Some(&2), &1), 2);
        assert_eq!(effective(None, &1), 1);
    }
}

//! Coercion of YAML scalars to strings.
//!
//! Variant values, platform architectures and recipe versions are frequently
//! written as bare numbers (`python: [2.7, 3.6]`, `arch: 64`). Downstream code
//! only ever sees their textual form.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};

/// A YAML scalar read as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scalar(pub String);

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_yaml::Value::deserialize(deserializer)?;
        scalar_to_string(&value)
            .map(Scalar)
            .ok_or_else(|| serde::de::Error::custom("expected a string, number or boolean"))
    }
}

/// Textual form of a YAML scalar, `None` for sequences, mappings and null.
#[must_use]
pub fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        _ => None,
    }
}

/// One scalar or a list of scalars, always read as a list.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<Scalar>),
    One(Scalar),
}

impl From<OneOrMany> for Vec<String> {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::Many(items) => items.into_iter().map(|s| s.0).collect(),
            OneOrMany::One(item) => vec![item.0],
        }
    }
}

/// Deserialize a scalar as a `String`.
///
/// # Errors
///
/// Fails on sequences, mappings and null.
pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Scalar::deserialize(deserializer).map(|s| s.0)
}

/// Deserialize an optional scalar as an `Option<String>`.
///
/// # Errors
///
/// Fails on sequences and mappings.
pub fn opt_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Option::<Scalar>::deserialize(deserializer).map(|s| s.map(|s| s.0))
}

/// Deserialize a list of scalars (or a single scalar) as `Vec<String>`.
///
/// # Errors
///
/// Fails when an element is not a scalar.
pub fn string_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Option::<OneOrMany>::deserialize(deserializer).map(|v| v.map(Into::into).unwrap_or_default())
}

/// Deserialize a mapping of key to scalar list, preserving key order.
///
/// # Errors
///
/// Fails when a value is neither a scalar nor a list of scalars.
pub fn string_list_map<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<IndexMap<String, Vec<String>>, D::Error> {
    let raw = Option::<IndexMap<String, OneOrMany>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, v.into()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Doc {
        #[serde(deserialize_with = "string")]
        arch: String,
        #[serde(default, deserialize_with = "string_list")]
        values: Vec<String>,
        #[serde(default, deserialize_with = "string_list_map")]
        matrix: IndexMap<String, Vec<String>>,
    }

    #[test]
    fn test_numbers_become_text() {
        let doc: Doc = serde_yaml::from_str("arch: 64\nvalues: [2.7, '3.6', true]\n").unwrap();
        assert_eq!(doc.arch, "64");
        assert_eq!(doc.values, vec!["2.7", "3.6", "true"]);
    }

    #[test]
    fn test_single_scalar_becomes_list() {
        let doc: Doc = serde_yaml::from_str("arch: x\nvalues: 1.11\n").unwrap();
        assert_eq!(doc.values, vec!["1.11"]);
    }

    #[test]
    fn test_map_keeps_key_order() {
        let doc: Doc =
            serde_yaml::from_str("arch: x\nmatrix:\n  zeta: [1]\n  alpha: [2, 3]\n").unwrap();
        let keys: Vec<_> = doc.matrix.keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
        assert_eq!(doc.matrix["alpha"], vec!["2", "3"]);
    }

    #[test]
    fn test_mapping_is_rejected_as_scalar() {
        let result: Result<Doc, _> = serde_yaml::from_str("arch: {a: 1}\n");
        assert!(result.is_err());
    }
}

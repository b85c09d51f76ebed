//! Build variants and their cartesian expansion.
//!
//! A [`VariantMatrix`] maps each variant key to the values it may take
//! (`python: [2.7, 3.6]`). [`expand`] turns it into concrete [`Variant`]s,
//! one per combination.

use crate::{Error, Result, scalar};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// One assignment of a single value to every variant key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variant(BTreeMap<String, String>);

impl Variant {
    /// Create an empty variant.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value assigned to `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Assign `value` to `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Iterate over assignments in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of assigned keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no key is assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Variant {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(k, v)| format!("{k}={v}")).collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

/// Variant keys and their candidate values, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VariantMatrix(IndexMap<String, Vec<String>>);

impl<'de> Deserialize<'de> for VariantMatrix {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        scalar::string_list_map(deserializer).map(Self)
    }
}

impl VariantMatrix {
    /// Create an empty matrix (expands to a single empty variant).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the candidate values for `key`, keeping its position if already present.
    pub fn insert(&mut self, key: impl Into<String>, values: Vec<String>) {
        self.0.insert(key.into(), values);
    }

    /// Candidate values for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.0.get(key).map(Vec::as_slice)
    }

    /// Iterate over keys and their values in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Whether the matrix declares no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Apply per-platform overrides.
    ///
    /// Keys present in `overrides` replace the values of the same key; new keys
    /// are appended after the existing ones.
    #[must_use]
    pub fn with_overrides(&self, overrides: &IndexMap<String, Vec<String>>) -> Self {
        let mut merged = self.clone();
        for (key, values) in overrides {
            merged.0.insert(key.clone(), values.clone());
        }
        merged
    }

    /// Expand into every combination. See [`expand`].
    #[must_use]
    pub fn expand(&self) -> Vec<Variant> {
        expand(self)
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<String>)> for VariantMatrix {
    fn from_iter<I: IntoIterator<Item = (K, Vec<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Cartesian product of a matrix.
///
/// The result follows the lexicographic product of the matrix key order: the
/// last key varies fastest. An empty matrix yields one empty variant; a key
/// with no values yields no variants at all.
#[must_use]
pub fn expand(matrix: &VariantMatrix) -> Vec<Variant> {
    let mut variants = vec![Variant::new()];
    for (key, values) in matrix.iter() {
        variants = variants
            .into_iter()
            .flat_map(|base| {
                values.iter().map(move |value| {
                    let mut next = base.clone();
                    next.insert(key, value.clone());
                    next
                })
            })
            .collect();
    }
    variants
}

/// Load a variants file: a YAML mapping of key to a list of values.
///
/// Numeric scalars are read as text; a bare scalar counts as a one-element list.
///
/// # Errors
///
/// Returns [`Error::Config`] if the file is missing, [`Error::Io`] if it can't be
/// read and [`Error::Parse`] if it is not a mapping of scalars.
pub fn load_variant_matrix(path: &Path) -> Result<VariantMatrix> {
    if !path.is_file() {
        return Err(Error::config(format!(
            "variants file '{}' does not exist",
            path.display()
        )));
    }
    let content = std::fs::read_to_string(path).map_err(|e| Error::io(e, path, "read"))?;
    if content.trim().is_empty() {
        return Ok(VariantMatrix::new());
    }
    let matrix: VariantMatrix =
        serde_yaml::from_str(&content).map_err(|e| Error::parse(path, e.to_string()))?;
    debug!(
        path = %path.display(),
        keys = matrix.0.len(),
        "Loaded variant matrix"
    );
    Ok(matrix)
}

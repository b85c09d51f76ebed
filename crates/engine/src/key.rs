//! Node identity.

use c3i_core::RenderedRecipe;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

/// What a node does with its package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    /// Build the package
    Build,
    /// Test the package built by the twin `build` node
    Test,
    /// Test a package built on another platform
    TestOnly,
}

impl NodeKind {
    /// Key prefix for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Test => "test",
            Self::TestOnly => "test-only",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable node identifier: `kind-name-build_id-label`.
///
/// Keys order lexicographically, which is what ordering ties are broken by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKey(String);

impl NodeKey {
    /// Compute the key for a node.
    #[must_use]
    pub fn new(kind: NodeKind, name: &str, build_id: &str, label: &str) -> Self {
        Self(format!("{kind}-{name}-{build_id}-{label}"))
    }

    /// Key of `recipe` at `kind` on the platform labelled `label`.
    #[must_use]
    pub fn for_recipe(kind: NodeKind, recipe: &RenderedRecipe, label: &str) -> Self {
        Self::new(kind, recipe.name(), recipe.build_id(), label)
    }

    /// The key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for NodeKey {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NodeKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NodeKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//! Graph nodes.

use crate::key::{NodeKey, NodeKind};
use c3i_core::{Platform, RenderedRecipe, Variant};
use std::path::PathBuf;

/// One task in the build graph.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildNode {
    /// Unique key
    pub key: NodeKey,
    /// Build, test or test-only
    pub kind: NodeKind,
    /// Rendered metadata of the package
    pub recipe: RenderedRecipe,
    /// Platform the task runs on
    pub platform: Platform,
    /// Variant the recipe was rendered with
    pub variant: Variant,
    /// Recipe directory the metadata came from
    pub recipe_dir: PathBuf,
}

impl BuildNode {
    /// Create a node, deriving its key.
    #[must_use]
    pub fn new(
        kind: NodeKind,
        recipe: RenderedRecipe,
        platform: Platform,
        variant: Variant,
        recipe_dir: PathBuf,
    ) -> Self {
        Self {
            key: NodeKey::for_recipe(kind, &recipe, &platform.label),
            kind,
            recipe,
            platform,
            variant,
            recipe_dir,
        }
    }

    /// The same package at another kind.
    #[must_use]
    pub fn with_kind(&self, kind: NodeKind) -> Self {
        Self::new(
            kind,
            self.recipe.clone(),
            self.platform.clone(),
            self.variant.clone(),
            self.recipe_dir.clone(),
        )
    }

    /// Key of the same package at another kind.
    #[must_use]
    pub fn key_as(&self, kind: NodeKind) -> NodeKey {
        NodeKey::for_recipe(kind, &self.recipe, &self.platform.label)
    }

    /// Package name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.recipe.name()
    }
}
